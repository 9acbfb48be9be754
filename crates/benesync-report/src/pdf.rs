//! Plain-text to PDF rendering
//!
//! Both drives export through here: a bold title line followed by the body in
//! a monospaced font, wrapped and paginated on A4.

use crate::error::ObjectStoreError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const TITLE_SIZE: i64 = 14;
const BODY_SIZE: i64 = 10;
const LEADING: i64 = 13;
const WRAP_AT: usize = 84;

/// Body lines that fit on one page below the title block
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN - 2 * LEADING) / LEADING) as usize;

/// Render `title` and `body` as a PDF document
///
/// # Errors
/// - `ObjectStoreError::Export` if the content stream or document cannot be
///   encoded
pub fn render_text_pdf(title: &str, body: &str) -> Result<Vec<u8>, ObjectStoreError> {
    let lines = wrap(body);
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let title_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => title_font,
            "F2" => body_font,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (number, chunk) in pages.iter().enumerate() {
        let content = page_content(title, number + 1, pages.len(), chunk);
        let encoded = content.encode().map_err(ObjectStoreError::export)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).map_err(ObjectStoreError::export)?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(ObjectStoreError::export)?;
    Ok(bytes)
}

fn page_content(title: &str, page: usize, total: usize, lines: &[String]) -> Content {
    let heading = if total > 1 {
        format!("{title} ({page}/{total})")
    } else {
        title.to_string()
    };

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(TITLE_SIZE)]),
        Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(PAGE_HEIGHT - MARGIN)],
        ),
        Operation::new("Tj", vec![Object::string_literal(latin(&heading))]),
        Operation::new("Tf", vec![Object::Name(b"F2".to_vec()), Object::Integer(BODY_SIZE)]),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new("T*", vec![]),
    ];
    for line in lines {
        operations.push(Operation::new("T*", vec![]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(latin(line))]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// Split on newlines and hard-wrap long lines
fn wrap(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in body.lines() {
        let chars: Vec<char> = line.trim_end().chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        for piece in chars.chunks(WRAP_AT) {
            out.push(piece.iter().collect());
        }
    }
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out
}

/// Standard Type1 fonts only cover Latin-1; everything else prints as '?'
fn latin(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_has_header_and_one_page() {
        let bytes = render_text_pdf("7_Report", "Name: Asha\nHGB: 10.5").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn pdf_paginates_long_bodies() {
        let body = (0..LINES_PER_PAGE * 2 + 1)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render_text_pdf("long", &body).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn empty_body_still_renders_a_page() {
        let doc = Document::load_mem(&render_text_pdf("blank", "").unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn wrap_splits_long_lines_and_drops_trailing_blanks() {
        let long = "x".repeat(WRAP_AT + 5);
        let lines = wrap(&format!("{long}\n\n"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].len(), 5);
    }

    #[test]
    fn latin_replaces_non_ascii() {
        assert_eq!(latin("Aśha\t"), "A?ha?");
    }
}
