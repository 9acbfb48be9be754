//! Outgoing mail and the sender capability

use crate::error::MailError;
use serde::{Deserialize, Serialize};

/// File attached to a message; serialized as base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Name shown to the recipient
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Raw file contents
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Attachment {
    /// PDF attachment
    #[must_use]
    pub fn pdf(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            data,
        }
    }
}

/// One message to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// Attached files, possibly none
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl OutgoingMail {
    /// Create message without attachments
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    /// Builder-style attachment
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Check the recipient looks like `local@domain`
    ///
    /// # Errors
    /// - `MailError::InvalidRecipient` otherwise
    pub fn validate(&self) -> Result<(), MailError> {
        let to = self.to.trim();
        let valid = to
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !to.contains(char::is_whitespace));
        if valid {
            Ok(())
        } else {
            Err(MailError::InvalidRecipient(self.to.clone()))
        }
    }
}

/// Sends one message
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver `mail`; returning `Ok` means the transport accepted it
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[async_trait::async_trait]
impl<T: MailSender + ?Sized> MailSender for std::sync::Arc<T> {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        (**self).send(mail).await
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachment_data_is_base64_on_the_wire() {
        let mail = OutgoingMail::new("a@x.com", "s", "b")
            .with_attachment(Attachment::pdf("7_Report.pdf", b"%PDF".to_vec()));

        let value = serde_json::to_value(&mail).unwrap();
        assert_eq!(
            value["attachments"][0],
            json!({"file_name": "7_Report.pdf", "content_type": "application/pdf", "data": "JVBERg=="})
        );

        let back: OutgoingMail = serde_json::from_value(value).unwrap();
        assert_eq!(back.attachments[0].data, b"%PDF");
    }

    #[test]
    fn validate_recipient() {
        assert!(OutgoingMail::new(" a@x.com ", "", "").validate().is_ok());
        assert!(OutgoingMail::new("a@", "", "").validate().is_err());
        assert!(OutgoingMail::new("not an address", "", "").validate().is_err());
        assert!(OutgoingMail::new("a b@x.com", "", "").validate().is_err());
    }
}
