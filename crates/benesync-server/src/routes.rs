//! HTTP surface

use crate::service::Service;
use std::convert::Infallible;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

/// Body of the liveness probe
pub const LIVENESS_TEXT: &str = "Beneficiary sync endpoint is active";

/// `GET /` liveness and `POST /` ingestion
///
/// Ingestion always answers 200; success or failure is in the JSON body.
#[must_use]
pub fn routes(
    service: Arc<Service>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let liveness = warp::get().and(warp::path::end()).map(|| LIVENESS_TEXT);

    let ingest = warp::post()
        .and(warp::path::end())
        .and(warp::body::bytes())
        .and(with_service(service))
        .then(|body: Bytes, service: Arc<Service>| async move {
            warp::reply::json(&service.ingest(&body).await)
        });

    liveness.or(ingest).with(warp::trace::request())
}

fn with_service(
    service: Arc<Service>,
) -> impl Filter<Extract = (Arc<Service>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}
