use std::convert::Infallible;
use std::net::SocketAddr;

use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::ObserverError;
use crate::ingest::IngestPipeline;

mod doc_routes;
mod measurement_routes;
mod metric_routes;
mod query;
mod webhook_routes;

pub fn routes(
    pipeline: &IngestPipeline,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    webhook_routes::routes(pipeline, body_limit)
        .or(measurement_routes::routes(pipeline))
        .or(metric_routes::routes(pipeline))
        .or(doc_routes::routes())
        .recover(handle_rejection)
}

pub async fn dispatch_server(
    pipeline: IngestPipeline,
    bind_addr: SocketAddr,
    body_limit: u64,
) -> Result<(), warp::Error> {
    let routes = routes(&pipeline, body_limit).with(warp::trace::request());
    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(bind_addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(%err, "Failed to listen for shutdown signal");
            }
            info!("Shutting down webserver");
        })?;

    info!(%addr, "Starting webserver");
    server.await;
    Ok(())
}

fn build_response<T: serde::Serialize>(
    resp: Result<T, ObserverError>,
) -> Result<warp::reply::Response, Rejection> {
    match resp {
        Ok(data) => Ok(warp::reply::json(&data).into_response()),
        Err(ObserverError::User(err)) => {
            warn!("{}", err);
            Ok(error_reply(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(ObserverError::NotFound(err)) => {
            warn!("{}", err);
            Ok(error_reply(StatusCode::NOT_FOUND, err.to_string()))
        }
        Err(ObserverError::Internal(err)) => {
            error!("{}", err);
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ))
        }
    }
}

fn error_reply(status: StatusCode, detail: String) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&dto::ErrorResponseDto { detail }), status)
        .into_response()
}

/// Maps warp's own rejections onto `{detail}` bodies
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_owned())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Malformed JSON body: {}", e))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_owned())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_owned())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected application/json".to_owned(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_owned(),
        )
    };
    Ok(error_reply(status, detail))
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct ErrorResponseDto {
        pub detail: String,
    }
}
