use tracing::error;
use warp::Filter;

use super::build_response;
use crate::ingest::IngestPipeline;

pub fn routes(
    pipeline: &IngestPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(pipeline.clone())
}

/// GET api/health
///
/// Always 200, `healthy` turns false when the database is unreachable
fn health(
    pipeline: IngestPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || pipeline.clone())
        .and(warp::get())
        .and(warp::path!("api" / "health"))
        .and_then(|pipeline: IngestPipeline| async move {
            let ret = match pipeline.check_db().await {
                Ok(count) => dto::HealthyDto {
                    healthy: true,
                    database_state: "connected".to_owned(),
                    measurement_count: Some(count),
                },
                Err(err) => {
                    error!(%err, "Database check failed");
                    dto::HealthyDto {
                        healthy: false,
                        database_state: "unavailable".to_owned(),
                        measurement_count: None,
                    }
                }
            };
            build_response(Ok(ret))
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct HealthyDto {
        pub healthy: bool,
        pub database_state: String,
        pub measurement_count: Option<i64>,
    }
}
