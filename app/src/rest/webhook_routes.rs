use serde_json::Value;
use warp::Filter;

use super::build_response;
use crate::error::ObserverError;
use crate::ingest::{IngestEvent, IngestPipeline};

pub fn routes(
    pipeline: &IngestPipeline,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    ingest(pipeline.clone(), body_limit)
}

/// POST webhooks/ingest?event=up
///
/// Accepts one network-server delivery
///
/// Returns a `IngestResponseDto`, `records_created` is 0 when no reading
/// mapped to a known metric
fn ingest(
    pipeline: IngestPipeline,
    body_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || pipeline.clone())
        .and(warp::post())
        .and(warp::path!("webhooks" / "ingest"))
        .and(warp::query::<dto::EventQuery>())
        .and(warp::body::content_length_limit(body_limit))
        .and(warp::body::json())
        .and_then(
            |pipeline: IngestPipeline, query: dto::EventQuery, body: Value| async move {
                let event = IngestEvent::from_query(query.event.as_deref());
                let resp = pipeline
                    .ingest(&event, &body)
                    .await
                    .map(dto::IngestResponseDto::from)
                    .map_err(ObserverError::from);
                build_response(resp)
            },
        )
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use utoipa::{IntoParams, ToSchema};

    use crate::ingest::{IngestOutcome, IngestReport};

    #[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
    #[into_params(parameter_in = Query)]
    pub struct EventQuery {
        /// `up`, `join` or any other network-server event, defaults to `up`
        pub event: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct IngestSuccessDto {
        pub status: String,
        pub records_created: u32,
        /// Sensor code
        pub capteur: String,
        /// Plot code
        pub parcelle: String,
        pub parcelle_id: i32,
        pub timestamp: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub measurement_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct IgnoredEventDto {
        pub status: String,
        pub event: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum IngestResponseDto {
        Success(IngestSuccessDto),
        Ignored(IgnoredEventDto),
    }

    impl From<IngestReport> for IngestSuccessDto {
        fn from(report: IngestReport) -> Self {
            IngestSuccessDto {
                status: "success".to_owned(),
                records_created: report.records_created,
                capteur: report.sensor_code,
                parcelle: report.plot_code,
                parcelle_id: report.plot_id,
                timestamp: report.timestamp,
                measurement_id: report.measurement_id,
            }
        }
    }

    impl From<IngestOutcome> for IngestResponseDto {
        fn from(outcome: IngestOutcome) -> Self {
            match outcome {
                IngestOutcome::Recorded(report) => IngestResponseDto::Success(report.into()),
                IngestOutcome::Ignored { event } => IngestResponseDto::Ignored(IgnoredEventDto {
                    status: "ignored".to_owned(),
                    event,
                }),
            }
        }
    }
}
