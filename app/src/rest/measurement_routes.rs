use warp::Filter;

use super::build_response;
use super::query::DateQuery;
use crate::error::ObserverError;
use crate::ingest::IngestPipeline;

pub fn routes(
    pipeline: &IngestPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    plot_measurements(pipeline.clone()).or(latest_plot_measurements(pipeline.clone()))
}

/// GET api/plots/:plot_id/measurements?from=..&until=..
///
/// Returns the plot's measurements inside the window, newest first.
/// The window may span at most 31 days
fn plot_measurements(
    pipeline: IngestPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || pipeline.clone())
        .and(warp::get())
        .and(warp::path!("api" / "plots" / i32 / "measurements").map(dto::PlotPath::from))
        .and(warp::query::<DateQuery>())
        .and_then(
            |pipeline: IngestPipeline, path: dto::PlotPath, query: DateQuery| async move {
                if let Err(err) = query.validate() {
                    return build_response::<Vec<dto::MeasurementDto>>(Err(err.into()));
                }
                let resp = pipeline
                    .measurements_for_plot(path.plot_id, query.from(), query.until())
                    .await
                    .map(dto::from_measurements)
                    .map_err(ObserverError::from);
                build_response(resp)
            },
        )
        .boxed()
}

/// GET api/plots/:plot_id/measurements/latest
///
/// Returns the measurements of the last 24 hours, newest first
fn latest_plot_measurements(
    pipeline: IngestPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || pipeline.clone())
        .and(warp::get())
        .and(
            warp::path!("api" / "plots" / i32 / "measurements" / "latest")
                .map(dto::PlotPath::from),
        )
        .and_then(|pipeline: IngestPipeline, path: dto::PlotPath| async move {
            let resp = pipeline
                .latest_measurements(path.plot_id)
                .await
                .map(dto::from_measurements)
                .map_err(ObserverError::from);
            build_response(resp)
        })
        .boxed()
}

pub mod dto {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use utoipa::{IntoParams, ToSchema};

    use crate::ingest::ports::Measurement;

    #[derive(Debug, Deserialize, IntoParams)]
    #[into_params(parameter_in = Path)]
    pub struct PlotPath {
        pub plot_id: i32,
    }

    impl From<i32> for PlotPath {
        fn from(plot_id: i32) -> Self {
            PlotPath { plot_id }
        }
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct MeasurementDto {
        pub id: i32,
        pub sensor_id: i32,
        pub plot_id: i32,
        pub timestamp: DateTime<Utc>,
        pub humidity: Option<f64>,
        pub temperature: Option<f64>,
        pub ph: Option<f64>,
        pub nitrogen: Option<f64>,
        pub phosphorus: Option<f64>,
        pub potassium: Option<f64>,
        /// Metrics as they arrived in the uplink
        #[schema(value_type = Object)]
        pub raw: Value,
        /// dBm at the first receiving gateway
        pub rssi: Option<i32>,
        pub snr: Option<f64>,
        /// Hz
        pub frequency: Option<i64>,
        pub battery_voltage: Option<f64>,
    }

    impl From<Measurement> for MeasurementDto {
        fn from(m: Measurement) -> Self {
            MeasurementDto {
                id: m.id,
                sensor_id: m.sensor_id,
                plot_id: m.plot_id,
                timestamp: m.timestamp,
                humidity: m.humidity,
                temperature: m.temperature,
                ph: m.ph,
                nitrogen: m.nitrogen,
                phosphorus: m.phosphorus,
                potassium: m.potassium,
                raw: m.raw,
                rssi: m.rssi,
                snr: m.snr,
                frequency: m.frequency,
                battery_voltage: m.battery_voltage,
            }
        }
    }

    pub fn from_measurements(measurements: Vec<Measurement>) -> Vec<MeasurementDto> {
        measurements.into_iter().map(MeasurementDto::from).collect()
    }
}
