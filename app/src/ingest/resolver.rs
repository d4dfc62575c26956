use agro_core::{parse_event_timestamp, MetricSet};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::ports::{AssignmentRepository, Plot, PlotRepository, Sensor};
use crate::error::IngestError;

/// Publish time of the uplink, ingestion time when absent or unparseable.
pub fn event_time(published_at: Option<&str>, received_at: DateTime<Utc>) -> DateTime<Utc> {
    match published_at {
        Some(raw) => parse_event_timestamp(raw).unwrap_or_else(|| {
            debug!(published_at = raw, "Unparseable publish time, using ingestion time");
            received_at
        }),
        None => received_at,
    }
}

pub async fn resolve_plot(
    assignments: &dyn AssignmentRepository,
    plots: &dyn PlotRepository,
    sensor: &Sensor,
    at: DateTime<Utc>,
) -> Result<Plot, IngestError> {
    let assignment = assignments
        .find_covering(sensor.id, at)
        .await?
        .ok_or_else(|| IngestError::NoActiveAssignment {
            sensor_code: sensor.code.clone(),
            at,
        })?;

    plots
        .find_by_id(assignment.plot_id)
        .await?
        .ok_or(IngestError::DanglingAssignment {
            assignment_id: assignment.id,
            plot_id: assignment.plot_id,
        })
}

/// Warns when the plot code carried in the text disagrees with the assignment.
pub async fn cross_check_plot(
    plots: &dyn PlotRepository,
    metrics: &MetricSet,
    resolved: &Plot,
) -> Result<(), IngestError> {
    let code = match metrics.single_plot_code() {
        Some(code) if code != resolved.code => code,
        _ => return Ok(()),
    };

    match plots.find_by_code(code).await? {
        Some(named) if named.id != resolved.id => warn!(
            plot_code = code,
            named_plot_id = named.id,
            resolved_plot_id = resolved.id,
            "Uplink names another plot than its assignment, keeping the assignment"
        ),
        Some(_) => {}
        None => debug!(plot_code = code, "Uplink names an unknown plot code"),
    }
    Ok(())
}

/// Warns about readings tagged with another sensor's code.
pub fn cross_check_sensor(sensor: &Sensor, metrics: &MetricSet) {
    for code in metrics.sensor_codes() {
        if *code != sensor.code {
            warn!(
                sensor_id = sensor.id,
                sensor_code = %sensor.code,
                tagged_code = %code,
                "Reading tagged with a foreign sensor code"
            );
        }
    }
}
