use agro_core::{MetricSet, RadioMeta};
use chrono::{DateTime, Utc};
use tracing::info;

use super::ports::{MeasurementRepository, NewMeasurement, Plot, Sensor};
use crate::error::IngestError;

/// Writes one row for the uplink, `None` when no metric was recognized.
pub async fn write(
    measurements: &dyn MeasurementRepository,
    sensor: &Sensor,
    plot: &Plot,
    timestamp: DateTime<Utc>,
    received_at: DateTime<Utc>,
    metrics: MetricSet,
    radio: RadioMeta,
) -> Result<Option<i32>, IngestError> {
    if metrics.is_empty() {
        info!(sensor_id = sensor.id, "No measurements extracted");
        return Ok(None);
    }

    let new = NewMeasurement {
        sensor_id: sensor.id,
        plot_id: plot.id,
        timestamp,
        received_at,
        metrics,
        radio,
    };
    let measurement_id = measurements.record(&new).await?;
    info!(
        sensor_id = sensor.id,
        plot_id = plot.id,
        measurement_id,
        metrics = new.metrics.len(),
        "Stored measurement"
    );
    Ok(Some(measurement_id))
}
