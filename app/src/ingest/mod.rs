//! Webhook ingestion: decode the envelope, parse and fold the readings,
//! attribute them to a plot and persist one measurement per uplink.

use std::fmt;
use std::sync::Arc;

use agro_core::{parse_batch, MetricSet, Uplink};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DBError, IngestError};
use ports::{
    AssignmentRepository, Measurement, MeasurementRepository, PlotRepository, SensorRepository,
};

pub mod ports;
pub mod resolver;
pub mod writer;

#[cfg(test)]
pub(crate) mod fake;

/// Network-server event kind, taken from the `event` query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Up,
    Join,
    Other(String),
}

impl IngestEvent {
    /// A missing parameter counts as `up`.
    pub fn from_query(event: Option<&str>) -> Self {
        match event.map(str::trim) {
            None | Some("") | Some("up") => IngestEvent::Up,
            Some("join") => IngestEvent::Join,
            Some(other) => IngestEvent::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IngestEvent::Up => "up",
            IngestEvent::Join => "join",
            IngestEvent::Other(other) => other,
        }
    }
}

impl fmt::Display for IngestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub records_created: u32,
    pub sensor_code: String,
    pub plot_code: String,
    pub plot_id: i32,
    pub timestamp: DateTime<Utc>,
    pub measurement_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Recorded(IngestReport),
    Ignored { event: String },
}

#[derive(Clone)]
pub struct IngestPipeline {
    sensors: Arc<dyn SensorRepository>,
    plots: Arc<dyn PlotRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    measurements: Arc<dyn MeasurementRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl IngestPipeline {
    pub fn new(
        sensors: Arc<dyn SensorRepository>,
        plots: Arc<dyn PlotRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        measurements: Arc<dyn MeasurementRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        IngestPipeline {
            sensors,
            plots,
            assignments,
            measurements,
            clock,
        }
    }

    /// Wires every port to the same store.
    pub fn from_store<S>(store: S, clock: Arc<dyn Clock + Send + Sync>) -> Self
    where
        S: SensorRepository
            + PlotRepository
            + AssignmentRepository
            + MeasurementRepository
            + 'static,
    {
        let store = Arc::new(store);
        IngestPipeline::new(store.clone(), store.clone(), store.clone(), store, clock)
    }

    #[tracing::instrument(skip(self, event, payload), fields(event = %event))]
    pub async fn ingest(
        &self,
        event: &IngestEvent,
        payload: &Value,
    ) -> Result<IngestOutcome, IngestError> {
        match event {
            IngestEvent::Up => self.ingest_uplink(payload).await.map(IngestOutcome::Recorded),
            IngestEvent::Join => {
                self.register_join(payload).await?;
                Ok(IngestOutcome::Ignored {
                    event: event.to_string(),
                })
            }
            IngestEvent::Other(name) => {
                debug!(event = %name, "Ignoring event");
                Ok(IngestOutcome::Ignored {
                    event: name.clone(),
                })
            }
        }
    }

    async fn ingest_uplink(&self, payload: &Value) -> Result<IngestReport, IngestError> {
        let received_at = self.clock.utc();
        let uplink = Uplink::from_json(payload)?;
        debug!(
            dev_eui = %uplink.dev_eui,
            content_source = uplink.content.kind(),
            rssi = ?uplink.radio.rssi,
            "Decoded uplink"
        );

        let batch = parse_batch(uplink.content.text());
        let metrics = MetricSet::aggregate(&batch.segments);

        let sensor = self
            .sensors
            .find_by_dev_eui(&uplink.dev_eui)
            .await?
            .ok_or_else(|| IngestError::UnknownDevice(uplink.dev_eui.to_string()))?;
        resolver::cross_check_sensor(&sensor, &metrics);

        let timestamp = resolver::event_time(uplink.published_at.as_deref(), received_at);
        let plot = resolver::resolve_plot(
            self.assignments.as_ref(),
            self.plots.as_ref(),
            &sensor,
            timestamp,
        )
        .await?;
        resolver::cross_check_plot(self.plots.as_ref(), &metrics, &plot).await?;

        let measurement_id = writer::write(
            self.measurements.as_ref(),
            &sensor,
            &plot,
            timestamp,
            received_at,
            metrics,
            uplink.radio,
        )
        .await?;

        Ok(IngestReport {
            records_created: u32::from(measurement_id.is_some()),
            sensor_code: sensor.code,
            plot_code: plot.code,
            plot_id: plot.id,
            timestamp,
            measurement_id,
        })
    }

    async fn register_join(&self, payload: &Value) -> Result<(), IngestError> {
        let dev_eui = match Uplink::device_id(payload) {
            Ok(dev_eui) => dev_eui,
            Err(err) => {
                debug!(%err, "Ignoring join without usable DevEUI");
                return Ok(());
            }
        };
        match self.sensors.find_by_dev_eui(&dev_eui).await? {
            Some(sensor) => {
                self.sensors.mark_seen(sensor.id, self.clock.utc()).await?;
                info!(dev_eui = %dev_eui, sensor_id = sensor.id, "Sensor joined");
            }
            None => debug!(dev_eui = %dev_eui, "Join from unregistered device"),
        }
        Ok(())
    }

    /// Measurements of an existing plot between `from` and `until`.
    pub async fn measurements_for_plot(
        &self,
        plot_id: i32,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, IngestError> {
        if self.plots.find_by_id(plot_id).await?.is_none() {
            return Err(IngestError::UnknownPlot(plot_id));
        }
        Ok(self.measurements.for_plot(plot_id, from, until).await?)
    }

    /// Measurements of the most recent day.
    pub async fn latest_measurements(&self, plot_id: i32) -> Result<Vec<Measurement>, IngestError> {
        let until = self.clock.utc();
        self.measurements_for_plot(plot_id, until - Duration::days(1), until)
            .await
    }

    pub async fn check_db(&self) -> Result<i64, DBError> {
        self.measurements.ping().await
    }
}
