use agro_core::{AssignmentInterval, DevEui, MetricKind, MetricSet, RadioMeta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::DBError;

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub id: i32,
    pub code: String,
    pub dev_eui: DevEui,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    /// Percent, from the last reported battery voltage
    pub battery_level: Option<u8>,
    /// Percent, from the last reported RSSI
    pub signal_quality: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub id: i32,
    pub code: String,
    pub area: Option<f64>,
}

/// Row to be written for one accepted uplink.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub sensor_id: i32,
    pub plot_id: i32,
    pub timestamp: DateTime<Utc>,
    /// Ingestion time, becomes the sensor's `last_seen`.
    pub received_at: DateTime<Utc>,
    pub metrics: MetricSet,
    pub radio: RadioMeta,
}

impl NewMeasurement {
    pub fn metric(&self, kind: MetricKind) -> Option<f64> {
        self.metrics.get(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
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
    pub raw: Value,
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    pub frequency: Option<i64>,
    pub battery_voltage: Option<f64>,
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    async fn find_by_dev_eui(&self, dev_eui: &DevEui) -> Result<Option<Sensor>, DBError>;

    /// Sets the sensor online with `last_seen = at`.
    async fn mark_seen(&self, sensor_id: i32, at: DateTime<Utc>) -> Result<(), DBError>;
}

#[async_trait]
pub trait PlotRepository: Send + Sync {
    async fn find_by_id(&self, plot_id: i32) -> Result<Option<Plot>, DBError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Plot>, DBError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// The assignment binding `sensor_id` at `at`, latest `assigned_at` first.
    async fn find_covering(
        &self,
        sensor_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<AssignmentInterval>, DBError>;
}

#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Inserts the row and marks the sensor as seen within one transaction.
    ///
    /// Battery level and signal quality of the sensor are refreshed from the
    /// radio metadata, absent readings keep the previous values.
    async fn record(&self, measurement: &NewMeasurement) -> Result<i32, DBError>;

    async fn for_plot(
        &self,
        plot_id: i32,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, DBError>;

    /// Returns the number of stored measurements.
    async fn ping(&self) -> Result<i64, DBError>;
}
