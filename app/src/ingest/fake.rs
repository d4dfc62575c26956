//! In-memory ports for pipeline and route tests.

use std::sync::{Arc, Mutex};

use agro_core::{select_active, AssignmentInterval, DevEui, MetricKind, RadioMeta};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::ports::{
    AssignmentRepository, Measurement, MeasurementRepository, NewMeasurement, Plot,
    PlotRepository, Sensor, SensorRepository,
};
use super::IngestPipeline;
use crate::error::DBError;

/// base64 of `CAFEBABED27C8B46`
pub const SENSOR_DEV_EUI_B64: &str = "yv66vtJ8i0Y=";
pub const SENSOR_DEV_EUI: &str = "CAFEBABED27C8B46";
pub const SENSOR_ID: i32 = 7;
pub const PLOT_ID: i32 = 11;

pub struct FixtureClock {
    pub utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
}

#[derive(Default)]
pub struct InMemoryStore {
    pub sensors: Mutex<Vec<Sensor>>,
    pub plots: Vec<Plot>,
    pub assignments: Vec<AssignmentInterval>,
    pub measurements: Mutex<Vec<Measurement>>,
    pub fail_writes: bool,
}

impl InMemoryStore {
    /// Sensor `cap1` assigned to plot `1` since 2026-01-01 without end.
    pub fn with_open_assignment() -> Self {
        InMemoryStore::with_assignment(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(), None)
    }

    pub fn with_assignment(
        assigned_at: DateTime<Utc>,
        unassigned_at: Option<DateTime<Utc>>,
    ) -> Self {
        InMemoryStore {
            sensors: Mutex::new(vec![Sensor {
                id: SENSOR_ID,
                code: "cap1".to_owned(),
                dev_eui: DevEui::normalize(SENSOR_DEV_EUI).unwrap(),
                online: false,
                last_seen: None,
                battery_level: None,
                signal_quality: None,
            }]),
            plots: vec![
                Plot {
                    id: PLOT_ID,
                    code: "1".to_owned(),
                    area: Some(2.5),
                },
                Plot {
                    id: PLOT_ID + 1,
                    code: "2".to_owned(),
                    area: None,
                },
            ],
            assignments: vec![AssignmentInterval {
                id: 1,
                sensor_id: SENSOR_ID,
                plot_id: PLOT_ID,
                assigned_at,
                unassigned_at,
            }],
            ..Default::default()
        }
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.lock().unwrap().len()
    }

    pub fn sensor(&self) -> Sensor {
        self.sensors.lock().unwrap()[0].clone()
    }

    pub fn into_pipeline(self) -> (Arc<InMemoryStore>, IngestPipeline) {
        self.into_pipeline_at(fixture_now())
    }

    pub fn into_pipeline_at(self, utc_now: DateTime<Utc>) -> (Arc<InMemoryStore>, IngestPipeline) {
        let store = Arc::new(self);
        let pipeline = IngestPipeline::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FixtureClock { utc_now }),
        );
        (store, pipeline)
    }

    fn seen(&self, sensor_id: i32, at: DateTime<Utc>, radio: &RadioMeta) {
        for sensor in self.sensors.lock().unwrap().iter_mut() {
            if sensor.id == sensor_id {
                sensor.online = true;
                sensor.last_seen = Some(at);
                sensor.battery_level = radio.battery_level().or(sensor.battery_level);
                sensor.signal_quality = radio.signal_quality().or(sensor.signal_quality);
            }
        }
    }
}

fn write_error() -> DBError {
    DBError::SQLError(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl SensorRepository for InMemoryStore {
    async fn find_by_dev_eui(&self, dev_eui: &DevEui) -> Result<Option<Sensor>, DBError> {
        let sensors = self.sensors.lock().unwrap();
        Ok(sensors.iter().find(|s| s.dev_eui == *dev_eui).cloned())
    }

    async fn mark_seen(&self, sensor_id: i32, at: DateTime<Utc>) -> Result<(), DBError> {
        self.seen(sensor_id, at, &RadioMeta::default());
        Ok(())
    }
}

#[async_trait]
impl PlotRepository for InMemoryStore {
    async fn find_by_id(&self, plot_id: i32) -> Result<Option<Plot>, DBError> {
        Ok(self.plots.iter().find(|p| p.id == plot_id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Plot>, DBError> {
        Ok(self.plots.iter().find(|p| p.code == code).cloned())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn find_covering(
        &self,
        sensor_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<AssignmentInterval>, DBError> {
        let owned = self.assignments.iter().filter(|a| a.sensor_id == sensor_id);
        Ok(select_active(owned, at).cloned())
    }
}

#[async_trait]
impl MeasurementRepository for InMemoryStore {
    async fn record(&self, new: &NewMeasurement) -> Result<i32, DBError> {
        if self.fail_writes {
            return Err(write_error());
        }
        let mut measurements = self.measurements.lock().unwrap();
        let id = measurements.len() as i32 + 1;
        measurements.push(Measurement {
            id,
            sensor_id: new.sensor_id,
            plot_id: new.plot_id,
            timestamp: new.timestamp,
            humidity: new.metric(MetricKind::Humidity),
            temperature: new.metric(MetricKind::Temperature),
            ph: new.metric(MetricKind::Ph),
            nitrogen: new.metric(MetricKind::Nitrogen),
            phosphorus: new.metric(MetricKind::Phosphorus),
            potassium: new.metric(MetricKind::Potassium),
            raw: new.metrics.raw_map(),
            rssi: new.radio.rssi,
            snr: new.radio.snr,
            frequency: new.radio.frequency,
            battery_voltage: new.radio.battery_voltage,
        });
        drop(measurements);
        self.seen(new.sensor_id, new.received_at, &new.radio);
        Ok(id)
    }

    async fn for_plot(
        &self,
        plot_id: i32,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, DBError> {
        let measurements = self.measurements.lock().unwrap();
        let mut rows: Vec<Measurement> = measurements
            .iter()
            .filter(|m| m.plot_id == plot_id && m.timestamp >= from && m.timestamp <= until)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(rows)
    }

    async fn ping(&self) -> Result<i64, DBError> {
        if self.fail_writes {
            return Err(write_error());
        }
        Ok(self.measurements.lock().unwrap().len() as i64)
    }
}
