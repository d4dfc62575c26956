use agro_core::MetricKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;

#[cfg(test)]
use super::CountRecord;
use crate::error::DBError;
use crate::ingest::ports::{Measurement, NewMeasurement};

#[derive(sqlx::FromRow, Debug)]
pub struct MeasurementDao {
    pub(crate) id: i32,
    pub(crate) sensor_id: i32,
    pub(crate) plot_id: i32,
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) humidity: Option<f64>,
    pub(crate) temperature: Option<f64>,
    pub(crate) ph: Option<f64>,
    pub(crate) nitrogen: Option<f64>,
    pub(crate) phosphorus: Option<f64>,
    pub(crate) potassium: Option<f64>,
    pub(crate) raw: Json<Value>,
    pub(crate) rssi: Option<i32>,
    pub(crate) snr: Option<f64>,
    pub(crate) frequency: Option<i64>,
    pub(crate) battery_voltage: Option<f64>,
}

impl From<MeasurementDao> for Measurement {
    fn from(dao: MeasurementDao) -> Self {
        Measurement {
            id: dao.id,
            sensor_id: dao.sensor_id,
            plot_id: dao.plot_id,
            timestamp: dao.timestamp.and_utc(),
            humidity: dao.humidity,
            temperature: dao.temperature,
            ph: dao.ph,
            nitrogen: dao.nitrogen,
            phosphorus: dao.phosphorus,
            potassium: dao.potassium,
            raw: dao.raw.0,
            rssi: dao.rssi,
            snr: dao.snr,
            frequency: dao.frequency,
            battery_voltage: dao.battery_voltage,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InsertedId {
    id: i32,
}

pub async fn insert<'e, E>(conn: E, measurement: &NewMeasurement) -> Result<i32, DBError>
where
    E: sqlx::PgExecutor<'e>,
{
    let inserted = sql_stmnt!(
        InsertedId,
        r#"INSERT INTO measurements
            (sensor_id, plot_id, timestamp, humidity, temperature, ph, nitrogen, phosphorus, potassium, raw,
                rssi, snr, frequency, battery_voltage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id"#,
        measurement.sensor_id,
        measurement.plot_id,
        measurement.timestamp.naive_utc(),
        measurement.metric(MetricKind::Humidity),
        measurement.metric(MetricKind::Temperature),
        measurement.metric(MetricKind::Ph),
        measurement.metric(MetricKind::Nitrogen),
        measurement.metric(MetricKind::Phosphorus),
        measurement.metric(MetricKind::Potassium),
        Json(measurement.metrics.raw_map()),
        measurement.radio.rssi,
        measurement.radio.snr,
        measurement.radio.frequency,
        measurement.radio.battery_voltage
    )
    .fetch_one(conn)
    .await?;
    Ok(inserted.id)
}

/// Measurements of a plot within `[from, until]`, newest first
pub async fn get_for_plot(
    conn: &sqlx::PgPool,
    plot_id: i32,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<MeasurementDao>, DBError> {
    Ok(sql_stmnt!(
        MeasurementDao,
        r#"SELECT * FROM measurements
            WHERE plot_id = $1 AND timestamp >= $2 AND timestamp <= $3
            ORDER BY timestamp DESC"#,
        plot_id,
        from.naive_utc(),
        until.naive_utc()
    )
    .fetch_all(conn)
    .await?)
}

#[cfg(test)]
pub async fn count_for_sensor(conn: &sqlx::PgPool, sensor_id: i32) -> Result<i64, DBError> {
    let rows = sql_stmnt!(
        CountRecord,
        "SELECT count(*) as count FROM measurements WHERE sensor_id = $1",
        sensor_id
    )
    .fetch_one(conn)
    .await?;
    Ok(rows.count())
}
