use agro_core::{AssignmentInterval, DevEui, RadioMeta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{assignment, check_schema, measurement, plot, sensor};
use crate::error::DBError;
use crate::ingest::ports::{
    AssignmentRepository, Measurement, MeasurementRepository, NewMeasurement, Plot,
    PlotRepository, Sensor, SensorRepository,
};

/// Postgres backed implementation of every ingest port
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl SensorRepository for PgStore {
    async fn find_by_dev_eui(&self, dev_eui: &DevEui) -> Result<Option<Sensor>, DBError> {
        sensor::get_by_dev_eui(&self.pool, dev_eui)
            .await?
            .map(Sensor::try_from)
            .transpose()
    }

    async fn mark_seen(&self, sensor_id: i32, at: DateTime<Utc>) -> Result<(), DBError> {
        sensor::mark_seen(&self.pool, sensor_id, at, &RadioMeta::default()).await
    }
}

#[async_trait]
impl PlotRepository for PgStore {
    async fn find_by_id(&self, plot_id: i32) -> Result<Option<Plot>, DBError> {
        Ok(plot::get(&self.pool, plot_id).await?.map(Plot::from))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Plot>, DBError> {
        Ok(plot::get_by_code(&self.pool, code).await?.map(Plot::from))
    }
}

#[async_trait]
impl AssignmentRepository for PgStore {
    async fn find_covering(
        &self,
        sensor_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<AssignmentInterval>, DBError> {
        Ok(assignment::get_covering(&self.pool, sensor_id, at)
            .await?
            .map(AssignmentInterval::from))
    }
}

#[async_trait]
impl MeasurementRepository for PgStore {
    async fn record(&self, new: &NewMeasurement) -> Result<i32, DBError> {
        // dropping the transaction on error rolls it back
        let mut tx = self.pool.begin().await?;
        let measurement_id = measurement::insert(&mut *tx, new).await?;
        sensor::mark_seen(&mut *tx, new.sensor_id, new.received_at, &new.radio).await?;
        tx.commit().await?;
        Ok(measurement_id)
    }

    async fn for_plot(
        &self,
        plot_id: i32,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, DBError> {
        Ok(measurement::get_for_plot(&self.pool, plot_id, from, until)
            .await?
            .into_iter()
            .map(Measurement::from)
            .collect())
    }

    async fn ping(&self) -> Result<i64, DBError> {
        check_schema(&self.pool).await
    }
}
