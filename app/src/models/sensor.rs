use agro_core::{DevEui, RadioMeta};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::DBError;
use crate::ingest::ports::Sensor;

pub const STATUS_ONLINE: &str = "online";

#[derive(sqlx::FromRow, Debug)]
pub struct SensorDao {
    pub(crate) id: i32,
    pub(crate) code: String,
    pub(crate) dev_eui: String,
    pub(crate) status: String,
    pub(crate) last_seen: Option<NaiveDateTime>,
    pub(crate) battery_level: Option<i16>,
    pub(crate) signal_quality: Option<i16>,
}

#[cfg(test)]
impl SensorDao {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn code(&self) -> &String {
        &self.code
    }

    pub fn is_online(&self) -> bool {
        self.status == STATUS_ONLINE
    }
}

impl TryFrom<SensorDao> for Sensor {
    type Error = DBError;

    /// Any status besides `online` (`offline`, `maintenance`, ..) reads as offline.
    fn try_from(dao: SensorDao) -> Result<Self, Self::Error> {
        let dev_eui = DevEui::normalize(&dao.dev_eui)
            .map_err(|err| DBError::InvalidRow(format!("sensor {}: {}", dao.id, err)))?;
        Ok(Sensor {
            id: dao.id,
            online: dao.status == STATUS_ONLINE,
            code: dao.code,
            dev_eui,
            last_seen: dao.last_seen.map(|t| t.and_utc()),
            battery_level: dao.battery_level.and_then(|l| u8::try_from(l).ok()),
            signal_quality: dao.signal_quality.and_then(|q| u8::try_from(q).ok()),
        })
    }
}

#[cfg(test)]
pub async fn insert(
    conn: &sqlx::PgPool,
    code: &str,
    dev_eui: &DevEui,
) -> Result<SensorDao, DBError> {
    Ok(sql_stmnt!(
        SensorDao,
        "INSERT INTO sensors (code, dev_eui) VALUES ($1, $2) RETURNING *",
        code,
        dev_eui.as_str()
    )
    .fetch_one(conn)
    .await?)
}

#[cfg(test)]
pub async fn get(conn: &sqlx::PgPool, sensor_id: i32) -> Result<Option<SensorDao>, DBError> {
    Ok(
        sql_stmnt!(SensorDao, "SELECT * FROM sensors WHERE id = $1", sensor_id)
            .fetch_optional(conn)
            .await?,
    )
}

/// Rows written outside the service may hold lowercase hex
pub async fn get_by_dev_eui(
    conn: &sqlx::PgPool,
    dev_eui: &DevEui,
) -> Result<Option<SensorDao>, DBError> {
    Ok(sql_stmnt!(
        SensorDao,
        "SELECT * FROM sensors WHERE UPPER(dev_eui) = $1",
        dev_eui.as_str()
    )
    .fetch_optional(conn)
    .await?)
}

/// Sets the sensor online, readings missing from `radio` keep their old value.
pub async fn mark_seen<'e, E>(
    conn: E,
    sensor_id: i32,
    at: DateTime<Utc>,
    radio: &RadioMeta,
) -> Result<(), DBError>
where
    E: sqlx::PgExecutor<'e>,
{
    sql_stmnt!(
        r#"UPDATE sensors SET status = $2, last_seen = $3,
            battery_level = COALESCE($4, battery_level),
            signal_quality = COALESCE($5, signal_quality)
            WHERE id = $1"#,
        sensor_id,
        STATUS_ONLINE,
        at.naive_utc(),
        radio.battery_level().map(i16::from),
        radio.signal_quality().map(i16::from)
    )
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
pub async fn delete(conn: &sqlx::PgPool, remove_id: i32) -> Result<(), DBError> {
    sql_stmnt!("DELETE FROM measurements WHERE sensor_id = $1", remove_id)
        .execute(conn)
        .await?;
    sql_stmnt!("DELETE FROM sensor_assignments WHERE sensor_id = $1", remove_id)
        .execute(conn)
        .await?;
    sql_stmnt!("DELETE FROM sensors WHERE id = $1", remove_id)
        .execute(conn)
        .await?;
    Ok(())
}
