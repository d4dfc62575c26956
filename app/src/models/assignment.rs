use agro_core::AssignmentInterval;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::DBError;

#[derive(sqlx::FromRow, Debug)]
pub struct AssignmentDao {
    pub(crate) id: i32,
    pub(crate) sensor_id: i32,
    pub(crate) plot_id: i32,
    pub(crate) assigned_at: NaiveDateTime,
    pub(crate) unassigned_at: Option<NaiveDateTime>,
}

impl From<AssignmentDao> for AssignmentInterval {
    fn from(dao: AssignmentDao) -> Self {
        AssignmentInterval {
            id: dao.id,
            sensor_id: dao.sensor_id,
            plot_id: dao.plot_id,
            assigned_at: dao.assigned_at.and_utc(),
            unassigned_at: dao.unassigned_at.map(|t| t.and_utc()),
        }
    }
}

#[cfg(test)]
pub async fn insert(
    conn: &sqlx::PgPool,
    sensor_id: i32,
    plot_id: i32,
    assigned_at: DateTime<Utc>,
    unassigned_at: Option<DateTime<Utc>>,
) -> Result<AssignmentDao, DBError> {
    Ok(sql_stmnt!(
        AssignmentDao,
        r#"INSERT INTO sensor_assignments (sensor_id, plot_id, assigned_at, unassigned_at)
            VALUES ($1, $2, $3, $4) RETURNING *"#,
        sensor_id,
        plot_id,
        assigned_at.naive_utc(),
        unassigned_at.map(|t| t.naive_utc())
    )
    .fetch_one(conn)
    .await?)
}

/// The interval covering `at`, right-open on `unassigned_at`
pub async fn get_covering(
    conn: &sqlx::PgPool,
    sensor_id: i32,
    at: DateTime<Utc>,
) -> Result<Option<AssignmentDao>, DBError> {
    Ok(sql_stmnt!(
        AssignmentDao,
        r#"SELECT * FROM sensor_assignments
            WHERE sensor_id = $1 AND assigned_at <= $2
                AND (unassigned_at IS NULL OR unassigned_at > $2)
            ORDER BY assigned_at DESC
            LIMIT 1"#,
        sensor_id,
        at.naive_utc()
    )
    .fetch_optional(conn)
    .await?)
}

#[cfg(test)]
pub async fn get_history(
    conn: &sqlx::PgPool,
    sensor_id: i32,
) -> Result<Vec<AssignmentDao>, DBError> {
    Ok(sql_stmnt!(
        AssignmentDao,
        "SELECT * FROM sensor_assignments WHERE sensor_id = $1 ORDER BY assigned_at",
        sensor_id
    )
    .fetch_all(conn)
    .await?)
}
