use crate::error::DBError;
use crate::ingest::ports::Plot;

#[derive(sqlx::FromRow, Debug)]
pub struct PlotDao {
    pub(crate) id: i32,
    pub(crate) code: String,
    pub(crate) area: Option<f64>,
}

#[cfg(test)]
impl PlotDao {
    pub fn id(&self) -> i32 {
        self.id
    }
}

impl From<PlotDao> for Plot {
    fn from(dao: PlotDao) -> Self {
        Plot {
            id: dao.id,
            code: dao.code,
            area: dao.area,
        }
    }
}

#[cfg(test)]
pub async fn insert(
    conn: &sqlx::PgPool,
    code: &str,
    area: Option<f64>,
) -> Result<PlotDao, DBError> {
    Ok(sql_stmnt!(
        PlotDao,
        "INSERT INTO plots (code, area) VALUES ($1, $2) RETURNING *",
        code,
        area
    )
    .fetch_one(conn)
    .await?)
}

pub async fn get(conn: &sqlx::PgPool, plot_id: i32) -> Result<Option<PlotDao>, DBError> {
    Ok(
        sql_stmnt!(PlotDao, "SELECT * FROM plots WHERE id = $1", plot_id)
            .fetch_optional(conn)
            .await?,
    )
}

pub async fn get_by_code(conn: &sqlx::PgPool, code: &str) -> Result<Option<PlotDao>, DBError> {
    Ok(
        sql_stmnt!(PlotDao, "SELECT * FROM plots WHERE code = $1", code)
            .fetch_optional(conn)
            .await?,
    )
}

#[cfg(test)]
pub async fn delete(conn: &sqlx::PgPool, remove_id: i32) -> Result<(), DBError> {
    sql_stmnt!("DELETE FROM plots WHERE id = $1", remove_id)
        .execute(conn)
        .await?;
    Ok(())
}
