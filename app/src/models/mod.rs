use crate::error::DBError;

// Runtime-checked statements, no live database needed at build time
macro_rules! sql_stmnt {
    ($ret:ident, $stmt:expr) => {
        sqlx::query_as::<_ ,$ret>($stmt)
    };
    ($stmt:expr) => {
        sqlx::query($stmt)
    };
    ($ret:ident, $stmt:expr, $($bind:expr),*) => {
        sqlx::query_as::<_ ,$ret>($stmt)$(.bind($bind))*
    };
    ($stmt:expr, $($bind:expr),*) => {
        sqlx::query($stmt)$(.bind($bind))*
    };
}

pub async fn establish_db_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<sqlx::PgPool, DBError> {
    Ok(sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?)
}

pub async fn run_migrations(conn: &sqlx::PgPool) -> Result<(), DBError> {
    sqlx::migrate!("./migrations").run(conn).await?;
    Ok(())
}

/// Fails if the schema is missing, returns the stored measurement count.
pub async fn check_schema(conn: &sqlx::PgPool) -> Result<i64, DBError> {
    let rows = sql_stmnt!(CountRecord, "SELECT count(*) as count FROM measurements")
        .fetch_one(conn)
        .await?;
    Ok(rows.count())
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRecord {
    pub count: Option<i64>,
}

impl CountRecord {
    pub fn count(self) -> i64 {
        self.count.unwrap_or(0)
    }
}

pub mod assignment;
pub mod measurement;
pub mod plot;
pub mod sensor;
pub mod store;

pub use store::PgStore;

#[cfg(test)]
mod test;
