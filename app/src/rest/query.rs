use chrono::{DateTime, Duration, Utc};
use utoipa::IntoParams;

use crate::error::ApiError;

pub const MAX_RANGE_DAYS: i64 = 31;

/// `?from=..&until=..` window, both RFC 3339
#[derive(serde::Serialize, serde::Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    from: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl DateQuery {
    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }

    pub fn is_valid(&self) -> bool {
        self.from < self.until
    }

    pub fn is_larger_than(&self, duration: Duration) -> bool {
        self.until - self.from > duration
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.is_valid() {
            return Err(ApiError::InvalidRange);
        }
        if self.is_larger_than(Duration::days(MAX_RANGE_DAYS)) {
            return Err(ApiError::RangeTooLarge(MAX_RANGE_DAYS));
        }
        Ok(())
    }
}
