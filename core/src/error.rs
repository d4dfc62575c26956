use thiserror::Error;

/// Reasons a webhook delivery cannot be turned into an [`crate::Uplink`].
///
/// All of them are terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Payload is not a JSON object")]
    NotAnObject,
    #[error("Missing device identifier (devEUI)")]
    MissingDeviceId,
    #[error("Invalid device identifier: {0}")]
    InvalidDeviceId(String),
    #[error("No measurement content found in payload")]
    MissingContent,
}

/// A single segment of the measurement text that got dropped.
///
/// Never fatal for the batch, the parser logs and continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("Segment has fewer than two tokens")]
    TooFewTokens,
    #[error("Segment has no d: reading")]
    MissingReading,
    #[error("Segment has no metric index")]
    MissingMetricIndex,
    #[error("Invalid reading: {0}")]
    InvalidReading(String),
    #[error("Invalid sensor field: {0}")]
    InvalidSensorField(String),
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}
