//! Wire-format core of the soil telemetry ingestion service.
//!
//! Everything in here is pure: decoding the network-server envelope,
//! tokenizing the `d:`/`s:`/`p:` measurement text, folding readings into
//! named metrics, reading the radio metadata and picking the plot assignment covering an instant.
//! Persistence and HTTP live in the `agro` application crate.

pub mod assignment;
pub mod dev_eui;
pub mod envelope;
pub mod error;
pub mod metric;
pub mod radio;
pub mod segment;
pub mod timestamp;

pub use assignment::{select_active, AssignmentInterval};
pub use dev_eui::DevEui;
pub use envelope::{ContentSource, Uplink};
pub use error::{EnvelopeError, SegmentError};
pub use metric::{MetricKind, MetricSet};
pub use radio::RadioMeta;
pub use segment::{parse_batch, parse_segment, Batch, Segment};
pub use timestamp::parse_event_timestamp;

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
