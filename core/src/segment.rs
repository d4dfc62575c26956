//! Tokenizer for the batched measurement text.
//!
//! A transmission looks like `d:6700 s:cap1;2 p:1,d:6600 s:cap1;2 p:1` where
//! `d` is the reading scaled by 100, `s` the sensor code and metric index and
//! `p` the plot code. Broken segments are dropped, the rest of the batch
//! still goes through.

use crate::error::SegmentError;
use tracing::{debug, warn};

const READING_SCALE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub sensor_code: Option<String>,
    pub plot_code: Option<String>,
    pub metric_index: u8,
    pub value: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Batch {
    pub segments: Vec<Segment>,
    pub rejected: Vec<(String, SegmentError)>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Splits the text into segments and parses each of them.
pub fn parse_batch(text: &str) -> Batch {
    let mut batch = Batch::default();
    for raw in split_segments(text) {
        match parse_segment(raw) {
            Ok(segment) => batch.segments.push(segment),
            Err(e) => {
                debug!(segment = raw, "Skipping segment: {}", e);
                batch.rejected.push((raw.to_owned(), e));
            }
        }
    }
    if batch.segments.is_empty() && !batch.rejected.is_empty() {
        warn!(
            rejected = batch.rejected.len(),
            "Every segment of the batch was rejected"
        );
    }
    batch
}

/// Parses one `d:<value> s:<code>;<index> p:<plot>` segment.
pub fn parse_segment(raw: &str) -> Result<Segment, SegmentError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(SegmentError::TooFewTokens);
    }

    let mut value = None;
    let mut sensor_code = None;
    let mut metric_index = None;
    let mut plot_code = None;

    for token in tokens {
        let (prefix, field) = token
            .split_once(':')
            .ok_or_else(|| SegmentError::MalformedToken(token.to_owned()))?;
        match prefix {
            "d" => value = Some(parse_reading(field)?),
            "s" => {
                let (code, index) = parse_sensor_field(field)?;
                sensor_code = code;
                metric_index = index;
            }
            "p" => {
                if field.is_empty() {
                    return Err(SegmentError::MalformedToken(token.to_owned()));
                }
                plot_code = Some(field.to_owned());
            }
            _ => debug!(token = token, "Ignoring unknown token"),
        }
    }

    Ok(Segment {
        value: value.ok_or(SegmentError::MissingReading)?,
        metric_index: metric_index.ok_or(SegmentError::MissingMetricIndex)?,
        sensor_code,
        plot_code,
    })
}

fn split_segments(text: &str) -> impl Iterator<Item = &str> {
    let delimiter = if uses_semicolon_delimiter(text) {
        ';'
    } else {
        ','
    };
    text.split(delimiter)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// `;` separates segments only in comma-free texts, and never when it is
/// the index separator of an `s:<code>;<index>` field.
fn uses_semicolon_delimiter(text: &str) -> bool {
    !text.contains(',')
        && text
            .split_whitespace()
            .any(|token| token.contains(';') && !is_indexed_sensor_field(token))
}

fn is_indexed_sensor_field(token: &str) -> bool {
    token
        .strip_prefix("s:")
        .and_then(|field| field.split_once(';'))
        .map_or(false, |(_, index)| {
            !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
        })
}

fn parse_reading(field: &str) -> Result<f64, SegmentError> {
    match field.parse::<f64>() {
        Ok(scaled) if scaled.is_finite() => Ok(scaled / READING_SCALE),
        _ => Err(SegmentError::InvalidReading(field.to_owned())),
    }
}

/// `cap1;2` carries code and index, a bare number is the index of the older
/// code-less protocol revision, a bare code has no index at all.
fn parse_sensor_field(
    field: &str,
) -> Result<(Option<String>, Option<u8>), SegmentError> {
    let invalid = || SegmentError::InvalidSensorField(field.to_owned());
    match field.split_once(';') {
        Some((code, index)) => {
            if code.is_empty() {
                return Err(invalid());
            }
            let index = index.parse::<u8>().map_err(|_| invalid())?;
            Ok((Some(code.to_owned()), Some(index)))
        }
        None if field.is_empty() => Err(invalid()),
        None => match field.parse::<u8>() {
            Ok(index) => Ok((None, Some(index))),
            Err(_) => Ok((Some(field.to_owned()), None)),
        },
    }
}
