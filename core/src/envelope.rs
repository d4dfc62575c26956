use crate::dev_eui::DevEui;
use crate::error::EnvelopeError;
use crate::radio::RadioMeta;
use serde::Deserialize;
use serde_json::Value;

/// Where the measurement text of a delivery was found.
///
/// Network-server versions disagree on the envelope layout, these are the
/// shapes seen in the field, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Top-level `content` field
    Direct(String),
    /// `objectJSON` string wrapping `{"text": ..}` or `{"content": ..}`
    ObjectJson(String),
    /// Decoded codec object, `object.content` or `object.text`
    NestedObject(String),
}

impl ContentSource {
    pub fn text(&self) -> &str {
        match self {
            ContentSource::Direct(text)
            | ContentSource::ObjectJson(text)
            | ContentSource::NestedObject(text) => text,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Direct(_) => "content",
            ContentSource::ObjectJson(_) => "objectJSON",
            ContentSource::NestedObject(_) => "object",
        }
    }
}

/// A webhook delivery reduced to what ingestion needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Uplink {
    pub dev_eui: DevEui,
    pub content: ContentSource,
    pub published_at: Option<String>,
    pub radio: RadioMeta,
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "devEUI")]
    dev_eui: Option<Value>,
    #[serde(rename = "deviceInfo")]
    device_info: Option<Value>,
    content: Option<Value>,
    #[serde(rename = "objectJSON")]
    object_json: Option<Value>,
    object: Option<Value>,
    #[serde(rename = "publishedAt")]
    published_at: Option<Value>,
    time: Option<Value>,
    #[serde(rename = "rxInfo")]
    rx_info: Option<Value>,
    #[serde(rename = "txInfo")]
    tx_info: Option<Value>,
}

impl RawEnvelope {
    fn parse(payload: &Value) -> Result<Self, EnvelopeError> {
        if !payload.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }
        RawEnvelope::deserialize(payload).map_err(|_| EnvelopeError::NotAnObject)
    }

    fn dev_eui(&self) -> Result<DevEui, EnvelopeError> {
        let raw = self
            .dev_eui
            .as_ref()
            .and_then(Value::as_str)
            .filter(|raw| !raw.trim().is_empty())
            .or_else(|| {
                self.device_info
                    .as_ref()
                    .and_then(|info| info.get("devEui"))
                    .and_then(Value::as_str)
            })
            .ok_or(EnvelopeError::MissingDeviceId)?;
        DevEui::normalize(raw)
    }

    fn content(&self) -> Result<ContentSource, EnvelopeError> {
        if let Some(text) = self.content.as_ref().and_then(non_empty_text) {
            return Ok(ContentSource::Direct(text));
        }
        if let Some(text) = self.object_json.as_ref().and_then(object_json_text) {
            return Ok(ContentSource::ObjectJson(text));
        }
        if let Some(text) = self.object.as_ref().and_then(text_field) {
            return Ok(ContentSource::NestedObject(text));
        }
        Err(EnvelopeError::MissingContent)
    }

    fn published_at(&self) -> Option<String> {
        self.published_at
            .as_ref()
            .or(self.time.as_ref())
            .and_then(non_empty_text)
    }

    fn radio(&self) -> RadioMeta {
        let gateway = self
            .rx_info
            .as_ref()
            .and_then(|info| info.get(0))
            .filter(|gateway| gateway.is_object());
        let rssi = gateway
            .and_then(|gateway| gateway.get("rssi"))
            .and_then(Value::as_i64)
            .and_then(|rssi| i32::try_from(rssi).ok());
        // v3 reports loRaSNR, v4 snr
        let snr = gateway
            .and_then(|gateway| gateway.get("loRaSNR").or_else(|| gateway.get("snr")))
            .and_then(Value::as_f64);
        let frequency = self
            .tx_info
            .as_ref()
            .and_then(|info| info.get("frequency"))
            .and_then(Value::as_i64);
        RadioMeta {
            rssi,
            snr,
            frequency,
            battery_voltage: self.battery_voltage(),
        }
    }

    fn battery_voltage(&self) -> Option<f64> {
        let decoded = match &self.object_json {
            Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded).ok(),
            other => other.clone(),
        };
        self.object
            .iter()
            .chain(decoded.iter())
            .find_map(|object| {
                ["batteryVoltage", "battery_voltage"]
                    .iter()
                    .find_map(|key| object.get(*key).and_then(Value::as_f64))
            })
    }
}

impl Uplink {
    /// Decodes an `up` delivery.
    pub fn from_json(payload: &Value) -> Result<Self, EnvelopeError> {
        let raw = RawEnvelope::parse(payload)?;
        let dev_eui = raw.dev_eui()?;
        let content = raw.content()?;
        Ok(Uplink {
            dev_eui,
            content,
            published_at: raw.published_at(),
            radio: raw.radio(),
        })
    }

    /// Only the device identifier, for events that carry no measurements.
    pub fn device_id(payload: &Value) -> Result<DevEui, EnvelopeError> {
        RawEnvelope::parse(payload)?.dev_eui()
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn text_field(object: &Value) -> Option<String> {
    ["text", "content"]
        .iter()
        .find_map(|key| object.get(*key).and_then(non_empty_text))
}

fn object_json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .ok()
            .and_then(|decoded| text_field(&decoded)),
        Value::Object(_) => text_field(value),
        _ => None,
    }
}
