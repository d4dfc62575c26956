use crate::error::EnvelopeError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Serialize;
use std::fmt;

const EUI_HEX_LEN: usize = 16;
const EUI_BYTES: usize = 8;

// Some network-server versions strip the padding
const LENIENT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Canonical LoRaWAN device identifier, 16 uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DevEui(String);

impl DevEui {
    /// Normalizes either encoding the network server may deliver.
    ///
    /// A 16 digit hex string is only uppercased, everything else is read as
    /// base64 of the 8 EUI bytes. Applying it to its own output is a no-op.
    pub fn normalize(raw: &str) -> Result<Self, EnvelopeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EnvelopeError::MissingDeviceId);
        }
        if is_eui_hex(trimmed) {
            return Ok(DevEui(trimmed.to_ascii_uppercase()));
        }

        let bytes = LENIENT_B64
            .decode(trimmed)
            .map_err(|_| EnvelopeError::InvalidDeviceId(trimmed.to_owned()))?;
        if bytes.len() != EUI_BYTES {
            return Err(EnvelopeError::InvalidDeviceId(trimmed.to_owned()));
        }
        Ok(DevEui(hex::encode_upper(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevEui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_eui_hex(value: &str) -> bool {
    value.len() == EUI_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}
