//! Inbound push-channel envelopes.
//!
//! Every frame on the push channel is one JSON object with a `type`
//! discriminator:
//!
//! ```json
//! {"type": "latency", "label": "Genetic", "value": 2003.4}
//! {"type": "alert", "message": "Critical event detected", "level": "CRITICAL"}
//! ```
//!
//! Frames are decoded once, here, into [`Inbound`]. Anything downstream
//! matches on the variants instead of poking at JSON.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::TelemetryError;

const LATENCY: &str = "latency";
const ALERT: &str = "alert";

/// A latency sample for one channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatencySample {
    /// Channel name, matched case-insensitively.
    pub label: String,
    /// Measured value; `null` on the wire is an explicit "no data".
    #[serde(deserialize_with = "required_nullable")]
    pub value: Option<f64>,
}

/// An alert raised by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlertNotice {
    pub message: String,
    pub level: String,
}

/// A decoded push-channel frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Latency(LatencySample),
    Alert(AlertNotice),
    /// Unrecognized or missing `type`. Ignored so newer backends can add
    /// message kinds without breaking older clients.
    Unknown(Option<String>),
    /// A recognized `type` whose payload is missing or mistyping a field.
    Incomplete { kind: &'static str, reason: String },
}

impl Inbound {
    /// Decode one frame.
    ///
    /// Only text that is not JSON at all is an error
    /// ([`TelemetryError::Decode`]). Well-formed JSON always decodes into
    /// some variant.
    pub fn decode(raw: &str) -> Result<Self, TelemetryError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(value))
    }

    fn from_value(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);

        match kind.as_deref() {
            Some(LATENCY) => match LatencySample::deserialize(value) {
                Ok(sample) => Inbound::Latency(sample),
                Err(e) => Inbound::Incomplete {
                    kind: LATENCY,
                    reason: e.to_string(),
                },
            },
            Some(ALERT) => match AlertNotice::deserialize(value) {
                Ok(notice) => Inbound::Alert(notice),
                Err(e) => Inbound::Incomplete {
                    kind: ALERT,
                    reason: e.to_string(),
                },
            },
            _ => Inbound::Unknown(kind),
        }
    }

    /// The envelope's `type`, if it had one.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Inbound::Latency(_) => Some(LATENCY),
            Inbound::Alert(_) => Some(ALERT),
            Inbound::Unknown(kind) => kind.as_deref(),
            Inbound::Incomplete { kind, .. } => Some(*kind),
        }
    }
}

// The field must be present, but may be null.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}
