use serde::{Deserialize, Serialize};

/// One normalized control-surface interaction. Producers post these to the
/// relay, which forwards them verbatim to every live subscriber. The relay is
/// type-agnostic: `kind` is free-form and unknown tags pass through unchanged.
///
/// By convention exactly one of `count`, `delta`, `value` accompanies a given
/// `kind`; the relay does not enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ControlEvent {
    pub fn counter(kind: impl Into<String>, count: i64) -> Self {
        Self {
            kind: kind.into(),
            count: Some(count),
            delta: None,
            value: None,
            label: None,
        }
    }

    pub fn dial_delta(kind: impl Into<String>, delta: i64) -> Self {
        Self {
            kind: kind.into(),
            count: None,
            delta: Some(delta),
            value: None,
            label: None,
        }
    }

    pub fn dial_value(kind: impl Into<String>, value: f64) -> Self {
        Self {
            kind: kind.into(),
            count: None,
            delta: None,
            value: Some(value),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Acknowledgement returned by the relay's submit endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub ok: bool,
}

impl SubmitAck {
    pub fn accepted() -> Self {
        Self { ok: true }
    }
}
