use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub departure: String,
    pub arrival: String,
    /// Fallback credential accepted by the endpoint when the server has none configured.
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AnalysisRequest {
    pub fn new(departure: impl Into<String>, arrival: impl Into<String>) -> Self {
        Self {
            departure: departure.into(),
            arrival: arrival.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Copy of the request with surrounding whitespace removed from both locations.
    /// Empty strings are kept; the endpoint is responsible for rejecting them.
    pub fn trimmed(&self) -> Self {
        Self {
            departure: self.departure.trim().to_string(),
            arrival: self.arrival.trim().to_string(),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub alert: Option<String>,
    pub plot: String,
    pub rows: Vec<ResultRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint: Option<String>,
    #[serde(default)]
    pub nearest_city: Option<String>,
    #[serde(default)]
    pub safety: Safety,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub wind_ms: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Safety verdict for a waypoint. Only the two exact strings are recognised;
/// anything else (e.g. "Data unavailable") is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Safety {
    Safe,
    Unsafe,
    Other(String),
}

impl Safety {
    pub const SAFE: &'static str = "Safe to continue";
    pub const UNSAFE: &'static str = "Unsafe to continue";

    pub fn as_str(&self) -> &str {
        match self {
            Safety::Safe => Self::SAFE,
            Safety::Unsafe => Self::UNSAFE,
            Safety::Other(s) => s,
        }
    }
}

impl Default for Safety {
    fn default() -> Self {
        Safety::Other(String::new())
    }
}

impl From<String> for Safety {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::SAFE => Safety::Safe,
            Self::UNSAFE => Safety::Unsafe,
            _ => Safety::Other(value),
        }
    }
}

impl From<Safety> for String {
    fn from(value: Safety) -> Self {
        match value {
            Safety::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one invocation as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvocationState {
    #[default]
    Idle,
    InFlight,
    Completed,
    Failed,
}

impl InvocationState {
    pub fn can_start(self) -> bool {
        !matches!(self, InvocationState::InFlight)
    }

    pub fn can_transition_to(self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Idle | Completed | Failed, InFlight) | (InFlight, Completed | Failed)
        )
    }
}
