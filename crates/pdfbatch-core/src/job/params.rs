//! Scalar parameters sent alongside every upload in a batch run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Compression level understood by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    #[default]
    Medium,
    Low,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "medium" | "balanced" => Ok(Quality::Medium),
            "low" | "maximum" => Ok(Quality::Low),
            other => Err(format!(
                "invalid quality '{other}' (expected high, medium or low)"
            )),
        }
    }
}

/// Form fields sent with each file. Fixed for one `execute` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitParams {
    pub quality: Quality,
    /// Additional scalar form fields, sent verbatim.
    pub extra: BTreeMap<String, String>,
}

impl SubmitParams {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// All form fields in send order: `quality` first, then extras by name.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        let mut out = vec![("quality", self.quality.as_str())];
        out.extend(
            self.extra
                .iter()
                .filter(|(k, _)| k.as_str() != "quality")
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        out
    }
}
