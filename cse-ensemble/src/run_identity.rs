use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::EnsembleError;

/// Text between the first two underscores, e.g. `_0.5ey_`.
static EVENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_.*?_").expect("Invalid regex pattern"));

/// Storm duration in minutes, e.g. `360m`.
static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,4}m").expect("Invalid regex pattern"));

/// Temporal pattern, e.g. `tp07`.
static TEMPORAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tp\d*").expect("Invalid regex pattern"));

/// The (event, duration, temporal pattern) triple a model run was made for,
/// as encoded in its result file name. All tokens are lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunIdentity {
    /// Storm frequency token, e.g. `10.0y` or `0.5ey`.
    pub event: String,
    /// Storm duration token, e.g. `360m`.
    pub duration: String,
    /// Temporal pattern token, e.g. `tp07`.
    pub temporal_pattern: String,
}

impl RunIdentity {
    /// Parse a result file name such as
    /// `Example-Catchment_0.5EY_360m_tp07_no-blockages_001_PO.csv`.
    ///
    /// Matching is case-insensitive. Fails if any of the three tokens is
    /// missing; nothing is defaulted.
    pub fn parse(filename: &str) -> Result<Self, EnsembleError> {
        let lower = filename.to_lowercase();
        let missing = |field| EnsembleError::Parse {
            filename: filename.to_string(),
            field,
        };

        let event = EVENT_PATTERN
            .find(&lower)
            .map(|m| m.as_str().replace('_', ""))
            .filter(|event| !event.is_empty())
            .ok_or_else(|| missing("event"))?;
        let duration = DURATION_PATTERN
            .find(&lower)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| missing("duration"))?;
        let temporal_pattern = TEMPORAL_PATTERN
            .find(&lower)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| missing("temporal pattern"))?;

        Ok(RunIdentity {
            event,
            duration,
            temporal_pattern,
        })
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.event, self.duration, self.temporal_pattern)
    }
}
