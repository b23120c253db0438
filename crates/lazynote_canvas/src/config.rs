//! Engine configuration.
//!
//! # Invariants
//! - Debounce delays are in `1..=MAX_DEBOUNCE_MS` milliseconds.
//! - Styles carry a non-empty color and a positive stroke width.
//! - Aggregation curves are solid, provenance curves are dashed, and neither
//!   draws an end marker.

use crate::model::connection::ConnectionKind;
use crate::model::style::{DashPattern, EndCap, LineStyle};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_BULK_DEBOUNCE_MS: u64 = 32;
pub const DEFAULT_TARGETED_DEBOUNCE_MS: u64 = 16;
const MAX_DEBOUNCE_MS: u64 = 1_000;

/// Tunables for one `ConnectionEngine` instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Debounce for resize/scroll/"reposition everything" requests.
    pub bulk_debounce_ms: u64,
    /// Debounce for per-object drag/resize requests.
    pub targeted_debounce_ms: u64,
    pub aggregation_style: LineStyle,
    pub provenance_style: LineStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bulk_debounce_ms: DEFAULT_BULK_DEBOUNCE_MS,
            targeted_debounce_ms: DEFAULT_TARGETED_DEBOUNCE_MS,
            aggregation_style: LineStyle::aggregation(),
            provenance_style: LineStyle::provenance(),
        }
    }
}

impl EngineConfig {
    pub fn bulk_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_debounce_ms)
    }

    pub fn targeted_delay(&self) -> Duration {
        Duration::from_millis(self.targeted_debounce_ms)
    }

    /// Checks delay bounds and style sanity.
    ///
    /// # Errors
    /// - `ConfigError::InvalidDebounce` when a delay is zero or too large.
    /// - `ConfigError::InvalidStyle` when a style is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_delay("bulk_debounce_ms", self.bulk_debounce_ms)?;
        validate_delay("targeted_debounce_ms", self.targeted_debounce_ms)?;
        validate_style(
            "aggregation_style",
            &self.aggregation_style,
            ConnectionKind::Aggregation,
        )?;
        validate_style(
            "provenance_style",
            &self.provenance_style,
            ConnectionKind::Provenance,
        )?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidDebounce { field: &'static str, value_ms: u64 },
    InvalidStyle { field: &'static str, reason: &'static str },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDebounce { field, value_ms } => write!(
                f,
                "`{field}` must be within 1..={MAX_DEBOUNCE_MS} ms, got {value_ms}"
            ),
            Self::InvalidStyle { field, reason } => write!(f, "`{field}` is invalid: {reason}"),
        }
    }
}

impl Error for ConfigError {}

fn validate_delay(field: &'static str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms == 0 || value_ms > MAX_DEBOUNCE_MS {
        return Err(ConfigError::InvalidDebounce { field, value_ms });
    }
    Ok(())
}

fn validate_style(
    field: &'static str,
    style: &LineStyle,
    kind: ConnectionKind,
) -> Result<(), ConfigError> {
    if style.color.trim().is_empty() {
        return Err(ConfigError::InvalidStyle {
            field,
            reason: "color cannot be empty",
        });
    }
    if !(style.stroke_width.is_finite() && style.stroke_width > 0.0) {
        return Err(ConfigError::InvalidStyle {
            field,
            reason: "stroke_width must be positive",
        });
    }
    match (kind, style.dash) {
        (ConnectionKind::Aggregation, DashPattern::Solid) => {}
        (ConnectionKind::Aggregation, DashPattern::Dashed { .. }) => {
            return Err(ConfigError::InvalidStyle {
                field,
                reason: "aggregation curves must be solid",
            });
        }
        (ConnectionKind::Provenance, DashPattern::Solid) => {
            return Err(ConfigError::InvalidStyle {
                field,
                reason: "provenance curves must be dashed",
            });
        }
        (ConnectionKind::Provenance, DashPattern::Dashed { dash, gap }) => {
            let positive = |value: f64| value.is_finite() && value > 0.0;
            if !(positive(dash) && positive(gap)) {
                return Err(ConfigError::InvalidStyle {
                    field,
                    reason: "dash and gap must be positive",
                });
            }
        }
    }
    if style.start_cap != EndCap::None || style.end_cap != EndCap::None {
        return Err(ConfigError::InvalidStyle {
            field,
            reason: "connector curves carry no end markers",
        });
    }
    Ok(())
}
