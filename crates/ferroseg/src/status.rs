use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Whether a sequence rule may currently be allocated from.
///
/// Persisted as its integer value (`1` enabled, `0` disabled) so records stay
/// compact and readable by other tooling sharing the backend.
///
/// # Example
///
/// ```
/// use ferroseg::RuleStatus;
///
/// assert_eq!(RuleStatus::Enabled.value(), 1);
/// assert_eq!(RuleStatus::try_from(0u8), Ok(RuleStatus::Disabled));
/// assert_eq!("enabled".parse(), Ok(RuleStatus::Enabled));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RuleStatus {
    /// The rule is active; segments may be reserved for its key.
    #[default]
    Enabled,
    /// The rule is parked; lookups still return it but allocation is refused.
    Disabled,
}

impl RuleStatus {
    /// The persisted integer value of this status.
    pub const fn value(self) -> u8 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 0,
        }
    }

    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Returned when an integer or string does not name a [`RuleStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule status: {0}")]
pub struct UnknownStatus(pub String);

impl TryFrom<u8> for RuleStatus {
    type Error = UnknownStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Enabled),
            0 => Ok(Self::Disabled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl From<RuleStatus> for u8 {
    fn from(status: RuleStatus) -> Self {
        status.value()
    }
}

impl FromStr for RuleStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" | "1" => Ok(Self::Enabled),
            "disabled" | "0" => Ok(Self::Disabled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}
