//! Operating mode of a verification session.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The context a verification session runs in.
///
/// On-site capture happens under physical supervision; remote capture does
/// not, so it is the only mode that runs the anti-spoof gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    OnSite,
    Remote,
}

impl OperatingMode {
    /// Whether captures in this mode must pass the anti-spoof gate.
    pub fn requires_anti_spoof(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnSite => write!(f, "on_site"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for OperatingMode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on_site" | "onsite" | "on-site" => Ok(Self::OnSite),
            "remote" => Ok(Self::Remote),
            other => Err(TypesError::UnknownMode(other.to_string())),
        }
    }
}
