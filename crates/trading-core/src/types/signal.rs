//! Directional signals emitted by strategies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One signal per bar. `Hold` means "no change".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Long,
    Short,
    Exit,
    #[default]
    Hold,
}

impl Signal {
    /// Whether the signal asks to open exposure.
    pub fn is_entry(&self) -> bool {
        matches!(self, Signal::Long | Signal::Short)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Exit => write!(f, "EXIT"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}
