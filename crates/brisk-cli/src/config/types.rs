use crate::config::defaults::default_destination;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which defaults apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `brisk dev`
    Dev,
    /// `brisk build`
    Production,
}

/// Where committed artifacts live.
///
/// Serialized as a plain string: a path, or the literal `"memory"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    /// Directory on disk
    Disk(PathBuf),
    /// Process memory only
    Memory,
}

impl Destination {
    pub const MEMORY: &'static str = "memory";

    pub fn is_memory(&self) -> bool {
        matches!(self, Destination::Memory)
    }
}

impl Default for Destination {
    fn default() -> Self {
        Destination::Disk(default_destination())
    }
}

impl TryFrom<String> for Destination {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("destination cannot be empty".to_string());
        }
        if trimmed == Self::MEMORY {
            Ok(Destination::Memory)
        } else {
            Ok(Destination::Disk(PathBuf::from(trimmed)))
        }
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.to_string()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Disk(path) => write!(f, "{}", path.display()),
            Destination::Memory => f.write_str(Self::MEMORY),
        }
    }
}
