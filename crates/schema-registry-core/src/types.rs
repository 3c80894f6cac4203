//! Wire-facing enums shared across the workspace: schema type, compatibility
//! level, and write mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The schema serialization language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Avro,
    Protobuf,
    Json,
}

impl Default for SchemaType {
    fn default() -> Self {
        SchemaType::Avro
    }
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Protobuf => "PROTOBUF",
            SchemaType::Json => "JSON",
        }
    }
}

impl FromStr for SchemaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVRO" => Ok(SchemaType::Avro),
            "PROTOBUF" => Ok(SchemaType::Protobuf),
            "JSON" => Ok(SchemaType::Json),
            other => Err(Error::InvalidSchema(format!(
                "unknown schema type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction a compatibility check is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Compatibility level gating schema evolution (component C6/C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityMode {
    None,
    Backward,
    BackwardTransitive,
    Forward,
    ForwardTransitive,
    Full,
    FullTransitive,
}

impl Default for CompatibilityMode {
    fn default() -> Self {
        CompatibilityMode::Backward
    }
}

impl CompatibilityMode {
    /// Whether prior-version checks must walk every non-deleted version
    /// rather than just the latest.
    pub fn is_transitive(&self) -> bool {
        matches!(
            self,
            CompatibilityMode::BackwardTransitive
                | CompatibilityMode::ForwardTransitive
                | CompatibilityMode::FullTransitive
        )
    }

    /// The directions that must individually pass for this level.
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            CompatibilityMode::None => &[],
            CompatibilityMode::Backward | CompatibilityMode::BackwardTransitive => {
                &[Direction::Backward]
            }
            CompatibilityMode::Forward | CompatibilityMode::ForwardTransitive => {
                &[Direction::Forward]
            }
            CompatibilityMode::Full | CompatibilityMode::FullTransitive => {
                &[Direction::Backward, Direction::Forward]
            }
        }
    }
}

impl FromStr for CompatibilityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(CompatibilityMode::None),
            "BACKWARD" => Ok(CompatibilityMode::Backward),
            "BACKWARD_TRANSITIVE" => Ok(CompatibilityMode::BackwardTransitive),
            "FORWARD" => Ok(CompatibilityMode::Forward),
            "FORWARD_TRANSITIVE" => Ok(CompatibilityMode::ForwardTransitive),
            "FULL" => Ok(CompatibilityMode::Full),
            "FULL_TRANSITIVE" => Ok(CompatibilityMode::FullTransitive),
            other => Err(Error::InvalidCompatibilityLevel(other.to_string())),
        }
    }
}

/// Write-gating mode for a subject or context (component C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    ReadWrite,
    ReadOnly,
    ReadOnlyOverride,
    Import,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::ReadWrite
    }
}

impl Mode {
    /// Whether this mode permits a plain register call.
    pub fn allows_write(&self) -> bool {
        matches!(self, Mode::ReadWrite | Mode::Import)
    }

    pub fn is_import(&self) -> bool {
        matches!(self, Mode::Import)
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READWRITE" => Ok(Mode::ReadWrite),
            "READONLY" => Ok(Mode::ReadOnly),
            "READONLY_OVERRIDE" => Ok(Mode::ReadOnlyOverride),
            "IMPORT" => Ok(Mode::Import),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}
