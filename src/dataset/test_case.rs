//! @ai:module:intent Test case definitions for the evaluation dataset
//! @ai:module:layer domain
//! @ai:module:public_api TestCase, Complexity
//! @ai:module:stateless true

use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Complexity category of a test case
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Simple, Complexity::Medium, Complexity::Complex];

    /// @ai:intent Convert category to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }

    /// @ai:intent Capitalized label for reports
    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Simple => "Simple",
            Complexity::Medium => "Medium",
            Complexity::Complex => "Complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "medium" => Ok(Complexity::Medium),
            "complex" => Ok(Complexity::Complex),
            other => Err(EvalError::UnknownCategory(other.to_string())),
        }
    }
}

/// @ai:intent A registered test case; immutable once registered
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub category: Complexity,
    pub name: String,
    /// Recorded session file backing this case
    pub session_path: PathBuf,
}

impl TestCase {
    /// @ai:intent Stable identifier "<category>/<name>"
    /// @ai:effects pure
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// @ai:intent Check that a test case name is safe to use as a file stem
/// @ai:effects pure
pub fn validate_name(name: &str) -> Result<(), EvalError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(EvalError::InvalidTestCaseName(name.to_string()))
    }
}
