use serde::{Deserialize, Serialize};

/// What to do with a line whose encoded size alone exceeds the maximum chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Emit the line as a singleton chunk that exceeds the maximum
    /// No input data is ever lost in this mode
    Permissive,

    /// Drop the line and report it through the observer
    /// Every written chunk honors the maximum in this mode
    Strict,
}

impl OversizePolicy {
    /// Check if oversized lines are written out
    pub fn keeps_oversized_lines(&self) -> bool {
        matches!(self, OversizePolicy::Permissive)
    }
}

impl Default for OversizePolicy {
    fn default() -> Self {
        Self::Permissive
    }
}

impl std::fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OversizePolicy::Permissive => write!(f, "permissive"),
            OversizePolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" | "keep" => Ok(OversizePolicy::Permissive),
            "strict" | "skip" => Ok(OversizePolicy::Strict),
            _ => Err(format!(
                "Invalid oversize policy: '{s}'. Valid values are: permissive, strict"
            )),
        }
    }
}

/// Where the engine is allowed to place chunk boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Any line boundary, chosen purely by accumulated size
    Lines,

    /// Prefer to start a new chunk at section headings once the current
    /// chunk has reached the minimum section size
    Headings,
}

impl BoundaryMode {
    /// Check if heading patterns take part in boundary detection
    pub fn uses_headings(&self) -> bool {
        matches!(self, BoundaryMode::Headings)
    }
}

impl Default for BoundaryMode {
    fn default() -> Self {
        Self::Lines
    }
}

impl std::fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryMode::Lines => write!(f, "lines"),
            BoundaryMode::Headings => write!(f, "headings"),
        }
    }
}

impl std::str::FromStr for BoundaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lines" | "line" => Ok(BoundaryMode::Lines),
            "headings" | "heading" | "sections" => Ok(BoundaryMode::Headings),
            _ => Err(format!(
                "Invalid boundary mode: '{s}'. Valid values are: lines, headings"
            )),
        }
    }
}
