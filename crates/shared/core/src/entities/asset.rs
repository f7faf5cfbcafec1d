use serde::{Deserialize, Serialize};

/// Unique identifier for a tradeable asset
///
/// Used as a map key by every store and as the scope of a matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create a new asset ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Asset class. Each class settles against its own fund pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Commodity,
}

impl AssetClass {
    pub const ALL: [AssetClass; 2] = [AssetClass::Equity, AssetClass::Commodity];
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Equity => f.write_str("Equity"),
            AssetClass::Commodity => f.write_str("Commodity"),
        }
    }
}

/// A listed asset. Identity and class are immutable; price comes from the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Display name (e.g. "Reliance Industries", "Gold")
    pub name: String,
    pub class: AssetClass,
}

impl Asset {
    pub fn new(id: impl Into<AssetId>, name: impl Into<String>, class: AssetClass) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class,
        }
    }
}
