use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Identifier of a MemeCoin record.
///
/// Assigned by the relational store on creation and stable for the
/// lifetime of the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemeCoinId(i64);

impl MemeCoinId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for MemeCoinId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for MemeCoinId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl Display for MemeCoinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted popularity counter as read from the relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub id: MemeCoinId,
    pub popularity_score: i64,
}

impl ScoreRow {
    pub fn new(id: i64, popularity_score: i64) -> Self {
        Self {
            id: MemeCoinId(id),
            popularity_score,
        }
    }
}
