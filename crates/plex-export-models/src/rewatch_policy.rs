use serde::{Deserialize, Serialize};

/// How duplicate viewings of one work are collapsed or retained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewatchPolicy {
    /// Keep every viewing; repeats after the chronologically first are
    /// flagged as rewatches.
    #[default]
    All,
    /// Keep only the earliest viewing per work.
    First,
    /// Keep only the most recent viewing per work.
    Last,
    /// Falsy policy value; behaves like `First`.
    #[serde(alias = "false", alias = "null")]
    Disabled,
}

impl RewatchPolicy {
    /// Policies that leave at most one record per identity key.
    pub fn collapses(&self) -> bool {
        !matches!(self, RewatchPolicy::All)
    }
}
