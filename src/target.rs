//! Compilation target description.
//!
//! The mid-end only cares about the feature set: optional passes are
//! switched on per target, the way a front-end would request them.

use std::collections::BTreeSet;

/// Optional behavior a target can request from the mid-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feature {
    /// Run the polyhedral dependence analysis and rewrite provably
    /// independent loops into parallel loops.
    ApplyPolyhedralModel,
    /// Dump the polytope model (statements and dependences) to stderr
    /// while optimizing.
    DumpPolytope,
}

/// A compilation target: host execution plus a set of features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    features: BTreeSet<Feature>,
}

impl Target {
    /// Plain host target with no optional features.
    pub fn host() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn set_feature(&mut self, feature: Feature) {
        self.features.insert(feature);
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}
