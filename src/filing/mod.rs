//! Filing obligation rule engine.
//!
//! Facts enter through the [`FactStore`] (or the shared [`FilingService`]), the [`FilingEngine`]
//! evaluates the ordered [`RuleSet`] tier by tier, and the resulting [`Verdict`] is packaged as a
//! [`FilingReport`]. Every classification is recomputed from the current fact row; nothing is
//! cached between calls.

pub mod domain;
pub mod engine;
pub mod facts;
pub mod import;
pub mod predicates;
pub mod report;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AmountField, ClassificationTag, Entity, EntityCategory, EntityId, FactField, FactValue,
    FilingFlag, FilingStatus, Obligation,
};
pub use engine::{FilingEngine, FiredRule, Verdict};
pub use facts::FactStore;
pub use import::{FactImportError, FactImporter};
pub use predicates::{Comparison, Predicate};
pub use report::FilingReport;
pub use router::filing_router;
pub use rules::{FilingThresholds, Rule, RuleDescriptor, RuleGate, RuleSet, Tier};
pub use service::FilingService;

/// Errors raised while storing or classifying facts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilingError {
    #[error("entity {0} not found in fact store")]
    UnknownEntity(EntityId),
    #[error("invalid value '{value}' for fact '{field}': {reason}")]
    InvalidFactValue {
        field: String,
        value: String,
        reason: &'static str,
    },
    #[error("fact store unavailable")]
    StoreUnavailable,
}

impl FilingError {
    pub(crate) fn invalid(field: &str, value: &str, reason: &'static str) -> Self {
        Self::InvalidFactValue {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}
