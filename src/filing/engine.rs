use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::domain::{ClassificationTag, Entity, EntityId, Obligation};
use super::facts::FactStore;
use super::report::FilingReport;
use super::rules::{FilingThresholds, RuleSet};
use super::FilingError;

/// Stateless classifier applying the fixed rule set to a fact row.
#[derive(Debug, Clone, Default)]
pub struct FilingEngine {
    rules: RuleSet,
}

impl FilingEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn with_thresholds(thresholds: &FilingThresholds) -> Self {
        Self::new(RuleSet::standard(thresholds))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify the current fact row for `entity_id`.
    pub fn classify(&self, store: &FactStore, entity_id: &EntityId) -> Result<Verdict, FilingError> {
        let entity = store.row(entity_id)?;
        Ok(self.evaluate(entity))
    }

    /// Evaluate every rule against `entity` from scratch and resolve the obligation.
    pub fn evaluate(&self, entity: &Entity) -> Verdict {
        let mut fired_tags: Vec<ClassificationTag> = Vec::new();
        let mut fired_rules = Vec::new();

        for rule in self.rules.rules() {
            if !rule.matches(entity, &fired_tags) {
                continue;
            }

            debug!(entity = %entity.id, rule = rule.name, tag = %rule.tag, "filing rule fired");
            if !fired_tags.contains(&rule.tag) {
                fired_tags.push(rule.tag);
            }
            fired_rules.push(FiredRule {
                rule: rule.name,
                tag: rule.tag,
                obligation: rule.obligation,
                reason: rule.reason(),
            });
        }

        let obligation = fired_rules
            .iter()
            .map(|fired| fired.obligation)
            .max_by_key(|obligation| obligation.rank())
            .unwrap_or(Obligation::NoFilingRequired);

        Verdict {
            entity_id: entity.id.clone(),
            tags: fired_tags.into_iter().collect(),
            obligation,
            fired_rules,
        }
    }
}

/// Record of one rule that fired, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredRule {
    pub rule: &'static str,
    pub tag: ClassificationTag,
    pub obligation: Obligation,
    pub reason: String,
}

/// Classification result for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub entity_id: EntityId,
    pub tags: BTreeSet<ClassificationTag>,
    pub obligation: Obligation,
    pub fired_rules: Vec<FiredRule>,
}

impl Verdict {
    pub fn must_file(&self) -> bool {
        self.obligation.is_mandatory()
    }

    pub fn optional_filing(&self) -> bool {
        self.obligation == Obligation::VoluntaryFilingL1
    }

    pub fn no_filing_required(&self) -> bool {
        self.obligation == Obligation::NoFilingRequired
    }

    pub fn has_tag(&self, tag: ClassificationTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.fired_rules.iter().map(|fired| fired.reason.clone()).collect()
    }

    pub fn report(&self) -> FilingReport {
        FilingReport::from(self)
    }
}
