use serde::{Deserialize, Serialize};

use super::domain::{EntityId, Obligation};
use super::engine::Verdict;

/// Structured, explainable rendering of a [`Verdict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingReport {
    pub entity_id: EntityId,
    pub filing_requirement: Obligation,
    pub inferred_classes: Vec<String>,
    pub must_file: bool,
    pub optional_filing: bool,
    pub no_filing_required: bool,
    pub reasons: Vec<String>,
}

impl From<&Verdict> for FilingReport {
    fn from(verdict: &Verdict) -> Self {
        Self {
            entity_id: verdict.entity_id.clone(),
            filing_requirement: verdict.obligation,
            inferred_classes: verdict
                .tags
                .iter()
                .map(|tag| tag.as_str().to_string())
                .collect(),
            must_file: verdict.must_file(),
            optional_filing: verdict.optional_filing(),
            no_filing_required: verdict.no_filing_required(),
            reasons: verdict.reasons(),
        }
    }
}

impl FilingReport {
    pub fn summary(&self) -> String {
        match self.filing_requirement {
            Obligation::MandatoryFilingL1 => "must file (L1 employee assessment)".to_string(),
            Obligation::MandatoryFilingE1 => "must file (E1 income tax return)".to_string(),
            Obligation::VoluntaryFilingL1 => {
                "optional filing (L1 assessment may be beneficial)".to_string()
            }
            Obligation::NoFilingRequired => "no filing required".to_string(),
        }
    }

    /// Multi-line text rendering used by the command line.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("Filing requirements for {}", self.entity_id),
            format!("Requirement: {} ({})", self.filing_requirement, self.summary()),
        ];

        if !self.reasons.is_empty() {
            lines.push("Reasons:".to_string());
            lines.extend(self.reasons.iter().map(|reason| format!("- {reason}")));
        }

        lines.push(format!(
            "Inferred classifications: {}",
            self.inferred_classes.join(", ")
        ));
        lines.join("\n")
    }
}
