use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{
    AmountField, ClassificationTag, Entity, EntityCategory, FilingFlag, Obligation,
};
use super::predicates::{Comparison, Predicate};

/// Income cutoffs the rule set is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingThresholds {
    /// Wage income must exceed this for the employment-irregularity L1 clause.
    pub l1_wage_threshold: Decimal,
    /// Wage income at or above this triggers L1 when employment tax was not filed.
    pub unfiled_employment_tax_threshold: Decimal,
    /// Non-wage income above this makes an E1 return mandatory.
    pub non_wage_income_threshold: Decimal,
}

impl Default for FilingThresholds {
    fn default() -> Self {
        Self {
            l1_wage_threshold: Decimal::from(14_517),
            unfiled_employment_tax_threshold: Decimal::from(13_308),
            non_wage_income_threshold: Decimal::from(730),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    MandatoryL1,
    MandatoryE1,
    VoluntaryL1,
    Fallback,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MandatoryL1 => "Mandatory L1",
            Self::MandatoryE1 => "Mandatory E1",
            Self::VoluntaryL1 => "Voluntary L1",
            Self::Fallback => "Fallback",
        }
    }
}

/// Precondition on the tags already fired earlier in the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleGate {
    Always,
    NoMandatoryTag,
    NoTagFired,
}

impl RuleGate {
    pub(crate) fn open(self, fired: &[ClassificationTag]) -> bool {
        match self {
            RuleGate::Always => true,
            RuleGate::NoMandatoryTag => !fired.iter().any(|tag| tag.is_mandatory()),
            RuleGate::NoTagFired => fired.is_empty(),
        }
    }
}

/// Named eligibility rule producing one classification tag.
///
/// `subject` restricts the rule to one entity category; `None` applies to every entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub tier: Tier,
    pub subject: Option<EntityCategory>,
    pub gate: RuleGate,
    pub predicate: Predicate,
    pub tag: ClassificationTag,
    pub obligation: Obligation,
    pub description: String,
}

impl Rule {
    pub fn priority(&self) -> u8 {
        self.obligation.rank()
    }

    pub fn applies_to(&self, entity: &Entity) -> bool {
        self.subject
            .map_or(true, |category| entity.category == category)
    }

    pub fn matches(&self, entity: &Entity, fired: &[ClassificationTag]) -> bool {
        self.applies_to(entity) && self.gate.open(fired) && self.predicate.test(entity)
    }

    pub fn reason(&self) -> String {
        format!(
            "{} ({}, classified as '{}')",
            self.description,
            self.name,
            self.obligation.label()
        )
    }

    pub fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            name: self.name,
            tier: self.tier,
            tier_label: self.tier.label(),
            subject: self.subject,
            gate: self.gate,
            condition: self.predicate.describe(),
            tag: self.tag,
            obligation: self.obligation,
            priority: self.priority(),
            description: self.description.clone(),
        }
    }
}

/// Serializable explanation of a rule for catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDescriptor {
    pub name: &'static str,
    pub tier: Tier,
    pub tier_label: &'static str,
    pub subject: Option<EntityCategory>,
    pub gate: RuleGate,
    pub condition: String,
    pub tag: ClassificationTag,
    pub obligation: Obligation,
    pub priority: u8,
    pub description: String,
}

/// Ordered, immutable collection of rules. Order only affects the reason listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    thresholds: FilingThresholds,
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard(&FilingThresholds::default())
    }
}

impl RuleSet {
    pub fn standard(thresholds: &FilingThresholds) -> Self {
        let wage_above_l1 = Predicate::threshold(
            AmountField::WageIncome,
            Comparison::GreaterThan,
            thresholds.l1_wage_threshold,
        );
        let wage_at_unfiled = Predicate::threshold(
            AmountField::WageIncome,
            Comparison::AtLeast,
            thresholds.unfiled_employment_tax_threshold,
        );
        let non_wage_above = Predicate::threshold(
            AmountField::NonWageIncome,
            Comparison::GreaterThan,
            thresholds.non_wage_income_threshold,
        );

        // Filer inference only covers natural persons.
        let person = Some(EntityCategory::Person);

        let rules = vec![
            Rule {
                name: "mandatory_l1_wage_irregularity",
                tier: Tier::MandatoryL1,
                subject: person,
                gate: RuleGate::Always,
                predicate: Predicate::all([
                    wage_above_l1,
                    Predicate::any_flag([
                        FilingFlag::IncorrectTaxCredits,
                        FilingFlag::MultipleEmploymentsWithoutJointTax,
                        FilingFlag::IncorrectCommuterAllowance,
                        FilingFlag::IncorrectFamilyBonus,
                    ]),
                ]),
                tag: ClassificationTag::MandatoryL1Filer,
                obligation: Obligation::MandatoryFilingL1,
                description: format!(
                    "Wage income above €{} with an incorrect payroll withholding",
                    thresholds.l1_wage_threshold
                ),
            },
            Rule {
                name: "mandatory_l1_incorrect_tax_credits",
                tier: Tier::MandatoryL1,
                subject: person,
                gate: RuleGate::Always,
                predicate: Predicate::flag(FilingFlag::IncorrectTaxCredits),
                tag: ClassificationTag::MandatoryL1Filer,
                obligation: Obligation::MandatoryFilingL1,
                description: "Tax credits were incorrectly applied by the employer".to_string(),
            },
            Rule {
                name: "additional_l1_unfiled_employment_tax",
                tier: Tier::MandatoryL1,
                subject: person,
                gate: RuleGate::Always,
                predicate: Predicate::all([
                    wage_at_unfiled,
                    Predicate::flag(FilingFlag::EmploymentTaxNotFiled),
                ]),
                tag: ClassificationTag::AdditionalMandatoryL1Filer,
                obligation: Obligation::MandatoryFilingL1,
                description: format!(
                    "Wage income of at least €{} without filed employment tax",
                    thresholds.unfiled_employment_tax_threshold
                ),
            },
            Rule {
                name: "additional_l1_special_payments",
                tier: Tier::MandatoryL1,
                subject: person,
                gate: RuleGate::Always,
                predicate: Predicate::flag(FilingFlag::SpecialPaymentSituations),
                tag: ClassificationTag::AdditionalMandatoryL1Filer,
                obligation: Obligation::MandatoryFilingL1,
                description: "Special payment situations require an assessment".to_string(),
            },
            Rule {
                name: "additional_l1_discretionary_assessment",
                tier: Tier::MandatoryL1,
                subject: person,
                gate: RuleGate::Always,
                predicate: Predicate::flag(FilingFlag::DiscretionaryAssessment),
                tag: ClassificationTag::AdditionalMandatoryL1Filer,
                obligation: Obligation::MandatoryFilingL1,
                description: "Tax office requested a discretionary assessment".to_string(),
            },
            Rule {
                name: "mandatory_e1_non_wage_income",
                tier: Tier::MandatoryE1,
                subject: person,
                gate: RuleGate::Always,
                predicate: non_wage_above,
                tag: ClassificationTag::MandatoryE1Filer,
                obligation: Obligation::MandatoryFilingE1,
                description: format!(
                    "Non-wage income above €{}",
                    thresholds.non_wage_income_threshold
                ),
            },
            Rule {
                name: "voluntary_l1_single_employer",
                tier: Tier::VoluntaryL1,
                subject: person,
                gate: RuleGate::NoMandatoryTag,
                predicate: Predicate::all([
                    Predicate::flag(FilingFlag::SingleEmployer),
                    Predicate::flag(FilingFlag::CorrectWageTax),
                ]),
                tag: ClassificationTag::VoluntaryL1Filer,
                obligation: Obligation::VoluntaryFilingL1,
                description: "Single employer with correctly withheld wage tax".to_string(),
            },
            Rule {
                name: "voluntary_l1_refund_triggers",
                tier: Tier::VoluntaryL1,
                subject: person,
                gate: RuleGate::NoMandatoryTag,
                predicate: Predicate::any_flag([
                    FilingFlag::VaryingIncomeNoRollup,
                    FilingFlag::EmployerChange,
                    FilingFlag::SvRepaymentEligible,
                    FilingFlag::UnclaimedTaxCredits,
                    FilingFlag::UnclaimedDeductions,
                ]),
                tag: ClassificationTag::VoluntaryL1Filer,
                obligation: Obligation::VoluntaryFilingL1,
                description: "A refund is likely from an employee assessment".to_string(),
            },
            Rule {
                name: "no_filing_required",
                tier: Tier::Fallback,
                subject: None,
                gate: RuleGate::NoTagFired,
                predicate: Predicate::all(Vec::new()),
                tag: ClassificationTag::NoFilingRequired,
                obligation: Obligation::NoFilingRequired,
                description: "No filing rule applies".to_string(),
            },
        ];

        Self {
            thresholds: *thresholds,
            rules,
        }
    }

    pub fn thresholds(&self) -> &FilingThresholds {
        &self.thresholds
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn catalog(&self) -> Vec<RuleDescriptor> {
        self.rules.iter().map(Rule::descriptor).collect()
    }
}
