use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingError;

/// Identifier wrapper for taxpayer entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityCategory {
    #[default]
    Person,
    Organization,
}

impl EntityCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "person" => Some(Self::Person),
            "organization" | "organisation" => Some(Self::Organization),
            _ => None,
        }
    }
}

/// The fixed set of boolean facts the rule set reads. Every flag defaults to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingFlag {
    IncorrectTaxCredits,
    MultipleEmploymentsWithoutJointTax,
    IncorrectCommuterAllowance,
    IncorrectFamilyBonus,
    EmploymentTaxNotFiled,
    SpecialPaymentSituations,
    DiscretionaryAssessment,
    SingleEmployer,
    CorrectWageTax,
    VaryingIncomeNoRollup,
    EmployerChange,
    SvRepaymentEligible,
    UnclaimedTaxCredits,
    UnclaimedDeductions,
    SelfEmploymentIncome,
}

impl FilingFlag {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::IncorrectTaxCredits,
            Self::MultipleEmploymentsWithoutJointTax,
            Self::IncorrectCommuterAllowance,
            Self::IncorrectFamilyBonus,
            Self::EmploymentTaxNotFiled,
            Self::SpecialPaymentSituations,
            Self::DiscretionaryAssessment,
            Self::SingleEmployer,
            Self::CorrectWageTax,
            Self::VaryingIncomeNoRollup,
            Self::EmployerChange,
            Self::SvRepaymentEligible,
            Self::UnclaimedTaxCredits,
            Self::UnclaimedDeductions,
            Self::SelfEmploymentIncome,
        ]
    }

    /// Stable field key used by raw fact input (CSV columns, property listings).
    pub const fn key(self) -> &'static str {
        match self {
            Self::IncorrectTaxCredits => "incorrect_tax_credits",
            Self::MultipleEmploymentsWithoutJointTax => "multiple_employments_without_joint_tax",
            Self::IncorrectCommuterAllowance => "incorrect_commuter_allowance",
            Self::IncorrectFamilyBonus => "incorrect_family_bonus",
            Self::EmploymentTaxNotFiled => "employment_tax_not_filed",
            Self::SpecialPaymentSituations => "special_payment_situations",
            Self::DiscretionaryAssessment => "discretionary_assessment",
            Self::SingleEmployer => "single_employer",
            Self::CorrectWageTax => "correct_wage_tax",
            Self::VaryingIncomeNoRollup => "varying_income_no_rollup",
            Self::EmployerChange => "employer_change",
            Self::SvRepaymentEligible => "sv_repayment_eligible",
            Self::UnclaimedTaxCredits => "unclaimed_tax_credits",
            Self::UnclaimedDeductions => "unclaimed_deductions",
            Self::SelfEmploymentIncome => "self_employment_income",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IncorrectTaxCredits => "incorrectly applied tax credits",
            Self::MultipleEmploymentsWithoutJointTax => "multiple employments without joint taxation",
            Self::IncorrectCommuterAllowance => "incorrect commuter allowance",
            Self::IncorrectFamilyBonus => "incorrect family bonus",
            Self::EmploymentTaxNotFiled => "employment tax not filed",
            Self::SpecialPaymentSituations => "special payment situations",
            Self::DiscretionaryAssessment => "discretionary assessment",
            Self::SingleEmployer => "single employer",
            Self::CorrectWageTax => "correct wage tax withheld",
            Self::VaryingIncomeNoRollup => "varying income without rollup",
            Self::EmployerChange => "employer change",
            Self::SvRepaymentEligible => "social insurance repayment eligible",
            Self::UnclaimedTaxCredits => "unclaimed tax credits",
            Self::UnclaimedDeductions => "unclaimed deductions",
            Self::SelfEmploymentIncome => "self-employment income",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|flag| flag.key() == key)
    }
}

/// Complete fact row for one entity. Flags absent from `flags` are `false`, amounts default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub category: EntityCategory,
    pub resident: bool,
    pub wage_income: Decimal,
    pub non_wage_income: Decimal,
    pub flags: BTreeSet<FilingFlag>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_wage_income(mut self, amount: impl Into<Decimal>) -> Self {
        self.wage_income = amount.into();
        self
    }

    pub fn with_non_wage_income(mut self, amount: impl Into<Decimal>) -> Self {
        self.non_wage_income = amount.into();
        self
    }

    pub fn with_flag(mut self, flag: FilingFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn has(&self, flag: FilingFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: FilingFlag, value: bool) {
        if value {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    pub fn amount(&self, field: AmountField) -> Decimal {
        match field {
            AmountField::WageIncome => self.wage_income,
            AmountField::NonWageIncome => self.non_wage_income,
        }
    }

    /// Build a row from string-typed fields, parsing each one by its declared type.
    ///
    /// Empty values leave the field at its default. Unknown keys and values that do not parse
    /// as the field's type are rejected with [`FilingError::InvalidFactValue`].
    pub fn from_fields<I, K, V>(id: impl Into<String>, fields: I) -> Result<Self, FilingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entity = Self::new(id);

        for (key, raw) in fields {
            let key = key.as_ref().trim();
            let raw = raw.as_ref().trim();
            let field = FactField::parse(key)
                .ok_or_else(|| FilingError::invalid(key, raw, "unknown fact"))?;
            if raw.is_empty() {
                continue;
            }
            entity.assign(field, raw)?;
        }

        entity.validate()?;
        Ok(entity)
    }

    fn assign(&mut self, field: FactField, raw: &str) -> Result<(), FilingError> {
        match field {
            FactField::Name => self.name = raw.to_string(),
            FactField::Category => {
                self.category = EntityCategory::parse(raw).ok_or_else(|| {
                    FilingError::invalid(field.key(), raw, "expected Person or Organization")
                })?;
            }
            FactField::Resident => self.resident = parse_flag(field, raw)?,
            FactField::WageIncome => self.wage_income = parse_amount(field, raw)?,
            FactField::NonWageIncome => self.non_wage_income = parse_amount(field, raw)?,
            FactField::Flag(flag) => {
                let value = parse_flag(field, raw)?;
                self.set_flag(flag, value);
            }
        }
        Ok(())
    }

    /// Checks the invariants a row must hold before it may enter the fact store.
    pub fn validate(&self) -> Result<(), FilingError> {
        if self.id.0.trim().is_empty() {
            return Err(FilingError::invalid("id", &self.id.0, "entity id must not be empty"));
        }
        for field in [AmountField::WageIncome, AmountField::NonWageIncome] {
            let amount = self.amount(field);
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(FilingError::invalid(
                    field.key(),
                    &amount.to_string(),
                    "income must not be negative",
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, field: FactField) -> FactValue {
        match field {
            FactField::Name => FactValue::Text(self.name.clone()),
            FactField::Category => FactValue::Category(self.category),
            FactField::Resident => FactValue::Flag(self.resident),
            FactField::WageIncome => FactValue::Amount(self.wage_income),
            FactField::NonWageIncome => FactValue::Amount(self.non_wage_income),
            FactField::Flag(flag) => FactValue::Flag(self.has(flag)),
        }
    }
}

fn parse_flag(field: FactField, raw: &str) -> Result<bool, FilingError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(FilingError::invalid(field.key(), raw, "expected a boolean")),
    }
}

fn parse_amount(field: FactField, raw: &str) -> Result<Decimal, FilingError> {
    raw.parse::<Decimal>()
        .map_err(|_| FilingError::invalid(field.key(), raw, "expected a decimal amount"))
}

/// Numeric facts that threshold predicates compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    WageIncome,
    NonWageIncome,
}

impl AmountField {
    pub const fn key(self) -> &'static str {
        match self {
            Self::WageIncome => "wage_income",
            Self::NonWageIncome => "non_wage_income",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::WageIncome => "wage income",
            Self::NonWageIncome => "non-wage income",
        }
    }
}

/// Every addressable field of a fact row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactField {
    Name,
    Category,
    Resident,
    WageIncome,
    NonWageIncome,
    Flag(FilingFlag),
}

impl FactField {
    pub fn ordered() -> Vec<Self> {
        let mut fields = vec![
            Self::Name,
            Self::Category,
            Self::Resident,
            Self::WageIncome,
            Self::NonWageIncome,
        ];
        fields.extend(FilingFlag::ordered().into_iter().map(Self::Flag));
        fields
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Resident => "resident",
            Self::WageIncome => AmountField::WageIncome.key(),
            Self::NonWageIncome => AmountField::NonWageIncome.key(),
            Self::Flag(flag) => flag.key(),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "resident" => Some(Self::Resident),
            "wage_income" => Some(Self::WageIncome),
            "non_wage_income" => Some(Self::NonWageIncome),
            other => FilingFlag::from_key(other).map(Self::Flag),
        }
    }
}

/// Typed value of a single fact.
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Text(String),
    Category(EntityCategory),
    Flag(bool),
    Amount(Decimal),
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Text(text) => f.write_str(text),
            FactValue::Category(category) => f.write_str(category.label()),
            FactValue::Flag(value) => write!(f, "{value}"),
            FactValue::Amount(amount) => write!(f, "{amount}"),
        }
    }
}

/// Classification labels an entity may carry. Several can hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassificationTag {
    MandatoryL1Filer,
    AdditionalMandatoryL1Filer,
    MandatoryE1Filer,
    VoluntaryL1Filer,
    NoFilingRequired,
}

impl ClassificationTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MandatoryL1Filer => "MandatoryL1Filer",
            Self::AdditionalMandatoryL1Filer => "AdditionalMandatoryL1Filer",
            Self::MandatoryE1Filer => "MandatoryE1Filer",
            Self::VoluntaryL1Filer => "VoluntaryL1Filer",
            Self::NoFilingRequired => "NoFilingRequired",
        }
    }

    pub const fn is_mandatory(self) -> bool {
        matches!(
            self,
            Self::MandatoryL1Filer | Self::AdditionalMandatoryL1Filer | Self::MandatoryE1Filer
        )
    }
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single resolved filing requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Obligation {
    MandatoryFilingL1,
    MandatoryFilingE1,
    VoluntaryFilingL1,
    NoFilingRequired,
}

impl Obligation {
    /// Precedence rank; the highest rank among fired rules is reported.
    pub const fn rank(self) -> u8 {
        match self {
            Self::MandatoryFilingL1 => 3,
            Self::MandatoryFilingE1 => 2,
            Self::VoluntaryFilingL1 => 1,
            Self::NoFilingRequired => 0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MandatoryFilingL1 => "MandatoryFilingL1",
            Self::MandatoryFilingE1 => "MandatoryFilingE1",
            Self::VoluntaryFilingL1 => "VoluntaryFilingL1",
            Self::NoFilingRequired => "NoFilingRequired",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MandatoryFilingL1 => "Mandatory Filing L1",
            Self::MandatoryFilingE1 => "Mandatory Filing E1",
            Self::VoluntaryFilingL1 => "Voluntary Filing L1",
            Self::NoFilingRequired => "No Filing Required",
        }
    }

    pub const fn is_mandatory(self) -> bool {
        matches!(self, Self::MandatoryFilingL1 | Self::MandatoryFilingE1)
    }

    pub const fn status(self) -> FilingStatus {
        match self {
            Self::MandatoryFilingL1 | Self::MandatoryFilingE1 => FilingStatus::MustFile,
            Self::VoluntaryFilingL1 => FilingStatus::Optional,
            Self::NoFilingRequired => FilingStatus::NoFiling,
        }
    }
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse filing status used for listing entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    MustFile,
    Optional,
    NoFiling,
}

impl FilingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MustFile => "must_file",
            Self::Optional => "optional",
            Self::NoFiling => "no_filing",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "must_file" => Some(Self::MustFile),
            "optional" => Some(Self::Optional),
            "no_filing" => Some(Self::NoFiling),
            _ => None,
        }
    }
}
