use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{AmountField, Entity, FilingFlag};

/// Comparison operator for threshold tests. The threshold value itself is on the
/// non-triggering side for the strict operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    AtLeast,
    LessThan,
    AtMost,
}

impl Comparison {
    pub fn holds(self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::AtLeast => value >= threshold,
            Self::LessThan => value < threshold,
            Self::AtMost => value <= threshold,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::AtLeast => ">=",
            Self::LessThan => "<",
            Self::AtMost => "<=",
        }
    }
}

/// Pure test over a fact row. Evaluation never mutates the row and does not depend on
/// evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Flag(FilingFlag),
    Threshold {
        field: AmountField,
        comparison: Comparison,
        threshold: Decimal,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn flag(flag: FilingFlag) -> Self {
        Self::Flag(flag)
    }

    pub fn threshold(field: AmountField, comparison: Comparison, threshold: Decimal) -> Self {
        Self::Threshold {
            field,
            comparison,
            threshold,
        }
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::All(predicates.into_iter().collect())
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Any(predicates.into_iter().collect())
    }

    pub fn any_flag(flags: impl IntoIterator<Item = FilingFlag>) -> Self {
        Self::any(flags.into_iter().map(Self::Flag))
    }

    pub fn test(&self, entity: &Entity) -> bool {
        match self {
            Predicate::Flag(flag) => entity.has(*flag),
            Predicate::Threshold {
                field,
                comparison,
                threshold,
            } => comparison.holds(entity.amount(*field), *threshold),
            Predicate::All(predicates) => predicates.iter().all(|p| p.test(entity)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.test(entity)),
        }
    }

    /// Readable rendering such as `wage income > 14517 and (a or b)`.
    pub fn describe(&self) -> String {
        match self {
            Predicate::Flag(flag) => flag.label().to_string(),
            Predicate::Threshold {
                field,
                comparison,
                threshold,
            } => format!("{} {} {}", field.label(), comparison.symbol(), threshold),
            Predicate::All(predicates) => join(predicates, " and "),
            Predicate::Any(predicates) => join(predicates, " or "),
        }
    }
}

fn join(predicates: &[Predicate], separator: &str) -> String {
    predicates
        .iter()
        .map(|predicate| match predicate {
            Predicate::All(inner) | Predicate::Any(inner) if inner.len() > 1 => {
                format!("({})", predicate.describe())
            }
            _ => predicate.describe(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}
