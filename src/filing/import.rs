use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::domain::{Entity, EntityId};
use super::FilingError;

#[derive(Debug)]
pub enum FactImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    MissingIdColumn,
    UnsupportedFormat(String),
    DuplicateId { row: usize, id: EntityId },
    Facts { row: usize, source: FilingError },
}

impl std::fmt::Display for FactImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactImportError::Io(err) => write!(f, "failed to read fact file: {}", err),
            FactImportError::Csv(err) => write!(f, "invalid fact CSV data: {}", err),
            FactImportError::Json(err) => write!(f, "invalid fact JSON data: {}", err),
            FactImportError::MissingIdColumn => write!(f, "fact CSV requires an 'id' column"),
            FactImportError::UnsupportedFormat(ext) => {
                write!(f, "unsupported fact file format '{}' (expected csv or json)", ext)
            }
            FactImportError::DuplicateId { row, id } => {
                write!(f, "row {}: entity {} already appeared earlier in the file", row, id)
            }
            FactImportError::Facts { row, source } => write!(f, "row {}: {}", row, source),
        }
    }
}

impl std::error::Error for FactImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FactImportError::Io(err) => Some(err),
            FactImportError::Csv(err) => Some(err),
            FactImportError::Json(err) => Some(err),
            FactImportError::Facts { source, .. } => Some(source),
            FactImportError::MissingIdColumn
            | FactImportError::UnsupportedFormat(_)
            | FactImportError::DuplicateId { .. } => None,
        }
    }
}

impl From<std::io::Error> for FactImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for FactImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for FactImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Loads fact rows from CSV or JSON exports.
pub struct FactImporter;

impl FactImporter {
    /// Pick the format from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Entity>, FactImportError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let reader = BufReader::new(File::open(path)?);

        match extension.as_str() {
            "csv" => Self::from_csv(reader),
            "json" => Self::from_json(reader),
            other => Err(FactImportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse a CSV export whose header row names fact keys. Rows are numbered from 1.
    pub fn from_csv<R: Read>(reader: R) -> Result<Vec<Entity>, FactImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let id_column = headers
            .iter()
            .position(|header| header == "id")
            .ok_or(FactImportError::MissingIdColumn)?;

        let mut seen = BTreeSet::new();
        let mut entities = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            let id = record.get(id_column).unwrap_or_default();
            let fields = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(column, _)| *column != id_column)
                .map(|(_, pair)| pair);

            let entity = Entity::from_fields(id, fields)
                .map_err(|source| FactImportError::Facts { row, source })?;
            ensure_unique(&mut seen, &entity, row)?;
            entities.push(entity);
        }

        Ok(entities)
    }

    /// Parse a JSON array of fact rows. Missing fields take their defaults.
    pub fn from_json<R: Read>(reader: R) -> Result<Vec<Entity>, FactImportError> {
        let entities: Vec<Entity> = serde_json::from_reader(reader)?;
        let mut seen = BTreeSet::new();
        for (index, entity) in entities.iter().enumerate() {
            let row = index + 1;
            entity
                .validate()
                .map_err(|source| FactImportError::Facts { row, source })?;
            ensure_unique(&mut seen, entity, row)?;
        }
        Ok(entities)
    }
}

/// Each entity id may appear on one row per file.
fn ensure_unique(
    seen: &mut BTreeSet<EntityId>,
    entity: &Entity,
    row: usize,
) -> Result<(), FactImportError> {
    if seen.insert(entity.id.clone()) {
        Ok(())
    } else {
        Err(FactImportError::DuplicateId {
            row,
            id: entity.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filing::domain::FilingFlag;
    use rust_decimal::Decimal;
    use std::io::Cursor;

    #[test]
    fn csv_rows_become_entities() {
        let csv = "id,name,wage_income,non_wage_income,incorrect_tax_credits\n\
                   p-1,Maria Schmidt,35000,0,true\n\
                   p-2,Hans Mueller,,2000,\n";

        let entities = FactImporter::from_csv(Cursor::new(csv)).expect("csv parses");

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id.as_str(), "p-1");
        assert_eq!(entities[0].wage_income, Decimal::from(35_000));
        assert!(entities[0].has(FilingFlag::IncorrectTaxCredits));
        assert_eq!(entities[1].wage_income, Decimal::ZERO);
        assert!(entities[1].flags.is_empty());
    }

    #[test]
    fn csv_rejects_non_numeric_income_with_row_number() {
        let csv = "id,wage_income\np-1,1000\np-2,lots\n";

        match FactImporter::from_csv(Cursor::new(csv)) {
            Err(FactImportError::Facts {
                row: 2,
                source: FilingError::InvalidFactValue { field, .. },
            }) => assert_eq!(field, "wage_income"),
            other => panic!("expected invalid fact on row 2, got {other:?}"),
        }
    }

    #[test]
    fn csv_requires_id_column() {
        let csv = "name,wage_income\nMaria,1000\n";

        assert!(matches!(
            FactImporter::from_csv(Cursor::new(csv)),
            Err(FactImportError::MissingIdColumn)
        ));
    }

    #[test]
    fn json_rows_default_missing_fields() {
        let json = r#"[{"id": "p-1", "wage_income": 40000, "flags": ["single_employer", "correct_wage_tax"]}]"#;

        let entities = FactImporter::from_json(Cursor::new(json)).expect("json parses");

        assert_eq!(entities[0].wage_income, Decimal::from(40_000));
        assert_eq!(entities[0].non_wage_income, Decimal::ZERO);
        assert!(entities[0].has(FilingFlag::SingleEmployer));
        assert!(!entities[0].resident);
    }

    #[test]
    fn json_rejects_negative_income() {
        let json = r#"[{"id": "p-1", "non_wage_income": -5}]"#;

        assert!(matches!(
            FactImporter::from_json(Cursor::new(json)),
            Err(FactImportError::Facts {
                row: 1,
                source: FilingError::InvalidFactValue { .. }
            })
        ));
    }

    #[test]
    fn csv_rejects_repeated_entity_ids() {
        let csv = "id,wage_income\np-1,1000\np-2,2000\np-1,3000\n";

        match FactImporter::from_csv(Cursor::new(csv)) {
            Err(FactImportError::DuplicateId { row, id }) => {
                assert_eq!(row, 3);
                assert_eq!(id.as_str(), "p-1");
            }
            other => panic!("expected duplicate id on row 3, got {other:?}"),
        }
    }

    #[test]
    fn json_rejects_repeated_entity_ids() {
        let json = r#"[{"id": "p-1"}, {"id": "p-1", "wage_income": 20000}]"#;

        assert!(matches!(
            FactImporter::from_json(Cursor::new(json)),
            Err(FactImportError::DuplicateId { row: 2, .. })
        ));
    }
}
