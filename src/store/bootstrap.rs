//! Bulk seeding of preset configurations from loosely typed records
//!
//! Preset files come from external tooling that may write numbers as floats
//! or strings. Scalars are coerced to integers here, and only here; anything
//! that is not integral is rejected for that record.

use super::{GridConfig, GridStore, UpsertOutcome};
use crate::automaton::{check_colour, Palette};
use crate::error::{EngineError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Per-record result of a seeding pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Inserted,
    Replaced,
    Rejected(String),
}

impl From<UpsertOutcome> for SeedOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Inserted => SeedOutcome::Inserted,
            UpsertOutcome::Replaced => SeedOutcome::Replaced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedEntry {
    pub name: String,
    pub outcome: SeedOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub entries: Vec<SeedEntry>,
}

impl SeedReport {
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Inserted))
    }

    pub fn replaced(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Replaced))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Rejected(_)))
    }

    fn count(&self, pred: impl Fn(&SeedOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match &entry.outcome {
                SeedOutcome::Inserted => writeln!(f, "Inserted grid configuration: {}", entry.name)?,
                SeedOutcome::Replaced => writeln!(f, "Updated grid configuration: {}", entry.name)?,
                SeedOutcome::Rejected(reason) => {
                    writeln!(f, "Rejected grid configuration: {} ({})", entry.name, reason)?
                }
            }
        }
        write!(
            f,
            "Seeding completed: {} inserted, {} updated, {} rejected",
            self.inserted(),
            self.replaced(),
            self.rejected()
        )
    }
}

/// Upsert every record, coercing numeric fields. Safe to re-run.
pub fn seed(store: &dyn GridStore, records: &[Value]) -> SeedReport {
    let mut report = SeedReport::default();

    for (idx, record) in records.iter().enumerate() {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", idx));

        let outcome = match coerce_record(record).and_then(|config| store.upsert(config)) {
            Ok(outcome) => {
                info!(name = %name, %outcome, "seeded grid configuration");
                outcome.into()
            }
            Err(e) => {
                warn!(name = %name, error = %e, "rejected grid configuration");
                SeedOutcome::Rejected(e.to_string())
            }
        };
        report.entries.push(SeedEntry { name, outcome });
    }

    info!(
        inserted = report.inserted(),
        updated = report.replaced(),
        rejected = report.rejected(),
        "seeding completed"
    );
    report
}

/// Seed from a JSON document holding an array of records
pub fn seed_from_str(store: &dyn GridStore, content: &str) -> Result<SeedReport> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| EngineError::Parse(format!("preset document is not valid JSON: {}", e)))?;
    let Value::Array(records) = value else {
        return Err(EngineError::Parse("preset document must be a JSON array".to_string()));
    };
    Ok(seed(store, &records))
}

/// Seed from a JSON preset file
pub fn seed_from_file<P: AsRef<Path>>(store: &dyn GridStore, path: P) -> Result<SeedReport> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| EngineError::io(format!("Failed to read preset file {}", path.display()), e))?;
    seed_from_str(store, &content)
}

/// Build a strict [`GridConfig`] from a loosely typed record
pub fn coerce_record(record: &Value) -> Result<GridConfig> {
    let object = record
        .as_object()
        .ok_or_else(|| EngineError::Validation("record is not an object".to_string()))?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::Validation("record has no string 'name'".to_string()))?
        .to_string();

    let size = match object.get("size") {
        Some(value) => coerce_int(value, "size")? as usize,
        None => return Err(EngineError::Validation("record has no 'size'".to_string())),
    };

    let predefined_update = match object.get("predefined_update") {
        Some(Value::Null) | None => 0,
        Some(value) => to_u32(coerce_int(value, "predefined_update")?, "predefined_update")?,
    };

    let cells = match object.get("cells") {
        Some(Value::Null) | None => None,
        Some(value) => Some(coerce_cells(value)?),
    };

    let colours = match object.get("colours") {
        Some(Value::Null) | None => Palette::new(),
        Some(value) => coerce_colours(value)?,
    };

    let config = GridConfig {
        name,
        size,
        predefined_update,
        cells,
        colours,
        cell_colours: None,
    };
    config.validate()?;
    Ok(config)
}

fn coerce_cells(value: &Value) -> Result<Vec<Vec<Vec<u32>>>> {
    let mut cube = Vec::new();
    for plane in array_field(value, "cube")? {
        let mut rows = Vec::new();
        for row in array_field(plane, "plane")? {
            let types = array_field(row, "row")?
                .iter()
                .map(|cell| to_u32(coerce_int(cell, "cell_type")?, "cell_type"))
                .collect::<Result<Vec<u32>>>()?;
            rows.push(types);
        }
        cube.push(rows);
    }
    Ok(cube)
}

fn array_field<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| EngineError::Validation(format!("'cells' {} is not an array", what)))
}

fn coerce_colours(value: &Value) -> Result<Palette> {
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::Validation("'colours' is not an object".to_string()))?;

    let mut palette = Palette::new();
    for (key, colour) in object {
        let cell_type = key
            .trim()
            .parse::<u32>()
            .map_err(|_| EngineError::Validation(format!("colour key '{}' is not a cell type", key)))?;
        let colour = match colour {
            Value::String(s) => parse_colour(s)?,
            other => to_u32(coerce_int(other, "colour")?, "colour")?,
        };
        palette.insert(cell_type, check_colour(colour)?);
    }
    Ok(palette)
}

/// Accepts `0xRRGGBB`, `#RRGGBB` or a decimal string
fn parse_colour(s: &str) -> Result<u32> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix('#')) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| EngineError::Validation(format!("colour '{}' is not a valid colour", s)))
}

/// Coerce a loosely typed scalar to a non-negative integer
fn coerce_int(value: &Value, field: &str) -> Result<u64> {
    let invalid = || EngineError::Validation(format!("'{}' value {} is not a non-negative integer", field, value));

    match value {
        Value::Number(n) => {
            if let Some(int) = n.as_u64() {
                Ok(int)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                    _ => Err(invalid()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn to_u32(value: u64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| EngineError::Validation(format!("'{}' value {} is too large", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn presets() -> Vec<Value> {
        vec![
            json!({
                "name": "tree",
                "size": 3.0,
                "predefined_update": "1",
                "cells": [
                    [[0, 0, 0], [0, 2.0, 0], [0, 0, 0]],
                    [[0, 0, 0], [0, "2", 0], [0, 0, 0]],
                    [[0, 0, 0], [0, 4, 0], [0, 0, 0]]
                ],
                "colours": {"2": "0xdc7633", "4": 14448179}
            }),
            json!({"name": "open_field", "size": 10, "predefined_update": 0}),
        ]
    }

    #[test]
    fn test_coercion() {
        let config = coerce_record(&presets()[0]).unwrap();
        assert_eq!(config.size, 3);
        assert_eq!(config.predefined_update, 1);
        let cells = config.cells.unwrap();
        assert_eq!(cells[0][1][1], 2);
        assert_eq!(cells[1][1][1], 2);
        assert_eq!(cells[2][1][1], 4);
        assert_eq!(config.colours.get(&2), Some(&0xdc7633));
        assert_eq!(config.colours.get(&4), Some(&0xdc7633));
    }

    #[test]
    fn test_non_integral_values_are_rejected() {
        for record in [
            json!({"name": "a", "size": 2.5}),
            json!({"name": "a", "size": -3}),
            json!({"name": "a", "size": "three"}),
            json!({"name": "a", "size": 1, "predefined_update": 0.1}),
            json!({"name": "a", "size": 1, "cells": [[[1.5]]]}),
            json!({"name": "a", "size": 1, "cells": [[[true]]]}),
            json!({"name": "a", "size": 2, "cells": [[[1]]]}),
            json!({"name": "a", "size": 1, "colours": {"1": "0x1000000"}}),
            json!({"name": "a", "size": 1, "colours": {"1": 4294967295u32}}),
            json!({"size": 2}),
            json!([1, 2, 3]),
        ] {
            assert!(coerce_record(&record).is_err(), "{}", record);
        }
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = MemoryStore::new();

        let first = seed(&store, &presets());
        assert_eq!(first.inserted(), 2);
        assert_eq!(first.replaced(), 0);
        let snapshot = (store.find("tree").unwrap(), store.find("open_field").unwrap());

        let second = seed(&store, &presets());
        assert_eq!(second.inserted(), 0);
        assert_eq!(second.replaced(), 2);
        assert_eq!((store.find("tree").unwrap(), store.find("open_field").unwrap()), snapshot);
    }

    #[test]
    fn test_bad_records_do_not_stop_the_pass() {
        let store = MemoryStore::new();
        let records = vec![json!({"name": "bad", "size": 0}), json!({"size": 3}), presets()[1].clone()];

        let report = seed(&store, &records);
        assert_eq!(report.rejected(), 2);
        assert_eq!(report.inserted(), 1);
        assert_eq!(report.entries[1].name, "#1");
        assert!(store.find("bad").is_err());
        assert!(report.to_string().contains("Inserted grid configuration: open_field"));
    }

    #[test]
    fn test_seed_from_str() {
        let store = MemoryStore::new();
        let report = seed_from_str(&store, r#"[{"name": "cube", "size": "4"}]"#).unwrap();
        assert_eq!(report.inserted(), 1);
        assert_eq!(store.find("cube").unwrap().size, 4);

        assert!(seed_from_str(&store, r#"{"name": "cube"}"#).is_err());
        assert!(seed_from_str(&store, "nope").is_err());
    }

    #[test]
    fn test_parse_colour() {
        assert_eq!(parse_colour("0x2ecc71").unwrap(), 0x2ecc71);
        assert_eq!(parse_colour("#ff0000").unwrap(), 0xff0000);
        assert_eq!(parse_colour("255").unwrap(), 255);
        assert!(parse_colour("green").is_err());
    }
}
