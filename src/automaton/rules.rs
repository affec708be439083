//! Survive/birth rule set and its `X/Y/Z` text form

use super::{Cell, Neighborhood};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Survive and birth thresholds plus the neighborhood they are counted over.
///
/// Thresholds match by exact equality: a live cell survives only with exactly
/// `survive` live neighbors, a dead cell is born only with exactly `birth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSet {
    pub survive: u8,
    pub birth: u8,
    pub neighborhood: Neighborhood,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            survive: 2,
            birth: 3,
            neighborhood: Neighborhood::Moore,
        }
    }
}

impl RuleSet {
    /// Build a rule set, rejecting thresholds above the topology maximum
    pub fn new(survive: u8, birth: u8, neighborhood: Neighborhood) -> Result<Self, EngineError> {
        let max = neighborhood.max_neighbors();
        for (label, value) in [("survive", survive), ("birth", birth)] {
            if value > max {
                return Err(EngineError::Parse(format!(
                    "{} threshold {} exceeds the {} maximum of {}",
                    label, value, neighborhood, max
                )));
            }
        }
        Ok(Self {
            survive,
            birth,
            neighborhood,
        })
    }

    /// Parse the `X/Y/Z` rule expression
    pub fn parse(expression: &str) -> Result<Self, EngineError> {
        let fields: Vec<&str> = expression.split('/').map(str::trim).collect();
        let [survive, birth, code] = fields.as_slice() else {
            return Err(EngineError::Parse(format!(
                "rule '{}' must have the form X/Y/Z, found {} field(s)",
                expression,
                fields.len()
            )));
        };

        let neighborhood = Neighborhood::from_code(code).ok_or_else(|| {
            EngineError::Parse(format!(
                "unknown neighborhood code '{}' (expected N for Moore or M for Von Neumann)",
                code
            ))
        })?;

        Self::new(
            parse_threshold("survive", survive)?,
            parse_threshold("birth", birth)?,
            neighborhood,
        )
    }

    #[inline]
    pub fn survives(&self, live_neighbors: u8) -> bool {
        live_neighbors == self.survive
    }

    #[inline]
    pub fn is_born(&self, live_neighbors: u8) -> bool {
        live_neighbors == self.birth
    }

    /// Next state of `current` given its live neighbor count and the colour for births
    pub fn next_state(&self, current: Cell, live_neighbors: u8, birth_colour: u32) -> Cell {
        match (current.is_alive(), live_neighbors) {
            (true, n) if self.survives(n) => current,
            (false, n) if self.is_born(n) => Cell::alive(birth_colour),
            _ => Cell::DEAD,
        }
    }
}

fn parse_threshold(label: &str, field: &str) -> Result<u8, EngineError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::Parse(format!(
            "{} threshold '{}' is not a non-negative integer",
            label, field
        )));
    }
    field.parse::<u8>().map_err(|_| {
        EngineError::Parse(format!("{} threshold '{}' is out of range", label, field))
    })
}

impl FromStr for RuleSet {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.survive, self.birth, self.neighborhood.code())
    }
}
