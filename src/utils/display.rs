//! Display and output formatting utilities

use crate::automaton::{Cell, Grid, RuleSet};
use crate::store::{GridConfig, SeedOutcome, SeedReport};
use std::collections::BTreeMap;

/// Format grids for console output
pub struct GridFormatter;

impl GridFormatter {
    /// Symbol for a cell: `·` dead, `█` default live type, a digit or letter for other types
    pub fn symbol(cell: &Cell) -> char {
        match cell.cell_type {
            0 => '·',
            1 => '█',
            t @ 2..=9 => char::from_digit(t, 10).unwrap_or('?'),
            t @ 10..=35 => char::from_digit(t, 36).unwrap_or('?'),
            _ => '#',
        }
    }

    /// Format every x plane as a block of y rows by z columns
    pub fn format_slices(grid: &Grid) -> String {
        let mut output = String::new();
        for (x, plane) in grid.to_nested().iter().enumerate() {
            output.push_str(&format!("x = {}\n", x));
            for row in plane {
                output.extend(row.iter().map(Self::symbol));
                output.push('\n');
            }
        }
        output
    }

    /// Format one x plane with coordinates
    pub fn format_slice_with_coords(grid: &Grid, x: usize) -> String {
        let mut output = String::new();
        if x >= grid.size() {
            return output;
        }

        // Header with z column numbers
        output.push_str("   ");
        for z in 0..grid.size() {
            output.push_str(&format!("{:2}", z % 10));
        }
        output.push('\n');

        // Rows with y numbers
        for y in 0..grid.size() {
            output.push_str(&format!("{:2} ", y));
            for z in 0..grid.size() {
                let cell = grid.cells()[grid.index(x, y, z)];
                let symbol = Self::symbol(&cell);
                output.push(symbol);
                output.push(symbol);
            }
            output.push('\n');
        }

        output
    }

    /// One-paragraph statistics summary
    pub fn format_summary(grid: &Grid, rules: &RuleSet, generation: usize) -> String {
        let total = grid.cells().len();
        let live = grid.live_count();

        let mut by_type: BTreeMap<u32, usize> = BTreeMap::new();
        for cell in grid.cells().iter().filter(|c| c.is_alive()) {
            *by_type.entry(cell.cell_type).or_default() += 1;
        }

        let mut output = String::new();
        output.push_str(&format!("Generation {} ({}x{}x{}, rules {})\n", generation, grid.size(), grid.size(), grid.size(), rules));
        output.push_str(&format!("  Live cells: {} / {}\n", live, total));
        output.push_str(&format!("  Density: {:.1}%\n", (live as f64 / total as f64) * 100.0));
        for (cell_type, count) in by_type {
            output.push_str(&format!("  Type {}: {}\n", cell_type, count));
        }
        output
    }

    /// Describe a stored configuration
    pub fn format_config(config: &GridConfig) -> String {
        let contents = match &config.cells {
            Some(_) => "stored cells",
            None => "generated on access",
        };
        format!(
            "{} (size {}, preset {}, {})",
            config.name, config.size, config.predefined_update, contents
        )
    }

    /// Seeding report with coloured outcomes
    pub fn format_seed_report(report: &SeedReport) -> String {
        let mut output = String::new();
        for entry in &report.entries {
            let line = match &entry.outcome {
                SeedOutcome::Inserted => ColorOutput::success(&format!("Inserted grid configuration: {}", entry.name)),
                SeedOutcome::Replaced => ColorOutput::info(&format!("Updated grid configuration: {}", entry.name)),
                SeedOutcome::Rejected(reason) => {
                    ColorOutput::warning(&format!("Rejected grid configuration: {} ({})", entry.name, reason))
                }
            };
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str(&format!(
            "{} inserted, {} updated, {} rejected",
            report.inserted(),
            report.replaced(),
            report.rejected()
        ));
        output
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() &&
        (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}
