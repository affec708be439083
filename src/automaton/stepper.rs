//! Generation transition

use super::cell::birth_colour;
use super::neighborhood::count_unchecked;
use super::{Grid, RuleSet};
use rayon::prelude::*;

/// Advance `current` by one generation under `rules`.
///
/// Neighbor counts are always taken against the input grid, which is never
/// mutated, so cells are evaluated independently and in parallel.
pub fn step(current: &Grid, rules: &RuleSet) -> Grid {
    let colour = birth_colour(current.predefined_update());

    let next_cells = current
        .cells()
        .par_iter()
        .enumerate()
        .map(|(idx, &cell)| {
            let (x, y, z) = current.coordinates(idx);
            let neighbors = count_unchecked(current, x, y, z, rules.neighborhood);
            rules.next_state(cell, neighbors, colour)
        })
        .collect();

    Grid::from_flat(current.size(), next_cells, current.predefined_update())
}

/// Advance the grid by several generations
pub fn step_generations(mut grid: Grid, rules: &RuleSet, generations: usize) -> Grid {
    for _ in 0..generations {
        grid = step(&grid, rules);
    }
    grid
}
