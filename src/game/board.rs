use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::state::Position;

/// Rejection-sampling attempts before falling back to enumerating free cells
const MAX_REJECTION_ATTEMPTS: usize = 32;

/// Fixed-size grid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Check if a position is within the grid bounds
    pub fn is_inside(&self, pos: Position) -> bool {
        pos.x >= 0 && (pos.x as usize) < self.width && pos.y >= 0 && (pos.y as usize) < self.height
    }

    /// Pick a uniformly random cell that is not in `excluding`.
    ///
    /// A handful of rejection samples cover the common sparse case; after
    /// that the free cells are enumerated and one is chosen directly, so the
    /// call terminates however crowded the board is. Returns `None` when
    /// every cell is excluded.
    pub fn random_free_cell<R: Rng>(
        &self,
        excluding: &HashSet<Position>,
        rng: &mut R,
    ) -> Option<Position> {
        if self.cell_count() == 0 {
            return None;
        }

        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let pos = Position::new(
                rng.gen_range(0..self.width) as i32,
                rng.gen_range(0..self.height) as i32,
            );
            if !excluding.contains(&pos) {
                return Some(pos);
            }
        }

        self.choose_among_free_cells(excluding, rng)
    }

    fn choose_among_free_cells<R: Rng>(
        &self,
        excluding: &HashSet<Position>,
        rng: &mut R,
    ) -> Option<Position> {
        let free: Vec<Position> = self
            .cells()
            .filter(|pos| !excluding.contains(pos))
            .collect();
        free.choose(rng).copied()
    }

    /// Every cell of the board, row by row
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Position::new(x as i32, y as i32)))
    }
}
