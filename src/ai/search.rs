use std::collections::HashMap;

use tracing::debug;
use web_time::Instant;

use crate::region::Region;
use crate::types::{Coordinate, Move};

const MAX_WINS: u8 = 1;
const MIN_WINS: u8 = 0;
const SENTINEL: Coordinate = Coordinate::new(0, 0);

/// Figures from the most recent `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveStats {
    pub cache_size: usize,
    pub elapsed_ms: u32,
    pub winning: bool,
}

/// Exhaustive minimax over Chomp positions with a transposition cache.
///
/// The cache holds a position label, not a perspective-tagged value:
/// `Some(cell)` means the side to move wins by playing `cell`, `None` means the
/// side to move loses. Each lookup derives the returned value from the caller's
/// perspective.
#[derive(Debug, Default)]
pub struct Solver {
    cache: HashMap<Region, Option<Coordinate>>,
    last_stats: Option<SolveStats>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a move for the side to move in `region`.
    ///
    /// If a forced win exists the first one in `Region::moves` order is returned
    /// with value 1. Otherwise the last enumerated move is returned with value 0.
    /// An empty region yields the `(0, 0)` sentinel.
    pub fn solve(&mut self, region: &Region) -> Move {
        let start = Instant::now();
        let best = self.evaluate(region, 0, true);
        let stats = SolveStats {
            cache_size: self.cache.len(),
            elapsed_ms: u32::try_from(start.elapsed().as_millis()).unwrap_or(u32::MAX),
            winning: best.is_winning(),
        };
        debug!(
            cell = %best.cell,
            value = best.value,
            cache_size = stats.cache_size,
            elapsed_ms = stats.elapsed_ms,
            "solved position"
        );
        self.last_stats = Some(stats);
        best
    }

    pub fn last_stats(&self) -> Option<SolveStats> {
        self.last_stats
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn evaluate(&mut self, region: &Region, depth: u16, maximizing: bool) -> Move {
        let (win, loss) = if maximizing {
            (MAX_WINS, MIN_WINS)
        } else {
            (MIN_WINS, MAX_WINS)
        };

        // The previous mover took the last cell.
        if region.is_empty() {
            return Move::new(SENTINEL, win);
        }

        match self.cache.get(region) {
            Some(Some(cell)) => return Move::new(*cell, win),
            Some(None) => return fallback(region, depth, loss),
            None => {}
        }

        for cell in region.moves() {
            let mut next = region.clone();
            next.chomp(cell);
            let reply = self.evaluate(&next, depth + 1, !maximizing);
            if reply.value == win {
                self.cache.insert(region.clone(), Some(cell));
                return Move::new(cell, win);
            }
        }

        self.cache.insert(region.clone(), None);
        fallback(region, depth, loss)
    }
}

/// Move for a lost position: the last enumerated cell at the root, the first one
/// deeper in the tree.
fn fallback(region: &Region, depth: u16, loss: u8) -> Move {
    let cell = if depth == 0 {
        region.moves().last()
    } else {
        region.moves().next()
    };
    Move::new(cell.unwrap_or(SENTINEL), loss)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

    use super::*;

    fn c(x: u8, y: u8) -> Coordinate {
        Coordinate::new(x, y)
    }

    type Cells = BTreeSet<(u8, u8)>;

    fn cells_of(region: &Region) -> Cells {
        region.moves().map(|m| (m.x, m.y)).collect()
    }

    /// Independent win/loss oracle over plain cell sets.
    fn mover_wins(cells: &Cells, memo: &mut HashMap<Cells, bool>) -> bool {
        if cells.is_empty() {
            // the opponent ate the last cell
            return true;
        }
        if let Some(&known) = memo.get(cells) {
            return known;
        }
        let wins = cells.iter().any(|&(x, y)| {
            let rest: Cells = cells
                .iter()
                .copied()
                .filter(|&(cx, cy)| cx < x || cy < y)
                .collect();
            !mover_wins(&rest, memo)
        });
        memo.insert(cells.clone(), wins);
        wins
    }

    fn reachable(width: u8, height: u8) -> Vec<Region> {
        let start = Region::new(width, height);
        let mut seen = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for cell in current.moves() {
                let mut next = current.clone();
                next.chomp(cell);
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
            out.push(current);
        }
        out
    }

    #[test]
    fn single_cell_is_lost_for_the_mover() {
        let mut solver = Solver::new();

        let mv = solver.solve(&Region::new(1, 1));

        assert_eq!(mv, Move::new(c(1, 1), 0));
        assert!(!mv.is_winning());
    }

    #[test]
    fn two_cell_bars_are_won_by_leaving_the_corner() {
        let mut solver = Solver::new();

        assert_eq!(solver.solve(&Region::new(2, 1)), Move::new(c(2, 1), 1));
        assert_eq!(solver.solve(&Region::new(1, 2)), Move::new(c(1, 2), 1));
    }

    #[test]
    fn every_rectangle_but_one_cell_is_a_first_player_win() {
        let mut solver = Solver::new();
        for width in 1..=5 {
            for height in 1..=5 {
                let mv = solver.solve(&Region::new(width, height));
                assert_eq!(mv.is_winning(), (width, height) != (1, 1), "{width}x{height}");
            }
        }
    }

    #[test]
    fn square_bars_are_won_by_the_diagonal_bite() {
        for n in 2..=5 {
            let mut solver = Solver::new();
            assert_eq!(solver.solve(&Region::new(n, n)), Move::new(c(2, 2), 1));
        }
    }

    #[test]
    fn two_column_bar_is_won_by_shortening_the_second_column() {
        let mut solver = Solver::new();

        assert_eq!(solver.solve(&Region::new(2, 3)), Move::new(c(2, 3), 1));
    }

    #[test]
    fn lost_root_position_falls_back_to_last_move() {
        // L-shape left after the diagonal bite on 2×2.
        let region = Region::from_corners([c(2, 1), c(1, 2)]).expect("valid staircase");
        let mut solver = Solver::new();

        let mv = solver.solve(&region);

        assert_eq!(mv, Move::new(c(1, 2), 0));
        assert_eq!(solver.last_stats().map(|s| s.winning), Some(false));
    }

    #[test]
    fn cached_lost_position_at_root_still_falls_back_to_last_move() {
        // The diagonal bite on an n×n bar leaves the L, which the search labels lost
        // one level down, where the fallback is the first move.
        for (n, corners) in [(2, vec![c(2, 1), c(1, 2)]), (3, vec![c(3, 1), c(1, 3)])] {
            let region = Region::from_corners(corners).expect("valid staircase");
            let mut warm = Solver::new();
            assert_eq!(warm.solve(&Region::new(n, n)), Move::new(c(2, 2), 1));
            let cached_before = warm.cache_size();

            let mv = warm.solve(&region);

            assert_eq!(warm.cache_size(), cached_before);
            assert_eq!(mv, Solver::new().solve(&region));
            assert_eq!(Some(mv.cell), region.moves().last());
            assert_eq!(mv.value, 0);
        }
    }

    #[test]
    fn empty_region_returns_sentinel() {
        let mut solver = Solver::new();

        assert_eq!(solver.solve(&Region::default()), Move::new(c(0, 0), 1));
    }

    #[test]
    fn solver_agrees_with_brute_force_on_every_small_position() {
        let mut solver = Solver::new();
        let mut memo = HashMap::new();

        for region in reachable(4, 3).into_iter().filter(|r| !r.is_empty()) {
            let expected = mover_wins(&cells_of(&region), &mut memo);
            let mv = solver.solve(&region);

            assert!(region.contains(mv.cell), "{} not legal", mv.cell);
            assert_eq!(mv.is_winning(), expected, "{:?}", region.corners());
            if expected {
                let mut after = region.clone();
                after.chomp(mv.cell);
                assert!(!mover_wins(&cells_of(&after), &mut memo));
            }
        }
    }

    #[test]
    fn repeated_solves_are_deterministic() {
        let region = Region::from_corners([c(5, 2), c(3, 4)]).expect("valid staircase");
        let mut warm = Solver::new();

        let first = warm.solve(&region);
        let cached = warm.solve(&region.clone());
        let fresh = Solver::new().solve(&region);

        assert_eq!(first, cached);
        assert_eq!(first, fresh);
    }

    #[test]
    fn cache_records_positions_and_can_be_cleared() {
        let mut solver = Solver::new();
        solver.solve(&Region::new(3, 3));

        let size = solver.cache_size();
        assert!(size > 0);
        assert_eq!(solver.last_stats().map(|s| s.cache_size), Some(size));

        solver.clear_cache();
        assert_eq!(solver.cache_size(), 0);
    }

    #[test]
    fn long_single_row_is_won_by_leaving_one_cell() {
        let mut solver = Solver::new();

        let mv = solver.solve(&Region::new(16, 1));

        assert_eq!(mv, Move::new(c(2, 1), 1));
    }
}
