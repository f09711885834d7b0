//! Reachability check for geometric plans
//!
//! Rasterizes the corridor into cells half a player wide and flood-fills from
//! the entry. A plan passes when the flood reaches terminal depth, never slips
//! past the closure, touches the bonus object if one was placed, and every row
//! gap fits the player.

use super::geometric::{GeometricPlan, Rect};
use std::collections::VecDeque;
use std::fmt;

const EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum ReachabilityViolation {
    EntryBlocked,
    TerminalUnreachable { deepest: f64 },
    ClosureBreached { depth: f64 },
    BonusOutOfReach,
    GapTooNarrow { row: u32 },
}

impl fmt::Display for ReachabilityViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReachabilityViolation::EntryBlocked => write!(f, "entry row is fully blocked"),
            ReachabilityViolation::TerminalUnreachable { deepest } => {
                write!(f, "terminal depth unreachable, deepest reachable depth {:.1}", deepest)
            }
            ReachabilityViolation::ClosureBreached { depth } => {
                write!(f, "traversal passes the closure down to depth {:.1}", depth)
            }
            ReachabilityViolation::BonusOutOfReach => write!(f, "bonus object is not reachable"),
            ReachabilityViolation::GapTooNarrow { row } => write!(f, "gap in row {} is narrower than the player", row),
        }
    }
}

impl std::error::Error for ReachabilityViolation {}

struct Grid {
    x_lo: f64,
    y_lo: f64,
    cell: f64,
    cols: usize,
    rows: usize,
    blocked: Vec<bool>,
}

impl Grid {
    fn new(plan: &GeometricPlan, cell: f64) -> Self {
        let x_lo = plan.corridor_min_x - plan.wall_thickness;
        let x_hi = plan.corridor_max_x + plan.wall_thickness;
        let y_lo = plan.entry_depth;
        let cols = ((x_hi - x_lo) / cell).ceil().max(1.0) as usize;
        let rows = ((plan.ground_y - y_lo) / cell).ceil().max(1.0) as usize;

        let mut grid = Self {
            x_lo,
            y_lo,
            cell,
            cols,
            rows,
            blocked: vec![false; cols * rows],
        };
        for rect in plan.blocking_rects() {
            grid.block(rect);
        }
        grid
    }

    /// Marks every cell the rectangle strictly overlaps
    fn block(&mut self, rect: &Rect) {
        let Some((c0, c1)) = span(rect.x0, rect.x1, self.x_lo, self.cell, self.cols) else {
            return;
        };
        let Some((r0, r1)) = span(rect.y0, rect.y1, self.y_lo, self.cell, self.rows) else {
            return;
        };
        for r in r0..=r1 {
            for c in c0..=c1 {
                self.blocked[r * self.cols + c] = true;
            }
        }
    }

    fn is_free(&self, c: usize, r: usize) -> bool {
        !self.blocked[r * self.cols + c]
    }

    fn column_of(&self, x: f64) -> usize {
        (((x - self.x_lo) / self.cell).floor().max(0.0) as usize).min(self.cols - 1)
    }

    fn row_of(&self, y: f64) -> usize {
        (((y - self.y_lo) / self.cell).floor().max(0.0) as usize).min(self.rows - 1)
    }

    fn bottom_of(&self, r: usize) -> f64 {
        self.y_lo + (r + 1) as f64 * self.cell
    }
}

fn span(lo: f64, hi: f64, origin: f64, cell: f64, len: usize) -> Option<(usize, usize)> {
    let first = ((lo - origin) / cell).floor().max(0.0);
    let last = ((hi - origin) / cell).ceil() - 1.0;
    if last < first || last < 0.0 {
        return None;
    }
    let first = first as usize;
    if first >= len {
        return None;
    }
    Some((first, (last as usize).min(len - 1)))
}

/// Verify the plan is traversable from entry to terminal depth and no further
pub fn verify(plan: &GeometricPlan, player_width: f64) -> Result<(), ReachabilityViolation> {
    if let Some(row) = plan.rows.iter().find(|row| row.gap_width() + EPS < player_width) {
        return Err(ReachabilityViolation::GapTooNarrow { row: row.index });
    }

    let grid = Grid::new(plan, player_width / 2.0);
    let first_col = grid.column_of(plan.corridor_min_x + EPS);
    let last_col = grid.column_of(plan.corridor_max_x - EPS);

    let mut reached = vec![false; grid.cols * grid.rows];
    let mut queue = VecDeque::new();
    for c in first_col..=last_col {
        if grid.is_free(c, 0) {
            reached[c] = true;
            queue.push_back((c, 0usize));
        }
    }
    if queue.is_empty() {
        return Err(ReachabilityViolation::EntryBlocked);
    }

    let mut deepest_row = 0;
    while let Some((c, r)) = queue.pop_front() {
        deepest_row = deepest_row.max(r);
        let neighbours = [
            (c.wrapping_sub(1), r),
            (c + 1, r),
            (c, r.wrapping_sub(1)),
            (c, r + 1),
        ];
        for (nc, nr) in neighbours {
            if nc >= grid.cols || nr >= grid.rows {
                continue;
            }
            let idx = nr * grid.cols + nc;
            if !reached[idx] && grid.is_free(nc, nr) {
                reached[idx] = true;
                queue.push_back((nc, nr));
            }
        }
    }

    let deepest = grid.bottom_of(deepest_row);
    if deepest > plan.terminal_depth + EPS {
        return Err(ReachabilityViolation::ClosureBreached { depth: deepest });
    }
    if deepest < plan.terminal_depth - grid.cell - EPS {
        return Err(ReachabilityViolation::TerminalUnreachable { deepest });
    }

    if let Some(bonus) = &plan.bonus {
        let (x, y) = bonus.rect.center();
        let idx = grid.row_of(y) * grid.cols + grid.column_of(x);
        if !reached[idx] {
            return Err(ReachabilityViolation::BonusOutOfReach);
        }
    }

    Ok(())
}
