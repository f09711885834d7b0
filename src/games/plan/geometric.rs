//! Geometric plans
//!
//! The payout ratio `min(final_multiplier, cap) / cap` maps linearly onto a
//! terminal depth. Rows of obstacles fill the corridor above that depth, each
//! leaving one gap; walls flank the corridor for the whole traversal and a
//! closure template seals the corridor at terminal depth. Decorations are
//! scattered with further sub-draws and carry no economic weight.

use super::reachability::{self, ReachabilityViolation};
use super::{Plan, PlanGenerator};
use crate::config::{ClosureTemplate, GameConfig, GeometryConfig, PlanMode, WeightedEntry};
use crate::games::seed_chain::{draw, SubDraws};
use crate::games::types::Outcome;
use crate::games::weighted::WeightedTable;
use serde::{Deserialize, Serialize};

const DECORATION_KINDS: [&str; 3] = ["cloud_small", "cloud_large", "dark_cloud"];
const CHAIN_SHARE: f64 = 0.4;

/// Axis-aligned rectangle, `y` growing downward
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Open-interval overlap; touching edges do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obstacle {
    pub kind: String,
    pub rect: Rect,
}

/// A horizontal band of obstacles with exactly one gap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObstacleRow {
    pub index: u32,
    pub depth: f64,
    pub gap_x0: f64,
    pub gap_x1: f64,
    pub obstacles: Vec<Obstacle>,
}

impl ObstacleRow {
    pub fn gap_width(&self) -> f64 {
        self.gap_x1 - self.gap_x0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Closure {
    pub template: String,
    pub pieces: Vec<Rect>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BonusObject {
    pub rect: Rect,
    pub multiplier: f64,
}

/// Cosmetic placement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decoration {
    pub kind: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometricPlan {
    pub world_width: f64,
    pub world_height: f64,
    pub ground_y: f64,
    pub corridor_min_x: f64,
    pub corridor_max_x: f64,
    pub wall_thickness: f64,
    pub entry_depth: f64,
    pub terminal_depth: f64,
    pub depth_cap_multiplier: f64,
    pub rows: Vec<ObstacleRow>,
    pub walls: Vec<Obstacle>,
    pub closure: Closure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<BonusObject>,
    pub collectibles: Vec<Decoration>,
    pub decorations: Vec<Decoration>,
}

impl GeometricPlan {
    /// Every rectangle that blocks movement
    pub fn blocking_rects(&self) -> impl Iterator<Item = &Rect> {
        self.rows
            .iter()
            .flat_map(|row| row.obstacles.iter().map(|o| &o.rect))
            .chain(self.walls.iter().map(|w| &w.rect))
            .chain(self.closure.pieces.iter())
    }
}

/// Builds corridor geometry from an outcome
#[derive(Debug, Clone)]
pub struct GeometricPlanner {
    geometry: GeometryConfig,
    obstacle_kinds: Vec<String>,
    obstacle_table: WeightedTable,
    closure_table: WeightedTable,
}

impl GeometricPlanner {
    pub fn new(config: &GameConfig) -> Self {
        let obstacle_table = WeightedTable::new(
            config
                .obstacles
                .iter()
                .enumerate()
                .map(|(i, o)| WeightedEntry::new(i as f64, o.spawn_probability))
                .collect(),
        );
        let template_indexes: Vec<f64> = (0..config.geometry.closure_templates.len())
            .map(|i| i as f64)
            .collect();

        Self {
            geometry: config.geometry.clone(),
            obstacle_kinds: config.obstacles.iter().map(|o| o.kind.clone()).collect(),
            obstacle_table,
            closure_table: WeightedTable::uniform(&template_indexes),
        }
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    /// Linear map of the capped payout ratio onto the traversal axis
    pub fn terminal_depth(&self, final_multiplier: f64) -> f64 {
        let g = &self.geometry;
        let ratio = final_multiplier.clamp(0.0, g.depth_cap_multiplier) / g.depth_cap_multiplier;
        g.min_terminal_depth + ratio * (g.max_terminal_depth - g.min_terminal_depth)
    }

    pub fn build(&self, base: f64, outcome: &Outcome) -> GeometricPlan {
        let g = &self.geometry;
        let draws = SubDraws::new(base);
        let terminal_depth = self.terminal_depth(outcome.final_multiplier);

        let rows = self.lay_rows(&draws, terminal_depth);
        let walls = self.lay_walls();
        let closure = self.place_closure(&draws, terminal_depth);
        let bonus = outcome
            .bonus_triggered()
            .then(|| self.place_bonus(&draws, terminal_depth, &rows, outcome.bonus_multiplier()));

        let span = terminal_depth - g.entry_depth;
        let collectibles = self.scatter(
            &draws,
            draw::COSMETIC_COLLECTIBLE_BASE,
            (span / 1_000.0 * g.collectibles_per_1000) as u64,
            terminal_depth,
            &rows,
            |variant| if variant < CHAIN_SHARE { "chain" } else { "music" },
        );
        let decorations = self.scatter(
            &draws,
            draw::DECORATION_BASE,
            (span / 1_000.0 * g.decorations_per_1000) as u64,
            terminal_depth,
            &rows,
            |variant| {
                let i = (variant * DECORATION_KINDS.len() as f64) as usize;
                DECORATION_KINDS[i.min(DECORATION_KINDS.len() - 1)]
            },
        );

        GeometricPlan {
            world_width: g.world_width,
            world_height: g.world_height,
            ground_y: g.ground_y,
            corridor_min_x: g.corridor_min_x(),
            corridor_max_x: g.corridor_max_x(),
            wall_thickness: g.wall_thickness,
            entry_depth: g.entry_depth,
            terminal_depth,
            depth_cap_multiplier: g.depth_cap_multiplier,
            rows,
            walls,
            closure,
            bonus,
            collectibles,
            decorations,
        }
    }

    fn lay_rows(&self, draws: &SubDraws, terminal_depth: f64) -> Vec<ObstacleRow> {
        let g = &self.geometry;
        let (min_x, max_x) = (g.corridor_min_x(), g.corridor_max_x());
        let last_row_bottom = terminal_depth - g.closure_clearance;

        let mut rows = Vec::new();
        let mut depth = g.entry_depth + g.first_row_depth;
        let mut index: u32 = 0;

        while depth + g.row_thickness <= last_row_bottom {
            let slot = draw::ROW_BASE + index as u64 * draw::ROW_STRIDE;
            let gap_width = draws.between(slot, g.min_gap, g.max_gap);
            let gap_x0 = draws.between(slot + 1, min_x, max_x - gap_width);
            let gap_x1 = gap_x0 + gap_width;
            let kind = self.obstacle_kind(draws.draw(slot + 2));

            let bottom = depth + g.row_thickness;
            let mut obstacles = Vec::with_capacity(2);
            if gap_x0 > min_x {
                obstacles.push(Obstacle { kind: kind.clone(), rect: Rect::new(min_x, depth, gap_x0, bottom) });
            }
            if gap_x1 < max_x {
                obstacles.push(Obstacle { kind, rect: Rect::new(gap_x1, depth, max_x, bottom) });
            }

            rows.push(ObstacleRow { index, depth, gap_x0, gap_x1, obstacles });
            depth += g.row_spacing;
            index += 1;
        }
        rows
    }

    fn obstacle_kind(&self, u: f64) -> String {
        self.obstacle_kinds
            .get(self.obstacle_table.select_index(u))
            .cloned()
            .unwrap_or_else(|| "cloud".to_string())
    }

    /// Contiguous wall segments on both sides, entry to ground
    fn lay_walls(&self) -> Vec<Obstacle> {
        let g = &self.geometry;
        let (min_x, max_x) = (g.corridor_min_x(), g.corridor_max_x());
        let mut walls = Vec::new();
        let mut top = g.entry_depth;
        while top < g.ground_y {
            let bottom = (top + g.wall_segment_height).min(g.ground_y);
            walls.push(Obstacle {
                kind: "wall".to_string(),
                rect: Rect::new(min_x - g.wall_thickness, top, min_x, bottom),
            });
            walls.push(Obstacle {
                kind: "wall".to_string(),
                rect: Rect::new(max_x, top, max_x + g.wall_thickness, bottom),
            });
            top = bottom;
        }
        walls
    }

    fn place_closure(&self, draws: &SubDraws, terminal_depth: f64) -> Closure {
        let g = &self.geometry;
        let index = self.closure_table.select_index(draws.draw(draw::CLOSURE_TEMPLATE));
        let template: Option<&ClosureTemplate> = g.closure_templates.get(index);
        let min_x = g.corridor_min_x();

        match template {
            Some(template) => Closure {
                template: template.name.clone(),
                pieces: template
                    .pieces
                    .iter()
                    .map(|p| {
                        Rect::new(
                            min_x + p.x0 * g.corridor_width,
                            terminal_depth + p.dy0,
                            min_x + p.x1 * g.corridor_width,
                            terminal_depth + p.dy1,
                        )
                    })
                    .collect(),
            },
            // Validated configs always carry templates; seal with a wall-to-wall slab otherwise
            None => Closure {
                template: "slab".to_string(),
                pieces: vec![Rect::new(
                    min_x - g.wall_thickness,
                    terminal_depth,
                    g.corridor_max_x() + g.wall_thickness,
                    terminal_depth + g.row_thickness,
                )],
            },
        }
    }

    fn place_bonus(&self, draws: &SubDraws, terminal_depth: f64, rows: &[ObstacleRow], multiplier: f64) -> BonusObject {
        let g = &self.geometry;
        let size = g.bonus_size;
        let lowest = (terminal_depth - g.closure_clearance - size).max(g.entry_depth);
        let y = clear_of_rows(draws.between(draw::BONUS_OBJECT_DEPTH, g.entry_depth, lowest), size, rows, g.entry_depth);
        let x = draws.between(draw::BONUS_OBJECT_X, g.corridor_min_x(), g.corridor_max_x() - size);

        BonusObject {
            rect: Rect::new(x, y, x + size, y + size),
            multiplier,
        }
    }

    fn scatter(
        &self,
        draws: &SubDraws,
        base_index: u64,
        count: u64,
        terminal_depth: f64,
        rows: &[ObstacleRow],
        kind_of: impl Fn(f64) -> &'static str,
    ) -> Vec<Decoration> {
        let g = &self.geometry;
        let lowest = terminal_depth - g.closure_clearance;
        (0..count)
            .map(|i| {
                let slot = base_index + i * draw::SCATTER_STRIDE;
                let y = clear_of_rows(draws.between(slot, g.entry_depth, lowest), 0.0, rows, g.entry_depth);
                Decoration {
                    kind: kind_of(draws.draw(slot + 2)).to_string(),
                    x: draws.between(slot + 1, g.corridor_min_x(), g.corridor_max_x()),
                    y,
                }
            })
            .collect()
    }
}

/// Lift a band `[y, y + height]` above any row it overlaps
fn clear_of_rows(mut y: f64, height: f64, rows: &[ObstacleRow], floor: f64) -> f64 {
    for row in rows.iter().rev() {
        let row_bottom = row.obstacles.first().map(|o| o.rect.y1).unwrap_or(row.depth);
        if y < row_bottom && row.depth < y + height.max(f64::EPSILON) {
            y = row.depth - height - 1.0;
        }
    }
    y.max(floor)
}

impl PlanGenerator for GeometricPlanner {
    fn mode(&self) -> PlanMode {
        PlanMode::Geometric
    }

    fn plan(&self, base: f64, outcome: &Outcome) -> Result<Plan, ReachabilityViolation> {
        let plan = self.build(base, outcome);
        reachability::verify(&plan, self.geometry.player_width)?;
        Ok(Plan::Geometric(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{ModifierLayer, Resolution};

    fn planner() -> GeometricPlanner {
        GeometricPlanner::new(&GameConfig::default())
    }

    fn win(final_multiplier: f64, bonus: Option<f64>) -> Outcome {
        let resolution = match bonus {
            Some(bonus_multiplier) => Resolution::BonusWin {
                primary_multiplier: final_multiplier / bonus_multiplier,
                modifiers: ModifierLayer::default(),
                bonus_multiplier,
            },
            None => Resolution::Win {
                primary_multiplier: final_multiplier,
                modifiers: ModifierLayer::default(),
            },
        };
        Outcome { resolution, final_multiplier, payout: 0, is_loss: false }
    }

    #[test]
    fn test_terminal_depth_mapping() {
        let planner = planner();
        assert_eq!(planner.terminal_depth(0.0), 800.0);
        assert_eq!(planner.terminal_depth(10.0), 17_500.0);
        assert_eq!(planner.terminal_depth(250.0), 17_500.0);
        assert!((planner.terminal_depth(5.0) - 9_150.0).abs() < 1e-9);
    }

    #[test]
    fn test_loss_has_no_rows_and_closure_near_entry() {
        let loss = Outcome { resolution: Resolution::Loss, final_multiplier: 0.0, payout: 0, is_loss: true };
        let plan = planner().build(0.1, &loss);
        assert!(plan.rows.is_empty());
        assert!(plan.bonus.is_none());
        assert_eq!(plan.terminal_depth, 800.0);
        assert!(plan.closure.pieces.iter().all(|p| p.y0 >= plan.terminal_depth));
    }

    #[test]
    fn test_rows_leave_one_gap_inside_corridor() {
        let plan = planner().build(0.9, &win(8.0, None));
        assert!(!plan.rows.is_empty());
        for row in &plan.rows {
            assert!(row.gap_x0 >= plan.corridor_min_x);
            assert!(row.gap_x1 <= plan.corridor_max_x);
            assert!(row.gap_width() >= 300.0 && row.gap_width() < 700.0);
            assert!(row.depth + 120.0 <= plan.terminal_depth - 400.0);
            for obstacle in &row.obstacles {
                assert!(obstacle.rect.x1 <= row.gap_x0 || obstacle.rect.x0 >= row.gap_x1);
            }
        }
    }

    #[test]
    fn test_walls_cover_whole_traversal() {
        let plan = planner().build(0.7, &win(1.3, None));
        let left: Vec<&Rect> = plan.walls.iter().map(|w| &w.rect).filter(|r| r.x1 <= plan.corridor_min_x).collect();
        let right: Vec<&Rect> = plan.walls.iter().map(|w| &w.rect).filter(|r| r.x0 >= plan.corridor_max_x).collect();
        for side in [left, right] {
            assert_eq!(side.first().map(|r| r.y0), Some(plan.entry_depth));
            assert_eq!(side.last().map(|r| r.y1), Some(plan.ground_y));
            for pair in side.windows(2) {
                assert_eq!(pair[0].y1, pair[1].y0);
            }
        }
    }

    #[test]
    fn test_bonus_object_placed_before_terminal_depth() {
        let planner = planner();
        for i in 0..50 {
            let base = 0.5 + i as f64 / 100.0;
            let plan = planner.build(base, &win(6.0, Some(3.0)));
            let bonus = plan.bonus.as_ref().expect("bonus placed");
            assert!(bonus.rect.y1 < plan.terminal_depth);
            assert!(bonus.rect.x0 >= plan.corridor_min_x && bonus.rect.x1 <= plan.corridor_max_x);
            assert!(plan.rows.iter().flat_map(|r| &r.obstacles).all(|o| !o.rect.intersects(&bonus.rect)));
        }
    }

    #[test]
    fn test_plan_is_pure() {
        let planner = planner();
        let outcome = win(2.0, None);
        assert_eq!(planner.build(0.66, &outcome), planner.build(0.66, &outcome));
        assert_ne!(planner.build(0.66, &outcome).rows, planner.build(0.67, &outcome).rows);
    }

    #[test]
    fn test_decorations_stay_in_traversable_region() {
        let plan = planner().build(0.97, &win(10.0, None));
        assert!(!plan.decorations.is_empty());
        assert!(!plan.collectibles.is_empty());
        for item in plan.decorations.iter().chain(plan.collectibles.iter()) {
            assert!(item.y >= plan.entry_depth && item.y < plan.terminal_depth);
            assert!(item.x >= plan.corridor_min_x && item.x <= plan.corridor_max_x);
        }
    }

    #[test]
    fn test_closure_template_comes_from_config() {
        let names: Vec<String> = GameConfig::default()
            .geometry
            .closure_templates
            .iter()
            .map(|t| t.name.clone())
            .collect();
        let planner = planner();
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            let plan = planner.build(i as f64 / 200.0, &win(1.3, None));
            assert!(names.contains(&plan.closure.template));
            seen.insert(plan.closure.template.clone());
        }
        assert_eq!(seen.len(), names.len());
    }

    #[test]
    fn test_cramped_rows_are_refused_not_returned() {
        let mut config = GameConfig::default();
        config.geometry.row_spacing = 150.0;
        let planner = GeometricPlanner::new(&config);

        let refused = (0..20)
            .map(|i| 0.5 + i as f64 * 0.02)
            .filter(|&base| planner.plan(base, &win(8.0, None)).is_err())
            .count();
        assert!(refused > 0);

        assert!(planner.plan(0.1, &win(0.0, None)).is_ok());
    }
}
