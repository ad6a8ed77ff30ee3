//! Owns the current working patch and decides when it needs to be rebuilt
//! (SPEC_FULL.md section 4.2).

use crate::collaborators::{Cartographer, CollisionOracle, HybridPlanner};
use crate::config::PlannerConfig;
use crate::coordinates::{metric_to_grid_round, to_patch};
use crate::types::{Minipatches, Patch, Point, Pose};

#[derive(Debug, Default)]
pub struct PatchManager {
    patch: Option<Patch>,
    reset_requested: bool,
}

impl PatchManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patch(&self) -> Option<Patch> {
        self.patch
    }

    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    fn near_edge(pose_patch: Pose, dim_metric: f64, margin: f64) -> bool {
        pose_patch.x <= margin
            || pose_patch.y <= margin
            || pose_patch.x >= dim_metric - margin
            || pose_patch.y >= dim_metric - margin
    }

    fn outside(pose_patch: Pose, dim_metric: f64) -> bool {
        pose_patch.x < 0.0 || pose_patch.y < 0.0 || pose_patch.x > dim_metric || pose_patch.y > dim_metric
    }

    /// Returns true and rebuilds the patch if any trigger in section 4.2
    /// fires. `ego_global` and `received_goal_global` are the points that
    /// define the new bounding box when a rebuild happens. On an actual
    /// rebuild, re-inserts every known minipatch (not only the nearest)
    /// into `oracle`.
    pub fn maybe_rebuild(
        &mut self,
        cfg: &PlannerConfig,
        ego_global: Pose,
        received_goal_global: Option<Pose>,
        is_sim: bool,
        planner: &mut impl HybridPlanner,
        cartographer: &mut impl Cartographer,
        oracle: &mut impl CollisionOracle,
        minipatches: &Minipatches,
    ) -> bool {
        let margin = cfg.gm_dist() / 2.0;

        let needs_rebuild = match self.patch {
            None => true,
            Some(patch) => {
                if self.reset_requested {
                    true
                } else {
                    let ego_patch = to_patch(ego_global, patch.origin_global);
                    if Self::near_edge(ego_patch, patch.dim_metric, margin) {
                        true
                    } else if let Some(goal) = received_goal_global {
                        let goal_patch = to_patch(goal, patch.origin_global);
                        Self::near_edge(goal_patch, patch.dim_metric, margin)
                            || Self::outside(goal_patch, patch.dim_metric)
                    } else {
                        false
                    }
                }
            }
        };

        if !needs_rebuild {
            return false;
        }

        let old_origin = self.patch.map(|p| p.origin_global);

        let b = ego_global.point();
        let a = received_goal_global.map(|g| g.point()).unwrap_or(b);
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        let max_x = a.x.max(b.x);
        let max_y = a.y.max(b.y);
        let side = (max_x - min_x).max(max_y - min_y) + 2.0 * cfg.padding_dist;
        let dim_grid = metric_to_grid_round(side, cfg.gm_res).max(1);
        let dim_metric = dim_grid as f64 * cfg.gm_res;
        let center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        let origin = Point::new(center.x - dim_metric / 2.0, center.y - dim_metric / 2.0);

        let new_patch = Patch {
            origin_global: origin,
            dim_metric,
            dim_grid,
        };
        self.patch = Some(new_patch);
        self.reset_requested = false;

        planner.reinit(origin, dim_grid);
        if is_sim {
            if let Some(old) = old_origin {
                cartographer.load_previous_patch(old, origin);
            }
        }

        oracle.insert_minipatches(minipatches, ego_global.point(), false, false);
        oracle.process_safety_patch();

        true
    }
}
