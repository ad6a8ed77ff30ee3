//! Trait contracts for the external collaborators the controller is
//! generic over (SPEC_FULL.md section 6 and the "collaborator handles, not
//! process-wide singletons" design note). Owning these as handles rather
//! than globals lets more than one controller — and more than one vehicle —
//! coexist in a process.

use crate::types::{CoarsePath, GridIndex, Minipatches, Path, Point, Pose};

/// A single kinematic planning node: a pose plus a steering angle, as
/// understood by the external kinematic planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanNode {
    pub pose: Pose,
    pub steer: f64,
}

/// The kinematic (hybrid) planner: expands motion primitives from a start
/// node toward a goal node, optionally terminating with an analytic
/// expansion to the exact goal.
pub trait HybridPlanner {
    /// Re-center the planner's internal grid on a newly rebuilt patch.
    fn reinit(&mut self, origin: Point, dim_grid: i32);

    /// Recompute the planner's heuristic/cost-to-go field toward `goal`.
    fn recalculate_env(&mut self, goal: PlanNode, ego: PlanNode);

    /// Build a planning node from a patch-frame pose and steering angle.
    fn create_node(&self, pose: Pose, steer: f64) -> PlanNode;

    /// Project `ego` onto `path` starting the search at `start_index`.
    /// Returns the projected pose, the new (non-decreasing) index, and the
    /// minimum distance found.
    fn project_ego(&self, ego: Pose, path: &Path, start_index: usize) -> (Pose, usize, f64);

    /// Search for a collision-free pose near `target`, if `target` itself
    /// is blocked.
    fn valid_close_pose(&self, ego: Pose, target: Pose) -> Option<Pose>;

    /// Plan from `ego` (optionally shifted to `plan_start`) toward `goal`.
    /// `to_final_pose` requests planning all the way to the true goal
    /// rather than a waypoint; `do_analytic` enables the analytic
    /// expansion terminator.
    fn plan(
        &mut self,
        ego: PlanNode,
        plan_start: PlanNode,
        goal: PlanNode,
        to_final_pose: bool,
        do_analytic: bool,
    ) -> Option<Path>;

    fn reset_lane_graph(&mut self);
    fn add_lane_point(&mut self, point: Point);
    fn update_lane_graph(&mut self, origin: Point, dim_metric: f64);
}

/// The coarse grid planner: a lattice search producing an index-space path.
pub trait GridPlanner {
    fn path(&mut self, ego_index: GridIndex) -> Option<CoarsePath>;
}

/// Collision checking over the current occupancy patch.
pub trait CollisionOracle {
    /// True if `pose_patch` is in collision.
    fn check_pose(&self, pose_patch: Pose) -> bool;

    /// Index into the path's sample list at which a collision first occurs,
    /// or `None` if the path is entirely collision-free.
    fn path_collision_index(&self, path: &Path) -> Option<usize>;

    fn insert_minipatches(
        &mut self,
        patches: &Minipatches,
        ego_global: Point,
        only_nearest: bool,
        only_new: bool,
    );

    fn process_safety_patch(&mut self);
}

/// Fuses local measurements into the current working patch.
pub trait Cartographer {
    fn cartograph(&mut self, tile: &crate::types::Tile, origin_grid: GridIndex, width: i32);
    fn pass_local_map(&mut self, origin_grid: GridIndex, width: i32);
    fn load_previous_patch(&mut self, old_origin: Point, new_origin: Point);
}

/// Vehicle kinematic parameter bookkeeping.
pub trait Vehicle {
    fn set_pose(&mut self, pose_global: Pose);
    fn wheelbase(&self) -> f64;
    /// Whether the vehicle has a capsule collision shape, carried into
    /// driven-history samples for downstream collision diagnostics.
    fn has_capsule(&self) -> bool;
}
