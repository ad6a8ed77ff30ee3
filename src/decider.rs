//! Pure predicate over the current planner state deciding whether (and
//! why) to replan (SPEC_FULL.md section 4.6).

use crate::config::{PlannerConfig, WaypointType};
use crate::types::{EgoState, GoalApproach};

/// Inputs to [`check_new_waypoint`] and [`should_replan`], gathered fresh
/// each tick by the controller.
#[derive(Debug, Clone, Copy)]
pub struct ReplanInputs {
    pub has_active_goal: bool,
    pub ego_s: EgoState,
    pub distance_to_goal: f64,
    pub distance_since_last_replanning: f64,
    pub dist_to_end_of_path: f64,
    pub new_goal_flag: bool,
    pub path_collides: bool,
    pub dist_to_collision: Option<f64>,
    pub divergent_dist: f64,
    pub projection_distance: f64,
    pub has_stored_path: bool,
}

/// Outcome of one replan evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplanDecision {
    pub replan: bool,
    /// True if the stored path must be discarded regardless of whether a
    /// new one is found (close collision / off-path triggers, section 4.6).
    pub invalidate_path: bool,
}

/// Implements the waypoint/final-goal transition in section 4.6. Mutates
/// `goal_s` and `to_final_pose` in place; returns whether this check alone
/// should trigger a replan.
pub fn check_new_waypoint(
    cfg: &PlannerConfig,
    goal_s: &mut GoalApproach,
    to_final_pose: &mut bool,
    distance_to_goal: f64,
    distance_since_last_replanning: f64,
    dist_to_end_of_path: f64,
) -> bool {
    let mut trigger = false;

    match cfg.waypoint_type {
        WaypointType::None => {
            *to_final_pose = true;
            *goal_s = GoalApproach::ExactGoal;
        }
        WaypointType::CoarsePath => {
            if distance_to_goal < cfg.max_dist4waypoints && *goal_s == GoalApproach::ApproxGoal {
                *goal_s = GoalApproach::ExactGoal;
                trigger = true;
            }
        }
        WaypointType::HeuristicReduced => {
            if distance_to_goal < cfg.max_dist4waypoints && !*to_final_pose {
                *goal_s = GoalApproach::ExactGoal;
                *to_final_pose = true;
                trigger = true;
            }
        }
    }

    if distance_to_goal > cfg.max_dist4waypoints {
        *to_final_pose = false;
        let cadence = cfg.waypoint_dist_f.min(dist_to_end_of_path / 2.0);
        if distance_since_last_replanning > cadence {
            trigger = true;
        }
    }

    trigger
}

/// Evaluates the full section 4.6 OR-chain. `new_waypoint_trigger` is the
/// result of a prior [`check_new_waypoint`] call this tick.
pub fn should_replan(cfg: &PlannerConfig, inputs: &ReplanInputs, new_waypoint_trigger: bool) -> ReplanDecision {
    if !inputs.has_active_goal || inputs.ego_s == EgoState::Goal {
        return ReplanDecision {
            replan: false,
            invalidate_path: false,
        };
    }

    let close_collision = inputs.path_collides
        && inputs
            .dist_to_collision
            .map(|d| d < cfg.min_coll_dist)
            .unwrap_or(false);

    let diverged = inputs.divergent_dist.is_finite();
    let off_path = inputs.projection_distance > cfg.max_dist4replan;

    let replan =
        new_waypoint_trigger || inputs.new_goal_flag || close_collision || diverged || off_path;

    ReplanDecision {
        replan,
        invalidate_path: close_collision || off_path,
    }
}
