//! Projects the vehicle onto the active path and accumulates driven
//! distance (SPEC_FULL.md section 4.4).

use crate::collaborators::HybridPlanner;
use crate::config::PlannerConfig;
use crate::coordinates::{angles_equal, polyline_length, to_global};
use crate::types::{DrivenHistory, DrivenSample, Patch, Path, Pose};

#[derive(Debug)]
pub struct TrajectoryTracker {
    pub index_on_path: usize,
    pub distance_since_last_replanning: f64,
    pub driven_history: DrivenHistory,
    /// Minimum distance found by the last projection onto the active path;
    /// `0.0` when there is no active path to project onto.
    pub last_projection_distance: f64,
}

impl Default for TrajectoryTracker {
    fn default() -> Self {
        Self {
            index_on_path: 0,
            distance_since_last_replanning: 0.0,
            driven_history: crate::types::new_driven_history(),
            last_projection_distance: 0.0,
        }
    }
}

impl TrajectoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.index_on_path = 0;
        self.distance_since_last_replanning = 0.0;
        self.last_projection_distance = 0.0;
    }

    /// Project `ego_patch` onto `path`, advance the tracked index, and
    /// return the remaining arc length to the end of the path. Returns 0 if
    /// `path` is `None`.
    pub fn analyze(
        &mut self,
        ego_patch: Pose,
        path: Option<&Path>,
        patch: Patch,
        planner: &impl HybridPlanner,
        has_capsule: bool,
    ) -> f64 {
        let path = match path {
            None => {
                self.index_on_path = 0;
                self.last_projection_distance = 0.0;
                return 0.0;
            }
            Some(p) => p,
        };

        let (_projection, new_index, min_dist) =
            planner.project_ego(ego_patch, path, self.index_on_path);
        self.last_projection_distance = min_dist;
        let new_index = new_index.max(self.index_on_path).min(path.len().saturating_sub(1));

        // The distance sum includes the boundary sample at `new_index`, but
        // it is excluded from the pushed history: it re-enters as the first
        // sample of next tick's segment, so including it here would double
        // it up in the history.
        let distance_segment: Vec<_> = path.samples[self.index_on_path..=new_index]
            .iter()
            .map(|s| to_global(Pose::new(s.x, s.y, s.yaw), patch.origin_global).point())
            .collect();
        self.distance_since_last_replanning += polyline_length(&distance_segment);

        for s in &path.samples[self.index_on_path..new_index] {
            let global = to_global(Pose::new(s.x, s.y, s.yaw), patch.origin_global);
            self.driven_history.push(DrivenSample {
                pose_global: global,
                direction: s.direction,
                has_capsule,
            });
        }

        self.index_on_path = new_index;
        path.length_from(new_index)
    }

    /// True iff ego is within position/heading/remaining-samples tolerance
    /// of the active goal.
    pub fn is_goal_reached(
        &self,
        ego_patch: Pose,
        goal_patch: Pose,
        remaining_samples: usize,
        cfg: &PlannerConfig,
    ) -> bool {
        let within_position =
            (ego_patch.x - goal_patch.x).abs() <= cfg.goal_dist && (ego_patch.y - goal_patch.y).abs() <= cfg.goal_dist;
        within_position
            && angles_equal(ego_patch.yaw, goal_patch.yaw, cfg.goal_angle)
            && remaining_samples <= cfg.min_rem_el
    }
}
