//! Typed, validated configuration for the planning core.
//!
//! Mirrors the reference implementation's single dictionary of named
//! constants, but replaces stringly-typed lookups with checked fields read
//! once at construction (see `SPEC_FULL.md` section 6).

use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Controls how the controller picks an intermediate goal when the true
/// goal is far away (section 4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaypointType {
    /// Always plan straight to the final goal.
    None,
    /// Extract a waypoint from the coarse grid path.
    CoarsePath,
    /// Switch to the final goal once within range, without an intermediate
    /// waypoint extraction step.
    HeuristicReduced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Working patch side length in grid cells.
    pub gm_dim: i32,
    /// Meters per grid cell.
    pub gm_res: f64,
    /// Extra margin (meters) added around the ego/goal bounding box on rebuild.
    pub padding_dist: f64,
    /// Maximum distance (meters) at which a minipatch is still inserted.
    pub max_patch_ins_dist: f64,

    /// Minimum allowed arc length (meters) to an upcoming collision before a
    /// forced replan.
    pub min_coll_dist: f64,
    /// Minimum interval (seconds) between environment refreshes outside of
    /// simulation throttling.
    pub env_update_t: f64,
    /// Goal-reached position tolerance (meters).
    pub goal_dist: f64,
    /// Goal-reached heading tolerance (radians).
    pub goal_angle: f64,
    /// Goal-reached remaining-samples tolerance.
    pub min_rem_el: usize,

    /// Spacing (meters) between consecutive path samples.
    pub interp_res: f64,
    /// Spacing (meters per cell) of the coarse planner grid.
    pub planner_res: f64,

    /// Distance (meters) below which the controller switches to planning
    /// toward the final goal instead of a waypoint.
    pub max_dist4waypoints: f64,
    /// Distance (meters) along the coarse path used to place a waypoint.
    pub waypoint_dist: f64,
    pub waypoint_type: WaypointType,
    /// Fallback replanning cadence (meters driven) when far from the goal.
    pub waypoint_dist_f: f64,
    /// Maximum projection distance (meters) before the path is considered
    /// stale and discarded.
    pub max_dist4replan: f64,
    /// Coarse-path divergence threshold, in grid cells.
    pub div_distance: f64,
    /// Fraction of the computed shift budget actually kept when splicing.
    pub keep_path_ratio: f64,
    /// Maximum distance (meters) from a goal to the patch edge before rebuild.
    pub max_dist2patch: f64,
}

impl PlannerConfig {
    /// Parse from a TOML document and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, PlanningError> {
        let cfg: Self =
            toml::from_str(s).map_err(|e| PlanningError::ConfigInvalid(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, PlanningError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlanningError::ConfigInvalid(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Enforces the precondition `MAX_DIST4WAYPOINTS >= WAYPOINT_DIST` and
    /// basic positivity of the distances and resolutions the controller
    /// divides by.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.max_dist4waypoints < self.waypoint_dist {
            return Err(PlanningError::ConfigInvalid(format!(
                "max_dist4waypoints ({}) must be >= waypoint_dist ({})",
                self.max_dist4waypoints, self.waypoint_dist
            )));
        }
        if self.gm_res <= 0.0 {
            return Err(PlanningError::ConfigInvalid(
                "gm_res must be positive".into(),
            ));
        }
        if self.interp_res <= 0.0 {
            return Err(PlanningError::ConfigInvalid(
                "interp_res must be positive".into(),
            ));
        }
        if self.planner_res <= 0.0 {
            return Err(PlanningError::ConfigInvalid(
                "planner_res must be positive".into(),
            ));
        }
        if self.gm_dim <= 0 {
            return Err(PlanningError::ConfigInvalid(
                "gm_dim must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.keep_path_ratio) || self.keep_path_ratio <= 0.0 {
            return Err(PlanningError::ConfigInvalid(
                "keep_path_ratio must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// `GM_DIST = GM_DIM * GM_RES`, the patch side length in meters.
    pub fn gm_dist(&self) -> f64 {
        self.gm_dim as f64 * self.gm_res
    }
}
