//! Decides how far along the retained path the next plan should start
//! (SPEC_FULL.md section 4.7).

use crate::collaborators::PlanNode;
use crate::config::PlannerConfig;
use crate::types::Path;

/// The chosen start node for the next kinematic plan, plus how many
/// samples of the retained path it corresponds to (0 if starting at ego).
#[derive(Debug, Clone, Copy)]
pub struct ShiftResult {
    pub plan_start: PlanNode,
    pub shift_idx: usize,
}

/// `wheelbase` comes from the `Vehicle` collaborator; `ego_index` is the
/// tracker's current index into `path`.
pub fn select_shift(
    cfg: &PlannerConfig,
    ego_node: PlanNode,
    path: Option<&Path>,
    ego_index: usize,
    divergent_dist: f64,
    coll_idx: Option<usize>,
    dist_to_end_of_path: f64,
    wheelbase: f64,
) -> ShiftResult {
    let path = match path {
        None => {
            return ShiftResult {
                plan_start: ego_node,
                shift_idx: 0,
            }
        }
        Some(p) => p,
    };

    let remaining = path.len().saturating_sub(ego_index);
    if remaining == 0 {
        return ShiftResult {
            plan_start: ego_node,
            shift_idx: 0,
        };
    }

    let div_m = if divergent_dist.is_finite() {
        divergent_dist * cfg.keep_path_ratio
    } else {
        f64::INFINITY
    };
    let coll_m = match coll_idx {
        Some(idx) => idx as f64 * cfg.interp_res * cfg.keep_path_ratio,
        None => f64::INFINITY,
    };
    let std_m = dist_to_end_of_path * cfg.keep_path_ratio;

    let shift_m = div_m.min(coll_m).min(std_m);
    let mut shift_idx = (shift_m / cfg.interp_res).floor().max(0.0) as usize;
    shift_idx = shift_idx.min(remaining.saturating_sub(1));

    if shift_idx == 0 {
        return ShiftResult {
            plan_start: ego_node,
            shift_idx: 0,
        };
    }

    let target_idx = ego_index + shift_idx;
    let sample = path.samples[target_idx];
    let steer = curvature_steer(path, target_idx, wheelbase, cfg.interp_res);

    ShiftResult {
        plan_start: PlanNode {
            pose: crate::types::Pose::new(sample.x, sample.y, sample.yaw),
            steer,
        },
        shift_idx,
    }
}

/// `atan(curvature * wheelbase)` from two consecutive yaw samples spaced
/// `interp_res` apart; 0 if only one yaw sample is available.
fn curvature_steer(path: &Path, index: usize, wheelbase: f64, interp_res: f64) -> f64 {
    let prev_idx = match index.checked_sub(1) {
        Some(i) => i,
        None => return 0.0,
    };
    let yaw_now = path.samples[index].yaw;
    let yaw_prev = path.samples[prev_idx].yaw;
    let dyaw = crate::coordinates::wrap_to_pi(yaw_now - yaw_prev);
    let curvature = dyaw / interp_res;
    (curvature * wheelbase).atan()
}
