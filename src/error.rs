use thiserror::Error;

/// Error kinds surfaced by the planning core.
///
/// Only [`PlanningError::ConfigInvalid`] is ever returned from the public
/// tick API (`PlanningCycleController::do_planning` never fails: it folds
/// every other kind into a logged event and the returned `(path, path_id)`
/// pair, per the recoverable-error policy in the design notes).
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("no plan available and no path retained from a previous cycle")]
    PlanUnavailable,

    #[error("goal at ({x:.3}, {y:.3}) is unreachable: no collision-free pose nearby")]
    GoalUnreachable { x: f64, y: f64 },

    #[error("ego pose is in collision")]
    EgoInCollision,

    #[error("coarse planner returned no path this tick")]
    CoarsePathEmpty,
}
