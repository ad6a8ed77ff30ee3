//! Validates received goals, finds collision-free fallbacks, and tracks the
//! "new goal" transition (SPEC_FULL.md section 4.3).

use crate::collaborators::{CollisionOracle, HybridPlanner};
use crate::coordinates::to_patch;
use crate::logging::{log_info, log_warning};
use crate::types::{GoalMessage, GoalSet, Patch, Pose};

#[derive(Debug, Default)]
pub struct GoalManager {
    goals: GoalSet,
    new_goal: bool,
}

impl GoalManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goals(&self) -> GoalSet {
        self.goals
    }

    /// Clears and returns the "new goal" flag (section 4.6's "New goal"
    /// replan trigger reads this exactly once per tick).
    pub fn take_new_goal_flag(&mut self) -> bool {
        std::mem::take(&mut self.new_goal)
    }

    pub fn parse_message(&mut self, msg: GoalMessage) -> bool {
        match msg {
            GoalMessage::Remove => {
                self.goals = GoalSet::default();
                self.new_goal = false;
                true
            }
            GoalMessage::Set(pose) => {
                self.goals.received_global = Some(pose);
                false
            }
            GoalMessage::None => false,
        }
    }

    pub fn refresh_patch_frame(&mut self, patch: Patch) {
        self.goals.received_patch = self.goals.received_global.map(|p| to_patch(p, patch.origin_global));
        self.goals.active_patch = self.goals.active_global.map(|p| to_patch(p, patch.origin_global));
    }

    /// Validate ego/received/active against the collision oracle, chasing a
    /// nearby fallback when blocked. Returns true iff the received goal was
    /// valid and differs from the current active goal (the caller should
    /// then call [`GoalManager::promote_received_to_active`]).
    pub fn validate(
        &mut self,
        ego_patch: Pose,
        planner: &impl HybridPlanner,
        oracle: &impl CollisionOracle,
    ) -> bool {
        if oracle.check_pose(ego_patch) {
            log_warning("ego pose is in collision");
        }

        self.goals.received_collides = false;
        if let Some(received) = self.goals.received_patch {
            if oracle.check_pose(received) {
                self.goals.received_collides = true;
                match planner.valid_close_pose(ego_patch, received) {
                    Some(fallback) => {
                        log_info("received goal collides, substituting nearby pose");
                        self.goals.received_patch = Some(fallback);
                    }
                    None => {
                        log_warning("received goal collides and no nearby fallback exists, dropping");
                        self.goals.received_global = None;
                        self.goals.received_patch = None;
                    }
                }
            }
        }

        if let Some(active) = self.goals.active_patch {
            if oracle.check_pose(active) {
                match planner.valid_close_pose(ego_patch, active) {
                    Some(fallback) => {
                        self.goals.active_patch = Some(fallback);
                    }
                    None => {
                        log_warning("active goal collides and no nearby fallback exists, resetting");
                        self.reset();
                        return false;
                    }
                }
            }
        }

        match (self.goals.received_patch, self.goals.active_patch) {
            (Some(received), active) => active != Some(received),
            (None, _) => false,
        }
    }

    pub fn promote_received_to_active(&mut self) {
        self.goals.active_global = self.goals.received_global;
        self.goals.active_patch = self.goals.received_patch;
        self.new_goal = true;
    }

    pub fn reset(&mut self) {
        self.goals = GoalSet::default();
        self.new_goal = false;
    }
}
