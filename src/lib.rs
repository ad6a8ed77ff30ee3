//! Orchestration core of a free-space motion planner.
//!
//! This crate owns the patch, goal, and trajectory bookkeeping around an
//! externally supplied kinematic planner, coarse grid planner, collision
//! oracle, cartographer, and vehicle model (see [`collaborators`]). It does
//! not itself perform lattice search, occupancy inflation, or cartography.

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod coordinates;
pub mod decider;
pub mod divergence;
pub mod error;
pub mod goal_manager;
pub mod logging;
pub mod patch_manager;
pub mod ring_buffer;
pub mod shift;
pub mod tracker;
pub mod types;

pub use config::PlannerConfig;
pub use controller::PlanningCycleController;
pub use error::PlanningError;
pub use types::{GoalMessage, Minipatches, Path, Pose};
