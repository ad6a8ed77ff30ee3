//! Core data model: poses, paths, patches, and the goal/vehicle/state
//! structures the controller owns (SPEC_FULL.md section 3).

use std::time::Duration;

use crate::ring_buffer::CircularBuffer;

/// A 2D pose in meters and radians. Equality is not derived because yaw
/// comparisons must go through [`crate::coordinates::angles_equal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn point(&self) -> Point {
        Point { x: self.x, y: self.y }
    }
}

/// A metric or integer-grid 2D point, depending on context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An integer coarse-grid index pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &GridIndex) -> f64 {
        (((self.x - other.x).pow(2) + (self.y - other.y).pow(2)) as f64).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Distinguishes the expansion family that produced a path sample, purely
/// for downstream diagnostics; the core never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Primitive,
    Analytic,
    Retained,
}

/// A single kinematic path sample in whatever frame the containing [`Path`]
/// is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    pub direction: Direction,
    pub sample_type: SampleType,
}

/// A kinematically feasible path. Invariant: `samples` is non-empty whenever
/// a `Path` exists at all (an absent path is modeled as `Option<Path>`, not
/// an empty one).
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub samples: Vec<PathSample>,
    pub cost: f64,
}

impl Path {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Euclidean polyline length of `samples[from..]`.
    pub fn length_from(&self, from: usize) -> f64 {
        crate::coordinates::polyline_length(
            &self.samples[from.min(self.samples.len())..]
                .iter()
                .map(|s| Point::new(s.x, s.y))
                .collect::<Vec<_>>(),
        )
    }
}

/// An integer-index path on the coarse planner's grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoarsePath {
    pub indices: Vec<GridIndex>,
}

impl CoarsePath {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

/// The current rectangular working region, in global coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    pub origin_global: Point,
    pub dim_metric: f64,
    pub dim_grid: i32,
}

/// The goal-tracking state: received vs. active goal, each in both frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoalSet {
    pub received_global: Option<Pose>,
    pub received_patch: Option<Pose>,
    pub active_global: Option<Pose>,
    pub active_patch: Option<Pose>,
    pub received_collides: bool,
}

/// The vehicle's tracked pose and progress along the active path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub pose_global: Pose,
    pub pose_patch: Pose,
    pub velocity: f64,
    pub index_on_path: usize,
    pub projection_on_path: Option<Pose>,
}

impl VehicleState {
    pub fn new(pose_global: Pose) -> Self {
        Self {
            pose_global,
            pose_patch: pose_global,
            velocity: 0.0,
            index_on_path: 0,
            projection_on_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgoState {
    Driving,
    Goal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Safe,
    Collides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalApproach {
    ApproxGoal,
    ExactGoal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplanState {
    Cyclic,
    Forced,
}

/// The four orthogonal state-machine fields (section 4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallState {
    pub ego_s: EgoState,
    pub path_s: PathState,
    pub goal_s: GoalApproach,
    pub repl_s: ReplanState,
}

impl Default for OverallState {
    fn default() -> Self {
        Self {
            ego_s: EgoState::Goal,
            path_s: PathState::Safe,
            goal_s: GoalApproach::ApproxGoal,
            repl_s: ReplanState::Forced,
        }
    }
}

/// One driven sample retained in the bounded history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivenSample {
    pub pose_global: Pose,
    pub direction: Direction,
    pub has_capsule: bool,
}

pub type DrivenHistory = CircularBuffer<DrivenSample>;

pub fn new_driven_history() -> DrivenHistory {
    CircularBuffer::new(1000)
}

/// Per-tick planning and kinematic-planner cycle durations, retained only
/// for observability (never consulted by decision logic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimeSample {
    pub planning_cycle: Duration,
    pub kinematic_cycle: Duration,
}

pub type CycleTimes = CircularBuffer<CycleTimeSample>;

pub fn new_cycle_times() -> CycleTimes {
    CircularBuffer::new(1000)
}

/// An inbound goal update for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalMessage {
    Remove,
    Set(Pose),
    None,
}

/// A single minipatch occupancy measurement tile, opaque to the core beyond
/// its identity for insertion purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub origin_grid: GridIndex,
    pub width: i32,
    pub data: Vec<f64>,
}

/// The dynamic shape of a `minipatches` update: a map in real operation, or
/// a single measurement tile in simulation. Modeled as a tagged variant
/// rather than relying on runtime type inspection (design notes).
#[derive(Debug, Clone, PartialEq)]
pub enum Minipatches {
    Map(std::collections::HashMap<u64, Tile>),
    Single(Tile),
}
