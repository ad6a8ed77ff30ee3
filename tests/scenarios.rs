//! End-to-end seed scenarios against hand-rolled collaborator doubles
//! (SPEC_FULL.md section 8). These doubles are toy substitutes for the real
//! hybrid/grid planners, collision oracle, cartographer, and vehicle model —
//! none of the real search algorithms those collaborators wrap are
//! reimplemented here, since they are explicitly out of scope for this
//! crate.

use freespace_planner::collaborators::{Cartographer, CollisionOracle, GridPlanner, HybridPlanner, PlanNode, Vehicle};
use freespace_planner::config::{PlannerConfig, WaypointType};
use freespace_planner::controller::PlanningCycleController;
use freespace_planner::types::{
    CoarsePath, Direction, GoalMessage, GridIndex, Minipatches, Path, PathSample, Point, Pose,
    SampleType, Tile,
};

struct StraightLinePlanner {
    interp_res: f64,
}

impl HybridPlanner for StraightLinePlanner {
    fn reinit(&mut self, _origin: Point, _dim_grid: i32) {}
    fn recalculate_env(&mut self, _goal: PlanNode, _ego: PlanNode) {}

    fn create_node(&self, pose: Pose, steer: f64) -> PlanNode {
        PlanNode { pose, steer }
    }

    fn project_ego(&self, ego: Pose, path: &Path, start_index: usize) -> (Pose, usize, f64) {
        let mut best_idx = start_index.min(path.len().saturating_sub(1));
        let mut best_dist = f64::INFINITY;
        for (i, s) in path.samples.iter().enumerate().skip(start_index) {
            let d = ((s.x - ego.x).powi(2) + (s.y - ego.y).powi(2)).sqrt();
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }
        let sample = path.samples[best_idx];
        (Pose::new(sample.x, sample.y, sample.yaw), best_idx, best_dist)
    }

    fn valid_close_pose(&self, _ego: Pose, _target: Pose) -> Option<Pose> {
        None
    }

    fn plan(
        &mut self,
        _ego: PlanNode,
        plan_start: PlanNode,
        goal: PlanNode,
        _to_final_pose: bool,
        _do_analytic: bool,
    ) -> Option<Path> {
        let dx = goal.pose.x - plan_start.pose.x;
        let dy = goal.pose.y - plan_start.pose.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < 1e-6 {
            return Some(Path {
                samples: vec![PathSample {
                    x: plan_start.pose.x,
                    y: plan_start.pose.y,
                    yaw: plan_start.pose.yaw,
                    direction: Direction::Forward,
                    sample_type: SampleType::Analytic,
                }],
                cost: 0.0,
            });
        }
        let steps = (dist / self.interp_res).ceil().max(1.0) as usize;
        let yaw = dy.atan2(dx);
        let samples = (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                PathSample {
                    x: plan_start.pose.x + dx * t,
                    y: plan_start.pose.y + dy * t,
                    yaw,
                    direction: Direction::Forward,
                    sample_type: SampleType::Primitive,
                }
            })
            .collect();
        Some(Path { samples, cost: dist })
    }

    fn reset_lane_graph(&mut self) {}
    fn add_lane_point(&mut self, _point: Point) {}
    fn update_lane_graph(&mut self, _origin: Point, _dim_metric: f64) {}
}

struct StraightGridPlanner {
    goal_index: GridIndex,
}

impl GridPlanner for StraightGridPlanner {
    fn path(&mut self, ego_index: GridIndex) -> Option<CoarsePath> {
        let mut indices = Vec::new();
        let steps = ego_index.distance_to(&self.goal_index).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = ego_index.x as f64 + (self.goal_index.x - ego_index.x) as f64 * t;
            let y = ego_index.y as f64 + (self.goal_index.y - ego_index.y) as f64 * t;
            indices.push(GridIndex::new(x.round() as i32, y.round() as i32));
        }
        Some(CoarsePath { indices })
    }
}

struct FreeOracle;
impl CollisionOracle for FreeOracle {
    fn check_pose(&self, _pose_patch: Pose) -> bool {
        false
    }
    fn path_collision_index(&self, _path: &Path) -> Option<usize> {
        None
    }
    fn insert_minipatches(&mut self, _patches: &Minipatches, _ego_global: Point, _only_nearest: bool, _only_new: bool) {}
    fn process_safety_patch(&mut self) {}
}

struct NoopCartographer;
impl Cartographer for NoopCartographer {
    fn cartograph(&mut self, _tile: &Tile, _origin_grid: GridIndex, _width: i32) {}
    fn pass_local_map(&mut self, _origin_grid: GridIndex, _width: i32) {}
    fn load_previous_patch(&mut self, _old_origin: Point, _new_origin: Point) {}
}

struct SimpleVehicle {
    pose: Pose,
}
impl Vehicle for SimpleVehicle {
    fn set_pose(&mut self, pose_global: Pose) {
        self.pose = pose_global;
    }
    fn wheelbase(&self) -> f64 {
        2.5
    }
    fn has_capsule(&self) -> bool {
        false
    }
}

fn test_config() -> PlannerConfig {
    PlannerConfig {
        gm_dim: 200,
        gm_res: 0.2,
        padding_dist: 5.0,
        max_patch_ins_dist: 20.0,
        min_coll_dist: 1.0,
        env_update_t: 0.1,
        goal_dist: 0.5,
        goal_angle: 0.2,
        min_rem_el: 3,
        interp_res: 0.2,
        planner_res: 0.4,
        max_dist4waypoints: 10.0,
        waypoint_dist: 5.0,
        waypoint_type: WaypointType::None,
        waypoint_dist_f: 3.0,
        max_dist4replan: 50.0,
        div_distance: 3.0,
        keep_path_ratio: 0.8,
        max_dist2patch: 2.0,
    }
}

type TestController =
    PlanningCycleController<StraightLinePlanner, StraightGridPlanner, FreeOracle, NoopCartographer, SimpleVehicle>;

fn new_controller(goal_grid_index: GridIndex) -> TestController {
    PlanningCycleController::new(
        test_config(),
        true,
        StraightLinePlanner { interp_res: 0.2 },
        StraightGridPlanner { goal_index: goal_grid_index },
        FreeOracle,
        NoopCartographer,
        SimpleVehicle { pose: Pose::new(0.0, 0.0, 0.0) },
        Vec::new(),
    )
    .expect("valid config")
}

/// Scenario 1: the vehicle drives toward a nearby goal and eventually
/// reaches it.
#[test]
fn reach_goal_scenario() {
    let mut controller = new_controller(GridIndex::new(5, 0));
    let goal = Pose::new(2.0, 0.0, 0.0);

    let (path, path_id) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(goal),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );
    assert!(path.is_some(), "expected an initial path toward the goal");
    let first_path_id = path_id;

    let mut ego = Pose::new(0.0, 0.0, 0.0);
    let mut reached = false;
    for tick in 1..200 {
        let step = 0.15;
        let dx = goal.x - ego.x;
        let dy = goal.y - ego.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 1e-6 {
            let t = step.min(dist) / dist;
            ego = Pose::new(ego.x + dx * t, ego.y + dy * t, 0.0);
        }

        let (path, _id) = controller.do_planning(
            ego,
            1.0,
            GoalMessage::None,
            Minipatches::Single(Tile {
                origin_grid: GridIndex::new(0, 0),
                width: 1,
                data: vec![0.0],
            }),
            tick as f64 * 0.1,
        );

        if path.is_none() {
            reached = true;
            break;
        }
    }

    assert!(reached, "vehicle should eventually reach the goal and clear the path");
    assert!(first_path_id <= controller.tick_index());
}

/// Scenario 5: removing the goal resets all planner state and clears the
/// returned path.
#[test]
fn goal_removed_resets_scenario() {
    let mut controller = new_controller(GridIndex::new(5, 0));
    let goal = Pose::new(2.0, 0.0, 0.0);

    let (path, _) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(goal),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );
    assert!(path.is_some());

    let (path_after_removal, _) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Remove,
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.1,
    );
    assert!(path_after_removal.is_none());
    use freespace_planner::types::EgoState;
    assert_eq!(controller.state().ego_s, EgoState::Goal);
}

/// Oracle that reports every pose as colliding, used to force
/// [`GoalManager::validate`] onto its fallback-substitution path.
struct AllPosesBlocked;
impl CollisionOracle for AllPosesBlocked {
    fn check_pose(&self, _pose_patch: Pose) -> bool {
        true
    }
    fn path_collision_index(&self, _path: &Path) -> Option<usize> {
        None
    }
    fn insert_minipatches(&mut self, _p: &Minipatches, _e: Point, _n: bool, _o: bool) {}
    fn process_safety_patch(&mut self) {}
}

/// Planner identical to [`StraightLinePlanner`] except it offers a fixed
/// nearby fallback whenever asked to find a collision-free pose.
struct FallbackLinePlanner {
    inner: StraightLinePlanner,
    fallback: Pose,
}
impl HybridPlanner for FallbackLinePlanner {
    fn reinit(&mut self, origin: Point, dim_grid: i32) {
        self.inner.reinit(origin, dim_grid);
    }
    fn recalculate_env(&mut self, goal: PlanNode, ego: PlanNode) {
        self.inner.recalculate_env(goal, ego);
    }
    fn create_node(&self, pose: Pose, steer: f64) -> PlanNode {
        self.inner.create_node(pose, steer)
    }
    fn project_ego(&self, ego: Pose, path: &Path, start_index: usize) -> (Pose, usize, f64) {
        self.inner.project_ego(ego, path, start_index)
    }
    fn valid_close_pose(&self, _ego: Pose, _target: Pose) -> Option<Pose> {
        Some(self.fallback)
    }
    fn plan(
        &mut self,
        ego: PlanNode,
        plan_start: PlanNode,
        goal: PlanNode,
        to_final_pose: bool,
        do_analytic: bool,
    ) -> Option<Path> {
        self.inner.plan(ego, plan_start, goal, to_final_pose, do_analytic)
    }
    fn reset_lane_graph(&mut self) {
        self.inner.reset_lane_graph();
    }
    fn add_lane_point(&mut self, point: Point) {
        self.inner.add_lane_point(point);
    }
    fn update_lane_graph(&mut self, origin: Point, dim_metric: f64) {
        self.inner.update_lane_graph(origin, dim_metric);
    }
}

/// Scenario 2: a received goal that collides gets substituted with a nearby
/// collision-free fallback instead of being dropped, and still promotes.
#[test]
fn goal_in_collision_falls_back_to_nearby_pose() {
    let blocked_goal = Pose::new(2.0, 0.0, 0.0);
    let fallback_goal = Pose::new(1.8, 0.3, 0.0);

    let mut controller = PlanningCycleController::new(
        test_config(),
        true,
        FallbackLinePlanner {
            inner: StraightLinePlanner { interp_res: 0.2 },
            fallback: fallback_goal,
        },
        StraightGridPlanner { goal_index: GridIndex::new(5, 0) },
        AllPosesBlocked,
        NoopCartographer,
        SimpleVehicle { pose: Pose::new(0.0, 0.0, 0.0) },
        Vec::new(),
    )
    .expect("valid config");

    let (path, _) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(blocked_goal),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );

    assert!(path.is_some(), "a fallback pose should still produce a path");
    assert_eq!(
        controller.state().ego_s,
        freespace_planner::types::EgoState::Driving,
        "substituted goal should still be promoted and drive the vehicle"
    );
}

/// Grid planner whose coarse path drifts sharply away from its previous
/// output on its second call, to exercise the divergence replan trigger.
struct DivergingGridPlanner {
    calls: usize,
}
impl GridPlanner for DivergingGridPlanner {
    fn path(&mut self, _ego_index: GridIndex) -> Option<CoarsePath> {
        let n = self.calls;
        self.calls += 1;
        if n == 0 {
            Some(CoarsePath {
                indices: (0..=10).map(|i| GridIndex::new(i, 0)).collect(),
            })
        } else {
            Some(CoarsePath {
                indices: (0..=10).map(|i| GridIndex::new(i, i)).collect(),
            })
        }
    }
}

/// Hybrid planner wrapping [`StraightLinePlanner`] that counts `plan` calls,
/// so a test can observe a replan firing with no other trigger present.
struct CountingLinePlanner {
    inner: StraightLinePlanner,
    plan_calls: usize,
}
impl HybridPlanner for CountingLinePlanner {
    fn reinit(&mut self, origin: Point, dim_grid: i32) {
        self.inner.reinit(origin, dim_grid);
    }
    fn recalculate_env(&mut self, goal: PlanNode, ego: PlanNode) {
        self.inner.recalculate_env(goal, ego);
    }
    fn create_node(&self, pose: Pose, steer: f64) -> PlanNode {
        self.inner.create_node(pose, steer)
    }
    fn project_ego(&self, ego: Pose, path: &Path, start_index: usize) -> (Pose, usize, f64) {
        self.inner.project_ego(ego, path, start_index)
    }
    fn valid_close_pose(&self, ego: Pose, target: Pose) -> Option<Pose> {
        self.inner.valid_close_pose(ego, target)
    }
    fn plan(
        &mut self,
        ego: PlanNode,
        plan_start: PlanNode,
        goal: PlanNode,
        to_final_pose: bool,
        do_analytic: bool,
    ) -> Option<Path> {
        self.plan_calls += 1;
        self.inner.plan(ego, plan_start, goal, to_final_pose, do_analytic)
    }
    fn reset_lane_graph(&mut self) {
        self.inner.reset_lane_graph();
    }
    fn add_lane_point(&mut self, point: Point) {
        self.inner.add_lane_point(point);
    }
    fn update_lane_graph(&mut self, origin: Point, dim_metric: f64) {
        self.inner.update_lane_graph(origin, dim_metric);
    }
}

/// Scenario 3: a coarse path that diverges from its previous shape forces a
/// replan even with no new goal, no collision, and little distance driven.
#[test]
fn diverging_coarse_path_forces_replan() {
    let mut controller = PlanningCycleController::new(
        test_config(),
        true,
        CountingLinePlanner {
            inner: StraightLinePlanner { interp_res: 0.2 },
            plan_calls: 0,
        },
        DivergingGridPlanner { calls: 0 },
        FreeOracle,
        NoopCartographer,
        SimpleVehicle { pose: Pose::new(0.0, 0.0, 0.0) },
        Vec::new(),
    )
    .expect("valid config");

    controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(Pose::new(20.0, 0.0, 0.0)),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );

    // Ticks 1..9 stay off the sim-mode env refresh cadence (tick_index % 10)
    // and carry the vehicle only a tiny distance, well under the waypoint
    // replan cadence.
    for tick in 1..10u64 {
        controller.do_planning(
            Pose::new(0.0, 0.0, 0.0),
            0.0,
            GoalMessage::None,
            Minipatches::Single(Tile {
                origin_grid: GridIndex::new(0, 0),
                width: 1,
                data: vec![0.0],
            }),
            tick as f64 * 0.01,
        );
    }

    // Tick 10 hits the sim-mode refresh cadence, where the grid planner's
    // second call returns a sharply diverging coarse path.
    controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::None,
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.1,
    );

    assert!(controller.state().repl_s == freespace_planner::types::ReplanState::Cyclic);
}

/// Grid planner that always returns a trivial one-step path anchored on
/// ego's current index, regardless of goal.
struct EdgeGridPlanner;
impl GridPlanner for EdgeGridPlanner {
    fn path(&mut self, ego_index: GridIndex) -> Option<CoarsePath> {
        Some(CoarsePath {
            indices: vec![ego_index, GridIndex::new(ego_index.x + 1, ego_index.y)],
        })
    }
}

/// Scenario 4: driving the vehicle near the edge of the current patch forces
/// a rebuild, which re-projects the lane graph and widens the working area.
#[test]
fn ego_near_patch_edge_triggers_rebuild() {
    let mut controller = PlanningCycleController::new(
        test_config(),
        true,
        StraightLinePlanner { interp_res: 0.2 },
        EdgeGridPlanner,
        FreeOracle,
        NoopCartographer,
        SimpleVehicle { pose: Pose::new(0.0, 0.0, 0.0) },
        Vec::new(),
    )
    .expect("valid config");

    controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(Pose::new(2.0, 0.0, 0.0)),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );

    // Jump the vehicle far outside the small initial patch; the next tick
    // must detect the near-edge/outside condition and rebuild around it.
    let (path, _) = controller.do_planning(
        Pose::new(50.0, 50.0, 0.0),
        0.0,
        GoalMessage::None,
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.1,
    );

    assert!(path.is_some(), "a rebuilt patch should still allow planning to continue");
}

/// Hybrid planner that produces a path once, then reports planner failure
/// (`None`) on every subsequent call regardless of inputs.
struct OnceThenFailingPlanner {
    inner: StraightLinePlanner,
    calls: usize,
}
impl HybridPlanner for OnceThenFailingPlanner {
    fn reinit(&mut self, origin: Point, dim_grid: i32) {
        self.inner.reinit(origin, dim_grid);
    }
    fn recalculate_env(&mut self, goal: PlanNode, ego: PlanNode) {
        self.inner.recalculate_env(goal, ego);
    }
    fn create_node(&self, pose: Pose, steer: f64) -> PlanNode {
        self.inner.create_node(pose, steer)
    }
    fn project_ego(&self, ego: Pose, path: &Path, start_index: usize) -> (Pose, usize, f64) {
        self.inner.project_ego(ego, path, start_index)
    }
    fn valid_close_pose(&self, ego: Pose, target: Pose) -> Option<Pose> {
        self.inner.valid_close_pose(ego, target)
    }
    fn plan(
        &mut self,
        ego: PlanNode,
        plan_start: PlanNode,
        goal: PlanNode,
        to_final_pose: bool,
        do_analytic: bool,
    ) -> Option<Path> {
        let n = self.calls;
        self.calls += 1;
        if n == 0 {
            self.inner.plan(ego, plan_start, goal, to_final_pose, do_analytic)
        } else {
            None
        }
    }
    fn reset_lane_graph(&mut self) {
        self.inner.reset_lane_graph();
    }
    fn add_lane_point(&mut self, point: Point) {
        self.inner.add_lane_point(point);
    }
    fn update_lane_graph(&mut self, origin: Point, dim_metric: f64) {
        self.inner.update_lane_graph(origin, dim_metric);
    }
}

/// Scenario 6: a replan forced by path divergence (not collision, so the
/// stored path is not marked for invalidation) finds the planner reporting
/// failure; the previously retained path must survive rather than the
/// controller going pathless.
#[test]
fn planner_failure_keeps_existing_path() {
    let mut controller = PlanningCycleController::new(
        test_config(),
        true,
        OnceThenFailingPlanner {
            inner: StraightLinePlanner { interp_res: 0.2 },
            calls: 0,
        },
        DivergingGridPlanner { calls: 0 },
        FreeOracle,
        NoopCartographer,
        SimpleVehicle { pose: Pose::new(0.0, 0.0, 0.0) },
        Vec::new(),
    )
    .expect("valid config");

    let (first_path, _) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::Set(Pose::new(20.0, 0.0, 0.0)),
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.0,
    );
    assert!(first_path.is_some());

    for tick in 1..10u64 {
        controller.do_planning(
            Pose::new(0.0, 0.0, 0.0),
            0.0,
            GoalMessage::None,
            Minipatches::Single(Tile {
                origin_grid: GridIndex::new(0, 0),
                width: 1,
                data: vec![0.0],
            }),
            tick as f64 * 0.01,
        );
    }

    // Tick 10 hits the sim-mode refresh cadence; the grid planner's coarse
    // path now diverges sharply, forcing a replan with no collision
    // involved, and the kinematic planner fails to produce a replacement.
    let (path_after_failure, _) = controller.do_planning(
        Pose::new(0.0, 0.0, 0.0),
        0.0,
        GoalMessage::None,
        Minipatches::Single(Tile {
            origin_grid: GridIndex::new(0, 0),
            width: 1,
            data: vec![0.0],
        }),
        0.1,
    );

    assert!(
        path_after_failure.is_some(),
        "a failed replan must keep the previously retained path instead of returning none"
    );
}
