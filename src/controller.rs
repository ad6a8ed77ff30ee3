//! Top-level per-tick orchestration (SPEC_FULL.md section 4.8) and the
//! state model (section 4.9). This is the only module that knows the full
//! ordering of the planning cycle; every other module is a pure or
//! narrowly-scoped collaborator it composes.

use crate::collaborators::{Cartographer, CollisionOracle, GridPlanner, HybridPlanner, PlanNode, Vehicle};
use crate::config::{PlannerConfig, WaypointType};
use crate::coordinates::{polyline_length, to_global, to_patch};
use crate::decider::{check_new_waypoint, should_replan, ReplanInputs};
use crate::error::PlanningError;
use crate::goal_manager::GoalManager;
use crate::logging::{log_success, log_warning};
use crate::patch_manager::PatchManager;
use crate::shift::select_shift;
use crate::tracker::TrajectoryTracker;
use crate::types::{
    new_cycle_times, CoarsePath, CycleTimeSample, CycleTimes, EgoState, GoalApproach, GoalMessage,
    GridIndex, Minipatches, OverallState, Path, PathState, Point, Pose, ReplanState,
};

pub struct PlanningCycleController<P, G, C, M, V>
where
    P: HybridPlanner,
    G: GridPlanner,
    C: CollisionOracle,
    M: Cartographer,
    V: Vehicle,
{
    cfg: PlannerConfig,
    is_sim: bool,

    planner: P,
    grid_planner: G,
    oracle: C,
    cartographer: M,
    vehicle: V,

    patch_manager: PatchManager,
    goal_manager: GoalManager,
    tracker: TrajectoryTracker,

    state: OverallState,
    active_path: Option<Path>,
    active_coarse_path: Option<CoarsePath>,
    coll_idx: Option<usize>,
    distance_to_goal: f64,
    last_divergent_dist: f64,
    to_final_pose: bool,

    ego_global: Pose,
    ego_v: f64,

    tick_index: u64,
    path_id: u64,
    last_env_calculation: f64,
    time_goal_reached: Option<f64>,

    cycle_times: CycleTimes,
    lane_graph: Vec<Point>,
}

impl<P, G, C, M, V> PlanningCycleController<P, G, C, M, V>
where
    P: HybridPlanner,
    G: GridPlanner,
    C: CollisionOracle,
    M: Cartographer,
    V: Vehicle,
{
    pub fn new(
        cfg: PlannerConfig,
        is_sim: bool,
        planner: P,
        grid_planner: G,
        oracle: C,
        cartographer: M,
        vehicle: V,
        lane_graph: Vec<Point>,
    ) -> Result<Self, PlanningError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            is_sim,
            planner,
            grid_planner,
            oracle,
            cartographer,
            vehicle,
            patch_manager: PatchManager::new(),
            goal_manager: GoalManager::new(),
            tracker: TrajectoryTracker::new(),
            state: OverallState::default(),
            active_path: None,
            active_coarse_path: None,
            coll_idx: None,
            distance_to_goal: f64::INFINITY,
            last_divergent_dist: f64::INFINITY,
            to_final_pose: false,
            ego_global: Pose::new(0.0, 0.0, 0.0),
            ego_v: 0.0,
            tick_index: 0,
            path_id: 0,
            last_env_calculation: f64::NEG_INFINITY,
            time_goal_reached: None,
            cycle_times: new_cycle_times(),
            lane_graph,
        })
    }

    pub fn state(&self) -> OverallState {
        self.state
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Clears goals and the active path, marks `ego_s = Goal`, and forces a
    /// patch rebuild centered on `ego`. Mirrors the reference
    /// implementation's `reset_data`, including that reaching the goal
    /// drives this as a side effect of the check itself (section 4.4).
    fn reset_data(&mut self) {
        self.goal_manager.reset();
        self.active_path = None;
        self.active_coarse_path = None;
        self.coll_idx = None;
        self.to_final_pose = false;
        self.tracker.reset();
        self.state = OverallState {
            ego_s: EgoState::Goal,
            ..self.state
        };
        self.patch_manager.request_reset();
    }

    fn reproject_lane_graph(&mut self) {
        self.planner.reset_lane_graph();
        for point in &self.lane_graph {
            self.planner.add_lane_point(*point);
        }
        if let Some(patch) = self.patch_manager.patch() {
            self.planner.update_lane_graph(patch.origin_global, patch.dim_metric);
        }
    }

    fn should_refresh_env(&self, time_seconds: f64, new_goal: bool) -> bool {
        if self.is_sim {
            self.tick_index % 10 == 0 || new_goal
        } else {
            self.tick_index == 0
                || new_goal
                || time_seconds - self.last_env_calculation > self.cfg.env_update_t
        }
    }

    fn refresh_env(&mut self, time_seconds: f64, ego_index: GridIndex, minipatches: &Minipatches) {
        self.oracle
            .insert_minipatches(minipatches, self.ego_global.point(), false, true);
        self.oracle.process_safety_patch();

        self.cartographer.pass_local_map(ego_index, self.cfg.gm_dim);
        let ego_patch = to_patch(self.ego_global, self.patch_of().origin_global);
        let goal_patch = self.goal_manager.goals().active_patch.unwrap_or(ego_patch);
        let ego_node = self.planner.create_node(ego_patch, 0.0);
        let goal_node = self.planner.create_node(goal_patch, 0.0);
        self.planner.recalculate_env(goal_node, ego_node);

        if let Some(new_coarse) = self.grid_planner.path(ego_index) {
            self.last_divergent_dist = match &self.active_coarse_path {
                Some(prev) => crate::divergence::divergent_distance(
                    &new_coarse,
                    prev,
                    self.cfg.div_distance,
                    self.cfg.planner_res,
                ),
                None => f64::INFINITY,
            };
            self.distance_to_goal =
                polyline_length(
                    &new_coarse
                        .indices
                        .iter()
                        .map(|g| Point::new(g.x as f64, g.y as f64))
                        .collect::<Vec<_>>(),
                ) * self.cfg.planner_res;
            self.active_coarse_path = Some(new_coarse);
        } else {
            log_warning("coarse planner returned no path this tick");
        }
        self.last_env_calculation = time_seconds;
    }

    fn patch_of(&self) -> crate::types::Patch {
        self.patch_manager.patch().unwrap_or(crate::types::Patch {
            origin_global: self.ego_global.point(),
            dim_metric: self.cfg.gm_dist(),
            dim_grid: self.cfg.gm_dim,
        })
    }

    fn extract_waypoint(&self, coarse: &CoarsePath) -> Option<PlanNode> {
        if coarse.is_empty() {
            return None;
        }
        let idx = ((self.cfg.waypoint_dist / self.cfg.planner_res).round() as usize)
            .min(coarse.len() - 1);
        let sample = coarse.indices[idx];
        let yaw = if idx > 0 {
            let prev = coarse.indices[idx - 1];
            ((sample.y - prev.y) as f64).atan2((sample.x - prev.x) as f64)
        } else {
            0.0
        };
        let pose = Pose::new(
            sample.x as f64 * self.cfg.planner_res,
            sample.y as f64 * self.cfg.planner_res,
            yaw,
        );
        Some(self.planner.create_node(pose, 0.0))
    }

    /// Runs one planning tick and returns the global-frame path (if any)
    /// and the current path identifier.
    pub fn do_planning(
        &mut self,
        ego_global: Pose,
        ego_v: f64,
        goal_message: GoalMessage,
        minipatches: Minipatches,
        time_seconds: f64,
    ) -> (Option<Path>, u64) {
        self.ego_global = ego_global;
        self.ego_v = ego_v;
        self.vehicle.set_pose(ego_global);

        let removed = self.goal_manager.parse_message(goal_message);
        if removed {
            self.reset_data();
        }

        let rebuilt = self.patch_manager.maybe_rebuild(
            &self.cfg,
            ego_global,
            self.goal_manager.goals().received_global,
            self.is_sim,
            &mut self.planner,
            &mut self.cartographer,
            &mut self.oracle,
            &minipatches,
        );
        if rebuilt {
            self.reproject_lane_graph();
        }

        let patch = self.patch_of();
        let ego_patch = to_patch(ego_global, patch.origin_global);
        self.goal_manager.refresh_patch_frame(patch);

        self.oracle
            .insert_minipatches(&minipatches, ego_global.point(), true, true);
        self.oracle.process_safety_patch();

        let should_promote = self
            .goal_manager
            .validate(ego_patch, &self.planner, &self.oracle);
        if should_promote {
            self.goal_manager.promote_received_to_active();
            let goal_s = match self.cfg.waypoint_type {
                WaypointType::CoarsePath => GoalApproach::ApproxGoal,
                WaypointType::None | WaypointType::HeuristicReduced => GoalApproach::ExactGoal,
            };
            self.state = OverallState {
                ego_s: EgoState::Driving,
                goal_s,
                repl_s: ReplanState::Forced,
                ..self.state
            };
            self.active_path = None;
            self.tracker.reset();
        }

        let dist_to_end_of_path = self.tracker.analyze(
            ego_patch,
            self.active_path.as_ref(),
            patch,
            &self.planner,
            self.vehicle.has_capsule(),
        );

        let ego_index = GridIndex::new(
            crate::coordinates::metric_to_grid_round(ego_patch.x, self.cfg.planner_res),
            crate::coordinates::metric_to_grid_round(ego_patch.y, self.cfg.planner_res),
        );
        let ego_node = self.planner.create_node(ego_patch, 0.0);

        let new_goal_flag = self.goal_manager.take_new_goal_flag();

        let mut env_refreshed_this_tick = false;
        if self.should_refresh_env(time_seconds, new_goal_flag) {
            self.refresh_env(time_seconds, ego_index, &minipatches);
            env_refreshed_this_tick = true;
        }

        self.coll_idx = self.active_path.as_ref().and_then(|p| self.oracle.path_collision_index(p));
        self.state.path_s = if self.coll_idx.is_some() {
            PathState::Collides
        } else {
            PathState::Safe
        };

        let waypoint_trigger = check_new_waypoint(
            &self.cfg,
            &mut self.state.goal_s,
            &mut self.to_final_pose,
            self.distance_to_goal,
            self.tracker.distance_since_last_replanning,
            dist_to_end_of_path,
        );

        let replan_inputs = ReplanInputs {
            has_active_goal: self.goal_manager.goals().active_patch.is_some(),
            ego_s: self.state.ego_s,
            distance_to_goal: self.distance_to_goal,
            distance_since_last_replanning: self.tracker.distance_since_last_replanning,
            dist_to_end_of_path,
            new_goal_flag,
            path_collides: self.state.path_s == PathState::Collides,
            dist_to_collision: self.coll_idx.map(|i| i as f64 * self.cfg.interp_res),
            divergent_dist: self.last_divergent_dist,
            projection_distance: self.tracker.last_projection_distance,
            has_stored_path: self.active_path.is_some(),
        };
        let decision = should_replan(&self.cfg, &replan_inputs, waypoint_trigger);

        if decision.invalidate_path {
            self.active_path = None;
        }

        if decision.replan {
            self.tracker.distance_since_last_replanning = 0.0;

            if !env_refreshed_this_tick {
                self.refresh_env(time_seconds, ego_index, &minipatches);
            }

            let goal_patch = self.goal_manager.goals().active_patch.unwrap_or(ego_patch);
            let global_goal_node = self.planner.create_node(goal_patch, 0.0);

            let current_goal_node = if self.cfg.waypoint_type == WaypointType::CoarsePath
                && self.distance_to_goal > self.cfg.max_dist4waypoints
            {
                self.active_coarse_path
                    .as_ref()
                    .and_then(|coarse| self.extract_waypoint(coarse))
                    .unwrap_or(global_goal_node)
            } else {
                global_goal_node
            };

            let shift = select_shift(
                &self.cfg,
                ego_node,
                self.active_path.as_ref(),
                self.tracker.index_on_path,
                self.last_divergent_dist,
                self.coll_idx,
                dist_to_end_of_path,
                self.vehicle.wheelbase(),
            );

            let do_analytic = self.state.goal_s == GoalApproach::ExactGoal;
            let planned = self.planner.plan(
                ego_node,
                shift.plan_start,
                current_goal_node,
                self.to_final_pose,
                do_analytic,
            );

            match planned {
                None => {
                    if self.active_path.is_none() {
                        log_warning("planner returned no path and none is retained");
                    } else {
                        log_warning("planner returned no path, keeping previous path");
                    }
                }
                Some(new_path) => {
                    self.active_path = Some(self.splice(new_path, shift.shift_idx));
                    self.tracker.index_on_path = 0;
                    self.path_id = self.tick_index;
                    self.state.repl_s = ReplanState::Cyclic;
                }
            }
        }

        if self.active_path.is_some() {
            let ego_patch = to_patch(self.ego_global, self.patch_of().origin_global);
            let goal_patch = self.goal_manager.goals().active_patch;
            if let Some(goal_patch) = goal_patch {
                let remaining = self
                    .active_path
                    .as_ref()
                    .map(|p| p.len().saturating_sub(self.tracker.index_on_path))
                    .unwrap_or(0);
                if self
                    .tracker
                    .is_goal_reached(ego_patch, goal_patch, remaining, &self.cfg)
                {
                    log_success("goal reached");
                    self.time_goal_reached = Some(time_seconds);
                    self.reset_data();
                }
            }
        }

        self.cycle_times.push(CycleTimeSample {
            planning_cycle: std::time::Duration::from_secs(0),
            kinematic_cycle: std::time::Duration::from_secs(0),
        });
        self.tick_index += 1;

        let global_path = self.active_path.as_ref().map(|p| Path {
            samples: p
                .samples
                .iter()
                .map(|s| {
                    let g = to_global(Pose::new(s.x, s.y, s.yaw), self.patch_of().origin_global);
                    crate::types::PathSample {
                        x: g.x,
                        y: g.y,
                        yaw: g.yaw,
                        direction: s.direction,
                        sample_type: s.sample_type,
                    }
                })
                .collect(),
            cost: p.cost,
        });

        (global_path, self.path_id)
    }

    /// Splice `stored[ego_index..ego_index+shift_idx]` onto the front of
    /// `new_path`, blending cost by the spliced fraction (section 4.8.g).
    fn splice(&self, new_path: Path, shift_idx: usize) -> Path {
        let stored = match &self.active_path {
            None => return new_path,
            Some(p) => p,
        };
        if shift_idx == 0 || stored.is_empty() {
            return new_path;
        }
        let start = self.tracker.index_on_path;
        let end = (start + shift_idx).min(stored.len());
        let prefix = &stored.samples[start..end];
        let prefix_len = prefix.len() as f64;
        let stored_total = stored.len() as f64;

        let mut samples = prefix.to_vec();
        samples.extend(new_path.samples.iter().copied());

        let cost = stored.cost * (prefix_len / stored_total) + new_path.cost;

        Path { samples, cost }
    }
}
