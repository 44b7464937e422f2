//! The agent aggregate: role goals, hierarchical plans, plan execution,
//! and grid-guided movement.
//!
//! One agent owns exactly one memory stream and at most one active plan.
//! Plan execution follows a small state machine: no plan -> planning ->
//! executing -> completed (plan cleared), after which planning becomes
//! eligible again.

use rand::Rng;
use serde::Serialize;

use crate::grid::{NavGrid, Point};
use crate::memory::{Memory, MemoryKind, MemoryStream};
use crate::world::{LastMessage, WalkBounds};

/// World units per tick while following a path.
const MOVE_SPEED: f64 = 2.0;
/// A waypoint closer than this counts as reached.
const WAYPOINT_RADIUS: f64 = 10.0;
/// A plan target closer than this needs no further travel.
const ARRIVAL_RADIUS: f64 = 30.0;
/// Target drift beyond this forces a fresh path request.
const REPLAN_DRIFT: f64 = 20.0;
/// Per-tick chance of advancing to the next plan step.
const STEP_ADVANCE_CHANCE: f64 = 0.1;
/// Per-tick chance of an ambient observation.
const AMBIENT_OBSERVATION_CHANCE: f64 = 0.02;

const ENERGY_DECAY: f64 = 0.1;
const HUNGER_DECAY: f64 = 0.05;
/// Work goals need at least this much energy.
const WORK_ENERGY_FLOOR: f64 = 30.0;
/// Social goals stop appealing above this social level.
const SOCIAL_CEILING: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Work,
    Social,
    Personal,
    Exploration,
}

/// A role-flavored desire. Goals are static inputs to plan selection; they
/// are never consumed or mutated.
#[derive(Debug, Clone)]
pub struct Goal {
    pub kind: GoalKind,
    pub description: String,
    pub priority: u8,
    pub target: Option<Point>,
}

impl Goal {
    fn new(kind: GoalKind, description: &str, priority: u8, target: Option<Point>) -> Self {
        Self {
            kind,
            description: description.to_string(),
            priority,
            target,
        }
    }
}

/// An ordered list of sub-step labels with a cursor. Terminal once the
/// cursor passes the last step.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub description: String,
    pub steps: Vec<String>,
    pub current_step: usize,
    pub target: Option<Point>,
    pub priority: u8,
}

impl Plan {
    pub fn current(&self) -> Option<&str> {
        self.steps.get(self.current_step).map(String::as_str)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.steps.len()
    }
}

/// An autonomous townsperson.
pub struct Agent {
    /// Stable external identifier, e.g. `handyman-bob`.
    pub id: String,
    pub name: String,
    pub role: String,
    pub description: String,
    pub position: Point,
    /// Activity labels the drift tick cycles through.
    pub routine: Vec<String>,

    pub plan: Option<Plan>,
    goals: Vec<Goal>,
    pub memories: MemoryStream,

    pub energy: f64,
    pub social: f64,
    pub hunger: f64,
    pub activity: String,
    pub last_reflection_min: f64,
    pub last_message: Option<LastMessage>,

    path: Vec<Point>,
    path_cursor: usize,
    requested_target: Option<Point>,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
        position: Point,
        routine: Vec<String>,
    ) -> Self {
        let name = name.into();
        let role = role.into();
        let description = description.into();
        let mut agent = Self {
            id: id.into(),
            name: name.clone(),
            role: role.clone(),
            description: description.clone(),
            position,
            routine,
            plan: None,
            goals: role_goals(&role),
            memories: MemoryStream::new(),
            energy: 100.0,
            social: 50.0,
            hunger: 50.0,
            activity: "idle".to_string(),
            last_reflection_min: 0.0,
            last_message: None,
            path: Vec::new(),
            path_cursor: 0,
            requested_target: None,
        };
        agent.record(
            format!("I am {name}, the {role}. {description}"),
            MemoryKind::Reflection,
            9,
            Vec::new(),
            0.0,
        );
        agent
    }

    /// Appends a memory located at the agent's current position.
    pub fn record(
        &mut self,
        description: String,
        kind: MemoryKind,
        importance: u8,
        related: Vec<String>,
        now_min: f64,
    ) {
        let location = self.position;
        self.memories.record(Memory::new(
            description,
            kind,
            importance,
            related,
            location,
            now_min,
        ));
    }

    /// One cognitive tick: decay needs, run the plan state machine, reflect
    /// when due, and occasionally note the surroundings.
    pub fn update(
        &mut self,
        grid: &NavGrid,
        bounds: &WalkBounds,
        rng: &mut impl Rng,
        now_min: f64,
    ) -> anyhow::Result<()> {
        self.decay_needs();
        self.execute_plan(grid, bounds, rng, now_min);

        let themes = self
            .memories
            .reflect(&self.role, now_min, self.last_reflection_min);
        if !themes.is_empty() {
            let position = self.position;
            self.memories.record_reflections(themes, position, now_min);
            self.last_reflection_min = now_min;
        }

        if rng.gen::<f64>() < AMBIENT_OBSERVATION_CHANCE {
            self.ambient_observation(rng, now_min);
        }
        Ok(())
    }

    pub fn decay_needs(&mut self) {
        self.energy = (self.energy - ENERGY_DECAY).max(0.0);
        self.hunger = (self.hunger - HUNGER_DECAY).max(0.0);
    }

    /// Runs the current plan step, or starts planning when no plan exists.
    pub fn execute_plan(
        &mut self,
        grid: &NavGrid,
        bounds: &WalkBounds,
        rng: &mut impl Rng,
        now_min: f64,
    ) {
        if self.plan.is_none() {
            self.plan_next_action(now_min);
            return;
        }

        let step = self
            .plan
            .as_ref()
            .and_then(|p| p.current().map(str::to_string));
        let step = match step {
            Some(step) => step,
            None => {
                self.plan = None;
                return;
            }
        };
        self.activity = step;

        if let Some(target) = self.plan.as_ref().and_then(|p| p.target) {
            if self.position.distance(target) >= ARRIVAL_RADIUS {
                self.move_toward(target, grid, bounds);
            }
        }

        // Stochastic dwell time per step rather than a fixed duration.
        if rng.gen::<f64>() < STEP_ADVANCE_CHANCE {
            let finished = match self.plan.as_mut() {
                Some(plan) => {
                    plan.current_step += 1;
                    plan.is_finished().then(|| plan.description.clone())
                }
                None => None,
            };
            if let Some(description) = finished {
                self.plan = None;
                self.record(
                    format!("Completed plan: {description}"),
                    MemoryKind::Observation,
                    4,
                    Vec::new(),
                    now_min,
                );
            }
        }
    }

    /// Picks the highest-priority eligible goal and instantiates its plan
    /// template, falling back to an idle plan.
    pub fn plan_next_action(&mut self, now_min: f64) {
        if self.plan.as_ref().map(|p| !p.is_finished()).unwrap_or(false) {
            return;
        }
        match self.select_goal() {
            Some(goal) => self.create_plan_for(goal, now_min),
            None => self.create_idle_plan(),
        }
    }

    fn select_goal(&self) -> Option<Goal> {
        let mut eligible: Vec<&Goal> = self
            .goals
            .iter()
            .filter(|goal| match goal.kind {
                GoalKind::Work => self.energy >= WORK_ENERGY_FLOOR,
                GoalKind::Social => self.social <= SOCIAL_CEILING,
                _ => true,
            })
            .collect();
        eligible.sort_by(|a, b| b.priority.cmp(&a.priority));
        eligible.first().map(|g| (*g).clone())
    }

    fn create_plan_for(&mut self, goal: Goal, now_min: f64) {
        let (steps, target) = match goal.kind {
            GoalKind::Work => (
                vec![
                    "Prepare for work",
                    "Travel to work location",
                    "Perform work tasks",
                    "Complete work activities",
                ],
                goal.target,
            ),
            GoalKind::Social => (
                vec![
                    "Look for people to talk to",
                    "Approach someone",
                    "Have a conversation",
                ],
                // Default social venue is the town square.
                goal.target.or(Some(Point::new(400.0, 300.0))),
            ),
            GoalKind::Personal => (vec!["Take care of personal needs", "Rest if needed"], None),
            GoalKind::Exploration => (vec!["Explore the town", "Observe surroundings"], None),
        };

        self.plan = Some(Plan {
            description: goal.description.clone(),
            steps: steps.into_iter().map(str::to_string).collect(),
            current_step: 0,
            target,
            priority: goal.priority,
        });
        self.record(
            format!("Made plan: {}", goal.description),
            MemoryKind::Plan,
            5,
            Vec::new(),
            now_min,
        );
    }

    fn create_idle_plan(&mut self) {
        self.plan = Some(Plan {
            description: "Taking a break".to_string(),
            steps: vec![
                "Look around".to_string(),
                "Rest briefly".to_string(),
                "Think about the day".to_string(),
            ],
            current_step: 0,
            target: None,
            priority: 1,
        });
    }

    /// Follows (and when needed, refreshes) the path toward `target`.
    ///
    /// A new smoothed path is requested only when none exists or the target
    /// has drifted more than [`REPLAN_DRIFT`] units since the last request;
    /// an unreachable target simply leaves the agent in place.
    pub fn move_toward(&mut self, target: Point, grid: &NavGrid, bounds: &WalkBounds) {
        let drifted = match self.requested_target {
            Some(prev) => {
                (prev.x - target.x).abs() > REPLAN_DRIFT || (prev.y - target.y).abs() > REPLAN_DRIFT
            }
            None => true,
        };
        if drifted {
            self.requested_target = Some(target);
            self.path = grid.smooth_path(grid.find_path(self.position, target));
            self.path_cursor = 0;
        }

        let waypoint = match self.path.get(self.path_cursor) {
            Some(p) => *p,
            None => return,
        };
        let distance = self.position.distance(waypoint);
        if distance < WAYPOINT_RADIUS {
            self.path_cursor += 1;
        } else {
            let step_x = (waypoint.x - self.position.x) / distance * MOVE_SPEED;
            let step_y = (waypoint.y - self.position.y) / distance * MOVE_SPEED;
            self.position = bounds.clamp(Point::new(
                self.position.x + step_x,
                self.position.y + step_y,
            ));
        }
    }

    /// Records a sighting of another agent, tagged with a coarse location.
    pub fn observe(&mut self, other_name: &str, other_position: Point, now_min: f64) {
        let label = location_label(other_position);
        self.record(
            format!("I saw {other_name} at the {label}"),
            MemoryKind::Observation,
            4,
            vec![other_name.to_string()],
            now_min,
        );
    }

    fn ambient_observation(&mut self, rng: &mut impl Rng, now_min: f64) {
        let phrasings = [
            "I notice the weather is pleasant today".to_string(),
            "The town square looks busy".to_string(),
            "I can hear activity from other buildings".to_string(),
            format!("It's a good day for {} work", self.role),
            "I should check on my tasks soon".to_string(),
        ];
        let pick = rng.gen_range(0..phrasings.len());
        self.record(
            phrasings[pick].clone(),
            MemoryKind::Observation,
            3,
            Vec::new(),
            now_min,
        );
    }
}

/// Coarse place names for observation memories, matching the authored map.
pub fn location_label(p: Point) -> &'static str {
    if p.x > 320.0 && p.x < 480.0 && p.y > 240.0 && p.y < 360.0 {
        "town square"
    } else if p.y < 200.0 {
        "northern area"
    } else if p.y > 400.0 {
        "southern area"
    } else {
        "town center"
    }
}

/// Fixed goal tables per role. Unknown roles get none and fall back to
/// idle plans.
fn role_goals(role: &str) -> Vec<Goal> {
    match role {
        "handyman" => vec![
            Goal::new(
                GoalKind::Work,
                "Check and repair buildings",
                8,
                Some(Point::new(400.0, 300.0)),
            ),
            Goal::new(
                GoalKind::Social,
                "Talk to townspeople about repairs needed",
                6,
                None,
            ),
        ],
        "toolsmith" => vec![
            Goal::new(
                GoalKind::Work,
                "Craft tools at the forge",
                9,
                Some(Point::new(600.0, 170.0)),
            ),
            Goal::new(
                GoalKind::Social,
                "Meet with customers about tool orders",
                7,
                None,
            ),
        ],
        "doctor" => vec![
            Goal::new(GoalKind::Work, "Check on townspeople health", 8, None),
            Goal::new(
                GoalKind::Work,
                "Tend to medicine garden",
                6,
                Some(Point::new(650.0, 150.0)),
            ),
        ],
        "mayor" => vec![
            Goal::new(
                GoalKind::Work,
                "Plan town improvements",
                9,
                Some(Point::new(70.0, 300.0)),
            ),
            Goal::new(
                GoalKind::Social,
                "Meet with citizens",
                8,
                Some(Point::new(400.0, 300.0)),
            ),
        ],
        "farmer" => vec![
            Goal::new(
                GoalKind::Work,
                "Tend to crops",
                9,
                Some(Point::new(200.0, 420.0)),
            ),
            Goal::new(
                GoalKind::Work,
                "Check grain storage",
                7,
                Some(Point::new(580.0, 420.0)),
            ),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::NavGrid;
    use crate::world::WalkBounds;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_agent(role: &str) -> Agent {
        Agent::new(
            format!("{role}-test"),
            "Testa",
            role,
            "A test subject",
            Point::new(400.0, 300.0),
            Vec::new(),
        )
    }

    fn setup() -> (NavGrid, WalkBounds) {
        (
            NavGrid::new(800.0, 600.0, 20.0),
            WalkBounds::for_map(800.0, 600.0),
        )
    }

    #[test]
    fn spawns_with_identity_reflection() {
        let agent = test_agent("farmer");
        assert_eq!(agent.memories.len(), 1);
        let memory = agent.memories.iter().next().unwrap();
        assert_eq!(memory.kind, MemoryKind::Reflection);
        assert_eq!(memory.importance, 9);
        assert!(memory.description.contains("Testa"));
    }

    #[test]
    fn work_goal_needs_energy() {
        let mut agent = test_agent("farmer");
        agent.energy = 20.0;
        agent.plan_next_action(0.0);
        // Farmer has only work goals, so low energy forces the idle plan.
        let plan = agent.plan.as_ref().unwrap();
        assert_eq!(plan.description, "Taking a break");
    }

    #[test]
    fn social_goal_skipped_when_satisfied() {
        let mut agent = test_agent("handyman");
        agent.energy = 10.0; // work ineligible
        agent.social = 90.0; // social ineligible
        agent.plan_next_action(0.0);
        assert_eq!(agent.plan.as_ref().unwrap().description, "Taking a break");
    }

    #[test]
    fn highest_priority_goal_wins() {
        let mut agent = test_agent("mayor");
        agent.plan_next_action(0.0);
        let plan = agent.plan.as_ref().unwrap();
        assert_eq!(plan.description, "Plan town improvements");
        assert_eq!(plan.steps.len(), 4);
        assert_eq!(plan.target, Some(Point::new(70.0, 300.0)));
    }

    #[test]
    fn goal_plan_records_plan_memory() {
        let mut agent = test_agent("toolsmith");
        agent.plan_next_action(0.0);
        assert!(agent
            .memories
            .iter()
            .any(|m| m.kind == MemoryKind::Plan
                && m.description.contains("Craft tools at the forge")));
    }

    #[test]
    fn plan_completion_clears_plan_and_records_memory() {
        let (grid, bounds) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut agent = test_agent("doctor");
        agent.plan = Some(Plan {
            description: "Check on townspeople health".to_string(),
            steps: vec!["Perform work tasks".to_string()],
            current_step: 0,
            target: None,
            priority: 8,
        });

        for _ in 0..500 {
            agent.execute_plan(&grid, &bounds, &mut rng, 10.0);
            if agent.plan.is_none() {
                break;
            }
        }
        assert!(agent.plan.is_none(), "one-step plan should finish");
        assert!(agent
            .memories
            .iter()
            .any(|m| m.description == "Completed plan: Check on townspeople health"
                && m.importance == 4));
    }

    #[test]
    fn execute_sets_activity_from_current_step() {
        let (grid, bounds) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut agent = test_agent("handyman");
        agent.plan_next_action(0.0);
        agent.execute_plan(&grid, &bounds, &mut rng, 0.0);
        assert_ne!(agent.activity, "idle");
    }

    #[test]
    fn movement_advances_toward_target_within_bounds() {
        let (grid, bounds) = setup();
        let mut agent = test_agent("farmer");
        agent.position = Point::new(100.0, 200.0);
        let target = Point::new(600.0, 400.0);
        let start_distance = agent.position.distance(target);

        for _ in 0..50 {
            agent.move_toward(target, &grid, &bounds);
        }
        assert!(agent.position.distance(target) < start_distance);
        assert!(agent.position.x >= 50.0 && agent.position.x <= 750.0);
        assert!(agent.position.y >= 150.0 && agent.position.y <= 500.0);
    }

    #[test]
    fn unreachable_target_leaves_agent_in_place() {
        let (mut grid, bounds) = setup();
        // Box the target in.
        grid.update_obstacles(&[crate::grid::Rect::new(580.0, 380.0, 60.0, 60.0)], &[]);
        let mut agent = test_agent("farmer");
        agent.position = Point::new(100.0, 200.0);
        let before = agent.position;
        agent.move_toward(Point::new(600.0, 400.0), &grid, &bounds);
        assert_eq!(agent.position, before);
    }

    #[test]
    fn needs_decay_and_floor_at_zero() {
        let mut agent = test_agent("farmer");
        agent.energy = 0.05;
        agent.hunger = 0.02;
        agent.decay_needs();
        agent.decay_needs();
        assert_eq!(agent.energy, 0.0);
        assert_eq!(agent.hunger, 0.0);
    }

    #[test]
    fn observation_uses_location_bands() {
        assert_eq!(location_label(Point::new(400.0, 300.0)), "town square");
        assert_eq!(location_label(Point::new(400.0, 150.0)), "northern area");
        assert_eq!(location_label(Point::new(400.0, 450.0)), "southern area");
        assert_eq!(location_label(Point::new(100.0, 300.0)), "town center");

        let mut agent = test_agent("doctor");
        agent.observe("Bob", Point::new(100.0, 450.0), 5.0);
        let last = agent.memories.iter().last().unwrap();
        assert_eq!(last.description, "I saw Bob at the southern area");
        assert_eq!(last.related, vec!["Bob".to_string()]);
    }
}
