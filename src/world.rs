//! Coordinator-owned state: the agent arena, the shared navigation grid,
//! the capped message log, and the town calendar.

use std::collections::VecDeque;

use serde::Serialize;

use crate::agent::Agent;
use crate::grid::{NavGrid, Point, Rect};

/// Hard cap on retained messages; oldest entries are dropped first.
pub const MESSAGE_CAP: usize = 20;

/// Minutes added to the calendar per tick / manual step.
pub const CLOCK_STEP_MIN: u32 = 30;

const DAY_START_HOUR: u32 = 8;

/// Rectangle agents are clamped into while moving. Leaves a margin for the
/// map border and the HUD strip along the top.
#[derive(Debug, Clone, Copy)]
pub struct WalkBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl WalkBounds {
    pub fn for_map(width: f64, height: f64) -> Self {
        Self {
            min_x: 50.0,
            max_x: width - 50.0,
            min_y: 150.0,
            max_y: height - 100.0,
        }
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }
}

/// Town calendar: starts day 1 at 08:00, advances in fixed 30-minute
/// steps, and wraps 24:00 to the next day's 08:00.
#[derive(Debug, Clone, Copy)]
pub struct GameClock {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    elapsed_min: f64,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            day: 1,
            hour: DAY_START_HOUR,
            minute: 0,
            elapsed_min: 0.0,
        }
    }

    pub fn advance_step(&mut self) {
        self.elapsed_min += CLOCK_STEP_MIN as f64;
        self.minute += CLOCK_STEP_MIN;
        if self.minute >= 60 {
            self.minute -= 60;
            self.hour += 1;
        }
        if self.hour >= 24 {
            self.hour = DAY_START_HOUR;
            self.day += 1;
        }
    }

    /// Total simulated minutes since the run began.
    pub fn elapsed_min(&self) -> f64 {
        self.elapsed_min
    }

    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Calendar stamp used on messages, e.g. `Day 2 09:30`.
    pub fn stamp(&self) -> String {
        format!("Day {} {}", self.day, self.time_label())
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// One symbolic exchange between two agents.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub emojis: [String; 2],
    pub intent: String,
    pub timestamp: String,
}

/// The sender-side echo of the latest message, surfaced per agent.
#[derive(Debug, Clone, Serialize)]
pub struct LastMessage {
    pub emojis: [String; 2],
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub role: String,
    pub position: Point,
    pub activity: String,
    pub energy: f64,
    pub social: f64,
    pub hunger: f64,
    pub memory_count: usize,
    pub last_message: Option<LastMessage>,
}

/// Read-only view of the whole simulation, refreshed every tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub day: u32,
    pub time: String,
    pub running: bool,
    pub agents: Vec<AgentSnapshot>,
    pub messages: Vec<Message>,
}

/// The simulation coordinator's state. Agents live in an arena and are
/// addressed by index; the grid is shared read-only within a tick and only
/// rebuilt wholesale by [`World::set_obstacles`].
pub struct World {
    scenario: String,
    tick: u64,
    pub clock: GameClock,
    pub running: bool,
    pub grid: NavGrid,
    pub walk_bounds: WalkBounds,
    agents: Vec<Agent>,
    messages: VecDeque<Message>,
}

impl World {
    pub fn new(scenario: impl Into<String>, width: f64, height: f64, cell_size: f64) -> Self {
        Self {
            scenario: scenario.into(),
            tick: 0,
            clock: GameClock::new(),
            running: false,
            grid: NavGrid::new(width, height, cell_size),
            walk_bounds: WalkBounds::for_map(width, height),
            agents: Vec::new(),
            messages: VecDeque::new(),
        }
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ends one tick: bumps the counter and the calendar.
    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.clock.advance_step();
    }

    pub fn now_min(&self) -> f64 {
        self.clock.elapsed_min()
    }

    /// Rebuilds the grid's obstacle state from the supplied layout.
    pub fn set_obstacles(&mut self, buildings: &[Rect], water: &[Rect]) {
        self.grid.update_obstacles(buildings, water);
    }

    pub fn spawn_agent(&mut self, agent: Agent) -> usize {
        self.agents.push(agent);
        self.agents.len() - 1
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        &mut self.agents[index]
    }

    /// Shared grid plus mutable agents, for updates that path-find while
    /// mutating agent state.
    pub fn nav_and_agents(&mut self) -> (&NavGrid, &mut [Agent]) {
        (&self.grid, &mut self.agents)
    }

    /// Disjoint mutable borrows of two distinct agents.
    pub fn agent_pair_mut(&mut self, a: usize, b: usize) -> (&mut Agent, &mut Agent) {
        assert_ne!(a, b, "agent pair must be distinct");
        if a < b {
            let (left, right) = self.agents.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.agents.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Logs a message, evicting the oldest past [`MESSAGE_CAP`], and echoes
    /// it onto the sender's `last_message`.
    pub fn push_message(&mut self, message: Message) {
        if let Some(sender) = self.agents.iter_mut().find(|a| a.id == message.from) {
            sender.last_message = Some(LastMessage {
                emojis: message.emojis.clone(),
                timestamp: message.timestamp.clone(),
            });
        }
        self.messages.push_back(message);
        while self.messages.len() > MESSAGE_CAP {
            self.messages.pop_front();
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            scenario: self.scenario.clone(),
            tick: self.tick,
            day: self.clock.day,
            time: self.clock.time_label(),
            running: self.running,
            agents: self
                .agents
                .iter()
                .map(|agent| AgentSnapshot {
                    id: agent.id.clone(),
                    name: agent.name.clone(),
                    role: agent.role.clone(),
                    position: agent.position,
                    activity: agent.activity.clone(),
                    energy: agent.energy,
                    social: agent.social,
                    hunger: agent.hunger,
                    memory_count: agent.memories.len(),
                    last_message: agent.last_message.clone(),
                })
                .collect(),
            messages: self.messages.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Point;

    fn message(n: usize) -> Message {
        Message {
            from: "handyman-bob".to_string(),
            to: "farmer-joe".to_string(),
            emojis: ["👋".to_string(), "😊".to_string()],
            intent: "communication".to_string(),
            timestamp: format!("Day 1 08:{n:02}"),
        }
    }

    fn town() -> World {
        World::new("test_town", 800.0, 600.0, 20.0)
    }

    #[test]
    fn clock_rolls_over_to_next_morning() {
        let mut clock = GameClock::new();
        assert_eq!(clock.stamp(), "Day 1 08:00");
        // 32 half-hour steps: 08:00 + 16h hits 24:00, which wraps to 08:00
        // on day 2.
        for _ in 0..32 {
            clock.advance_step();
        }
        assert_eq!(clock.day, 2);
        assert_eq!(clock.time_label(), "08:00");
        assert_eq!(clock.elapsed_min(), 960.0);
    }

    #[test]
    fn clock_half_hours_format_correctly() {
        let mut clock = GameClock::new();
        clock.advance_step();
        assert_eq!(clock.time_label(), "08:30");
        clock.advance_step();
        assert_eq!(clock.time_label(), "09:00");
    }

    #[test]
    fn message_log_caps_at_twenty() {
        let mut world = town();
        for n in 0..21 {
            world.push_message(message(n));
        }
        assert_eq!(world.messages().count(), MESSAGE_CAP);
        let first = world.messages().next().unwrap();
        assert_eq!(first.timestamp, "Day 1 08:01", "oldest entry evicted");
    }

    #[test]
    fn push_message_echoes_to_sender() {
        let mut world = town();
        world.spawn_agent(Agent::new(
            "handyman-bob",
            "Bob",
            "handyman",
            "Fixes things",
            Point::new(120.0, 170.0),
            Vec::new(),
        ));
        world.push_message(message(0));
        let bob = world.agent(0);
        let echo = bob.last_message.as_ref().unwrap();
        assert_eq!(echo.emojis[0], "👋");
    }

    #[test]
    fn pair_borrow_is_order_independent() {
        let mut world = town();
        for (id, name) in [("a-1", "Ann"), ("b-2", "Ben")] {
            world.spawn_agent(Agent::new(
                id,
                name,
                "farmer",
                "test",
                Point::new(0.0, 0.0),
                Vec::new(),
            ));
        }
        let (x, y) = world.agent_pair_mut(1, 0);
        assert_eq!(x.name, "Ben");
        assert_eq!(y.name, "Ann");
    }

    #[test]
    fn snapshot_reports_every_agent() {
        let mut world = town();
        world.spawn_agent(Agent::new(
            "farmer-joe",
            "Joe",
            "farmer",
            "Grows crops",
            Point::new(500.0, 440.0),
            Vec::new(),
        ));
        world.advance_time();
        let snapshot = world.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].id, "farmer-joe");
        assert_eq!(snapshot.agents[0].memory_count, 1);
        assert_eq!(snapshot.time, "08:30");
    }
}
