use std::path::PathBuf;

use hamlet::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::UpdateMode,
};
use tempfile::tempdir;

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn scenario_path() -> PathBuf {
    PathBuf::from("scenarios/fantasy_town.yaml")
}

fn build_engine(seed: u64, snapshot_dir: PathBuf, snapshot_interval: u64) -> EngineBuilder {
    let settings = EngineSettings {
        scenario_name: "fantasy_town".into(),
        seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    EngineBuilder::new(settings).with_mode(UpdateMode::Cognitive)
}

#[test]
fn engine_runs_deterministically() {
    let loader = scenario_loader();
    let scenario = loader.load(scenario_path()).unwrap();
    let ticks = 60;

    let mut world_a = scenario.build_world();
    let mut engine_a = build_engine(scenario.seed, PathBuf::from("unused_a"), 0).build();
    engine_a.run(&mut world_a, ticks).unwrap();

    let mut world_b = scenario.build_world();
    let mut engine_b = build_engine(scenario.seed, PathBuf::from("unused_b"), 0).build();
    engine_b.run(&mut world_b, ticks).unwrap();

    let a = serde_json::to_value(world_a.snapshot()).unwrap();
    let b = serde_json::to_value(world_b.snapshot()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn engine_runs_hook_each_tick() {
    let loader = scenario_loader();
    let scenario = loader.load(scenario_path()).expect("scenario should load");
    let mut world = scenario.build_world();
    let temp = tempdir().expect("tempdir");
    let mut engine = build_engine(scenario.seed, temp.path().to_path_buf(), 0).build();

    let mut ticks = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |snapshot| ticks.push(snapshot.tick))
        .expect("run succeeds");

    assert_eq!(ticks.len(), 6);
    assert_eq!(ticks.first().copied(), Some(1));
    assert_eq!(ticks.last().copied(), Some(6));
}

#[test]
fn engine_emits_snapshots() {
    let loader = scenario_loader();
    let scenario = loader.load(scenario_path()).unwrap();
    let temp = tempdir().unwrap();
    let snapshot_dir = temp.path().join("snaps");

    let mut world = scenario.build_world();
    let mut engine = build_engine(scenario.seed, snapshot_dir.clone(), 10).build();
    engine.run(&mut world, 30).unwrap();

    let expected = snapshot_dir.join("fantasy_town").join("tick_000010.json");
    assert!(
        expected.exists(),
        "expected snapshot {} to exist",
        expected.display()
    );

    let data = std::fs::read_to_string(expected).unwrap();
    assert!(
        data.contains("\"scenario\": \"fantasy_town\""),
        "snapshot should contain scenario metadata"
    );
}

#[test]
fn clock_advances_thirty_minutes_per_tick() {
    let loader = scenario_loader();
    let scenario = loader.load(scenario_path()).unwrap();
    let mut world = scenario.build_world();
    let temp = tempdir().unwrap();
    let mut engine = build_engine(scenario.seed, temp.path().to_path_buf(), 0).build();

    // 32 half-hour steps wrap the 16-hour day into the next morning.
    engine.run(&mut world, 32).unwrap();
    assert_eq!(world.clock.day, 2);
    assert_eq!(world.clock.time_label(), "08:00");
    assert_eq!(world.now_min(), 960.0);
}
