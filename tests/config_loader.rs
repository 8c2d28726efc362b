use std::fs;

use poultry_farm::{
    config::{ConfigLoader, FarmConfig},
    engine::{GameLoopBuilder, ScriptStep},
    species::Species,
};
use tempfile::tempdir;

fn loader() -> ConfigLoader {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn starter_farm_loads() {
    let config = loader()
        .load("scenarios/starter_farm.yaml")
        .expect("starter farm parses");
    assert_eq!(config.name, "starter_farm");
    assert_eq!(config.flock.len(), 3);
    assert_eq!(config.starting_eggs.get(&Species::Chicken), Some(&2));

    let game = GameLoopBuilder::new(config).build();
    assert_eq!(game.farm().state().poultry_count(), 6);
}

#[test]
fn invalid_farm_is_rejected_with_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "name: broken\nmax_frame_secs: 0\n").unwrap();

    let err = ConfigLoader::new(dir.path())
        .load("broken.yaml")
        .expect_err("zero frame length is invalid");
    assert!(format!("{err:#}").contains("broken.yaml"));
}

#[test]
fn demo_script_runs_every_step() {
    let config: FarmConfig = loader().load("scenarios/starter_farm.yaml").unwrap();
    let data = fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/scenarios/demo_script.yaml"
    ))
    .unwrap();
    let steps: Vec<ScriptStep> = serde_yaml::from_str(&data).unwrap();
    assert_eq!(steps.len(), 5);

    let mut game = GameLoopBuilder::new(config).build();
    let records = game.run_scripted(150.0, 30, &steps);
    assert_eq!(records.len(), 5);
    for record in &records {
        assert!(
            record.outcome.is_applied(),
            "{} at {}s was ignored: {:?}",
            record.action.name(),
            record.at_secs,
            record.outcome
        );
    }
}
