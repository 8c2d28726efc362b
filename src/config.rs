use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::species::{Gender, Species};

fn default_seed() -> u64 {
    7
}

fn default_starting_money() -> u64 {
    100
}

fn default_starting_food() -> u64 {
    50
}

fn default_max_frame_secs() -> f64 {
    1.0
}

fn default_grace_secs() -> u32 {
    10
}

fn default_senescence_chance() -> f64 {
    0.5
}

fn default_behaviour_weights() -> [f64; 3] {
    [0.2, 0.6, 0.2]
}

fn default_food_decay_secs() -> u32 {
    2
}

fn default_feed_cooldown_secs() -> u32 {
    2
}

fn default_care_interval_secs() -> u32 {
    10
}

fn default_egg_interval_secs() -> u32 {
    30
}

fn default_behaviour_interval_secs() -> u32 {
    5
}

fn default_death_removal_secs() -> f64 {
    2.0
}

fn default_sale_removal_secs() -> f64 {
    1.0
}

fn default_food_buy_price() -> u64 {
    2
}

fn default_food_sell_price() -> u64 {
    1
}

fn default_egg_buy_prices() -> BTreeMap<Species, u64> {
    BTreeMap::from([
        (Species::Chicken, 10),
        (Species::Goose, 20),
        (Species::Turkey, 30),
    ])
}

fn default_egg_sell_prices() -> BTreeMap<Species, u64> {
    BTreeMap::from([
        (Species::Chicken, 5),
        (Species::Goose, 10),
        (Species::Turkey, 15),
    ])
}

fn default_child_payout() -> u64 {
    20
}

fn default_adult_payout() -> u64 {
    50
}

fn default_feed_portion() -> u8 {
    10
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("behaviour weights must be non-negative and sum above zero")]
    BehaviourWeights,
    #[error("senescence chance {0} is outside [0, 1]")]
    SenescenceChance(f64),
    #[error("max frame length must be positive and finite, got {0}")]
    MaxFrame(f64),
    #[error("{0} must be finite and not negative, got {1}")]
    RemovalDelay(&'static str, f64),
    #[error("no egg price configured for {0}")]
    MissingEggPrice(Species),
}

/// A farm scenario: seed, opening stock and every tunable of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmConfig {
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_starting_money")]
    pub starting_money: u64,
    #[serde(default = "default_starting_food")]
    pub starting_food: u64,
    #[serde(default)]
    pub starting_eggs: BTreeMap<Species, u64>,
    #[serde(default)]
    pub flock: Vec<StockEntry>,
    #[serde(default = "default_max_frame_secs")]
    pub max_frame_secs: f64,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub prices: PriceList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub species: Species,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Rolled from the hatchery stream when omitted.
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_grace_secs")]
    pub starvation_grace_secs: u32,
    #[serde(default = "default_senescence_chance")]
    pub senescence_chance: f64,
    /// Idle, walk, peck.
    #[serde(default = "default_behaviour_weights")]
    pub behaviour_weights: [f64; 3],
    #[serde(default = "default_food_decay_secs")]
    pub food_decay_secs: u32,
    #[serde(default = "default_feed_cooldown_secs")]
    pub feed_cooldown_secs: u32,
    #[serde(default = "default_care_interval_secs")]
    pub care_interval_secs: u32,
    #[serde(default = "default_egg_interval_secs")]
    pub egg_interval_secs: u32,
    #[serde(default = "default_behaviour_interval_secs")]
    pub behaviour_interval_secs: u32,
    #[serde(default = "default_death_removal_secs")]
    pub death_removal_secs: f64,
    #[serde(default = "default_sale_removal_secs")]
    pub sale_removal_secs: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            starvation_grace_secs: default_grace_secs(),
            senescence_chance: default_senescence_chance(),
            behaviour_weights: default_behaviour_weights(),
            food_decay_secs: default_food_decay_secs(),
            feed_cooldown_secs: default_feed_cooldown_secs(),
            care_interval_secs: default_care_interval_secs(),
            egg_interval_secs: default_egg_interval_secs(),
            behaviour_interval_secs: default_behaviour_interval_secs(),
            death_removal_secs: default_death_removal_secs(),
            sale_removal_secs: default_sale_removal_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceList {
    #[serde(default = "default_food_buy_price")]
    pub food_buy: u64,
    #[serde(default = "default_food_sell_price")]
    pub food_sell: u64,
    #[serde(default = "default_egg_buy_prices")]
    pub egg_buy: BTreeMap<Species, u64>,
    #[serde(default = "default_egg_sell_prices")]
    pub egg_sell: BTreeMap<Species, u64>,
    #[serde(default = "default_child_payout")]
    pub child_payout: u64,
    #[serde(default = "default_adult_payout")]
    pub adult_payout: u64,
    #[serde(default)]
    pub old_payout: u64,
    /// Most food a single feed action hands out.
    #[serde(default = "default_feed_portion")]
    pub feed_portion: u8,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            food_buy: default_food_buy_price(),
            food_sell: default_food_sell_price(),
            egg_buy: default_egg_buy_prices(),
            egg_sell: default_egg_sell_prices(),
            child_payout: default_child_payout(),
            adult_payout: default_adult_payout(),
            old_payout: 0,
            feed_portion: default_feed_portion(),
        }
    }
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            name: "farm".to_string(),
            seed: default_seed(),
            starting_money: default_starting_money(),
            starting_food: default_starting_food(),
            starting_eggs: BTreeMap::new(),
            flock: Vec::new(),
            max_frame_secs: default_max_frame_secs(),
            lifecycle: LifecycleConfig::default(),
            prices: PriceList::default(),
        }
    }
}

impl FarmConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: FarmConfig = serde_yaml::from_str(text).context("Failed to parse farm config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = &self.lifecycle.behaviour_weights;
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::BehaviourWeights);
        }
        let chance = self.lifecycle.senescence_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::SenescenceChance(chance));
        }
        if !(self.max_frame_secs.is_finite() && self.max_frame_secs > 0.0) {
            return Err(ConfigError::MaxFrame(self.max_frame_secs));
        }
        for (name, secs) in [
            ("death_removal_secs", self.lifecycle.death_removal_secs),
            ("sale_removal_secs", self.lifecycle.sale_removal_secs),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(ConfigError::RemovalDelay(name, secs));
            }
        }
        for species in Species::ALL {
            if !self.prices.egg_buy.contains_key(&species)
                || !self.prices.egg_sell.contains_key(&species)
            {
                return Err(ConfigError::MissingEggPrice(species));
            }
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<FarmConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read farm config {}", path.display()))?;
        FarmConfig::from_yaml(&data).with_context(|| format!("Invalid farm config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_takes_defaults() {
        let config = FarmConfig::from_yaml("name: tiny\n").unwrap();
        assert_eq!(config.name, "tiny");
        assert_eq!(config.seed, 7);
        assert_eq!(config.lifecycle, LifecycleConfig::default());
        assert_eq!(config.prices, PriceList::default());
        assert!(config.flock.is_empty());
    }

    #[test]
    fn flock_entries_parse() {
        let yaml = r#"
name: coop
flock:
  - species: goose
    count: 2
    gender: female
    age_minutes: 4
  - species: turkey
"#;
        let config = FarmConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.flock.len(), 2);
        assert_eq!(config.flock[0].gender, Some(Gender::Female));
        assert_eq!(config.flock[1].count, 1);
        assert_eq!(config.flock[1].gender, None);
    }

    #[test]
    fn rejects_bad_senescence() {
        let mut config = FarmConfig::default();
        config.lifecycle.senescence_chance = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::SenescenceChance(1.5)));
    }

    #[test]
    fn rejects_missing_egg_price() {
        let mut config = FarmConfig::default();
        config.prices.egg_sell.remove(&Species::Goose);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingEggPrice(Species::Goose))
        );
    }

    #[test]
    fn rejects_nan_frame_cap() {
        let err = FarmConfig::from_yaml("name: x\nmax_frame_secs: .nan\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MaxFrame(v)) if v.is_nan()
        ));
        assert!(FarmConfig::from_yaml("name: x\nmax_frame_secs: .inf\n").is_err());
    }

    #[test]
    fn rejects_nan_removal_delays() {
        for field in ["death_removal_secs", "sale_removal_secs"] {
            let yaml = format!("name: x\nlifecycle:\n  {field}: .nan\n");
            let err = FarmConfig::from_yaml(&yaml).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<ConfigError>(),
                    Some(ConfigError::RemovalDelay(name, v)) if *name == field && v.is_nan()
                ),
                "{field}: {err:#}"
            );
        }
        let mut config = FarmConfig::default();
        config.lifecycle.sale_removal_secs = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::RemovalDelay("sale_removal_secs", -1.0))
        );
    }

    #[test]
    fn rejects_nan_behaviour_weight() {
        let mut config = FarmConfig::default();
        config.lifecycle.behaviour_weights = [f64::NAN, 1.0, 1.0];
        assert_eq!(config.validate(), Err(ConfigError::BehaviourWeights));
    }
}
