use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Chicken,
    Goose,
    Turkey,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Chicken, Species::Goose, Species::Turkey];

    pub fn name(self) -> &'static str {
        match self {
            Species::Chicken => "chicken",
            Species::Goose => "goose",
            Species::Turkey => "turkey",
        }
    }

    /// Weight of a chick, independent of how well it is fed.
    pub fn child_weight(self) -> f64 {
        match self {
            Species::Chicken => 0.5,
            Species::Goose => 1.0,
            Species::Turkey => 1.5,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Coarse lifecycle bucket. Ordering follows the only legal direction of
/// travel: child, adult, old.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeCategory {
    Child,
    Adult,
    Old,
}

impl AgeCategory {
    pub const CHILD_MAX_MINUTES: u32 = 2;
    pub const ADULT_MAX_MINUTES: u32 = 10;

    pub fn from_age_minutes(minutes: u32) -> Self {
        if minutes <= Self::CHILD_MAX_MINUTES {
            AgeCategory::Child
        } else if minutes <= Self::ADULT_MAX_MINUTES {
            AgeCategory::Adult
        } else {
            AgeCategory::Old
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgeCategory::Child => "child",
            AgeCategory::Adult => "adult",
            AgeCategory::Old => "old",
        };
        f.write_str(label)
    }
}

/// Weight range in kilograms for a fully grown bird.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

const fn kg(min: f64, max: f64) -> WeightRange {
    WeightRange { min, max }
}

/// Returns the weight range for grown birds; `None` for children, which
/// carry the nominal [`Species::child_weight`] instead.
pub fn weight_range(species: Species, age: AgeCategory, gender: Gender) -> Option<WeightRange> {
    use AgeCategory::*;
    use Gender::*;
    use Species::*;
    let range = match (species, age, gender) {
        (_, Child, _) => return None,
        (Chicken, Adult, Male) => kg(2.0, 4.0),
        (Chicken, Adult, Female) => kg(1.5, 3.0),
        (Chicken, Old, Male) => kg(1.8, 3.5),
        (Chicken, Old, Female) => kg(1.4, 2.6),
        (Goose, Adult, Male) => kg(5.0, 7.0),
        (Goose, Adult, Female) => kg(4.0, 6.0),
        (Goose, Old, Male) => kg(4.5, 6.5),
        (Goose, Old, Female) => kg(3.5, 5.5),
        (Turkey, Adult, Male) => kg(9.0, 14.0),
        (Turkey, Adult, Female) => kg(5.0, 8.0),
        (Turkey, Old, Male) => kg(8.0, 12.0),
        (Turkey, Old, Female) => kg(4.5, 7.0),
    };
    Some(range)
}

/// Interpolates the weight by how full the bird is, rounded to grams of ten.
pub fn weight_for(species: Species, age: AgeCategory, gender: Gender, food: u8) -> f64 {
    match weight_range(species, age, gender) {
        None => species.child_weight(),
        Some(WeightRange { min, max }) => {
            let raw = min + (max - min) * (f64::from(food) / 100.0);
            (raw * 100.0).round() / 100.0
        }
    }
}
