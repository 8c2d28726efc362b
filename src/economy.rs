//! Player transactions against the farm.
//!
//! Every action either applies in full or leaves the farm untouched. Not
//! having enough money, food or eggs is an ordinary outcome, reported as
//! [`Outcome::Ignored`] rather than an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PriceList;
use crate::farm::Farm;
use crate::registry::EntityId;
use crate::species::{AgeCategory, Species};

/// A player request coming from the HUD, shop or popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    FeedPoultry { entity: EntityId },
    SellPoultry { entity: EntityId },
    BuyFood { value: u64 },
    SellFood { value: u64 },
    BuyEggs { value: u64, species: Species },
    SellEggs { value: u64, species: Species },
    HatchEgg { species: Species },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::FeedPoultry { .. } => "feedPoultry",
            Action::SellPoultry { .. } => "sellPoultry",
            Action::BuyFood { .. } => "buyFood",
            Action::SellFood { .. } => "sellFood",
            Action::BuyEggs { .. } => "buyEggs",
            Action::SellEggs { .. } => "sellEggs",
            Action::HatchEgg { .. } => "hatchEgg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Shortfall {
    Money { needed: u64, available: u64 },
    Food { needed: u64, available: u64 },
    Eggs { species: Species, needed: u64, available: u64 },
    UnknownAnimal { entity: EntityId },
    AnimalDead { entity: EntityId },
    AlreadyFull { entity: EntityId },
    ZeroAmount,
    /// The amounts involved do not fit in a counter.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum Outcome {
    Applied,
    Hatched { entity: EntityId },
    Ignored(Shortfall),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Outcome::Ignored(_))
    }
}

pub struct EconomyController {
    prices: PriceList,
}

impl EconomyController {
    pub fn new(prices: PriceList) -> Self {
        Self { prices }
    }

    pub fn apply(&self, farm: &mut Farm, action: Action) -> Outcome {
        let outcome = match action {
            Action::FeedPoultry { entity } => self.feed_poultry(farm, entity),
            Action::SellPoultry { entity } => self.sell_poultry(farm, entity),
            Action::BuyFood { value } => self.buy_food(farm, value),
            Action::SellFood { value } => self.sell_food(farm, value),
            Action::BuyEggs { value, species } => self.buy_eggs(farm, value, species),
            Action::SellEggs { value, species } => self.sell_eggs(farm, value, species),
            Action::HatchEgg { species } => self.hatch_egg(farm, species),
        };
        match &outcome {
            Outcome::Ignored(shortfall) => {
                tracing::debug!(action = action.name(), ?shortfall, "action ignored")
            }
            _ => tracing::debug!(action = action.name(), "action applied"),
        }
        outcome
    }

    pub fn buy_food(&self, farm: &mut Farm, amount: u64) -> Outcome {
        if amount == 0 {
            return Outcome::Ignored(Shortfall::ZeroAmount);
        }
        let Some(cost) = amount.checked_mul(self.prices.food_buy) else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        let money = farm.state.money();
        if money < cost {
            return Outcome::Ignored(Shortfall::Money {
                needed: cost,
                available: money,
            });
        }
        let Some(food) = farm.state.food().checked_add(amount) else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        farm.state.set_food(food);
        farm.state.set_money(money - cost);
        Outcome::Applied
    }

    pub fn sell_food(&self, farm: &mut Farm, amount: u64) -> Outcome {
        if amount == 0 {
            return Outcome::Ignored(Shortfall::ZeroAmount);
        }
        let food = farm.state.food();
        if food < amount {
            return Outcome::Ignored(Shortfall::Food {
                needed: amount,
                available: food,
            });
        }
        let Some(money) = amount
            .checked_mul(self.prices.food_sell)
            .and_then(|income| farm.state.money().checked_add(income))
        else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        farm.state.set_food(food - amount);
        farm.state.set_money(money);
        Outcome::Applied
    }

    pub fn buy_eggs(&self, farm: &mut Farm, amount: u64, species: Species) -> Outcome {
        if amount == 0 {
            return Outcome::Ignored(Shortfall::ZeroAmount);
        }
        let Some(cost) = amount.checked_mul(self.egg_price(&self.prices.egg_buy, species)) else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        let money = farm.state.money();
        if money < cost {
            return Outcome::Ignored(Shortfall::Money {
                needed: cost,
                available: money,
            });
        }
        let Some(eggs) = farm.state.eggs(species).checked_add(amount) else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        farm.state.set_eggs(species, eggs);
        farm.state.set_money(money - cost);
        Outcome::Applied
    }

    pub fn sell_eggs(&self, farm: &mut Farm, amount: u64, species: Species) -> Outcome {
        if amount == 0 {
            return Outcome::Ignored(Shortfall::ZeroAmount);
        }
        let eggs = farm.state.eggs(species);
        if eggs < amount {
            return Outcome::Ignored(Shortfall::Eggs {
                species,
                needed: amount,
                available: eggs,
            });
        }
        let Some(money) = amount
            .checked_mul(self.egg_price(&self.prices.egg_sell, species))
            .and_then(|income| farm.state.money().checked_add(income))
        else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        farm.state.set_eggs(species, eggs - amount);
        farm.state.set_money(money);
        Outcome::Applied
    }

    /// Hands the bird one portion, limited by its appetite and the reserve.
    pub fn feed_poultry(&self, farm: &mut Farm, entity: EntityId) -> Outcome {
        if self.prices.feed_portion == 0 {
            return Outcome::Ignored(Shortfall::ZeroAmount);
        }
        let reserve = farm.state.food();
        let Some(animal) = farm.registry.get_mut(entity) else {
            return Outcome::Ignored(Shortfall::UnknownAnimal { entity });
        };
        if animal.is_dead() {
            return Outcome::Ignored(Shortfall::AnimalDead { entity });
        }
        let appetite = 100 - animal.food();
        if appetite == 0 {
            return Outcome::Ignored(Shortfall::AlreadyFull { entity });
        }
        if reserve == 0 {
            return Outcome::Ignored(Shortfall::Food {
                needed: 1,
                available: 0,
            });
        }
        let portion = u64::from(self.prices.feed_portion.min(appetite)).min(reserve) as u8;
        let taken = animal.feed(portion);
        farm.state.set_food(reserve - u64::from(taken));
        if farm.inspected() == Some(entity) {
            farm.inspect(Some(entity));
        }
        Outcome::Applied
    }

    /// Sells a living bird: an age-based price plus half its care rounded to
    /// the nearest ten.
    pub fn sell_poultry(&self, farm: &mut Farm, entity: EntityId) -> Outcome {
        let Some(animal) = farm.registry.get_mut(entity) else {
            return Outcome::Ignored(Shortfall::UnknownAnimal { entity });
        };
        if animal.is_dead() {
            return Outcome::Ignored(Shortfall::AnimalDead { entity });
        }
        let payout = self.poultry_payout(animal.age(), animal.care());
        let Some(money) = farm.state.money().checked_add(payout) else {
            return Outcome::Ignored(Shortfall::Overflow);
        };
        animal.sell();
        farm.state.set_money(money);
        farm.sync_poultry_count();
        Outcome::Applied
    }

    pub fn hatch_egg(&self, farm: &mut Farm, species: Species) -> Outcome {
        let eggs = farm.state.eggs(species);
        if eggs == 0 {
            return Outcome::Ignored(Shortfall::Eggs {
                species,
                needed: 1,
                available: 0,
            });
        }
        farm.state.set_eggs(species, eggs - 1);
        let entity = farm.spawn(species, None, 0);
        Outcome::Hatched { entity }
    }

    pub fn poultry_payout(&self, age: AgeCategory, care: u8) -> u64 {
        let base = match age {
            AgeCategory::Child => self.prices.child_payout,
            AgeCategory::Adult => self.prices.adult_payout,
            AgeCategory::Old => self.prices.old_payout,
        };
        let tens = (f64::from(care) / 10.0).round() as u64;
        base.saturating_add(tens * 10 / 2)
    }

    fn egg_price(&self, table: &BTreeMap<Species, u64>, species: Species) -> u64 {
        table.get(&species).copied().unwrap_or(0)
    }
}

impl Default for EconomyController {
    fn default() -> Self {
        Self::new(PriceList::default())
    }
}
