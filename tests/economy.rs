use std::cell::RefCell;
use std::rc::Rc;

use poultry_farm::{
    animal::AnimalSnapshot,
    config::{FarmConfig, PriceList},
    economy::{Action, Outcome, Shortfall},
    engine::GameLoopBuilder,
    species::{Gender, Species},
    state::{Observer, StateChange},
    GameLoop,
};

#[derive(Default)]
struct Hud {
    changes: Vec<StateChange>,
    popups: Vec<AnimalSnapshot>,
}

struct SharedHud(Rc<RefCell<Hud>>);

impl Observer for SharedHud {
    fn state_changed(&mut self, change: &StateChange) {
        self.0.borrow_mut().changes.push(*change);
    }

    fn animal_changed(&mut self, snapshot: &AnimalSnapshot) {
        self.0.borrow_mut().popups.push(snapshot.clone());
    }
}

fn game(money: u64, food: u64) -> (GameLoop, Rc<RefCell<Hud>>) {
    let hud = Rc::new(RefCell::new(Hud::default()));
    let config = FarmConfig {
        name: "market".into(),
        starting_money: money,
        starting_food: food,
        ..FarmConfig::default()
    };
    let game = GameLoopBuilder::new(config)
        .with_observer(SharedHud(hud.clone()))
        .build();
    hud.borrow_mut().changes.clear();
    (game, hud)
}

#[test]
fn buying_an_egg_and_hatching_it_adds_a_bird() {
    let (mut game, _) = game(100, 0);
    let eggs_before = game.farm().state().eggs(Species::Goose);
    let birds_before = game.farm().state().poultry_count();

    let bought = game.on_action(Action::BuyEggs {
        value: 1,
        species: Species::Goose,
    });
    assert_eq!(bought, Outcome::Applied);
    let hatched = game.on_action(Action::HatchEgg {
        species: Species::Goose,
    });
    let Outcome::Hatched { entity } = hatched else {
        panic!("expected a hatch, got {hatched:?}");
    };

    assert_eq!(game.farm().state().eggs(Species::Goose), eggs_before);
    assert_eq!(game.farm().state().poultry_count(), birds_before + 1);
    let chick = game.farm().animal(entity).unwrap();
    assert_eq!(chick.species(), Species::Goose);
    assert_eq!(chick.age_minutes(), 0);
}

#[test]
fn feeding_tops_up_without_overfilling() {
    let (mut game, _) = game(0, 100);
    let id = game
        .farm_mut()
        .spawn(Species::Chicken, Some(Gender::Male), 4);
    game.farm_mut().animal_mut(id).unwrap().set_food(95);

    let outcome = game.on_action(Action::FeedPoultry { entity: id });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(game.farm().animal(id).unwrap().food(), 100);
    assert_eq!(game.farm().state().food(), 95);
}

#[test]
fn selling_more_eggs_than_stocked_changes_nothing() {
    let (mut game, hud) = game(40, 0);
    let buy = game.on_action(Action::BuyEggs {
        value: 2,
        species: Species::Chicken,
    });
    assert_eq!(buy, Outcome::Applied);
    let money = game.farm().state().money();
    hud.borrow_mut().changes.clear();

    let outcome = game.on_action(Action::SellEggs {
        value: 5,
        species: Species::Chicken,
    });
    assert!(matches!(outcome, Outcome::Ignored(Shortfall::Eggs { .. })));
    assert_eq!(game.farm().state().money(), money);
    assert_eq!(game.farm().state().eggs(Species::Chicken), 2);
    assert!(hud.borrow().changes.is_empty(), "ignored actions notify nobody");
}

#[test]
fn hud_hears_every_applied_change() {
    let (mut game, hud) = game(50, 10);
    game.on_action(Action::BuyFood { value: 5 });
    let changes = hud.borrow().changes.clone();
    assert!(changes.contains(&StateChange::Food { value: 15 }));
    assert!(changes.contains(&StateChange::Money { value: 40 }));
}

#[test]
fn hud_hears_laid_eggs() {
    let (mut game, hud) = game(0, 0);
    game.farm_mut()
        .spawn(Species::Turkey, Some(Gender::Female), 5);
    hud.borrow_mut().changes.clear();
    for _ in 0..30 {
        game.frame(1.0);
    }
    assert_eq!(game.farm().state().eggs(Species::Turkey), 1);
    assert!(hud.borrow().changes.contains(&StateChange::Eggs {
        species: Species::Turkey,
        value: 1
    }));
}

#[test]
fn inspected_bird_is_pushed_each_frame() {
    let (mut game, hud) = game(0, 0);
    let id = game.farm_mut().spawn(Species::Goose, Some(Gender::Female), 0);
    game.inspect(Some(id));
    game.frame(0.5);
    game.frame(0.5);
    let popups = hud.borrow().popups.clone();
    assert_eq!(popups.len(), 3);
    assert!(popups.iter().all(|p| p.id == id));

    game.inspect(None);
    game.frame(0.5);
    assert_eq!(hud.borrow().popups.len(), 3);
}

#[test]
fn sold_bird_leaves_after_its_roll() {
    let (mut game, _) = game(0, 0);
    let id = game.farm_mut().spawn(Species::Chicken, Some(Gender::Female), 1);
    let outcome = game.on_action(Action::SellPoultry { entity: id });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(game.farm().state().money(), 70);
    assert_eq!(game.farm().state().poultry_count(), 0);

    game.frame(0.5);
    assert!(game.farm().animal(id).is_some());
    game.frame(0.5);
    assert!(game.farm().animal(id).is_none());

    let late = game.on_action(Action::FeedPoultry { entity: id });
    assert_eq!(late, Outcome::Ignored(Shortfall::UnknownAnimal { entity: id }));
}

#[test]
fn free_food_cannot_overflow_the_store() {
    let config = FarmConfig {
        name: "free food".into(),
        prices: PriceList {
            food_buy: 0,
            ..PriceList::default()
        },
        ..FarmConfig::default()
    };
    let mut game = GameLoopBuilder::new(config).build();
    let outcome = game.on_action(Action::BuyFood { value: u64::MAX });
    assert_eq!(outcome, Outcome::Ignored(Shortfall::Overflow));
    assert_eq!(game.farm().state().food(), 50);

    game.frame(0.016);
    assert_eq!(game.on_action(Action::BuyFood { value: 10 }), Outcome::Applied);
    assert_eq!(game.farm().state().food(), 60);
}
