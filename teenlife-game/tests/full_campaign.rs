use teenlife_game::{
    ActivityDef, CatalogData, ChoreKind, Ending, GameEngine, Gender, MemoryStorage, Milestone,
    Outcome, Period, ScriptedRolls, SimConfig, SimulationController, SkipOutcome,
    StaticDataLoader, StatId, SubjectId, Tier,
};

fn quiet_config() -> SimConfig {
    SimConfig {
        category_event_chance: 0.0,
        ..SimConfig::default()
    }
}

fn new_game() -> SimulationController {
    let mut game =
        SimulationController::new(quiet_config(), CatalogData::default_catalog().clone(), 11);
    game.new_game("Morgan", Gender::Other, 11);
    game
}

fn scripted_game(rolls: ScriptedRolls) -> SimulationController<ScriptedRolls> {
    let mut game = SimulationController::with_rng(
        quiet_config(),
        CatalogData::default_catalog().clone(),
        11,
        rolls,
    );
    game.new_game("Morgan", Gender::Other, 11);
    game
}

/// Advance to the next morning, returning the rollover outcome.
fn finish_day<R: teenlife_game::RandomSource>(game: &mut SimulationController<R>) -> Outcome {
    loop {
        let outcome = game.advance_period().expect("advance");
        if game.state().clock.period == Period::Morning {
            return outcome;
        }
    }
}

#[test]
fn study_math_on_day_one() {
    let mut game = new_game();
    let outcome = game.perform_activity("study_math").unwrap();
    let state = game.state();
    assert_eq!(state.actions.available, 7);
    assert_eq!(state.actions.max, 8);
    assert_eq!(state.stats.intelligence, 53);
    assert_eq!(state.stats.happiness, 98);
    // 70.00 + 2 * (1 + 3 / 100)
    assert_eq!(state.education.grade_points(SubjectId::Math), 7206);
    assert!(outcome.tier_change.is_none());
    assert_eq!(
        state.log.latest().map(|entry| entry.message.as_str()),
        Some(outcome.message.as_str())
    );
}

#[test]
fn unaffordable_activity_leaves_state_unchanged() {
    let mut catalog = CatalogData::default_catalog().clone();
    let marathon: ActivityDef = serde_json::from_value(serde_json::json!({
        "id": "marathon",
        "name": "Run a Marathon",
        "cost": 3,
        "effects": { "fitness": 20, "energy": -40 }
    }))
    .unwrap();
    catalog.activities.push(marathon);
    let mut game = SimulationController::new(quiet_config(), catalog, 3);
    game.with_state_mut(|state| state.actions.available = 2);
    let before = game.state().clone();

    let err = game.perform_activity("marathon").unwrap_err();
    assert_eq!(err.code(), "insufficient_actions");
    assert_eq!(game.state(), &before);
    assert!(game.available_activities().iter().all(|a| a.id != "marathon"));
}

#[test]
fn school_days_wait_for_a_decision() {
    let mut game = new_game();
    let outcome = finish_day(&mut game);
    assert!(outcome.message.ends_with("Time to decide about school."));
    assert!(game.available_activities().is_empty());
    assert_eq!(
        game.perform_activity("sleep").unwrap_err().code(),
        "school_decision_required"
    );
    game.decide_school(true).unwrap();
    assert!(!game.available_activities().is_empty());
}

#[test]
fn school_days_cannot_be_slept_through() {
    let mut game = new_game();
    finish_day(&mut game);
    let before = game.state().clone();
    for _ in 0..4 {
        assert_eq!(
            game.advance_period().unwrap_err().code(),
            "school_decision_required"
        );
    }
    assert_eq!(game.state(), &before, "an undecided morning changes nothing");
    assert_eq!(game.state().clock.period, Period::Morning);

    game.decide_school(false).unwrap();
    let school = &game.state().school;
    assert_eq!((school.days_skipped, school.days_attended), (1, 0));
    assert!(game.state().education.grade_points(SubjectId::Math) < 7000);

    game.advance_period().unwrap();
    assert_eq!(
        game.decide_school(true).unwrap_err().code(),
        "no_school_decision_pending",
        "the decision belongs to the morning"
    );
}

#[test]
fn grounding_lasts_seven_days_and_gates_every_night() {
    let mut game = scripted_game(ScriptedRolls::default().with_fallback(0.9));
    finish_day(&mut game);
    let outcome = game.decide_school(false).unwrap();
    assert!(matches!(
        outcome.consequence,
        Some(teenlife_game::Consequence::School {
            skip: Some(SkipOutcome::Grounded),
            ..
        })
    ));
    assert_eq!(game.state().school.grounded_days_remaining, 7);
    assert!(game.buy_item("snacks").is_err());
    assert_eq!(
        game.perform_activity("video_games").unwrap_err().code(),
        "grounded"
    );

    let mut milestones = Vec::new();
    for day in 0..7 {
        if game.state().school.decision_pending() {
            game.decide_school(true).unwrap();
        }
        while game.state().clock.period != Period::Night {
            game.advance_period().unwrap();
        }
        let clock = game.state().clock.clone();
        let err = game.advance_period().unwrap_err();
        assert_eq!(err.code(), "chores_required", "night {day}");
        assert_eq!(game.state().clock, clock, "clock must not move");

        let mut progress = game.start_chores();
        assert_eq!(progress.kind, ChoreKind::Punishment);
        while !progress.step() {}
        let actions = game.state().actions.available;
        game.complete_chores_minigame(&progress).unwrap();
        assert_eq!(game.state().actions.available, actions, "punishment is free");
        let money = game.state().stats.money;

        let outcome = game.advance_period().unwrap();
        assert_eq!(game.state().stats.money, money, "no pay while grounded");
        milestones.extend(outcome.milestones);
    }

    assert!(!game.state().school.grounded);
    assert!(milestones.contains(&Milestone::GroundingLifted));
    assert!(milestones.contains(&Milestone::AllowanceWithheld));
    assert!(
        !milestones
            .iter()
            .any(|m| matches!(m, Milestone::AllowancePaid { .. }))
    );
    assert!(game.state().school.decision_pending(), "back to a monday");
    game.decide_school(true).unwrap();
    assert!(game.perform_activity("video_games").is_ok());
}

#[test]
fn detention_caps_saturday_at_the_tier_budget() {
    // One roll per quiet period advance, then the skip roll.
    let rolls = ScriptedRolls::new([0.99, 0.99, 0.99, 0.99, 0.6]).with_fallback(0.99);
    let mut game = scripted_game(rolls);
    finish_day(&mut game);
    let outcome = game.decide_school(false).unwrap();
    assert!(matches!(
        outcome.consequence,
        Some(teenlife_game::Consequence::School {
            skip: Some(SkipOutcome::Detention),
            ..
        })
    ));
    assert_eq!(game.tier(), Tier::D);

    let mut saturday = None;
    for _ in 0..5 {
        if game.state().school.decision_pending() {
            game.decide_school(true).unwrap();
        }
        let outcome = finish_day(&mut game);
        if game.state().clock.weekday == 6 {
            saturday = Some(outcome);
        }
    }
    let saturday = saturday.expect("reached saturday");
    // 69.00 after the skip, +0.50 per attended day: tier C by Wednesday.
    assert_eq!(game.tier(), Tier::C);
    assert!(
        saturday
            .milestones
            .contains(&Milestone::DetentionServed { actions: 5 })
    );
    assert_eq!(game.state().actions.available, 5);
    assert!(!game.state().school.saturday_detention_pending);
}

#[test]
fn allowance_arrives_on_sunday() {
    let mut game = new_game();
    let mut paid = None;
    for _ in 0..7 {
        if game.state().school.decision_pending() {
            game.decide_school(true).unwrap();
        }
        let outcome = finish_day(&mut game);
        if let Some(Milestone::AllowancePaid { amount }) = outcome
            .milestones
            .iter()
            .find(|m| matches!(m, Milestone::AllowancePaid { .. }))
        {
            paid = Some((*amount, game.state().clock.weekday));
        }
    }
    assert_eq!(paid, Some((15, 7)));
    assert_eq!(game.state().stats.money, 15);
}

#[test]
fn exam_drop_reports_exactly_one_tier_change() {
    let mut game = new_game();
    game.with_state_mut(|state| {
        for subject in SubjectId::ALL {
            state.education.set_grade(*subject, 95.0);
        }
        state.education.recompute();
    });
    assert_eq!(game.tier(), Tier::A);

    game.with_state_mut(|state| state.education.set_grade(SubjectId::Math, 75.0));
    let outcome = game.perform_activity("study_english").unwrap();
    let change = outcome.tier_change.expect("tier change reported");
    assert_eq!(change.tier, Tier::C);
    assert!(!change.improved);
    assert_eq!(change.actions, 5);
    assert_eq!(change.allowance, 15);

    let again = game.perform_activity("study_english").unwrap();
    assert!(again.tier_change.is_none());
}

#[test]
fn a_quiet_life_ages_out() {
    let mut game = new_game();
    let mut birthdays = Vec::new();
    for _ in 0..2_500 {
        if game.is_over() {
            break;
        }
        if game.state().school.decision_pending() {
            game.decide_school(true).unwrap();
        }
        for _ in 0..4 {
            match game.advance_period() {
                Ok(outcome) => birthdays.extend(
                    outcome
                        .milestones
                        .into_iter()
                        .filter(|m| matches!(m, Milestone::Birthday { .. })),
                ),
                Err(err) => {
                    assert_eq!(err.code(), "game_over");
                    break;
                }
            }
        }
    }
    assert_eq!(game.state().ending, Some(Ending::AgedOut));
    assert_eq!(game.state().clock.age, 19);
    assert_eq!(birthdays.len(), 6);
    assert_eq!(game.advance_period().unwrap_err().code(), "game_over");
}

#[test]
fn health_collapse_ends_the_game() {
    let mut game = new_game();
    game.with_state_mut(|state| {
        state.stats.health = 1;
        state.stats.energy = 10;
    });
    let outcome = game.advance_period().unwrap();
    assert_eq!(outcome.ending, Some(Ending::HealthCollapse));
    assert_eq!(game.state().stats.get(StatId::Health), 0);
}

#[test]
fn save_slots_round_trip_through_the_engine() {
    let storage = MemoryStorage::new();
    let engine = GameEngine::new(StaticDataLoader, storage.clone());
    let mut game = engine.create_game("Robin", Gender::Female, 2024).unwrap();
    game.perform_activity("study_science").unwrap();
    game.advance_period().unwrap();
    game.with_state_mut(|state| {
        state.relationships.modify("crush", 7);
        state.education.set_grade(SubjectId::History, 81.37);
    });
    engine.save_game("autosave", &game).unwrap();
    assert_eq!(storage.slots(), vec!["autosave"]);

    let snapshot = game.state().clone();
    let mut restored = engine.create_game("Other", Gender::Male, 1).unwrap();
    assert!(engine.load_game("autosave", &mut restored).unwrap());
    assert_eq!(restored.state(), &snapshot);
    assert_eq!(restored.state().stats, snapshot.stats);
    assert_eq!(restored.state().clock, snapshot.clock);
    assert_eq!(restored.state().education, snapshot.education);
    assert_eq!(restored.state().relationships, snapshot.relationships);
    assert_eq!(
        restored.state().education.grade_points(SubjectId::History),
        8137
    );
}
