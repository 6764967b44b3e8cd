use std::collections::BTreeSet;

use teenlife_game::{
    ActivityKind, CatalogData, EventCategory, RelationshipLedger, SimConfig, SubjectId,
};

fn catalog() -> &'static CatalogData {
    CatalogData::default_catalog()
}

#[test]
fn embedded_catalog_parses_and_validates() {
    let parsed = CatalogData::load_from_static().expect("embedded catalog parses");
    parsed.validate().expect("embedded catalog validates");
    assert_eq!(&parsed, catalog());
    assert!(!parsed.activities.is_empty());
    assert!(!parsed.events.is_empty());
    assert_eq!(parsed.shop.len(), 12);
}

#[test]
fn every_subject_has_a_study_activity() {
    let studied: BTreeSet<SubjectId> = catalog()
        .activities
        .iter()
        .filter_map(|activity| match activity.kind {
            ActivityKind::Study(subject) => Some(subject),
            _ => None,
        })
        .collect();
    let all: BTreeSet<SubjectId> = SubjectId::ALL.iter().copied().collect();
    assert_eq!(studied, all);
}

#[test]
fn exactly_one_chore_activity_exists() {
    let chores: Vec<_> = catalog()
        .activities
        .iter()
        .filter(|activity| activity.kind == ActivityKind::Chore)
        .collect();
    assert_eq!(chores.len(), 1);
    assert!(chores[0].periods.is_empty(), "chores are offered all day");
}

#[test]
fn relationship_effects_target_known_npcs() {
    let ledger = RelationshipLedger::with_defaults();
    let activity_targets = catalog()
        .activities
        .iter()
        .flat_map(|activity| activity.relationship_effects.keys());
    let choice_targets = catalog()
        .events
        .iter()
        .flat_map(|event| event.choices.iter())
        .flat_map(|choice| choice.relationship_effects.keys());
    for id in activity_targets.chain(choice_targets) {
        assert!(ledger.contains(id), "unknown npc '{id}' in catalog");
    }
}

#[test]
fn events_offer_real_choices() {
    for event in &catalog().events {
        assert!(event.choices.len() >= 2, "event '{}' needs two choices", event.id);
        for choice in &event.choices {
            assert!(!choice.text.trim().is_empty(), "blank choice in '{}'", event.id);
            assert!(
                !choice.result_text.trim().is_empty(),
                "choice '{}' in '{}' has no result text",
                choice.text,
                event.id
            );
        }
        if event.needs_subject() {
            assert_eq!(event.category, EventCategory::School, "{}", event.id);
        }
    }
}

#[test]
fn forced_triggers_point_at_forced_events() {
    let config = SimConfig::default();
    for trigger in &config.forced_triggers {
        let event = catalog()
            .event(&trigger.event_id)
            .unwrap_or_else(|| panic!("trigger event '{}' missing", trigger.event_id));
        assert!(event.choices.len() >= 2);
    }
}

#[test]
fn shop_grants_reference_items() {
    for entry in &catalog().shop {
        assert!(entry.price > 0, "'{}' must cost something", entry.id);
        if let Some(item) = &entry.grants_item {
            assert!(
                catalog().item(item).is_some(),
                "shop entry '{}' grants unknown item '{item}'",
                entry.id
            );
        }
    }
}

#[test]
fn default_config_round_trips_through_json() {
    let config = SimConfig::default();
    config.validate().expect("defaults validate");
    let json = serde_json::to_string(&config).unwrap();
    let parsed: SimConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let sparse: SimConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(sparse, config);
}
