//! Activity availability filtering and execution.
use serde::{Deserialize, Serialize};

use crate::actions::ActionEconomy;
use crate::clock::Clock;
use crate::data::{ActivityDef, ActivityKind, CatalogData, Effects};
use crate::education::{EducationTracker, TierChange};
use crate::error::ValidationError;
use crate::relationships::{RelationshipChange, RelationshipLedger};
use crate::school::SchoolAttendanceResolver;
use crate::stats::{StatBoard, StatDelta, StatId};

/// Read-only view used to decide whether an activity may run.
#[derive(Debug, Clone, Copy)]
pub struct ActivityContext<'a> {
    pub clock: &'a Clock,
    pub stats: &'a StatBoard,
    pub actions: &'a ActionEconomy,
    pub school: &'a SchoolAttendanceResolver,
}

/// Check every availability predicate for `activity`.
///
/// # Errors
///
/// Returns the first failing predicate as a [`ValidationError`].
pub fn check_available(
    activity: &ActivityDef,
    ctx: &ActivityContext<'_>,
) -> Result<(), ValidationError> {
    if ctx.school.decision_pending() {
        return Err(ValidationError::SchoolDecisionRequired);
    }
    let period = ctx.clock.period;
    if !activity.offered_in(period) {
        return Err(ValidationError::WrongPeriod {
            id: activity.id.clone(),
            period,
        });
    }
    if activity.weekend_only && !ctx.clock.is_weekend() {
        return Err(ValidationError::WeekendOnly {
            id: activity.id.clone(),
        });
    }
    if ctx.clock.age < activity.min_age {
        return Err(ValidationError::TooYoung {
            id: activity.id.clone(),
            min_age: activity.min_age,
        });
    }
    if ctx.school.grounded && activity.blocked_when_grounded() {
        return Err(ValidationError::Grounded {
            id: activity.id.clone(),
        });
    }
    if let Some((stat, needed)) = activity.requirements.first_unmet(ctx.stats) {
        return Err(ValidationError::RequirementUnmet {
            id: activity.id.clone(),
            stat,
            needed,
        });
    }
    if !ctx.actions.can_afford(activity.cost) {
        return Err(ValidationError::InsufficientActions {
            needed: activity.cost,
            available: ctx.actions.available,
        });
    }
    Ok(())
}

/// Activities that can be performed right now.
#[must_use]
pub fn list_available<'c>(
    catalog: &'c CatalogData,
    ctx: &ActivityContext<'_>,
) -> Vec<&'c ActivityDef> {
    catalog
        .activities
        .iter()
        .filter(|activity| check_available(activity, ctx).is_ok())
        .collect()
}

/// Mutable state an activity touches.
pub struct ActivityTargets<'a> {
    pub clock: &'a Clock,
    pub stats: &'a mut StatBoard,
    pub actions: &'a mut ActionEconomy,
    pub school: &'a mut SchoolAttendanceResolver,
    pub relationships: &'a mut RelationshipLedger,
    pub education: &'a mut EducationTracker,
}

impl ActivityTargets<'_> {
    fn context(&self) -> ActivityContext<'_> {
        ActivityContext {
            clock: self.clock,
            stats: &*self.stats,
            actions: &*self.actions,
            school: &*self.school,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub id: String,
    pub name: String,
    pub cost: u8,
    pub deltas: Vec<StatDelta>,
    pub relationships: Vec<RelationshipChange>,
    pub tier_change: Option<TierChange>,
    pub chores_completed: bool,
    pub summary: String,
}

/// Re-validate and execute `activity`.
///
/// Study activities forward their intelligence delta to the education
/// tracker. A chore performed while grounded satisfies the daily chores
/// requirement and pays nothing.
///
/// # Errors
///
/// Returns the first failing availability predicate; nothing is mutated.
pub fn perform(
    activity: &ActivityDef,
    targets: ActivityTargets<'_>,
) -> Result<ActivityOutcome, ValidationError> {
    check_available(activity, &targets.context())?;
    if !targets.actions.spend(activity.cost) {
        return Err(ValidationError::InsufficientActions {
            needed: activity.cost,
            available: targets.actions.available,
        });
    }

    let punishment_chore = activity.kind == ActivityKind::Chore && targets.school.grounded;
    let skip = punishment_chore.then_some(StatId::Money);
    let deltas = activity.effects.apply(targets.stats, skip);

    let relationships: Vec<RelationshipChange> = activity
        .relationship_effects
        .iter()
        .filter_map(|(id, delta)| targets.relationships.modify(id, *delta))
        .collect();

    let tier_change = match activity.kind {
        ActivityKind::Study(subject) => {
            let bonus = activity.effects.get(StatId::Intelligence);
            targets
                .education
                .study(subject, bonus, targets.clock.days_played)
        }
        ActivityKind::Standard | ActivityKind::Chore => None,
    };

    if punishment_chore {
        targets.school.complete_chores();
        log::debug!("grounded chores completed via '{}'", activity.id);
    }

    let applied: Effects = deltas
        .iter()
        .map(|delta| (delta.stat, delta.requested))
        .collect();
    let summary = if applied.is_empty() {
        activity.name.clone()
    } else {
        format!("{}: {applied}", activity.name)
    };

    Ok(ActivityOutcome {
        id: activity.id.clone(),
        name: activity.name.clone(),
        cost: activity.cost,
        deltas,
        relationships,
        tier_change,
        chores_completed: punishment_chore,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::education::{SubjectId, Tier};

    struct World {
        clock: Clock,
        stats: StatBoard,
        actions: ActionEconomy,
        school: SchoolAttendanceResolver,
        relationships: RelationshipLedger,
        education: EducationTracker,
    }

    impl World {
        fn new() -> Self {
            Self {
                clock: Clock::default(),
                stats: StatBoard::default(),
                actions: ActionEconomy::full(8),
                school: SchoolAttendanceResolver::default(),
                relationships: RelationshipLedger::with_defaults(),
                education: EducationTracker::default(),
            }
        }

        fn ctx(&self) -> ActivityContext<'_> {
            ActivityContext {
                clock: &self.clock,
                stats: &self.stats,
                actions: &self.actions,
                school: &self.school,
            }
        }

        fn perform(&mut self, id: &str) -> Result<ActivityOutcome, ValidationError> {
            let catalog = CatalogData::default_catalog();
            let activity = catalog.activity(id).unwrap();
            perform(
                activity,
                ActivityTargets {
                    clock: &self.clock,
                    stats: &mut self.stats,
                    actions: &mut self.actions,
                    school: &mut self.school,
                    relationships: &mut self.relationships,
                    education: &mut self.education,
                },
            )
        }
    }

    #[test]
    fn study_math_spends_and_forwards_intelligence() {
        let mut world = World::new();
        let outcome = world.perform("study_math").unwrap();
        assert_eq!(world.actions.available, 7);
        assert_eq!(world.stats.intelligence, 53);
        assert_eq!(world.stats.happiness, 98);
        // 70.00 + (2.00 + 2 * 3 hundredths)
        assert_eq!(world.education.grade_points(SubjectId::Math), 7206);
        assert_eq!(world.education.subjects[&SubjectId::Math].study_count, 1);
        assert!(outcome.tier_change.is_none());
        assert_eq!(outcome.summary, "Study Math: -2 happiness, +3 intelligence");
    }

    #[test]
    fn unaffordable_activity_changes_nothing() {
        let mut world = World::new();
        world.clock.period = crate::clock::Period::Afternoon;
        world.actions.available = 1;
        let before = world.stats.clone();
        let err = world.perform("hangout").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientActions {
                needed: 2,
                available: 1
            }
        );
        assert_eq!(world.stats, before);
        assert_eq!(world.actions.available, 1);
    }

    #[test]
    fn zero_cost_activities_work_on_an_empty_budget() {
        let mut world = World::new();
        world.actions.block();
        world.stats.energy = 40;
        world.perform("sleep").unwrap();
        assert_eq!(world.stats.energy, 70);
        assert_eq!(world.actions.available, 0);
    }

    #[test]
    fn availability_predicates_filter_the_catalog() {
        let mut world = World::new();
        let catalog = CatalogData::default_catalog();
        let ids = |world: &World| -> Vec<String> {
            list_available(catalog, &world.ctx())
                .into_iter()
                .map(|a| a.id.clone())
                .collect()
        };

        // Sunday morning, age 13, no money.
        let morning = ids(&world);
        assert!(morning.contains(&"volunteer".to_string()));
        assert!(!morning.contains(&"hangout".to_string()));
        assert!(!morning.contains(&"eat_junk".to_string()));

        world.clock.period = crate::clock::Period::Afternoon;
        world.stats.money = 100;
        let afternoon = ids(&world);
        assert!(afternoon.contains(&"hangout".to_string()));
        assert!(!afternoon.contains(&"part_time_job".to_string()));

        world.clock.age = 15;
        world.clock.weekday = 2;
        let weekday = ids(&world);
        assert!(weekday.contains(&"part_time_job".to_string()));
        assert!(!weekday.contains(&"volunteer".to_string()));
    }

    #[test]
    fn pending_school_decision_blocks_everything() {
        let mut world = World::new();
        world.school.begin_day(true);
        assert!(list_available(CatalogData::default_catalog(), &world.ctx()).is_empty());
        assert_eq!(
            world.perform("sleep").unwrap_err(),
            ValidationError::SchoolDecisionRequired
        );
    }

    #[test]
    fn grounding_blocks_leisure_but_not_study_or_chores() {
        let mut world = World::new();
        world.school.ground(7);
        assert_eq!(world.perform("video_games").unwrap_err().code(), "grounded");
        world.perform("study_art").unwrap();
        world.perform("sleep").unwrap();

        assert!(world.school.chores_required());
        let outcome = world.perform("do_chores").unwrap();
        assert!(outcome.chores_completed);
        assert_eq!(world.stats.money, 0, "grounded chores pay nothing");
        assert!(!world.school.chores_required());
    }

    #[test]
    fn earning_chores_pay_when_not_grounded() {
        let mut world = World::new();
        let outcome = world.perform("do_chores").unwrap();
        assert!(!outcome.chores_completed);
        assert_eq!(world.stats.money, 10);
        assert_eq!(world.relationships.strength("mom"), 72);
    }

    #[test]
    fn stat_requirements_are_enforced() {
        let mut world = World::new();
        let err = world.perform("eat_healthy").unwrap_err();
        assert_eq!(
            err,
            ValidationError::RequirementUnmet {
                id: "eat_healthy".to_string(),
                stat: StatId::Money,
                needed: 10
            }
        );
    }

    #[test]
    fn study_reports_tier_changes() {
        let mut world = World::new();
        for subject in SubjectId::ALL {
            world.education.set_grade(*subject, 95.0);
        }
        world.education.recompute();
        world.education.set_grade(SubjectId::History, 75.0);
        let outcome = world.perform("study_math").unwrap();
        let change = outcome.tier_change.unwrap();
        assert_eq!(change.tier, Tier::C);
        assert!(!change.improved);
        assert_eq!((change.actions, change.allowance), (5, 15));
    }
}
