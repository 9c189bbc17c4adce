//! Mastery engine tests: grade capture, idempotent mark updates, guards

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rstest::{fixture, rstest};

use rsoutcome::application::services::MasteryService;
use rsoutcome::application::ApplicationError;
use rsoutcome::config::Settings;
use rsoutcome::domain::{
    DomainError, GradeEvent, MarkResult, Outcome, OutcomeSet, OutcomeUsage,
};
use rsoutcome::infrastructure::di::ServiceContainer;
use rsoutcome::infrastructure::traits::{GradeSource, OutcomeStore};
use rsoutcome::util::testing;

const COURSE: i64 = 301;
const USER: i64 = 501;
const GRADER: i64 = 2;
const ITEM: i64 = 42;
const MODULE: i64 = 7001;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

struct StubGradeSource {
    items: HashMap<i64, i64>,
}

impl GradeSource for StubGradeSource {
    fn module_for_item(&self, item: i64) -> Option<i64> {
        self.items.get(&item).copied()
    }
}

#[fixture]
fn container() -> ServiceContainer {
    ServiceContainer::new(Settings::default())
}

struct Setup {
    outcome: Outcome,
    usage: OutcomeUsage,
    mastery: MasteryService,
}

/// One assessable outcome mapped onto a quiz activity, with the grade
/// item resolving to that activity's module.
fn seed(container: &ServiceContainer, assessable: bool) -> Setup {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    let mut outcome = Outcome::new(set.id, None, "O-1", "Outcome statement");
    outcome.assessable = assessable;
    let outcome = container.tree.create(outcome).unwrap();

    let area = container
        .areas
        .get_or_create("mod_quiz", "activity", 11)
        .unwrap();
    let usage = container.areas.map_outcome(area.id, outcome.id).unwrap();
    container.areas.register_module(area.id, MODULE).unwrap();

    let grades = Arc::new(StubGradeSource {
        items: HashMap::from([(ITEM, MODULE)]),
    });
    let mastery = MasteryService::new(
        Arc::clone(&container.store),
        Arc::clone(&container.areas),
        Arc::clone(&container.ledger),
        grades,
    );
    Setup {
        outcome,
        usage,
        mastery,
    }
}

fn grade(rawgrade: Option<f64>) -> GradeEvent {
    GradeEvent {
        item_id: ITEM,
        user_id: USER,
        rawgrade,
        mingrade: 0.0,
        maxgrade: 10.0,
    }
}

#[rstest]
fn given_grade_event_when_processing_then_attempt_upserted(container: ServiceContainer) {
    let mut setup = seed(&container, true);

    setup.mastery.process_grade(&grade(Some(8.0))).unwrap();

    let attempt = container
        .store
        .attempt_for(setup.usage.id, USER)
        .expect("attempt stored");
    assert_eq!(attempt.percentgrade, 80.0);

    // Re-delivery replaces, never duplicates.
    setup.mastery.process_grade(&grade(Some(6.0))).unwrap();
    let attempt = container.store.attempt_for(setup.usage.id, USER).unwrap();
    assert_eq!(attempt.percentgrade, 60.0);
}

#[rstest]
fn given_null_grade_when_processing_then_attempt_removed(container: ServiceContainer) {
    let mut setup = seed(&container, true);
    setup.mastery.process_grade(&grade(Some(8.0))).unwrap();

    setup.mastery.process_grade(&grade(None)).unwrap();

    assert!(container.store.attempt_for(setup.usage.id, USER).is_none());
}

#[rstest]
fn given_unmapped_item_when_processing_then_ignored(container: ServiceContainer) {
    let mut setup = seed(&container, true);
    let unmapped = GradeEvent {
        item_id: 9999,
        ..grade(Some(8.0))
    };

    setup.mastery.process_grade(&unmapped).unwrap();

    assert!(container.store.attempt_for(setup.usage.id, USER).is_none());
}

#[rstest]
fn given_same_earned_set_when_updating_twice_then_second_call_writes_nothing(
    container: ServiceContainer,
) {
    let setup = seed(&container, true);
    let candidates = [setup.outcome.id];
    let earned: HashSet<i64> = HashSet::from([setup.outcome.id]);

    let changed = setup
        .mastery
        .update_mark_earned(COURSE, USER, GRADER, &candidates, &earned)
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(container.ledger.history(setup.outcome.id, USER).len(), 1);

    let changed = setup
        .mastery
        .update_mark_earned(COURSE, USER, GRADER, &candidates, &earned)
        .unwrap();
    assert_eq!(changed, 0, "unchanged results must be skipped");
    assert_eq!(
        container.ledger.history(setup.outcome.id, USER).len(),
        1,
        "no new history rows on the idempotent second call"
    );
}

#[rstest]
fn given_result_flip_when_updating_then_one_history_row_per_transition(
    container: ServiceContainer,
) {
    let setup = seed(&container, true);
    let candidates = [setup.outcome.id];

    setup
        .mastery
        .update_mark_earned(
            COURSE,
            USER,
            GRADER,
            &candidates,
            &HashSet::from([setup.outcome.id]),
        )
        .unwrap();
    setup
        .mastery
        .update_mark_earned(COURSE, USER, GRADER, &candidates, &HashSet::new())
        .unwrap();

    let history = container.ledger.history(setup.outcome.id, USER);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].result, MarkResult::Earned);
    assert_eq!(history[1].result, MarkResult::NotEarned);
}

#[rstest]
fn given_non_assessable_outcome_when_marking_then_fails_without_writes(
    container: ServiceContainer,
) {
    let setup = seed(&container, false);

    let err = setup
        .mastery
        .mark_outcome_as_earned(COURSE, USER, GRADER, &setup.outcome)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NotAssessable { .. })
    ));
    assert!(container.store.mark_for(COURSE, setup.outcome.id, USER).is_none());
    assert!(container.ledger.history(setup.outcome.id, USER).is_empty());
}

#[rstest]
fn given_earned_mark_when_attempt_deleted_then_mark_retained(container: ServiceContainer) {
    let mut setup = seed(&container, true);
    setup.mastery.process_grade(&grade(Some(9.0))).unwrap();
    setup
        .mastery
        .mark_outcome_as_earned(COURSE, USER, GRADER, &setup.outcome)
        .unwrap();

    // Grade removal deletes the attempt but must not touch the mark.
    setup.mastery.process_grade(&grade(None)).unwrap();

    assert!(container.store.attempt_for(setup.usage.id, USER).is_none());
    let mark = container
        .store
        .mark_for(COURSE, setup.outcome.id, USER)
        .expect("mark survives attempt deletion");
    assert_eq!(mark.result, MarkResult::Earned);
}

#[rstest]
fn given_already_earned_when_marking_again_then_no_new_history(container: ServiceContainer) {
    let setup = seed(&container, true);
    setup
        .mastery
        .mark_outcome_as_earned(COURSE, USER, GRADER, &setup.outcome)
        .unwrap();

    setup
        .mastery
        .mark_outcome_as_earned(COURSE, USER, GRADER, &setup.outcome)
        .unwrap();

    assert_eq!(container.ledger.history(setup.outcome.id, USER).len(), 1);
}
