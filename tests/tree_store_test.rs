//! Tree store service tests: creation, ordering, soft deletion

use rstest::{fixture, rstest};

use rsoutcome::application::ApplicationError;
use rsoutcome::config::Settings;
use rsoutcome::domain::{DomainError, Outcome, OutcomeSet};
use rsoutcome::infrastructure::di::ServiceContainer;
use rsoutcome::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[fixture]
fn container() -> ServiceContainer {
    ServiceContainer::new(Settings::default())
}

fn outcome(set: i64, parent: Option<i64>, idnumber: &str) -> Outcome {
    Outcome::new(set, parent, idnumber, format!("{idnumber} statement"))
}

#[rstest]
fn given_new_set_when_creating_outcomes_then_sortorder_appends(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();

    let a = container.tree.create(outcome(set.id, None, "A")).unwrap();
    let b = container.tree.create(outcome(set.id, None, "B")).unwrap();
    let c = container.tree.create(outcome(set.id, None, "C")).unwrap();

    assert_eq!(a.sortorder, 0);
    assert_eq!(b.sortorder, 1);
    assert_eq!(c.sortorder, 2);
}

#[rstest]
fn given_duplicate_idnumber_across_sets_when_creating_then_validation_error(
    container: ServiceContainer,
) {
    let first = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "First"))
        .unwrap();
    let second = container
        .tree
        .create_set(OutcomeSet::new("SET-2", "Second"))
        .unwrap();
    container.tree.create(outcome(first.id, None, "X")).unwrap();

    let err = container
        .tree
        .create(outcome(second.id, None, "X"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DuplicateIdnumber(_))
    ));
}

#[rstest]
fn given_empty_description_when_creating_then_validation_error(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();

    let err = container
        .tree
        .create(Outcome::new(set.id, None, "X", ""))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::EmptyDescription { .. })
    ));
}

#[rstest]
fn given_branch_when_deleting_then_descendants_soft_deleted_and_siblings_renumbered(
    container: ServiceContainer,
) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    container.tree.create(outcome(set.id, None, "A")).unwrap();
    let b = container.tree.create(outcome(set.id, None, "B")).unwrap();
    container.tree.create(outcome(set.id, None, "C")).unwrap();
    let b1 = container
        .tree
        .create(outcome(set.id, Some(b.id), "B1"))
        .unwrap();

    let deleted = container.tree.delete(b.id).unwrap();

    assert_eq!(deleted, 2, "B and B1 are soft-deleted");
    assert!(container.tree.find(b1.id).unwrap().deleted);
    let roots = container.tree.children(set.id, None);
    let order: Vec<(String, i64)> = roots
        .iter()
        .map(|o| (o.idnumber.clone(), o.sortorder))
        .collect();
    assert_eq!(order, vec![("A".into(), 0), ("C".into(), 1)]);
}

#[rstest]
fn given_nested_tree_when_asking_branch_then_preorder(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    let root = container.tree.create(outcome(set.id, None, "R")).unwrap();
    let left = container
        .tree
        .create(outcome(set.id, Some(root.id), "R.1"))
        .unwrap();
    container
        .tree
        .create(outcome(set.id, Some(left.id), "R.1.1"))
        .unwrap();
    container
        .tree
        .create(outcome(set.id, Some(root.id), "R.2"))
        .unwrap();

    let branch = container.tree.branch(root.id).unwrap();
    let order: Vec<&str> = branch.iter().map(|o| o.idnumber.as_str()).collect();

    assert_eq!(order, vec!["R", "R.1", "R.1.1", "R.2"]);
}

#[rstest]
fn given_nested_tree_when_asking_depth_then_ancestor_count(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    let root = container.tree.create(outcome(set.id, None, "R")).unwrap();
    let mid = container
        .tree
        .create(outcome(set.id, Some(root.id), "R.1"))
        .unwrap();
    let leaf = container
        .tree
        .create(outcome(set.id, Some(mid.id), "R.1.1"))
        .unwrap();

    assert_eq!(container.tree.depth(root.id).unwrap(), 0);
    assert_eq!(container.tree.depth(leaf.id).unwrap(), 2);
}

#[rstest]
fn given_set_when_deleting_then_outcomes_cascade(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    let a = container.tree.create(outcome(set.id, None, "A")).unwrap();

    container.tree.delete_set(set.id).unwrap();

    assert!(container.tree.find_set(set.id).unwrap().deleted);
    assert!(container.tree.find(a.id).unwrap().deleted);
}

#[rstest]
fn given_deleted_set_when_creating_outcome_then_error(container: ServiceContainer) {
    let set = container
        .tree
        .create_set(OutcomeSet::new("SET-1", "Test set"))
        .unwrap();
    container.tree.delete_set(set.id).unwrap();

    let err = container
        .tree
        .create(outcome(set.id, None, "A"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SetNotFound(_))
    ));
}
