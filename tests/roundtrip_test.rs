//! Export/import round-trip tests for the generic format

use std::sync::Arc;

use rstest::{fixture, rstest};

use rsoutcome::application::import::{GenericExporter, VocabularyFormat, VocabularyImporter};
use rsoutcome::config::Settings;
use rsoutcome::domain::{Outcome, OutcomeSet};
use rsoutcome::infrastructure::di::ServiceContainer;
use rsoutcome::infrastructure::traits::OutcomeStore;
use rsoutcome::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[fixture]
fn container() -> ServiceContainer {
    ServiceContainer::new(Settings::default())
}

fn seed_set(container: &ServiceContainer) -> OutcomeSet {
    let mut set = OutcomeSet::new("RT-2024", "Round trip standards");
    set.description = "Exercises every exported field".to_string();
    set.provider = Some("Example provider".to_string());
    set.revision = Some("v2".to_string());
    let set = container.tree.create_set(set).unwrap();

    let mut root = Outcome::new(set.id, None, "RT-1", "Root statement");
    root.docnum = Some("1".to_string());
    root.subjects = vec!["Mathematics".to_string()];
    root.edulevels = vec!["Grade 3".to_string(), "Grade 4".to_string()];
    let root = container.tree.create(root).unwrap();

    let mut child = Outcome::new(set.id, Some(root.id), "RT-1.1", "Child statement");
    child.docnum = Some("1.1".to_string());
    child.assessable = true;
    child.subjects = vec!["Mathematics".to_string()];
    container.tree.create(child).unwrap();

    let mut sibling = Outcome::new(set.id, None, "RT-2", "Second root");
    sibling.assessable = true;
    container.tree.create(sibling).unwrap();

    set
}

#[rstest]
fn given_exported_set_when_reimporting_then_fields_survive(container: ServiceContainer) {
    let set = seed_set(&container);
    let exporter = GenericExporter::new(Arc::clone(&container.tree), "rsoutcome");
    let document = exporter.export_set(set.id).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.xml");
    std::fs::write(&path, &document).unwrap();

    let target = ServiceContainer::new(Settings::default());
    let importer = VocabularyImporter::new(VocabularyFormat::Generic, Arc::clone(&target.tree));
    let report = importer.process_file(&path).unwrap();

    assert_eq!(report.outcomes_created, 3);
    assert_eq!(report.set.idnumber, set.idnumber);
    assert_eq!(report.set.name, set.name);
    assert_eq!(report.set.description, set.description);
    assert_eq!(report.set.provider, set.provider);
    assert_eq!(report.set.revision, set.revision);

    for original in container.store.outcomes_in_set(set.id, false) {
        let reimported = target
            .tree
            .find_by_idnumber(&original.idnumber)
            .unwrap_or_else(|| panic!("{} missing after round trip", original.idnumber));
        assert_eq!(reimported.docnum, original.docnum);
        assert_eq!(reimported.description, original.description);
        assert_eq!(reimported.assessable, original.assessable);
        assert_eq!(reimported.subjects, original.subjects);
        assert_eq!(reimported.edulevels, original.edulevels);
    }

    // Hierarchy survives: RT-1.1 hangs off RT-1 in the new store too.
    let new_root = target.tree.find_by_idnumber("RT-1").unwrap();
    let new_child = target.tree.find_by_idnumber("RT-1.1").unwrap();
    assert_eq!(new_child.parent_id, Some(new_root.id));
}

#[rstest]
fn given_deleted_branch_when_exporting_then_only_live_outcomes_written(
    container: ServiceContainer,
) {
    let set = seed_set(&container);
    let second_root = container.tree.find_by_idnumber("RT-2").unwrap();
    container.tree.delete(second_root.id).unwrap();

    let exporter = GenericExporter::new(Arc::clone(&container.tree), "rsoutcome");
    let document = exporter.export_set(set.id).unwrap();

    assert!(
        !document.contains("Second root"),
        "deleted outcomes are not exported"
    );
    assert!(document.contains("RT-1.1"));
}
