//! Generic vocabulary import tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::{fixture, rstest};

use rsoutcome::application::import::{VocabularyFormat, VocabularyImporter};
use rsoutcome::application::ApplicationError;
use rsoutcome::config::Settings;
use rsoutcome::infrastructure::di::ServiceContainer;
use rsoutcome::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/vocabularies")
        .join(name)
}

#[fixture]
fn container() -> ServiceContainer {
    ServiceContainer::new(Settings::default())
}

#[rstest]
fn given_generic_file_when_importing_then_set_and_hierarchy_created(container: ServiceContainer) {
    let importer = VocabularyImporter::new(VocabularyFormat::Generic, Arc::clone(&container.tree));

    let report = importer.process_file(&resource("sample_generic.xml")).unwrap();

    assert_eq!(report.outcomes_created, 3);
    assert_eq!(report.set.idnumber, "SCI-2024");
    assert_eq!(report.set.name, "Science Standards");
    assert_eq!(report.set.provider.as_deref(), Some("State Board of Education"));
    assert_eq!(report.set.revision.as_deref(), Some("2024"));
    assert_eq!(report.set.region.as_deref(), Some("US-CA"));

    let root = container.tree.find_by_idnumber("SCI-1").unwrap();
    assert_eq!(root.parent_id, None);
    assert!(!root.assessable);
    assert_eq!(root.docnum.as_deref(), Some("1"));

    let children: Vec<(String, i64)> = container
        .tree
        .children(report.set.id, Some(root.id))
        .iter()
        .map(|o| (o.idnumber.clone(), o.sortorder))
        .collect();
    assert_eq!(
        children,
        vec![("SCI-1.1".into(), 0), ("SCI-1.2".into(), 1)]
    );

    let leaf = container.tree.find_by_idnumber("SCI-1.1").unwrap();
    assert!(leaf.assessable);
    assert_eq!(leaf.subjects, vec!["Science"]);
    assert_eq!(leaf.edulevels, vec!["Grade 4"]);
}

#[rstest]
fn given_wrong_extension_when_importing_then_format_error_before_any_write(
    container: ServiceContainer,
) {
    let importer = VocabularyImporter::new(VocabularyFormat::Generic, Arc::clone(&container.tree));

    let err = importer.process_file(&resource("wrong_ext.txt")).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportFormat { .. }));
    assert!(container.tree.sets().is_empty());
}

#[rstest]
fn given_malformed_document_when_importing_then_format_error_before_any_write(
    container: ServiceContainer,
) {
    let importer = VocabularyImporter::new(VocabularyFormat::Generic, Arc::clone(&container.tree));

    let err = importer.process_file(&resource("malformed.xml")).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportFormat { .. }));
    // The well-formedness pre-scan runs before the first save.
    assert!(container.tree.sets().is_empty());
}

#[rstest]
fn given_forward_parent_reference_when_importing_then_integrity_error(
    container: ServiceContainer,
) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forward.xml");
    std::fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<data component="rsoutcome">
  <outcomeSet>
    <idnumber>FWD-1</idnumber>
    <name>Forward reference</name>
  </outcomeSet>
  <outcome>
    <id>2</id>
    <parentid>1</parentid>
    <idnumber>CHILD</idnumber>
    <description>Child before parent</description>
  </outcome>
  <outcome>
    <id>1</id>
    <idnumber>PARENT</idnumber>
    <description>Parent declared late</description>
  </outcome>
</data>
"#,
    )
    .unwrap();
    let importer = VocabularyImporter::new(VocabularyFormat::Generic, Arc::clone(&container.tree));

    let err = importer.process_file(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportIntegrity { .. }));
    // The set itself was committed before the bad reference surfaced.
    assert!(container.tree.find_set_by_idnumber("FWD-1").is_some());
    assert!(container.tree.find_by_idnumber("CHILD").is_none());
}
