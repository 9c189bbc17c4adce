//! AB vocabulary import tests: nesting, grouping codes, explicit parents

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

fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[fixture]
fn container() -> ServiceContainer {
    ServiceContainer::new(Settings::default())
}

#[rstest]
fn given_nested_document_when_importing_then_structure_and_labels_mapped(
    container: ServiceContainer,
) {
    let importer = VocabularyImporter::new(VocabularyFormat::Ab, Arc::clone(&container.tree));

    let report = importer.process_file(&resource("sample_ab.xml")).unwrap();

    assert_eq!(report.outcomes_created, 4);
    assert_eq!(report.set.idnumber, "AB-DOC-7");
    assert_eq!(report.set.name, "Mathematics Framework");
    assert_eq!(report.set.provider.as_deref(), Some("Achievement Bodies Inc"));

    let s1 = container.tree.find_by_idnumber("S1").unwrap();
    assert_eq!(s1.parent_id, None);
    assert!(!s1.assessable, "linkable=N is not assessable");
    assert_eq!(s1.docnum.as_deref(), Some("1"));
    assert_eq!(s1.subjects, vec!["Mathematics"]);
    assert_eq!(s1.edulevels, vec!["Grade 3"]);

    // Nesting encodes parentage; the explicit parent_uid on S2 points at
    // S1 even though S2 is not nested under it.
    let order: Vec<String> = container
        .tree
        .children(report.set.id, Some(s1.id))
        .iter()
        .map(|o| o.idnumber.clone())
        .collect();
    assert_eq!(order, vec!["S1.A", "S1.B", "S2"]);

    let s1a = container.tree.find_by_idnumber("S1.A").unwrap();
    assert!(s1a.assessable);
    assert_eq!(s1a.docnum.as_deref(), Some("1.A"));

    let s2 = container.tree.find_by_idnumber("S2").unwrap();
    assert!(s2.assessable);
    assert!(s2.edulevels.is_empty(), "S2 sits outside the grade grouping");
}

#[rstest]
fn given_unknown_grade_code_when_importing_then_integrity_error(container: ServiceContainer) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "badcode.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<standard_document uid="AB-BAD-1">
  <title>Bad grade code</title>
  <grade_range code="13">
    <standard uid="S1" linkable="Y">
      <description>Unreachable</description>
    </standard>
  </grade_range>
</standard_document>
"#,
    );
    let importer = VocabularyImporter::new(VocabularyFormat::Ab, Arc::clone(&container.tree));

    let err = importer.process_file(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportIntegrity { .. }));
    assert!(container.tree.find_by_idnumber("S1").is_none());
}

#[rstest]
fn given_missing_uid_when_importing_then_integrity_error(container: ServiceContainer) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "nouid.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<standard_document uid="AB-BAD-2">
  <title>Missing uid</title>
  <standard linkable="Y">
    <description>No identifier</description>
  </standard>
</standard_document>
"#,
    );
    let importer = VocabularyImporter::new(VocabularyFormat::Ab, Arc::clone(&container.tree));

    let err = importer.process_file(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportIntegrity { .. }));
}

#[rstest]
fn given_dangling_parent_uid_when_importing_then_integrity_error(container: ServiceContainer) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "dangling.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<standard_document uid="AB-BAD-3">
  <title>Dangling parent</title>
  <standard uid="S1" linkable="Y" parent_uid="NEVER-SEEN">
    <description>Orphan</description>
  </standard>
</standard_document>
"#,
    );
    let importer = VocabularyImporter::new(VocabularyFormat::Ab, Arc::clone(&container.tree));

    let err = importer.process_file(&path).unwrap_err();

    assert!(matches!(err, ApplicationError::ImportIntegrity { .. }));
    assert!(container.tree.find_by_idnumber("S1").is_none());
}
