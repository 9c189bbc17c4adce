//! Generic round-trip vocabulary reader
//!
//! Inverse of [`GenericExporter`](super::GenericExporter): a `<data>`
//! document with one `<outcomeSet>` and flat `<outcome>` elements whose
//! children map 1:1 onto outcome fields. Parent linkage uses the exported
//! numeric id, resolved through the identifier map in document order.

use std::mem;
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{
    check_well_formed, format_error, parse_flag, read_vocabulary_file, IdentifierMap, ImportReport,
};
use crate::application::services::TreeService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Outcome, OutcomeSet};

pub struct GenericReader {
    tree: Arc<TreeService>,
}

/// Which element we are currently collecting fields for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Document,
    Set,
    Outcome,
}

#[derive(Debug, Default)]
struct PendingSet {
    idnumber: String,
    name: String,
    description: String,
    provider: Option<String>,
    revision: Option<String>,
    region: Option<String>,
}

impl PendingSet {
    fn assign(&mut self, field: &str, value: String) {
        match field {
            "idnumber" => self.idnumber = value,
            "name" => self.name = value,
            "description" => self.description = value,
            "provider" => self.provider = Some(value),
            "revision" => self.revision = Some(value),
            "region" => self.region = Some(value),
            // id and deleted are export artifacts with no import meaning
            _ => {}
        }
    }

    fn build(self) -> OutcomeSet {
        let mut set = OutcomeSet::new(self.idnumber, self.name);
        set.description = self.description;
        set.provider = self.provider;
        set.revision = self.revision;
        set.region = self.region;
        set
    }
}

#[derive(Debug, Default)]
struct PendingOutcome {
    exported_id: Option<String>,
    parent_ref: Option<String>,
    idnumber: String,
    docnum: Option<String>,
    description: String,
    assessable: bool,
    subjects: Vec<String>,
    edulevels: Vec<String>,
}

impl PendingOutcome {
    fn assign(&mut self, field: &str, value: String) {
        match field {
            "id" => self.exported_id = Some(value),
            "parentid" => self.parent_ref = Some(value),
            "idnumber" => self.idnumber = value,
            "docnum" => self.docnum = Some(value),
            "description" => self.description = value,
            "assessable" => self.assessable = parse_flag(&value),
            "subject" => self.subjects.push(value),
            "edulevel" => self.edulevels.push(value),
            _ => {}
        }
    }
}

impl GenericReader {
    pub fn new(tree: Arc<TreeService>) -> Self {
        Self { tree }
    }

    pub fn process_file(&self, path: &Path) -> ApplicationResult<ImportReport> {
        let content = read_vocabulary_file(path)?;
        check_well_formed(&content, path)?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut idmap = IdentifierMap::new();
        let mut set: Option<OutcomeSet> = None;
        let mut created = 0usize;
        let mut section = Section::Document;
        let mut field: Option<String> = None;
        let mut pending_set = PendingSet::default();
        let mut pending = PendingOutcome::default();

        loop {
            match reader.read_event().map_err(|e| format_error(path, e))? {
                Event::Start(e) => match e.name().as_ref() {
                    b"data" => {}
                    b"outcomeSet" => {
                        section = Section::Set;
                        pending_set = PendingSet::default();
                    }
                    b"outcome" => {
                        if set.is_none() {
                            return Err(ApplicationError::import_integrity(
                                "<outcome> before <outcomeSet>",
                            ));
                        }
                        section = Section::Outcome;
                        pending = PendingOutcome::default();
                    }
                    name => field = Some(String::from_utf8_lossy(name).into_owned()),
                },
                Event::Text(t) => {
                    if let Some(name) = &field {
                        let value = t.unescape().map_err(|e| format_error(path, e))?.into_owned();
                        match section {
                            Section::Set => pending_set.assign(name, value),
                            Section::Outcome => pending.assign(name, value),
                            Section::Document => {}
                        }
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"outcomeSet" => {
                        let built = mem::take(&mut pending_set).build();
                        set = Some(self.tree.create_set(built)?);
                        section = Section::Document;
                    }
                    b"outcome" => {
                        // Set presence was checked at the start tag.
                        let set_id = set.as_ref().map(|s| s.id).unwrap_or_default();
                        self.save_outcome(set_id, mem::take(&mut pending), &mut idmap)?;
                        created += 1;
                        section = Section::Document;
                    }
                    b"data" => {}
                    _ => field = None,
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let set = set
            .ok_or_else(|| ApplicationError::import_format(path, "no <outcomeSet> element"))?;
        debug!(
            "generic import: {} -> set '{}' with {} outcomes",
            path.display(),
            set.idnumber,
            created
        );
        Ok(ImportReport {
            set,
            outcomes_created: created,
        })
    }

    fn save_outcome(
        &self,
        set_id: i64,
        pending: PendingOutcome,
        idmap: &mut IdentifierMap,
    ) -> ApplicationResult<()> {
        let key = pending
            .exported_id
            .clone()
            .unwrap_or_else(|| pending.idnumber.clone());
        if idmap.contains(&key) {
            return Err(ApplicationError::import_integrity(format!(
                "identifier '{key}' declared twice in one import run"
            )));
        }
        let parent_id = match pending.parent_ref.as_deref() {
            Some(reference) if !reference.is_empty() => Some(idmap.resolve(reference)?),
            _ => None,
        };
        let mut outcome = Outcome::new(set_id, parent_id, pending.idnumber, pending.description);
        outcome.docnum = pending.docnum;
        outcome.assessable = pending.assessable;
        outcome.subjects = pending.subjects;
        outcome.edulevels = pending.edulevels;
        let saved = self.tree.create(outcome)?;
        idmap.insert(key, saved.id)?;
        Ok(())
    }
}
