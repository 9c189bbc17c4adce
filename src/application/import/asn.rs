//! "ASN" flat RDF vocabulary reader
//!
//! One `asn:StandardDocument` (identified by `rdf:about`) followed by a
//! flat sequence of `asn:Statement` siblings. Parent linkage is an
//! explicit `gemq:isChildOf rdf:resource` back-reference that must point
//! at the document or an already-seen statement; a dangling reference is
//! an integrity error and the statement is not saved. Education level,
//! subject, and indexing status arrive as URIs whose trailing path
//! segment is a code resolved against the label dictionaries.

use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::labels::{edulevel_label, subject_label};
use super::{
    attribute, check_well_formed, format_error, read_vocabulary_file, IdentifierMap, ImportReport,
};
use crate::application::services::TreeService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Outcome, OutcomeSet};

pub struct AsnReader {
    tree: Arc<TreeService>,
}

impl AsnReader {
    pub fn new(tree: Arc<TreeService>) -> Self {
        Self { tree }
    }

    pub fn process_file(&self, path: &Path) -> ApplicationResult<ImportReport> {
        let content = read_vocabulary_file(path)?;
        check_well_formed(&content, path)?;
        let mut parser = AsnParser::new(&self.tree, path);
        parser.run(&content)?;
        let set = parser.set.ok_or_else(|| {
            ApplicationError::import_format(path, "no asn:StandardDocument element")
        })?;
        debug!(
            "asn import: {} -> set '{}' with {} outcomes",
            path.display(),
            set.idnumber,
            parser.created
        );
        Ok(ImportReport {
            set,
            outcomes_created: parser.created,
        })
    }
}

/// An `asn:Statement` being collected.
#[derive(Debug, Default)]
struct Statement {
    uri: String,
    description: String,
    notation: Option<String>,
    child_of: Option<String>,
    subjects: Vec<String>,
    edulevels: Vec<String>,
    assessable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Publisher,
    Notation,
}

struct AsnParser<'a> {
    tree: &'a TreeService,
    path: &'a Path,
    idmap: IdentifierMap,
    set: Option<OutcomeSet>,
    doc_uri: Option<String>,
    title: String,
    doc_description: String,
    publisher: Option<String>,
    doc_subjects: Vec<String>,
    doc_levels: Vec<String>,
    in_document: bool,
    statement: Option<Statement>,
    field: Option<Field>,
    created: usize,
}

impl<'a> AsnParser<'a> {
    fn new(tree: &'a TreeService, path: &'a Path) -> Self {
        Self {
            tree,
            path,
            idmap: IdentifierMap::new(),
            set: None,
            doc_uri: None,
            title: String::new(),
            doc_description: String::new(),
            publisher: None,
            doc_subjects: Vec::new(),
            doc_levels: Vec::new(),
            in_document: false,
            statement: None,
            field: None,
            created: 0,
        }
    }

    fn run(&mut self, content: &str) -> ApplicationResult<()> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);
        loop {
            match reader.read_event().map_err(|e| format_error(self.path, e))? {
                Event::Start(e) => self.open(&e)?,
                Event::Empty(e) => self.resource(&e)?,
                Event::Text(t) => {
                    let value = t
                        .unescape()
                        .map_err(|e| format_error(self.path, e))?
                        .into_owned();
                    self.text(value);
                }
                Event::End(e) => self.close(e.name().as_ref())?,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn open(&mut self, element: &BytesStart<'_>) -> ApplicationResult<()> {
        match element.name().as_ref() {
            b"asn:StandardDocument" => {
                let about = attribute(element, "rdf:about", self.path)?.ok_or_else(|| {
                    ApplicationError::import_integrity("asn:StandardDocument without rdf:about")
                })?;
                self.doc_uri = Some(about);
                self.in_document = true;
            }
            b"asn:Statement" => {
                let about = attribute(element, "rdf:about", self.path)?.ok_or_else(|| {
                    ApplicationError::import_integrity("asn:Statement without rdf:about")
                })?;
                self.statement = Some(Statement {
                    uri: about,
                    ..Statement::default()
                });
            }
            b"dc:title" => self.field = Some(Field::Title),
            b"dcterms:description" => self.field = Some(Field::Description),
            b"dc:publisher" => self.field = Some(Field::Publisher),
            b"asn:statementNotation" => self.field = Some(Field::Notation),
            // Resource-valued elements are usually self-closing but may
            // be written with a separate end tag.
            b"gemq:isChildOf" | b"asn:educationLevel" | b"dc:subject" | b"asn:indexingStatus" => {
                self.resource(element)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn resource(&mut self, element: &BytesStart<'_>) -> ApplicationResult<()> {
        let Some(uri) = attribute(element, "rdf:resource", self.path)? else {
            return Ok(());
        };
        match element.name().as_ref() {
            b"gemq:isChildOf" => {
                if let Some(statement) = self.statement.as_mut() {
                    statement.child_of = Some(uri);
                }
            }
            b"asn:educationLevel" => {
                let code = trailing_segment(&uri);
                let label = edulevel_label(code).map(str::to_string).ok_or_else(|| {
                    ApplicationError::import_integrity(format!(
                        "unknown education level code '{code}'"
                    ))
                })?;
                match self.statement.as_mut() {
                    Some(statement) => statement.edulevels.push(label),
                    None => self.doc_levels.push(label),
                }
            }
            b"dc:subject" => {
                let code = trailing_segment(&uri);
                let label = subject_label(code).map(str::to_string).ok_or_else(|| {
                    ApplicationError::import_integrity(format!("unknown subject code '{code}'"))
                })?;
                match self.statement.as_mut() {
                    Some(statement) => statement.subjects.push(label),
                    None => self.doc_subjects.push(label),
                }
            }
            b"asn:indexingStatus" => {
                let assessable = match trailing_segment(&uri) {
                    "Yes" => true,
                    "No" => false,
                    code => {
                        return Err(ApplicationError::import_integrity(format!(
                            "unknown indexing status code '{code}'"
                        )))
                    }
                };
                if let Some(statement) = self.statement.as_mut() {
                    statement.assessable = assessable;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, value: String) {
        match self.field {
            Some(Field::Title) => self.title = value,
            Some(Field::Description) => match self.statement.as_mut() {
                Some(statement) => statement.description = value,
                None if self.in_document => self.doc_description = value,
                None => {}
            },
            Some(Field::Publisher) => self.publisher = Some(value),
            Some(Field::Notation) => {
                if let Some(statement) = self.statement.as_mut() {
                    statement.notation = Some(value);
                }
            }
            None => {}
        }
    }

    fn close(&mut self, name: &[u8]) -> ApplicationResult<()> {
        match name {
            b"asn:StandardDocument" => {
                self.in_document = false;
                self.save_document()?;
            }
            b"asn:Statement" => {
                if let Some(statement) = self.statement.take() {
                    self.save_statement(statement)?;
                }
            }
            _ => self.field = None,
        }
        Ok(())
    }

    /// The document element closes before the first statement, so the set
    /// always exists when statements arrive.
    fn save_document(&mut self) -> ApplicationResult<()> {
        if self.set.is_some() {
            return Ok(());
        }
        let idnumber = self.doc_uri.clone().ok_or_else(|| {
            ApplicationError::import_integrity("asn:StandardDocument without rdf:about")
        })?;
        let mut set = OutcomeSet::new(idnumber, self.title.clone());
        set.description = self.doc_description.clone();
        set.provider = self.publisher.clone();
        self.set = Some(self.tree.create_set(set)?);
        Ok(())
    }

    fn save_statement(&mut self, statement: Statement) -> ApplicationResult<()> {
        let set_id = self
            .set
            .as_ref()
            .map(|s| s.id)
            .ok_or_else(|| {
                ApplicationError::import_integrity("asn:Statement before asn:StandardDocument")
            })?;
        if self.idmap.contains(&statement.uri) {
            return Err(ApplicationError::import_integrity(format!(
                "identifier '{}' declared twice in one import run",
                statement.uri
            )));
        }
        let parent_id = match statement.child_of.as_deref() {
            Some(uri) if Some(uri) == self.doc_uri.as_deref() => None,
            Some(uri) => Some(self.idmap.resolve(uri)?),
            None => None,
        };
        let mut outcome = Outcome::new(set_id, parent_id, statement.uri.clone(), statement.description);
        outcome.docnum = statement.notation;
        outcome.assessable = statement.assessable;
        outcome.subjects = self
            .doc_subjects
            .iter()
            .cloned()
            .chain(statement.subjects)
            .collect();
        outcome.edulevels = self
            .doc_levels
            .iter()
            .cloned()
            .chain(statement.edulevels)
            .collect();
        let saved = self.tree.create(outcome)?;
        self.idmap.insert(statement.uri, saved.id)?;
        self.created += 1;
        Ok(())
    }
}

/// Trailing path segment of a code URI, e.g. ".../educationLevel/9" -> "9".
fn trailing_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}
