//! "AB" hierarchical vocabulary reader
//!
//! A `<standard_document>` with header metadata (`title`, `organization`,
//! self-closing `subject`/`grade_range` code elements) and a body of
//! nested `<standard>`/`<item>` elements. Nesting encodes parentage, so
//! parents always precede children; an explicit `parent_uid` attribute
//! may override the structural parent and must resolve to an already-seen
//! uid. `linkable="Y"` marks an outcome assessable.
//!
//! Grouping `subject`/`grade_range` wrappers apply their code to every
//! outcome created while they are open; header-level self-closing codes
//! apply to the whole document.

use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::labels::{edulevel_label, subject_label};
use super::{
    attribute, check_well_formed, format_error, parse_flag, read_vocabulary_file, IdentifierMap,
    ImportReport,
};
use crate::application::services::TreeService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Outcome, OutcomeId, OutcomeSet};

pub struct AbReader {
    tree: Arc<TreeService>,
}

impl AbReader {
    pub fn new(tree: Arc<TreeService>) -> Self {
        Self { tree }
    }

    pub fn process_file(&self, path: &Path) -> ApplicationResult<ImportReport> {
        let content = read_vocabulary_file(path)?;
        check_well_formed(&content, path)?;
        let mut parser = AbParser::new(&self.tree, path);
        parser.run(&content)?;
        let set = parser
            .set
            .ok_or_else(|| ApplicationError::import_format(path, "no <standard_document> element"))?;
        debug!(
            "ab import: {} -> set '{}' with {} outcomes",
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

/// A `<standard>`/`<item>` element whose end tag has not been seen yet.
///
/// Creation is deferred until either its first child opens (so the child
/// can reference it as parent) or its end tag closes it as a leaf.
#[derive(Debug, Clone)]
struct Frame {
    uid: String,
    explicit_parent: Option<String>,
    assessable: bool,
    description: String,
    docnum: Option<String>,
    created: Option<OutcomeId>,
}

/// Text destinations while a character-data element is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Organization,
    Description,
    DocNum,
}

struct AbParser<'a> {
    tree: &'a TreeService,
    path: &'a Path,
    idmap: IdentifierMap,
    set: Option<OutcomeSet>,
    title: String,
    organization: Option<String>,
    doc_uid: Option<String>,
    doc_subjects: Vec<String>,
    doc_levels: Vec<String>,
    subject_stack: Vec<String>,
    level_stack: Vec<String>,
    frames: Vec<Frame>,
    field: Option<Field>,
    created: usize,
}

impl<'a> AbParser<'a> {
    fn new(tree: &'a TreeService, path: &'a Path) -> Self {
        Self {
            tree,
            path,
            idmap: IdentifierMap::new(),
            set: None,
            title: String::new(),
            organization: None,
            doc_uid: None,
            doc_subjects: Vec::new(),
            doc_levels: Vec::new(),
            subject_stack: Vec::new(),
            level_stack: Vec::new(),
            frames: Vec::new(),
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
                Event::Empty(e) => self.open_empty(&e)?,
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
            b"standard_document" => {
                self.doc_uid = attribute(element, "uid", self.path)?;
            }
            b"title" => self.field = Some(Field::Title),
            b"organization" => self.field = Some(Field::Organization),
            b"description" => self.field = Some(Field::Description),
            b"doc_num" => self.field = Some(Field::DocNum),
            b"subject" => {
                let label = self.subject_code(element)?;
                self.subject_stack.push(label);
            }
            b"grade_range" => {
                let label = self.level_code(element)?;
                self.level_stack.push(label);
            }
            b"standard" | b"item" => self.open_frame(element)?,
            _ => {}
        }
        Ok(())
    }

    fn open_empty(&mut self, element: &BytesStart<'_>) -> ApplicationResult<()> {
        match element.name().as_ref() {
            b"subject" => {
                let label = self.subject_code(element)?;
                self.doc_subjects.push(label);
            }
            b"grade_range" => {
                let label = self.level_code(element)?;
                self.doc_levels.push(label);
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, value: String) {
        match self.field {
            Some(Field::Title) => self.title = value,
            Some(Field::Organization) => self.organization = Some(value),
            Some(Field::Description) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.description = value;
                }
            }
            Some(Field::DocNum) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.docnum = Some(value);
                }
            }
            None => {}
        }
    }

    fn close(&mut self, name: &[u8]) -> ApplicationResult<()> {
        match name {
            b"standard" | b"item" => self.close_frame()?,
            b"subject" => {
                self.subject_stack.pop();
            }
            b"grade_range" => {
                self.level_stack.pop();
            }
            b"standard_document" => self.ensure_set()?,
            _ => self.field = None,
        }
        Ok(())
    }

    fn open_frame(&mut self, element: &BytesStart<'_>) -> ApplicationResult<()> {
        // The enclosing frame becomes a parent; it must exist before its
        // first child is saved.
        self.flush_top()?;
        let uid = attribute(element, "uid", self.path)?.ok_or_else(|| {
            ApplicationError::import_integrity("standard/item element without uid attribute")
        })?;
        let explicit_parent = attribute(element, "parent_uid", self.path)?;
        let assessable = attribute(element, "linkable", self.path)?
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        self.frames.push(Frame {
            uid,
            explicit_parent,
            assessable,
            description: String::new(),
            docnum: None,
            created: None,
        });
        Ok(())
    }

    fn close_frame(&mut self) -> ApplicationResult<()> {
        let frame = self.frames.pop().ok_or_else(|| {
            ApplicationError::import_integrity("unbalanced standard/item end tag")
        })?;
        if frame.created.is_none() {
            let structural_parent = self.frames.last().and_then(|f| f.created);
            self.save_frame(&frame, structural_parent)?;
        }
        Ok(())
    }

    /// Save the innermost open frame if it has not been saved yet.
    fn flush_top(&mut self) -> ApplicationResult<()> {
        let Some(top) = self.frames.last() else {
            return Ok(());
        };
        if top.created.is_some() {
            return Ok(());
        }
        let index = self.frames.len() - 1;
        let frame = self.frames[index].clone();
        let structural_parent = if index > 0 {
            self.frames[index - 1].created
        } else {
            None
        };
        let id = self.save_frame(&frame, structural_parent)?;
        self.frames[index].created = Some(id);
        Ok(())
    }

    fn save_frame(
        &mut self,
        frame: &Frame,
        structural_parent: Option<OutcomeId>,
    ) -> ApplicationResult<OutcomeId> {
        self.ensure_set()?;
        if self.idmap.contains(&frame.uid) {
            return Err(ApplicationError::import_integrity(format!(
                "identifier '{}' declared twice in one import run",
                frame.uid
            )));
        }
        let set_id = self.set.as_ref().map(|s| s.id).unwrap_or_default();
        let parent_id = match frame.explicit_parent.as_deref() {
            Some(uid) => Some(self.idmap.resolve(uid)?),
            None => structural_parent,
        };
        let mut outcome = Outcome::new(
            set_id,
            parent_id,
            frame.uid.clone(),
            frame.description.clone(),
        );
        outcome.docnum = frame.docnum.clone();
        outcome.assessable = frame.assessable;
        outcome.subjects = self
            .doc_subjects
            .iter()
            .chain(self.subject_stack.iter())
            .cloned()
            .collect();
        outcome.edulevels = self
            .doc_levels
            .iter()
            .chain(self.level_stack.iter())
            .cloned()
            .collect();
        let saved = self.tree.create(outcome)?;
        self.idmap.insert(frame.uid.clone(), saved.id)?;
        self.created += 1;
        Ok(saved.id)
    }

    /// Create the owning set on first need, from header metadata.
    fn ensure_set(&mut self) -> ApplicationResult<()> {
        if self.set.is_some() {
            return Ok(());
        }
        if self.title.trim().is_empty() {
            return Err(ApplicationError::import_integrity(
                "standard document has no title",
            ));
        }
        let idnumber = self.doc_uid.clone().unwrap_or_else(|| self.title.clone());
        let mut set = OutcomeSet::new(idnumber, self.title.clone());
        set.provider = self.organization.clone();
        self.set = Some(self.tree.create_set(set)?);
        Ok(())
    }

    fn subject_code(&self, element: &BytesStart<'_>) -> ApplicationResult<String> {
        let code = attribute(element, "code", self.path)?.unwrap_or_default();
        subject_label(&code)
            .map(str::to_string)
            .ok_or_else(|| {
                ApplicationError::import_integrity(format!("unknown subject code '{code}'"))
            })
    }

    fn level_code(&self, element: &BytesStart<'_>) -> ApplicationResult<String> {
        let code = attribute(element, "code", self.path)?.unwrap_or_default();
        edulevel_label(&code)
            .map(str::to_string)
            .ok_or_else(|| {
                ApplicationError::import_integrity(format!("unknown grade range code '{code}'"))
            })
    }
}
