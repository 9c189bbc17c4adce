//! Generic vocabulary exporter
//!
//! Serializes one live outcome set to the round-trip `<data>` document
//! read back by [`GenericReader`](super::GenericReader). Outcomes are
//! written pre-order so every parent id precedes the children that
//! reference it.

use std::io::Write;
use std::sync::Arc;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::application::services::TreeService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, Outcome, OutcomeSet, SetId};

pub struct GenericExporter {
    tree: Arc<TreeService>,
    component: String,
}

impl GenericExporter {
    pub fn new(tree: Arc<TreeService>, component: impl Into<String>) -> Self {
        Self {
            tree,
            component: component.into(),
        }
    }

    /// Serialize the set and its live outcomes to an XML string.
    pub fn export_set(&self, id: SetId) -> ApplicationResult<String> {
        let set = self
            .tree
            .find_set(id)
            .filter(|s| !s.deleted)
            .ok_or(DomainError::SetNotFound(id))?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;

        let mut data = BytesStart::new("data");
        data.push_attribute(("component", self.component.as_str()));
        writer
            .write_event(Event::Start(data))
            .map_err(write_error)?;

        self.write_set(&mut writer, &set)?;

        let mut exported = 0usize;
        for root in self.tree.children(set.id, None) {
            for outcome in self.tree.branch(root.id)? {
                self.write_outcome(&mut writer, &outcome)?;
                exported += 1;
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new("data")))
            .map_err(write_error)?;
        debug!("export: set '{}' with {} outcomes", set.idnumber, exported);

        String::from_utf8(writer.into_inner()).map_err(|e| ApplicationError::OperationFailed {
            context: "serializing outcome set".to_string(),
            source: Box::new(e),
        })
    }

    fn write_set<W: Write>(
        &self,
        writer: &mut Writer<W>,
        set: &OutcomeSet,
    ) -> ApplicationResult<()> {
        writer
            .write_event(Event::Start(BytesStart::new("outcomeSet")))
            .map_err(write_error)?;
        text_element(writer, "id", &set.id.to_string())?;
        text_element(writer, "idnumber", &set.idnumber)?;
        text_element(writer, "name", &set.name)?;
        text_element(writer, "description", &set.description)?;
        if let Some(provider) = &set.provider {
            text_element(writer, "provider", provider)?;
        }
        if let Some(revision) = &set.revision {
            text_element(writer, "revision", revision)?;
        }
        if let Some(region) = &set.region {
            text_element(writer, "region", region)?;
        }
        text_element(writer, "deleted", "0")?;
        writer
            .write_event(Event::End(BytesEnd::new("outcomeSet")))
            .map_err(write_error)?;
        Ok(())
    }

    fn write_outcome<W: Write>(
        &self,
        writer: &mut Writer<W>,
        outcome: &Outcome,
    ) -> ApplicationResult<()> {
        writer
            .write_event(Event::Start(BytesStart::new("outcome")))
            .map_err(write_error)?;
        text_element(writer, "id", &outcome.id.to_string())?;
        if let Some(parent_id) = outcome.parent_id {
            text_element(writer, "parentid", &parent_id.to_string())?;
        }
        text_element(writer, "idnumber", &outcome.idnumber)?;
        if let Some(docnum) = &outcome.docnum {
            text_element(writer, "docnum", docnum)?;
        }
        text_element(writer, "description", &outcome.description)?;
        text_element(writer, "assessable", if outcome.assessable { "1" } else { "0" })?;
        text_element(writer, "deleted", "0")?;
        for subject in &outcome.subjects {
            text_element(writer, "subject", subject)?;
        }
        for edulevel in &outcome.edulevels {
            text_element(writer, "edulevel", edulevel)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("outcome")))
            .map_err(write_error)?;
        Ok(())
    }
}

fn text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> ApplicationResult<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_error)?;
    if !value.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)?;
    Ok(())
}

fn write_error<E>(source: E) -> ApplicationError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ApplicationError::OperationFailed {
        context: "serializing outcome set".to_string(),
        source: Box::new(source),
    }
}
