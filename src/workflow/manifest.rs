//! Workflow manifest parsing.

use crate::error::DefinitionError;
use crate::workflow::WorkflowDescriptor;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Read and parse a workflow manifest.
///
/// The manifest must be a YAML mapping with a non-empty string `name`.
/// Recognized optional fields are extracted when they have the expected
/// type; a wrong-typed recognized field is not an error and stays in the
/// extra bag verbatim, like every unrecognized field.
pub fn parse_manifest(path: &Path) -> Result<WorkflowDescriptor, DefinitionError> {
    let text = std::fs::read_to_string(path)?;
    parse_manifest_text(&text)
}

pub(crate) fn parse_manifest_text(text: &str) -> Result<WorkflowDescriptor, DefinitionError> {
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| DefinitionError::parse(format!("malformed workflow manifest: {}", e)))?;
    let mut fields = match value {
        Value::Mapping(mapping) => mapping,
        _ => Mapping::new(),
    };

    let name = match fields.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => {
            return Err(DefinitionError::parse(
                "workflow manifest missing name field",
            ))
        }
    };
    fields.remove("name");

    let mut take_string = |key: &str| -> Option<String> {
        match fields.get(key).and_then(Value::as_str) {
            Some(s) => {
                let s = s.to_string();
                fields.remove(key);
                Some(s)
            }
            None => None,
        }
    };

    let description = take_string("description");
    let author = take_string("author");
    let config_source = take_string("config_source");
    let installed_path = take_string("installed_path");
    let instructions = take_string("instructions");
    let validation = take_string("validation");
    let template = take_string("template");

    let standalone = fields.get("standalone").and_then(Value::as_bool);
    if standalone.is_some() {
        fields.remove("standalone");
    }

    Ok(WorkflowDescriptor {
        name,
        description,
        author,
        standalone,
        config_source,
        installed_path,
        instructions,
        validation,
        template,
        extra: fields,
    })
}
