//! Workflow Manifest Model
//!
//! A workflow is a directory holding a `workflow.yaml` manifest and,
//! by convention, sibling instruction/validation/template documents.
//! [`manifest`] parses the manifest into a [`WorkflowDescriptor`];
//! [`loader`] adds best-effort sibling loading and the directory probe
//! used by tree traversal.

pub mod loader;
pub mod manifest;

pub use loader::{is_workflow_directory, load_workflow, LoadOptions, LoadedWorkflow, MANIFEST_FILE};
pub use manifest::parse_manifest;

use serde::Serialize;
use serde_yaml::Mapping;

/// Parsed workflow manifest.
///
/// Recognized fields are typed; everything else the manifest declares is
/// preserved verbatim in `extra` so later variable resolution sees the
/// whole document.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDescriptor {
    /// Required, non-empty declared name.
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub standalone: Option<bool>,
    /// Path of the configuration document this workflow reads settings from.
    pub config_source: Option<String>,
    /// Self-referential install location marker, usually placeholder-bearing.
    pub installed_path: Option<String>,
    /// Path marker for the instructions document.
    pub instructions: Option<String>,
    /// Path marker for the validation checklist.
    pub validation: Option<String>,
    /// Path marker for the output template.
    pub template: Option<String>,
    /// Unrecognized manifest fields, verbatim and in document order.
    pub extra: Mapping,
}

impl WorkflowDescriptor {
    /// Whether the manifest declares `standalone: true`.
    pub fn is_standalone(&self) -> bool {
        self.standalone.unwrap_or(false)
    }

    /// Reassemble the full manifest as a YAML mapping, typed fields first,
    /// then the preserved extras.
    pub fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();
        let mut put = |key: &str, value: serde_yaml::Value| {
            mapping.insert(serde_yaml::Value::String(key.to_string()), value);
        };
        put("name", serde_yaml::Value::String(self.name.clone()));
        let strings = [
            ("description", &self.description),
            ("author", &self.author),
            ("config_source", &self.config_source),
            ("installed_path", &self.installed_path),
            ("instructions", &self.instructions),
            ("validation", &self.validation),
            ("template", &self.template),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                put(key, serde_yaml::Value::String(value.clone()));
            }
        }
        if let Some(standalone) = self.standalone {
            put("standalone", serde_yaml::Value::Bool(standalone));
        }
        for (key, value) in &self.extra {
            mapping.insert(key.clone(), value.clone());
        }
        mapping
    }
}
