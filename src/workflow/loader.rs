//! Workflow directory loading: manifest plus conventional sibling documents.

use crate::error::DefinitionError;
use crate::workflow::{parse_manifest, WorkflowDescriptor};
use serde::Serialize;
use std::path::Path;

/// Conventional manifest filename that marks a workflow directory.
pub const MANIFEST_FILE: &str = "workflow.yaml";

/// Instruction document candidates, tried in order.
const INSTRUCTION_FILES: [&str; 2] = ["instructions.md", "instructions.xml"];
/// Validation checklist filename.
const VALIDATION_FILE: &str = "checklist.md";
/// Output template filename.
const TEMPLATE_FILE: &str = "template.md";

/// Which sibling documents [`load_workflow`] should read.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub instructions: bool,
    pub validation: bool,
    pub template: bool,
}

/// A parsed manifest plus whichever sibling documents were requested and
/// present. Missing siblings yield `None`, never an error: workflow
/// documentation is routinely incomplete.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedWorkflow {
    pub descriptor: WorkflowDescriptor,
    pub instructions: Option<String>,
    pub validation: Option<String>,
    pub template: Option<String>,
}

/// True iff the conventional manifest file exists directly under `dir`.
/// Never recurses and never fails; used as a traversal predicate.
pub fn is_workflow_directory(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// Parse the manifest in `dir`, then best-effort read the sibling documents
/// requested in `options`.
pub fn load_workflow(dir: &Path, options: LoadOptions) -> Result<LoadedWorkflow, DefinitionError> {
    let descriptor = parse_manifest(&dir.join(MANIFEST_FILE))?;

    let instructions = if options.instructions {
        INSTRUCTION_FILES
            .iter()
            .find_map(|name| read_sibling(dir, name))
    } else {
        None
    };
    let validation = if options.validation {
        read_sibling(dir, VALIDATION_FILE)
    } else {
        None
    };
    let template = if options.template {
        read_sibling(dir, TEMPLATE_FILE)
    } else {
        None
    };

    Ok(LoadedWorkflow {
        descriptor,
        instructions,
        validation,
        template,
    })
}

fn read_sibling(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Failed to read workflow document {}: {}", path.display(), e);
            None
        }
    }
}
