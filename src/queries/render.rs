//! Format workflow execution context as text.

use crate::workflow::WorkflowDescriptor;
use std::collections::BTreeMap;
use std::path::Path;

/// Render the human-readable execution guide for a workflow context.
pub fn execution_guide(
    descriptor: &WorkflowDescriptor,
    category: &str,
    path: &Path,
    resolved_variables: &BTreeMap<String, String>,
    instructions: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Workflow: {} ({})\n\n",
        descriptor.name, category
    ));
    out.push_str(&format!("  Location: {}\n", path.display()));
    out.push_str(&format!(
        "  Standalone: {}\n",
        if descriptor.is_standalone() { "yes" } else { "no" }
    ));
    if let Some(author) = &descriptor.author {
        out.push_str(&format!("  Author: {}\n", author));
    }
    out.push('\n');

    if let Some(description) = &descriptor.description {
        out.push_str("Description\n");
        out.push_str(&format!("  {}\n\n", description));
    }

    if !resolved_variables.is_empty() {
        out.push_str("Resolved variables\n");
        for (key, value) in resolved_variables {
            out.push_str(&format!("  {}: {}\n", key, value));
        }
        out.push('\n');
    }

    out.push_str("Instructions\n");
    match instructions {
        Some(text) => {
            for line in text.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
        None => out.push_str("  No instructions document loaded.\n"),
    }
    out
}
