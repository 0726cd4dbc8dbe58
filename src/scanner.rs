//! Definition Tree Scanner
//!
//! Recursive discovery of workflow directories under a definitions root,
//! and flat discovery of agent documents. Discovery favors completeness
//! under partial failure: an unreadable branch or an unparseable candidate
//! is logged and skipped, and the scan as a whole never aborts.

use crate::agent::{parse_agent_file, AgentDescriptor};
use crate::workflow::{is_workflow_directory, parse_manifest, WorkflowDescriptor, MANIFEST_FILE};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Literal path segment whose successor names a workflow's category.
const CATEGORY_MARKER: &str = "workflows";

/// One workflow directory found during traversal.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredWorkflow {
    pub descriptor: WorkflowDescriptor,
    /// Directory holding the manifest.
    pub path: PathBuf,
    /// The same directory relative to the scanned root.
    pub relative_path: PathBuf,
    /// Category derived from the path position under the root.
    pub category: String,
}

/// Ordered discovery outcome plus the deduplicated categories observed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryResult {
    pub workflows: Vec<DiscoveredWorkflow>,
    /// Sorted and deduplicated.
    pub categories: Vec<String>,
}

/// Walk the definitions tree and collect every workflow directory.
pub fn scan_definition_tree(root: &Path) -> DiscoveryResult {
    let workflows: Vec<DiscoveredWorkflow> = discovered_workflows(root).collect();
    let mut categories: Vec<String> = workflows.iter().map(|w| w.category.clone()).collect();
    categories.sort();
    categories.dedup();
    DiscoveryResult {
        workflows,
        categories,
    }
}

/// Find the first workflow whose declared name equals `name`, in
/// filesystem-enumeration order. That order is not guaranteed stable
/// across platforms; with duplicate declared names the winner is
/// undefined. Absence is `None`, upgraded to an error only by the query
/// layer.
pub fn find_workflow_by_name(root: &Path, name: &str) -> Option<DiscoveredWorkflow> {
    discovered_workflows(root).find(|w| w.descriptor.name == name)
}

/// Lazy traversal shared by full discovery and name lookup. A workflow
/// directory does not stop recursion: nested workflow directories are
/// discovered too.
fn discovered_workflows(root: &Path) -> impl Iterator<Item = DiscoveredWorkflow> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable branch under {}: {}", root.display(), e);
                    return None;
                }
            };
            if !entry.file_type().is_dir() || !is_workflow_directory(entry.path()) {
                return None;
            }
            let descriptor = match parse_manifest(&entry.path().join(MANIFEST_FILE)) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    tracing::warn!("Skipping workflow at {}: {}", entry.path().display(), e);
                    return None;
                }
            };
            let relative_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();
            let category = derive_category(&relative_path);
            Some(DiscoveredWorkflow {
                descriptor,
                path: entry.path().to_path_buf(),
                relative_path,
                category,
            })
        })
}

/// Derive a workflow's category from its root-relative path: the segment
/// after a literal `workflows` segment when present, otherwise the
/// second-to-last segment, otherwise `unknown`.
pub fn derive_category(relative_path: &Path) -> String {
    let segments: Vec<&str> = relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    if let Some(pos) = segments.iter().position(|s| *s == CATEGORY_MARKER) {
        if let Some(next) = segments.get(pos + 1) {
            return next.to_string();
        }
    }
    if segments.len() >= 2 {
        segments[segments.len() - 2].to_string()
    } else {
        "unknown".to_string()
    }
}

/// Flat scan of the agents directory for the first document whose declared
/// name (metadata `name`, agent `id`, or agent `name`) equals the query.
/// Unreadable or unparseable candidates are skipped with a warning.
pub fn find_agent_by_name(agents_dir: &Path, name: &str) -> Option<(AgentDescriptor, PathBuf)> {
    let entries = match std::fs::read_dir(agents_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                "Failed to read agents directory {}: {}",
                agents_dir.display(),
                e
            );
            return None;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    "Failed to read directory entry in {}: {}",
                    agents_dir.display(),
                    e
                );
                continue;
            }
        };

        let path = entry.path();
        if path.extension() != Some(std::ffi::OsStr::new("md")) {
            continue;
        }

        let descriptor = match parse_agent_file(&path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!("Skipping agent document {}: {}", path.display(), e);
                continue;
            }
        };

        if declared_name_matches(&descriptor, name) {
            return Some((descriptor, path));
        }
    }

    None
}

fn declared_name_matches(descriptor: &AgentDescriptor, query: &str) -> bool {
    descriptor.name.as_deref() == Some(query)
        || descriptor.agent.id == query
        || descriptor.agent.name == query
}
