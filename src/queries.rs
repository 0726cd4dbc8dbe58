//! Query Facade
//!
//! The three composed read-only operations exposed to the enclosing tool
//! server: list workflows, get workflow context, get agent menu. Each
//! combines the scanner, the parsers, and the resolver, re-reading from
//! disk on every call. Absent names surface here, and only here, as
//! [`DefinitionError::NotFound`].

pub mod render;

use crate::agent::{AgentIdentity, MenuItemKind};
use crate::error::DefinitionError;
use crate::resolver::{resolve_value, ContextOptions, ResolveContext};
use crate::scanner::{find_agent_by_name, find_workflow_by_name, scan_definition_tree};
use crate::workflow::{load_workflow, LoadOptions};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Conventional agents directory name under the definitions root.
const AGENTS_DIR: &str = "agents";

/// One classified menu entry of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct MenuEntryView {
    pub label: String,
    pub kind: MenuItemKind,
    pub command: Option<String>,
    /// Full attribute bag, names and values as written in the document.
    pub attributes: Vec<(String, String)>,
}

/// Result of [`agent_menu`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentMenuView {
    pub agent: AgentIdentity,
    pub description: Option<String>,
    pub path: PathBuf,
    pub items: Vec<MenuEntryView>,
}

/// Result of [`workflow_context`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowContextView {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
    /// The manifest mapping; placeholder-resolved when resolution was
    /// requested, verbatim otherwise.
    pub manifest: Mapping,
    pub instructions: Option<String>,
    /// Well-known variables plus every string-valued manifest field,
    /// fully resolved. Empty when resolution was not requested.
    pub resolved_variables: BTreeMap<String, String>,
    /// Human-readable execution guide.
    pub execution_guide: String,
}

/// One row of [`list_workflows`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub standalone: bool,
    pub path: PathBuf,
    pub relative_path: PathBuf,
}

/// Result of [`list_workflows`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowListing {
    pub workflows: Vec<WorkflowSummary>,
    /// Categories observed across the whole tree, sorted and deduplicated,
    /// regardless of the filters applied to `workflows`.
    pub categories: Vec<String>,
    pub total_count: usize,
}

/// Look up an agent by name under `root/agents` and return its classified
/// menu.
pub fn agent_menu(root: &Path, agent_name: &str) -> Result<AgentMenuView, DefinitionError> {
    let agents_dir = root.join(AGENTS_DIR);
    let (descriptor, path) = find_agent_by_name(&agents_dir, agent_name)
        .ok_or_else(|| DefinitionError::NotFound(format!("Agent not found: {}", agent_name)))?;

    let items = descriptor
        .menu
        .iter()
        .map(|item| MenuEntryView {
            label: item.label.clone(),
            kind: item.kind(),
            command: item.command().map(|c| c.to_string()),
            attributes: item.attributes.clone(),
        })
        .collect();

    Ok(AgentMenuView {
        agent: descriptor.agent,
        description: descriptor.description,
        path,
        items,
    })
}

/// Look up a workflow by name, load it, and assemble its execution
/// context, optionally resolving every placeholder in the manifest
/// against `project_root`.
pub fn workflow_context(
    root: &Path,
    project_root: &Path,
    name: &str,
    load_instructions: bool,
    resolve_config: bool,
) -> Result<WorkflowContextView, DefinitionError> {
    let found = find_workflow_by_name(root, name)
        .ok_or_else(|| DefinitionError::NotFound(format!("Workflow not found: {}", name)))?;

    let loaded = load_workflow(
        &found.path,
        LoadOptions {
            instructions: load_instructions,
            ..Default::default()
        },
    )?;

    let mut manifest = loaded.descriptor.to_mapping();
    let mut resolved_variables = BTreeMap::new();

    if resolve_config {
        let ctx = ResolveContext::create(
            project_root,
            ContextOptions {
                bmad_root: Some(root.to_path_buf()),
                workflow_dir: Some(found.path.clone()),
                ..Default::default()
            },
        );

        let resolved = resolve_value(&Value::Mapping(manifest), &ctx)?;
        manifest = match resolved {
            Value::Mapping(mapping) => mapping,
            _ => Mapping::new(),
        };

        resolved_variables.insert(
            "project-root".to_string(),
            ctx.project_root.display().to_string(),
        );
        resolved_variables.insert(
            "config_source".to_string(),
            ctx.config_path.display().to_string(),
        );
        resolved_variables.insert(
            "installed_path".to_string(),
            found.path.display().to_string(),
        );
        for (key, value) in &manifest {
            if let (Value::String(key), Value::String(value)) = (key, value) {
                resolved_variables
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    let execution_guide = render::execution_guide(
        &loaded.descriptor,
        &found.category,
        &found.path,
        &resolved_variables,
        loaded.instructions.as_deref(),
    );

    Ok(WorkflowContextView {
        name: loaded.descriptor.name.clone(),
        category: found.category,
        path: found.path,
        manifest,
        instructions: loaded.instructions,
        resolved_variables,
        execution_guide,
    })
}

/// Discover every workflow under `root`, apply the optional filters, and
/// summarize. Individual bad entries were already skipped with a warning
/// during discovery; filters that match nothing yield an empty listing,
/// never an error.
pub fn list_workflows(
    root: &Path,
    category: Option<&str>,
    standalone_only: bool,
) -> WorkflowListing {
    let discovery = scan_definition_tree(root);

    let workflows: Vec<WorkflowSummary> = discovery
        .workflows
        .into_iter()
        .filter(|w| category.map_or(true, |c| w.category == c))
        .filter(|w| !standalone_only || w.descriptor.is_standalone())
        .map(|w| WorkflowSummary {
            name: w.descriptor.name.clone(),
            description: w.descriptor.description.clone(),
            category: w.category,
            standalone: w.descriptor.is_standalone(),
            path: w.path,
            relative_path: w.relative_path,
        })
        .collect();

    WorkflowListing {
        total_count: workflows.len(),
        workflows,
        categories: discovery.categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn definitions_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        let wf = root.join("workflows/4-implementation/dev-story");
        fs::create_dir_all(&wf).unwrap();
        fs::write(
            wf.join("workflow.yaml"),
            "name: dev-story\ndescription: Implement the next story\nstandalone: true\noutput_folder: \"{config_source}:output_folder\"\n",
        )
        .unwrap();
        fs::write(wf.join("instructions.md"), "Follow the story file.\n").unwrap();

        let agents = root.join("agents");
        fs::create_dir_all(&agents).unwrap();
        fs::write(
            agents.join("master.md"),
            "---\nname: master\n---\n```xml\n<agent id=\"core/master\" name=\"BMad Master\" title=\"Task Executor\">\n<menu>\n<item cmd=\"*dev\" workflow=\"{project-root}/x.yaml\">Run dev-story</item>\n</menu>\n</agent>\n```\n",
        )
        .unwrap();

        fs::write(root.join("config.yaml"), "output_folder: \"{project-root}/docs\"\n").unwrap();
        temp
    }

    #[test]
    fn test_agent_menu_not_found_message() {
        let temp = definitions_tree();
        let err = agent_menu(temp.path(), "nonexistent-agent").unwrap_err();
        assert!(err.to_string().contains("Agent not found"));
    }

    #[test]
    fn test_agent_menu_classifies_items() {
        let temp = definitions_tree();
        let view = agent_menu(temp.path(), "master").unwrap();
        assert_eq!(view.agent.id, "core/master");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].kind, MenuItemKind::Workflow);
        assert_eq!(view.items[0].command.as_deref(), Some("*dev"));
    }

    #[test]
    fn test_workflow_context_not_found_message() {
        let temp = definitions_tree();
        let err = workflow_context(temp.path(), temp.path(), "nope", false, false).unwrap_err();
        assert!(err.to_string().contains("Workflow not found: nope"));
    }

    #[test]
    fn test_workflow_context_resolves_variables() {
        let temp = definitions_tree();
        let project_root = dunce::canonicalize(temp.path()).unwrap();
        let view = workflow_context(temp.path(), temp.path(), "dev-story", true, true).unwrap();

        assert_eq!(
            view.resolved_variables.get("project-root").unwrap(),
            &project_root.display().to_string()
        );
        assert!(view
            .resolved_variables
            .get("installed_path")
            .unwrap()
            .contains("dev-story"));
        assert_eq!(
            view.resolved_variables.get("output_folder").unwrap(),
            &format!("{}/docs", project_root.display())
        );
        assert_eq!(
            view.instructions.as_deref(),
            Some("Follow the story file.\n")
        );
        assert!(view.execution_guide.contains("dev-story"));
    }

    #[test]
    fn test_workflow_context_without_resolution_keeps_placeholders() {
        let temp = definitions_tree();
        let view = workflow_context(temp.path(), temp.path(), "dev-story", false, false).unwrap();
        assert!(view.resolved_variables.is_empty());
        assert_eq!(
            view.manifest.get("output_folder").and_then(|v| v.as_str()),
            Some("{config_source}:output_folder")
        );
    }

    #[test]
    fn test_list_workflows_scenario() {
        let temp = definitions_tree();
        let listing = list_workflows(temp.path(), None, false);
        assert_eq!(listing.total_count, 1);
        let summary = &listing.workflows[0];
        assert_eq!(summary.name, "dev-story");
        assert_eq!(summary.category, "4-implementation");
        assert!(summary.standalone);
    }

    #[test]
    fn test_list_workflows_unmatched_category_is_empty() {
        let temp = definitions_tree();
        let listing = list_workflows(temp.path(), Some("9-nothing"), false);
        assert!(listing.workflows.is_empty());
        assert_eq!(listing.total_count, 0);
    }

    #[test]
    fn test_list_workflows_standalone_filter() {
        let temp = definitions_tree();
        let wf = temp.path().join("workflows/2-planning/prd");
        fs::create_dir_all(&wf).unwrap();
        fs::write(wf.join("workflow.yaml"), "name: prd\n").unwrap();

        let listing = list_workflows(temp.path(), None, true);
        assert_eq!(listing.total_count, 1);
        assert_eq!(listing.workflows[0].name, "dev-story");
        // Categories still reflect the whole tree.
        assert_eq!(listing.categories, vec!["2-planning", "4-implementation"]);
    }

    #[test]
    fn test_views_serialize_to_json() {
        let temp = definitions_tree();
        let view = agent_menu(temp.path(), "master").unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["agent"]["id"], "core/master");
        assert_eq!(json["items"][0]["kind"], "workflow");
    }
}
