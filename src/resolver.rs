//! Variable Resolution
//!
//! Manifest and menu strings embed placeholder tokens that are rewritten
//! against a [`ResolveContext`]: `{project-root}`, `{config_source}`,
//! `{config_source}:KEY` (a flat key looked up in the configuration
//! document, resolved recursively when its value is itself a string), and
//! `{installed_path}`. Unknown configuration keys leave their token in
//! place; substitution is partial, not all-or-nothing.

use crate::error::DefinitionError;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum substitution recursion depth. The sole cycle defense: any true
/// cycle in the configuration graph exceeds a finite bound eventually.
const MAX_RESOLUTION_DEPTH: usize = 10;

/// Conventional definitions-root directory name under the project root.
const DEFAULT_BMAD_DIR: &str = "bmad";
/// Conventional configuration filename under the definitions root.
const CONFIG_FILE: &str = "config.yaml";

static CONFIG_KEY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{config_source\}:([A-Za-z0-9_-]+)").unwrap());

/// Everything resolution needs: the project paths and the parsed
/// configuration mapping. Built fresh per query; never cached.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Absolute project root, substituted for `{project-root}`.
    pub project_root: PathBuf,
    /// Definitions root directory.
    pub bmad_root: PathBuf,
    /// Configuration document path, substituted for `{config_source}`.
    pub config_path: PathBuf,
    /// Current workflow's directory, substituted for `{installed_path}`.
    pub workflow_dir: Option<PathBuf>,
    /// Parsed configuration mapping; absent when the document is missing
    /// or unreadable.
    pub config_data: Option<Mapping>,
}

/// Optional overrides for [`ResolveContext::create`]. Unset paths are
/// derived from their conventional locations.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub bmad_root: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub workflow_dir: Option<PathBuf>,
}

impl ResolveContext {
    /// Build a context for `project_root`, deriving the definitions root
    /// and configuration path when not overridden, then loading the
    /// configuration document.
    ///
    /// Configuration load failures degrade to an absent `config_data` with
    /// a logged warning; most callers do not need configuration-bound
    /// variables and resolution stays partial rather than failing.
    pub fn create(project_root: &Path, options: ContextOptions) -> Self {
        let project_root =
            dunce::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
        let bmad_root = options
            .bmad_root
            .unwrap_or_else(|| project_root.join(DEFAULT_BMAD_DIR));
        let config_path = options
            .config_path
            .unwrap_or_else(|| bmad_root.join(CONFIG_FILE));
        let config_data = load_config_data(&config_path);

        Self {
            project_root,
            bmad_root,
            config_path,
            workflow_dir: options.workflow_dir,
            config_data,
        }
    }

    fn config_value(&self, key: &str) -> Option<&Value> {
        self.config_data.as_ref()?.get(key)
    }
}

/// Load and parse the configuration document. A pure function of the path:
/// no caching here; an external layer may memoize if the repeated I/O
/// matters.
fn load_config_data(path: &Path) -> Option<Mapping> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                "Configuration document {} not loaded: {}",
                path.display(),
                e
            );
            return None;
        }
    };
    match serde_yaml::from_str::<Mapping>(&text) {
        Ok(mapping) => Some(mapping),
        Err(e) => {
            tracing::warn!(
                "Configuration document {} not parseable: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Resolve all placeholder tokens in `input` against `ctx`.
pub fn resolve(input: &str, ctx: &ResolveContext) -> Result<String, DefinitionError> {
    resolve_bounded(input, ctx, 0, input)
}

fn resolve_bounded(
    input: &str,
    ctx: &ResolveContext,
    depth: usize,
    original: &str,
) -> Result<String, DefinitionError> {
    if depth > MAX_RESOLUTION_DEPTH {
        return Err(DefinitionError::Resolution {
            input: original.to_string(),
        });
    }

    // The keyed form must be rewritten before the standalone form, which
    // would otherwise consume its prefix.
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in CONFIG_KEY_TOKEN.captures_iter(input) {
        let token = caps.get(0).expect("regex match has a full capture");
        out.push_str(&input[last..token.start()]);
        match ctx.config_value(&caps[1]) {
            Some(Value::String(value)) => {
                out.push_str(&resolve_bounded(value, ctx, depth + 1, original)?)
            }
            Some(Value::Bool(value)) => out.push_str(&value.to_string()),
            Some(Value::Number(value)) => out.push_str(&value.to_string()),
            // Absent keys and non-scalar values leave the token unresolved.
            _ => out.push_str(token.as_str()),
        }
        last = token.end();
    }
    out.push_str(&input[last..]);

    let mut out = out.replace("{project-root}", &display(&ctx.project_root));
    out = out.replace("{config_source}", &display(&ctx.config_path));
    if let Some(dir) = &ctx.workflow_dir {
        out = out.replace("{installed_path}", &display(dir));
    }
    Ok(out)
}

/// Resolve every string leaf of an arbitrarily nested value, without
/// mutating the input. Non-string scalars pass through unchanged; mapping
/// keys are never rewritten.
pub fn resolve_value(value: &Value, ctx: &ResolveContext) -> Result<Value, DefinitionError> {
    match value {
        Value::String(s) => Ok(Value::String(resolve(s, ctx)?)),
        Value::Sequence(items) => items
            .iter()
            .map(|item| resolve_value(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(mapping) => {
            let mut out = Mapping::new();
            for (key, item) in mapping {
                out.insert(key.clone(), resolve_value(item, ctx)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other.clone()),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
