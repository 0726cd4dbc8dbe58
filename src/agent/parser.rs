//! Agent document parsing: metadata block, fenced structured block, elements.
//!
//! Agent definitions are UTF-8 documents with an optional leading
//! `---`-delimited YAML metadata block followed by a body containing one
//! ```` ```xml ````-fenced block. Only that block is interpreted; the rest
//! of the body is presentation text and ignored.

use crate::agent::{AgentDescriptor, AgentIdentity, MenuItem, Persona};
use crate::error::DefinitionError;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```xml[ \t]*\r?\n(.*?)```").unwrap());
static AGENT_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<agent\b([^>]*)>").unwrap());
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*"([^"]*)""#).unwrap());
static PERSONA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<persona\b[^>]*>(.*?)</persona>").unwrap());
static PERSONA_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<role\b[^>]*>(.*?)</role>").unwrap());
static PERSONA_IDENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<identity\b[^>]*>(.*?)</identity>").unwrap());
static PERSONA_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<communication_style\b[^>]*>(.*?)</communication_style>").unwrap()
});
static PERSONA_PRINCIPLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<principles\b[^>]*>(.*?)</principles>").unwrap());
static MENU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<menu\b[^>]*>(.*?)</menu>").unwrap());
static MENU_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item\b([^>]*)>(.*?)</item>").unwrap());
static ACTIVATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<activation\b[^>]*>(.*?)</activation>").unwrap());

/// Read and parse an agent definition file.
pub fn parse_agent_file(path: &Path) -> Result<AgentDescriptor, DefinitionError> {
    let text = std::fs::read_to_string(path)?;
    parse_agent_document(&text)
}

/// Parse one agent definition document.
///
/// Fails with [`DefinitionError::Parse`] when the fenced structured block is
/// absent or the `<agent>` element lacks a required attribute.
pub fn parse_agent_document(text: &str) -> Result<AgentDescriptor, DefinitionError> {
    let (metadata, body) = split_metadata_block(text)?;

    let block = FENCED_BLOCK
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| DefinitionError::parse("no structured block"))?;

    let agent = parse_agent_identity(block)?;
    let persona = parse_persona(block);
    let menu = parse_menu(block);
    let activation = ACTIVATION
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let (name, description) = match metadata {
        Some(meta) => (
            mapping_string(&meta, "name"),
            mapping_string(&meta, "description"),
        ),
        None => (None, None),
    };

    Ok(AgentDescriptor {
        name,
        description,
        agent,
        persona,
        menu,
        activation,
    })
}

/// Split an optional leading `---`-delimited YAML metadata block from the
/// body. A missing or unterminated block is treated as absent; a present
/// block with malformed YAML is a parse failure.
fn split_metadata_block(text: &str) -> Result<(Option<serde_yaml::Mapping>, &str), DefinitionError> {
    let trimmed = text.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return Ok((None, text));
    };
    if !rest.starts_with('\n') && !rest.starts_with("\r\n") {
        return Ok((None, text));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let metadata = if yaml.trim().is_empty() {
                None
            } else {
                let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).map_err(|e| {
                    DefinitionError::parse(format!("malformed metadata block: {}", e))
                })?;
                Some(mapping)
            };
            return Ok((metadata, body));
        }
        offset += line.len();
    }

    // No closing delimiter: the whole document is body text.
    Ok((None, text))
}

fn mapping_string(mapping: &serde_yaml::Mapping, key: &str) -> Option<String> {
    mapping.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

fn parse_agent_identity(block: &str) -> Result<AgentIdentity, DefinitionError> {
    let attrs = AGENT_TAG
        .captures(block)
        .map(|c| parse_attributes(&c[1]))
        .ok_or_else(|| DefinitionError::parse("missing required agent attributes"))?;

    let get = |name: &str| {
        attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    match (get("id"), get("name"), get("title")) {
        (Some(id), Some(name), Some(title)) => Ok(AgentIdentity {
            id,
            name,
            title,
            icon: get("icon"),
        }),
        _ => Err(DefinitionError::parse("missing required agent attributes")),
    }
}

fn parse_persona(block: &str) -> Option<Persona> {
    let inner = PERSONA.captures(block)?.get(1)?.as_str();
    let field = |re: &Regex| {
        re.captures(inner)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };
    Some(Persona {
        role: field(&PERSONA_ROLE),
        identity: field(&PERSONA_IDENTITY),
        communication_style: field(&PERSONA_STYLE),
        principles: field(&PERSONA_PRINCIPLES),
    })
}

fn parse_menu(block: &str) -> Vec<MenuItem> {
    let Some(inner) = MENU.captures(block).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    MENU_ITEM
        .captures_iter(inner.as_str())
        .map(|c| MenuItem {
            label: c[2].trim().to_string(),
            attributes: parse_attributes(&c[1]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MenuItemKind;

    const DOC: &str = r#"---
name: bmad-master
description: Master task executor
---

# BMad Master

```xml
<agent id="bmad/core/agents/master" name="BMad Master" title="Master Task Executor" icon="🧙">
  <persona>
    <role>Master task executor and workflow orchestrator</role>
    <identity>Executes any task across all modules</identity>
    <communication_style>Direct and efficient</communication_style>
    <principles>Execute immediately, never ask twice</principles>
  </persona>
  <menu>
    <item cmd="*help" action="show numbered menu">Show available commands</item>
    <item cmd="*create-doc" workflow="{project-root}/bmad/workflows/create-doc/workflow.yaml">Create a document</item>
    <item cmd="*run" exec="{installed_path}/run.md" data="{config_source}:output_folder">Run a task</item>
    <item cmd="*exit" future-attr="kept">Exit agent mode</item>
  </menu>
  <activation critical="true">
    Load persona. Greet the user.
  </activation>
</agent>
```
"#;

    #[test]
    fn test_parse_full_document() {
        let parsed = parse_agent_document(DOC).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("bmad-master"));
        assert_eq!(parsed.description.as_deref(), Some("Master task executor"));
        assert_eq!(parsed.agent.id, "bmad/core/agents/master");
        assert_eq!(parsed.agent.name, "BMad Master");
        assert_eq!(parsed.agent.title, "Master Task Executor");
        assert_eq!(parsed.agent.icon.as_deref(), Some("🧙"));
    }

    #[test]
    fn test_menu_order_and_count_match_source() {
        let parsed = parse_agent_document(DOC).unwrap();
        assert_eq!(parsed.menu.len(), 4);
        let commands: Vec<_> = parsed.menu.iter().map(|i| i.command().unwrap()).collect();
        assert_eq!(commands, vec!["*help", "*create-doc", "*run", "*exit"]);
    }

    #[test]
    fn test_menu_item_kinds() {
        let parsed = parse_agent_document(DOC).unwrap();
        let kinds: Vec<_> = parsed.menu.iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                MenuItemKind::Action,
                MenuItemKind::Workflow,
                MenuItemKind::Exec,
                MenuItemKind::Other,
            ]
        );
    }

    #[test]
    fn test_unknown_item_attribute_round_trips() {
        let parsed = parse_agent_document(DOC).unwrap();
        assert_eq!(parsed.menu[3].attribute("future-attr"), Some("kept"));
    }

    #[test]
    fn test_persona_fields() {
        let parsed = parse_agent_document(DOC).unwrap();
        let persona = parsed.persona.unwrap();
        assert!(persona.role.unwrap().starts_with("Master task executor"));
        assert_eq!(persona.communication_style.as_deref(), Some("Direct and efficient"));
    }

    #[test]
    fn test_activation_text_is_verbatim() {
        let parsed = parse_agent_document(DOC).unwrap();
        let activation = parsed.activation.unwrap();
        assert!(activation.contains("Load persona. Greet the user."));
    }

    #[test]
    fn test_missing_structured_block() {
        let err = parse_agent_document("# Just a readme\n\nNo block here.").unwrap_err();
        assert!(err.to_string().contains("no structured block"));
    }

    #[test]
    fn test_missing_required_attribute() {
        let doc = "```xml\n<agent id=\"a\" name=\"A\">\n<menu></menu>\n</agent>\n```\n";
        let err = parse_agent_document(doc).unwrap_err();
        assert!(err.to_string().contains("missing required agent attributes"));
    }

    #[test]
    fn test_document_without_metadata_block() {
        let doc = "```xml\n<agent id=\"a\" name=\"A\" title=\"T\"></agent>\n```\n";
        let parsed = parse_agent_document(doc).unwrap();
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.agent.title, "T");
        assert!(parsed.menu.is_empty());
        assert!(parsed.persona.is_none());
    }

    #[test]
    fn test_unterminated_metadata_block_is_body_text() {
        let doc = "---\nname: x\n\n```xml\n<agent id=\"a\" name=\"A\" title=\"T\"></agent>\n```\n";
        let parsed = parse_agent_document(doc).unwrap();
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.agent.id, "a");
    }
}
