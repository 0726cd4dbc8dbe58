//! Agent Definition Model
//!
//! Descriptor types for agent definition documents: the identity block,
//! optional persona, the ordered command menu, and raw activation text.
//! Parsing lives in [`parser`]; descriptors are immutable value objects
//! built fresh per query.

pub mod parser;

pub use parser::{parse_agent_document, parse_agent_file};

use serde::Serialize;

/// Identity attributes of the `<agent>` element. id, name, and title are
/// required; a descriptor cannot be constructed without them.
#[derive(Debug, Clone, Serialize)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    pub title: String,
    pub icon: Option<String>,
}

/// Optional persona block. Each field is present or absent on its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Persona {
    pub role: Option<String>,
    pub identity: Option<String>,
    pub communication_style: Option<String>,
    pub principles: Option<String>,
}

/// Derived menu item classification.
///
/// Computed on read from attribute precedence (workflow > exec > action >
/// other), never stored, so it cannot diverge from the attribute bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    Workflow,
    Exec,
    Action,
    Other,
}

/// One `<item>` element of the agent menu.
///
/// `attributes` is an open, ordered bag: every XML attribute on the source
/// element is kept as written, unknown names included, so unanticipated
/// attributes round-trip losslessly.
#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    /// Trimmed inner text of the item element.
    pub label: String,
    /// All attributes in document order, names and values unmodified.
    pub attributes: Vec<(String, String)>,
}

impl MenuItem {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The command string, e.g. `*create-doc`.
    pub fn command(&self) -> Option<&str> {
        self.attribute("cmd")
    }

    /// Referenced workflow manifest path, if any.
    pub fn workflow(&self) -> Option<&str> {
        self.attribute("workflow")
    }

    /// Referenced executable document path, if any.
    pub fn exec(&self) -> Option<&str> {
        self.attribute("exec")
    }

    /// Inline action text, if any.
    pub fn action(&self) -> Option<&str> {
        self.attribute("action")
    }

    /// Classify this item by attribute precedence.
    pub fn kind(&self) -> MenuItemKind {
        if self.workflow().is_some() {
            MenuItemKind::Workflow
        } else if self.exec().is_some() {
            MenuItemKind::Exec
        } else if self.action().is_some() {
            MenuItemKind::Action
        } else {
            MenuItemKind::Other
        }
    }
}

/// Fully parsed agent definition document.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    /// `name` from the leading metadata block, when present.
    pub name: Option<String>,
    /// `description` from the leading metadata block, when present.
    pub description: Option<String>,
    /// Required identity block.
    pub agent: AgentIdentity,
    /// Optional persona block.
    pub persona: Option<Persona>,
    /// Menu items in document order.
    pub menu: Vec<MenuItem>,
    /// Raw `<activation>` inner text, verbatim.
    pub activation: Option<String>,
}
