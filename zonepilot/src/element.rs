use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;

/// Represents one node of the foreground app's accessibility tree
///
/// A `Node` is a view into one snapshot of the tree. A new UI-change event
/// delivers a new tree; held nodes are never updated in place.
#[derive(Debug)]
pub struct Node {
    inner: Box<dyn NodeImpl>,
}

/// Attributes associated with a node
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct NodeAttributes {
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub description: Option<String>,
    /// Widget class, e.g. `android.widget.Switch`
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub class_name: Option<String>,
    /// Resource id, e.g. `android:id/search_src_text`
    #[serde(default, skip_serializing_if = "is_empty_string")]
    pub view_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub clickable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub checkable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub focused: bool,
}

fn is_empty_string(opt: &Option<String>) -> bool {
    match opt {
        Some(s) => s.is_empty(),
        None => true,
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl NodeAttributes {
    /// Best human-readable label: text first, description second.
    pub fn label(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.description.as_deref().filter(|s| !s.is_empty()))
    }
}

impl fmt::Debug for NodeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("NodeAttributes");

        if let Some(ref class_name) = self.class_name {
            debug_struct.field("class_name", class_name);
        }
        if let Some(ref text) = self.text {
            if !text.is_empty() {
                debug_struct.field("text", text);
            }
        }
        if let Some(ref description) = self.description {
            if !description.is_empty() {
                debug_struct.field("description", description);
            }
        }
        if let Some(ref view_id) = self.view_id {
            debug_struct.field("view_id", view_id);
        }

        // Only show flags that are set
        if self.clickable {
            debug_struct.field("clickable", &true);
        }
        if self.checkable {
            debug_struct.field("checkable", &true);
        }
        if self.checked {
            debug_struct.field("checked", &true);
        }
        if self.editable {
            debug_struct.field("editable", &true);
        }
        if self.focused {
            debug_struct.field("focused", &true);
        }

        debug_struct.finish()
    }
}

/// Interface for platform-specific node implementations
pub trait NodeImpl: Send + Sync + Debug {
    /// Identity of the node within the process, stable for the node's lifetime
    fn object_id(&self) -> usize;
    fn attributes(&self) -> NodeAttributes;
    /// Ordered children, left to right
    fn children(&self) -> Result<Vec<Node>, AutomationError>;
    /// Relation-only back reference; `None` at the root or once the tree is gone
    fn parent(&self) -> Result<Option<Node>, AutomationError>;
    fn click(&self) -> Result<(), AutomationError>;
    fn focus(&self) -> Result<(), AutomationError>;
    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
    fn clone_box(&self) -> Box<dyn NodeImpl>;
}

impl Node {
    pub fn new(inner: Box<dyn NodeImpl>) -> Self {
        Self { inner }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn attributes(&self) -> NodeAttributes {
        self.inner.attributes()
    }

    pub fn text(&self) -> Option<String> {
        self.inner.attributes().text
    }

    pub fn description(&self) -> Option<String> {
        self.inner.attributes().description
    }

    pub fn class_name(&self) -> Option<String> {
        self.inner.attributes().class_name
    }

    pub fn view_id(&self) -> Option<String> {
        self.inner.attributes().view_id
    }

    pub fn is_clickable(&self) -> bool {
        self.inner.attributes().clickable
    }

    pub fn is_checked(&self) -> bool {
        self.inner.attributes().checked
    }

    pub fn is_editable(&self) -> bool {
        self.inner.attributes().editable
    }

    pub fn is_focused(&self) -> bool {
        self.inner.attributes().focused
    }

    pub fn children(&self) -> Result<Vec<Node>, AutomationError> {
        self.inner.children()
    }

    pub fn parent(&self) -> Result<Option<Node>, AutomationError> {
        self.inner.parent()
    }

    pub fn click(&self) -> Result<(), AutomationError> {
        self.inner.click()
    }

    pub fn focus(&self) -> Result<(), AutomationError> {
        self.inner.focus()
    }

    pub fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.set_text(text)
    }

    /// Create a locator that searches the subtree rooted at this node
    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        Locator::new(self.clone(), selector.into())
    }

    /// Detach the subtree into plain data, e.g. to store it as a fixture
    pub fn to_serializable(&self) -> SerializableNode {
        let children = self
            .children()
            .unwrap_or_default()
            .iter()
            .map(Node::to_serializable)
            .collect();
        SerializableNode {
            attributes: self.attributes(),
            children,
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for Node {}

/// Plain-data version of a node and its subtree
///
/// Used for JSON fixtures of vendor tree shapes and for recorded replays.
/// It cannot perform actions; materialize it through
/// [`crate::platforms::synthetic::SyntheticEngine::tree`] to get live nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializableNode {
    #[serde(flatten)]
    pub attributes: NodeAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializableNode>,
}

impl SerializableNode {
    pub fn new(class_name: &str) -> Self {
        Self {
            attributes: NodeAttributes {
                class_name: Some(class_name.to_string()),
                ..Default::default()
            },
            children: Vec::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.attributes.text = Some(text.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.attributes.description = Some(description.to_string());
        self
    }

    pub fn view_id(mut self, view_id: &str) -> Self {
        self.attributes.view_id = Some(view_id.to_string());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.attributes.clickable = true;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.attributes.checkable = true;
        self.attributes.checked = checked;
        self
    }

    pub fn editable(mut self) -> Self {
        self.attributes.editable = true;
        self
    }

    pub fn focused(mut self) -> Self {
        self.attributes.focused = true;
        self
    }

    pub fn child(mut self, child: SerializableNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
