//! In-memory engine and node implementation
//!
//! Trees are built from [`SerializableNode`] data into an arena. Parent links
//! are arena indices, so they are relations only and never keep a subtree
//! alive on their own. Actions do not mutate the snapshot; they are appended
//! to an action log shared by every tree of one engine, the way a device
//! would accept the action and deliver a fresh tree in a later event.

use crate::element::{Node, NodeAttributes, NodeImpl, SerializableNode};
use crate::launch::EntryPoint;
use crate::platforms::AccessibilityEngine;
use crate::service::ServiceComponent;
use crate::utils::lock;
use crate::AutomationError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

static NEXT_OBJECT_ID: AtomicUsize = AtomicUsize::new(1);

/// Kind of action a node received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Focus,
    SetText(String),
}

/// One action performed against a synthetic node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformedAction {
    pub object_id: usize,
    /// Text, description, view id or class of the node, whichever comes first
    pub target: String,
    pub action: ActionKind,
}

#[derive(Debug, Default)]
struct ActionLog {
    actions: Mutex<Vec<PerformedAction>>,
    fail_all: AtomicBool,
}

impl ActionLog {
    fn record(&self, object_id: usize, attrs: &NodeAttributes, action: ActionKind) -> Result<(), AutomationError> {
        let target = attrs
            .label()
            .map(str::to_string)
            .or_else(|| attrs.view_id.clone())
            .or_else(|| attrs.class_name.clone())
            .unwrap_or_default();
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AutomationError::ActionFailed(format!(
                "{action:?} rejected on '{target}'"
            )));
        }
        debug!(object_id, target = %target, ?action, "Synthetic action");
        lock(&self.actions).push(PerformedAction {
            object_id,
            target,
            action,
        });
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    attributes: NodeAttributes,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct Arena {
    base_id: usize,
    entries: Vec<Entry>,
    log: Arc<ActionLog>,
}

impl Arena {
    fn build(data: &SerializableNode, log: Arc<ActionLog>) -> Self {
        let mut entries = Vec::new();
        // (data, parent index) pairs; children pushed in reverse so indices follow pre-order
        let mut pending: Vec<(&SerializableNode, Option<usize>)> = vec![(data, None)];
        while let Some((node, parent)) = pending.pop() {
            let index = entries.len();
            entries.push(Entry {
                attributes: node.attributes.clone(),
                parent,
                children: Vec::with_capacity(node.children.len()),
            });
            if let Some(parent) = parent {
                entries[parent].children.push(index);
            }
            for child in node.children.iter().rev() {
                pending.push((child, Some(index)));
            }
        }
        let base_id = NEXT_OBJECT_ID.fetch_add(entries.len(), Ordering::SeqCst);
        Self {
            base_id,
            entries,
            log,
        }
    }
}

/// A node inside a synthetic tree
#[derive(Debug, Clone)]
pub struct SyntheticNode {
    arena: Arc<Arena>,
    index: usize,
}

impl SyntheticNode {
    fn entry(&self) -> &Entry {
        &self.arena.entries[self.index]
    }

    fn wrap(&self, index: usize) -> Node {
        Node::new(Box::new(SyntheticNode {
            arena: Arc::clone(&self.arena),
            index,
        }))
    }

    fn record(&self, action: ActionKind) -> Result<(), AutomationError> {
        self.arena
            .log
            .record(self.object_id(), &self.entry().attributes, action)
    }
}

impl NodeImpl for SyntheticNode {
    fn object_id(&self) -> usize {
        self.arena.base_id + self.index
    }

    fn attributes(&self) -> NodeAttributes {
        self.entry().attributes.clone()
    }

    fn children(&self) -> Result<Vec<Node>, AutomationError> {
        Ok(self
            .entry()
            .children
            .iter()
            .map(|&index| self.wrap(index))
            .collect())
    }

    fn parent(&self) -> Result<Option<Node>, AutomationError> {
        Ok(self.entry().parent.map(|index| self.wrap(index)))
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.record(ActionKind::Click)
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.record(ActionKind::Focus)
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        if !self.entry().attributes.editable {
            return Err(AutomationError::ActionFailed(
                "set_text on a non-editable node".to_string(),
            ));
        }
        self.record(ActionKind::SetText(text.to_string()))
    }

    fn clone_box(&self) -> Box<dyn NodeImpl> {
        Box::new(self.clone())
    }
}

/// In-memory [`AccessibilityEngine`]
///
/// Launches succeed unless rejected; the service registry starts out
/// unavailable and the secure settings empty.
#[derive(Debug, Default)]
pub struct SyntheticEngine {
    log: Arc<ActionLog>,
    active_root: Mutex<Option<Node>>,
    launch_attempts: Mutex<Vec<EntryPoint>>,
    rejected_launches: Mutex<Vec<EntryPoint>>,
    reject_all_launches: AtomicBool,
    services: Mutex<Option<Vec<ServiceComponent>>>,
    services_setting: Mutex<Option<String>>,
    accessibility_enabled: AtomicBool,
}

impl SyntheticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a tree whose actions are recorded by this engine
    pub fn tree(&self, data: &SerializableNode) -> Node {
        let arena = Arena::build(data, Arc::clone(&self.log));
        Node::new(Box::new(SyntheticNode {
            arena: Arc::new(arena),
            index: 0,
        }))
    }

    /// Materialize a tree and make it the active window
    pub fn show(&self, data: &SerializableNode) -> Node {
        let root = self.tree(data);
        *lock(&self.active_root) = Some(root.clone());
        root
    }

    pub fn hide(&self) {
        *lock(&self.active_root) = None;
    }

    pub fn actions(&self) -> Vec<PerformedAction> {
        lock(&self.log.actions).clone()
    }

    /// Make every node action report failure from now on
    pub fn fail_actions(&self, fail: bool) {
        self.log.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn reject_launch(&self, entry: EntryPoint) {
        lock(&self.rejected_launches).push(entry);
    }

    pub fn reject_all_launches(&self, reject: bool) {
        self.reject_all_launches.store(reject, Ordering::SeqCst);
    }

    /// Every launch attempted, successful or not, in order
    pub fn launch_attempts(&self) -> Vec<EntryPoint> {
        lock(&self.launch_attempts).clone()
    }

    pub fn set_enabled_services(&self, services: Option<Vec<ServiceComponent>>) {
        *lock(&self.services) = services;
    }

    pub fn set_enabled_services_setting(&self, setting: Option<&str>) {
        *lock(&self.services_setting) = setting.map(str::to_string);
    }

    pub fn set_accessibility_enabled(&self, enabled: bool) {
        self.accessibility_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl AccessibilityEngine for SyntheticEngine {
    fn active_root(&self) -> Option<Node> {
        lock(&self.active_root).clone()
    }

    fn launch(&self, entry: &EntryPoint) -> Result<(), AutomationError> {
        lock(&self.launch_attempts).push(entry.clone());
        if self.reject_all_launches.load(Ordering::SeqCst)
            || lock(&self.rejected_launches).contains(entry)
        {
            return Err(AutomationError::PlatformError(format!(
                "No activity found to handle {entry}"
            )));
        }
        Ok(())
    }

    fn enabled_services(&self) -> Option<Vec<ServiceComponent>> {
        lock(&self.services).clone()
    }

    fn enabled_services_setting(&self) -> Option<String> {
        lock(&self.services_setting).clone()
    }

    fn accessibility_enabled(&self) -> bool {
        self.accessibility_enabled.load(Ordering::SeqCst)
    }
}
