use crate::element::Node;
use crate::errors::AutomationError;
use crate::selector::Selector;
use crate::tree_search::{find_all_matching, find_first_matching, nearest_clickable_ancestor};

/// Finds nodes matching a selector within one tree snapshot
///
/// A locator never waits: the tree it searches is the snapshot delivered with
/// the current event. Retrying means evaluating a fresh locator against the
/// next event's tree.
#[derive(Debug, Clone)]
pub struct Locator {
    root: Node,
    selector: Selector,
}

impl Locator {
    pub(crate) fn new(root: Node, selector: Selector) -> Self {
        Self { root, selector }
    }

    /// The pre-order-first match
    pub fn first(&self) -> Result<Node, AutomationError> {
        if !self.selector.is_valid() {
            return Err(AutomationError::InvalidArgument(format!(
                "Invalid selector: {}",
                self.selector
            )));
        }
        find_first_matching(&self.root, &self.selector).ok_or_else(|| {
            AutomationError::ElementNotFound(format!("No node matches {}", self.selector))
        })
    }

    /// Every match in pre-order
    pub fn all(&self) -> Vec<Node> {
        find_all_matching(&self.root, &self.selector)
    }

    /// The nearest clickable ancestor of the first match, the match included
    pub fn clickable(&self) -> Result<Node, AutomationError> {
        let node = self.first()?;
        nearest_clickable_ancestor(&node).ok_or_else(|| {
            AutomationError::ElementNotFound(format!(
                "No clickable ancestor for node matching {}",
                self.selector
            ))
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}
