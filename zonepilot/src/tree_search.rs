//! Predicate-based traversal over accessibility trees
//!
//! Traversal is an explicit-stack, depth-first, pre-order walk: a node is
//! visited before its children and children are visited left to right. When
//! several nodes match, the pre-order-first one wins. Stage handlers rely on
//! that tie-break, so it is part of the contract.

use crate::element::Node;
use crate::selector::Selector;
use tracing::debug;

/// Return the pre-order-first node in `root`'s subtree satisfying `predicate`.
pub fn find_first<F>(root: &Node, predicate: F) -> Option<Node>
where
    F: Fn(&Node) -> bool,
{
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if predicate(&node) {
            return Some(node);
        }
        match node.children() {
            // Reversed so the leftmost child is popped first
            Ok(children) => stack.extend(children.into_iter().rev()),
            Err(e) => debug!("Failed to get children: {}. Skipping subtree.", e),
        }
    }
    None
}

/// Return the pre-order-first node matching `selector`.
pub fn find_first_matching(root: &Node, selector: &Selector) -> Option<Node> {
    find_first(root, |node| selector.matches(&node.attributes()))
}

/// Return every node matching `selector`, in pre-order.
pub fn find_all_matching(root: &Node, selector: &Selector) -> Vec<Node> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if selector.matches(&node.attributes()) {
            found.push(node.clone());
        }
        if let Ok(children) = node.children() {
            stack.extend(children.into_iter().rev());
        }
    }
    found
}

/// Walk from `node` towards the root and return the first clickable node,
/// `node` itself included.
pub fn nearest_clickable_ancestor(node: &Node) -> Option<Node> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if candidate.is_clickable() {
            return Some(candidate);
        }
        current = match candidate.parent() {
            Ok(parent) => parent,
            Err(e) => {
                debug!("Parent lookup failed: {}", e);
                None
            }
        };
    }
    None
}
