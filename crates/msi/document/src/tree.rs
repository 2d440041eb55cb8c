//! Arena-backed document tree.
//!
//! Every node is stored once in the arena and addressed by its [`NodeId`].
//! Parent/child links are indices, so a node referenced from several
//! indexes is still owned by at most one parent. Moving a node re-parents
//! it; nothing is ever copied.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::{TreeError, TreeResult};
use crate::kind::NodeKind;

/// Stable handle of a node in a [`DocumentTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Node ────────────────────────────────────────────────────────────

/// One element of the document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentNode {
    pub kind: NodeKind,
    pub attributes: Attributes,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    needs_parent: bool,
    pruned: bool,
}

impl DocumentNode {
    fn new(kind: NodeKind, attributes: Attributes) -> Self {
        Self {
            kind,
            attributes,
            children: Vec::new(),
            parent: None,
            needs_parent: false,
            pruned: false,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Set when the node was decoded with a parent reference that has not
    /// been resolved yet. Cleared by [`DocumentTree::attach`].
    pub fn needs_parent(&self) -> bool {
        self.needs_parent
    }

    pub fn is_pruned(&self) -> bool {
        self.pruned
    }

    /// Shorthand for the `Id` attribute most elements carry.
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("Id")
    }
}

// ── Tree ────────────────────────────────────────────────────────────

/// The arena holding every node of one decompiled document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentTree {
    nodes: Vec<DocumentNode>,
    root: NodeId,
}

impl DocumentTree {
    /// Create a tree holding only a root of the given kind.
    pub fn new(root_kind: NodeKind) -> Self {
        Self {
            nodes: vec![DocumentNode::new(root_kind, Attributes::new())],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a detached node to the arena.
    pub fn create(&mut self, kind: NodeKind, attributes: Attributes) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DocumentNode::new(kind, attributes));
        id
    }

    /// Add a node and attach it under `parent` in one step.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        attributes: Attributes,
    ) -> TreeResult<NodeId> {
        self.live(parent)?;
        let id = self.create(kind, attributes);
        self.attach(parent, id)?;
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> TreeResult<&DocumentNode> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut DocumentNode> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> TreeResult<&mut Attributes> {
        Ok(&mut self.get_mut(id)?.attributes)
    }

    pub fn set_needs_parent(&mut self, id: NodeId, value: bool) -> TreeResult<()> {
        self.get_mut(id)?.needs_parent = value;
        Ok(())
    }

    /// Append `child` to the children of `parent`, moving it away from any
    /// previous parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if child == self.root {
            return Err(TreeError::RootImmovable);
        }
        self.live(parent)?;
        self.live(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        self.unlink(child);
        self.nodes[parent.0].children.push(child);
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.needs_parent = false;
        Ok(())
    }

    /// Remove `id` from its parent's children, leaving it an orphan.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        if id == self.root {
            return Err(TreeError::RootImmovable);
        }
        self.get(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Detach a node and mark it and its whole subtree as removed.
    pub fn prune(&mut self, id: NodeId) -> TreeResult<()> {
        self.detach(id)?;
        for node in self.descendants_inclusive(id) {
            self.nodes[node.0].pruned = true;
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether following parent links from `id` reaches the root.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = id;
        // Parent chains are acyclic, so the walk is bounded by the arena size.
        for _ in 0..=self.nodes.len() {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Every node below `id`, in pre-order. `id` itself is excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = self.descendants_inclusive(id);
        if !out.is_empty() {
            out.remove(0);
        }
        out
    }

    /// First direct child of `parent` matching the predicate.
    pub fn find_child<F>(&self, parent: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DocumentNode) -> bool,
    {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| predicate(&self.nodes[c.0]))
    }

    /// Ids of every node that has not been pruned, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.pruned)
            .map(|(i, _)| NodeId(i))
    }

    /// Number of nodes in the arena, pruned ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Owned snapshot of the subtree rooted at `id`.
    pub fn view(&self, id: NodeId) -> TreeResult<NodeView> {
        let node = self.get(id)?;
        let children = node
            .children
            .iter()
            .map(|c| self.view(*c))
            .collect::<TreeResult<Vec<_>>>()?;
        Ok(NodeView {
            kind: node.kind.name().to_string(),
            attributes: node
                .attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        })
    }

    // ── Internal ──

    fn live(&self, id: NodeId) -> TreeResult<&DocumentNode> {
        let node = self.get(id)?;
        if node.pruned {
            return Err(TreeError::Pruned(id));
        }
        Ok(node)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn descendants_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.nodes.get(id.0).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }
}

// ── View ────────────────────────────────────────────────────────────

/// Serializable, owned copy of a subtree. Two runs over the same input
/// produce equal views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<NodeView>,
}

impl NodeView {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child of the given kind whose `Id` matches.
    pub fn child(&self, kind: &str, id: &str) -> Option<&NodeView> {
        self.children
            .iter()
            .find(|c| c.kind == kind && c.attribute("Id") == Some(id))
    }

    /// Direct children of the given kind.
    pub fn children_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a NodeView> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}
