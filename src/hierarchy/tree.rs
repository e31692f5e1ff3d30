use std::fmt;

use slotmap::SlotMap;
use tracing::debug;

use super::{ContainmentOracle, ShellGenerator};
use crate::error::{HierarchyError, Result};
use crate::geometry::{Shell, Structure};

slotmap::new_key_type! {
    /// Unique identifier for a node in a [`HierarchyTree`].
    pub struct NodeId;
}

/// One nesting level: a shell, the structures it was generated for, and the
/// nodes nested inside it.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    shell: Option<Shell>,
    structures: Vec<Structure>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl HierarchyNode {
    /// The node's shell; `None` only for an unbounded root.
    #[must_use]
    pub fn shell(&self) -> Option<&Shell> {
        self.shell.as_ref()
    }

    /// Structures owned directly by this node.
    #[must_use]
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Child nodes in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Containment hierarchy of paper shells.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]; the parent
/// link is a plain lookup key, never ownership. After every insertion, each
/// structure below a node lies inside that node's shell, whatever order the
/// structures arrived in.
pub struct HierarchyTree<G, C> {
    nodes: SlotMap<NodeId, HierarchyNode>,
    root: NodeId,
    generator: G,
    oracle: C,
}

impl<G: ShellGenerator, C: ContainmentOracle> HierarchyTree<G, C> {
    /// Creates a tree with an unbounded root that accepts any structure.
    #[must_use]
    pub fn new(generator: G, oracle: C) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(HierarchyNode {
            shell: None,
            structures: Vec::new(),
            children: Vec::new(),
            parent: None,
        });
        Self {
            nodes,
            root,
            generator,
            oracle,
        }
    }

    /// Creates a tree whose root already wraps `structures`.
    ///
    /// Structures inserted later must fit inside the root shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the root shell cannot be generated.
    pub fn with_root(generator: G, oracle: C, structures: Vec<Structure>) -> Result<Self> {
        let shell = generator.generate(&structures)?;
        let mut tree = Self::new(generator, oracle);
        let root = tree.root;
        let node = tree.node_mut(root)?;
        node.shell = Some(shell);
        node.structures = structures;
        Ok(tree)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing but an unbounded, empty root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
            && self
                .nodes
                .get(self.root)
                .is_some_and(|r| r.structures.is_empty())
    }

    /// Looks up a node.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError::NodeNotFound` if the id is stale.
    pub fn node(&self, id: NodeId) -> Result<&HierarchyNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| HierarchyError::NodeNotFound.into())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut HierarchyNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| HierarchyError::NodeNotFound.into())
    }

    /// Inserts a structure somewhere below the root.
    ///
    /// Returns the id of the node created for it.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError::NoEnclosingShell` if the root is bounded and
    /// the structure's shell does not fit inside it, or a geometry error if
    /// its shell cannot be generated.
    pub fn insert(&mut self, structure: Structure) -> Result<NodeId> {
        let name = structure.name().to_owned();
        match self.insert_at(self.root, structure)? {
            Some(id) => Ok(id),
            None => Err(HierarchyError::NoEnclosingShell(name).into()),
        }
    }

    /// Inserts a structure into the subtree rooted at `target`.
    ///
    /// The structure goes into the first child (in insertion order) whose
    /// subtree accepts it. Otherwise it becomes a new child of `target` if
    /// `target` is unbounded or encloses the structure's shell; the target's
    /// existing children are then re-offered to the new node, which adopts
    /// every one it encloses.
    ///
    /// Returns `None` when the subtree rejects the structure, in which case
    /// the caller should retry at an ancestor.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not exist or the shell cannot be
    /// generated.
    pub fn insert_at(&mut self, target: NodeId, structure: Structure) -> Result<Option<NodeId>> {
        self.node(target)?;
        let shell = self.generator.generate(std::slice::from_ref(&structure))?;
        let id = self.nodes.insert(HierarchyNode {
            shell: Some(shell),
            structures: vec![structure],
            children: Vec::new(),
            parent: None,
        });

        if self.insert_node(target, id)? {
            Ok(Some(id))
        } else {
            self.nodes.remove(id);
            Ok(None)
        }
    }

    /// Offers the detached subtree `id` to the subtree rooted at `target`.
    fn insert_node(&mut self, target: NodeId, id: NodeId) -> Result<bool> {
        let children = self.node(target)?.children.clone();
        for child in children {
            if self.insert_node(child, id)? {
                return Ok(true);
            }
        }

        let accepts = match (&self.node(target)?.shell, &self.node(id)?.shell) {
            (None, _) => true,
            (Some(outer), Some(inner)) => self.oracle.contains(outer, inner),
            (Some(_), None) => false,
        };
        if !accepts {
            return Ok(false);
        }

        // The new node may enclose some of its future siblings.
        let detached = std::mem::take(&mut self.node_mut(target)?.children);
        self.node_mut(id)?.parent = Some(target);

        let mut kept = Vec::with_capacity(detached.len() + 1);
        for sibling in detached {
            self.node_mut(sibling)?.parent = None;
            if self.insert_node(id, sibling)? {
                debug!(?sibling, into = ?id, "re-homed subtree");
            } else {
                self.node_mut(sibling)?.parent = Some(target);
                kept.push(sibling);
            }
        }
        kept.push(id);
        self.node_mut(target)?.children = kept;

        debug!(?id, parent = ?target, "inserted node");
        Ok(true)
    }

    /// Adds a structure to an existing node and regenerates its shell.
    ///
    /// The grown shell is not re-tested against the parent; callers must
    /// keep the structure inside the node's enclosing shells.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the shell cannot be
    /// regenerated.
    pub fn append_structure(&mut self, id: NodeId, structure: Structure) -> Result<()> {
        let mut structures = self.node(id)?.structures.clone();
        structures.push(structure);
        let shell = self.generator.generate(&structures)?;
        let node = self.node_mut(id)?;
        node.structures = structures;
        node.shell = Some(shell);
        debug!(?id, structures = node.structures.len(), "regenerated shell");
        Ok(())
    }

    /// Nesting depth of a node; the root is level 0.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError::NodeNotFound` if the id is stale.
    pub fn level(&self, id: NodeId) -> Result<usize> {
        let mut level = 0;
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            level += 1;
            current = self.node(parent)?.parent;
        }
        Ok(level)
    }

    /// All nodes in pre-order (parent before children, children in order).
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// Nodes at the given level, in pre-order.
    #[must_use]
    pub fn nodes_at_level(&self, level: usize) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.level(id).is_ok_and(|l| l == level))
            .collect()
    }

    /// Deepest level present in the tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.level(id).ok())
            .max()
            .unwrap_or(0)
    }

    /// Every structure in the subtree rooted at `id`, in pre-order.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError::NodeNotFound` if the id is stale.
    pub fn subtree_structures(&self, id: NodeId) -> Result<Vec<&Structure>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            out.extend(node.structures.iter());
            stack.extend(node.children.iter().rev());
        }
        Ok(out)
    }

    /// The containment predicate used by this tree.
    pub fn oracle(&self) -> &C {
        &self.oracle
    }
}

impl<G: ShellGenerator, C: ContainmentOracle> fmt::Display for HierarchyTree<G, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.preorder() {
            let level = self.level(id).map_err(|_| fmt::Error)?;
            let node = self.node(id).map_err(|_| fmt::Error)?;
            let names: Vec<&str> = node.structures.iter().map(Structure::name).collect();
            let label = if node.shell.is_none() && names.is_empty() {
                "(unbounded)".to_owned()
            } else {
                names.join(", ")
            };
            writeln!(f, "{}level {level}: {label}", "  ".repeat(level))?;
        }
        Ok(())
    }
}
