//! Node arena and path resolver.
//!
//! The tree owns every node in a [`Slab`] and addresses them by
//! [`NodeId`]. Parent links are plain handles, so walking `..` or
//! rebuilding a node's absolute path never needs shared ownership.
//!
//! Resolution rules:
//!
//! - absolute paths start at the root, relative ones at the working
//!   directory; empty segments are ignored
//! - every segment but the last must name a directory, so a path that
//!   continues past a regular file resolves to nothing
//! - `.` stays put, `..` moves to the parent and fails at the root
//! - a symbolic link that still has segments after it is followed first,
//!   with relative targets resolved from the link's own directory
//! - the final segment is returned as-is, so a link names the link
//! - at most `symlink_limit` link hops are taken per lookup

use slab::Slab;

use crate::mode::Mode;
use crate::node::{Directory, Node, NodeId};

/// Default bound on link hops during one lookup.
pub const DEFAULT_SYMLINK_LIMIT: usize = 40;

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Slab<Node>,
    root: NodeId,
    cwd: NodeId,
    symlink_limit: usize,
}

impl Tree {
    /// Create a tree holding only a root directory with `root_mode`.
    pub fn new(root_mode: Mode, symlink_limit: usize) -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node::directory("", root_mode)));
        Self {
            nodes,
            root,
            cwd: root,
            symlink_limit,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn working_directory(&self) -> NodeId {
        self.cwd
    }

    pub(crate) fn set_working_directory(&mut self, id: NodeId) {
        self.cwd = id;
    }

    pub fn symlink_limit(&self) -> usize {
        self.symlink_limit
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Resolve `path` from the root or the working directory.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        let start = if path.starts_with('/') { self.root } else { self.cwd };
        self.resolve_from(start, path)
    }

    /// Resolve `path` with relative paths anchored at `base`.
    pub fn resolve_from(&self, base: NodeId, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        let start = if path.starts_with('/') { self.root } else { base };
        let mut budget = self.symlink_limit;
        self.walk(start, path, &mut budget)
    }

    /// Follow `id` through any chain of links to a non-link node.
    ///
    /// Returns `None` for dangling links and for chains longer than the
    /// hop limit.
    pub fn follow(&self, id: NodeId) -> Option<NodeId> {
        let mut budget = self.symlink_limit;
        self.follow_links(id, &mut budget)
    }

    fn walk(&self, start: NodeId, path: &str, budget: &mut usize) -> Option<NodeId> {
        let mut current = start;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.follow_links(current, budget)?;
            let dir = self.node(current)?;
            let entries = dir.as_directory()?;
            match segment {
                "." => {}
                ".." => current = dir.parent()?,
                name => current = entries.get(name)?,
            }
        }
        Some(current)
    }

    fn follow_links(&self, id: NodeId, budget: &mut usize) -> Option<NodeId> {
        let mut current = id;
        while let Some(link) = self.node(current)?.as_symlink() {
            if *budget == 0 {
                tracing::trace!(link = %self.path_of(id), "symlink hop limit reached");
                return None;
            }
            *budget -= 1;
            let base = self.node(current)?.parent()?;
            let target = link.target();
            if target.is_empty() {
                return None;
            }
            let start = if target.starts_with('/') { self.root } else { base };
            current = self.walk(start, target, budget)?;
        }
        Some(current)
    }

    /// The directory `id` denotes, following links.
    pub fn directory(&self, id: NodeId) -> Option<&Directory> {
        self.node(self.follow(id)?)?.as_directory()
    }

    /// File contents `id` denotes, following links.
    pub fn contents(&self, id: NodeId) -> Option<&[u8]> {
        Some(self.node(self.follow(id)?)?.as_file()?.contents())
    }

    /// True if `id` is a directory or a link chain ending in one.
    pub fn is_dir(&self, id: NodeId) -> bool {
        self.directory(id).is_some()
    }

    /// True if `id` is a file or a link chain ending in one.
    pub fn is_file(&self, id: NodeId) -> bool {
        self.contents(id).is_some()
    }

    /// Read bit of the node itself; links are not followed.
    pub fn is_readable(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.mode().is_readable())
    }

    /// Write bit of the node itself; links are not followed.
    pub fn is_writable(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.mode().is_writable())
    }

    /// Absolute path of `id`, built from the parent chain.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(node) = self.node(current) {
            let Some(parent) = node.parent() else {
                break;
            };
            parts.push(node.name());
            current = parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// True if `id` is `ancestor` or lies somewhere beneath it.
    pub fn is_within(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.node(node_id).and_then(Node::parent);
        }
        false
    }

    /// Attach `node` under the real directory `parent`, replacing any
    /// existing entry of the same name.
    ///
    /// Returns `None` when `parent` is not a live directory.
    pub(crate) fn insert(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        let existing = self.node(parent)?.as_directory()?.get(node.name());
        if let Some(existing) = existing {
            self.remove(existing);
        }

        node.set_parent(parent);
        let name = node.name().to_string();
        let id = NodeId(self.nodes.insert(node));
        self.node_mut(parent)?.as_directory_mut()?.insert(name, id);
        Some(id)
    }

    /// Detach `id` from its parent and free its whole subtree.
    ///
    /// A working directory inside the removed subtree moves to the removed
    /// node's parent. The root cannot be removed.
    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let Some(parent) = node.parent() else {
            return false;
        };
        let name = node.name().to_string();

        if self.is_within(id, self.cwd) {
            self.cwd = parent;
        }
        if let Some(dir) = self.node_mut(parent).and_then(Node::as_directory_mut) {
            dir.remove(&name);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(dir) = self.nodes.try_remove(next.0).as_ref().and_then(Node::as_directory) {
                pending.extend(dir.entries().map(|(_, child)| child));
            }
        }
        true
    }
}
