//! Nodes stored in the tree arena.

use indexmap::IndexMap;

use crate::mode::Mode;
use crate::types::FileType;

/// Handle to a node inside a [`Tree`](crate::Tree).
///
/// Handles are only meaningful for the tree that issued them and become
/// stale once the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A directory, file or symbolic link.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    mode: Mode,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Directory(Directory),
    File(RegularFile),
    Symlink(SymbolicLink),
}

/// Children keyed by name, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    children: IndexMap<String, NodeId>,
}

impl Directory {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, id: NodeId) {
        self.children.insert(name, id);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<NodeId> {
        self.children.shift_remove(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegularFile {
    contents: Vec<u8>,
}

impl RegularFile {
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub(crate) fn set_contents(&mut self, contents: Vec<u8>) {
        self.contents = contents;
    }
}

/// A link holding its target text verbatim; the target may be relative
/// (to the link's directory), absolute, or dangling.
#[derive(Debug, Clone)]
pub struct SymbolicLink {
    target: String,
}

impl SymbolicLink {
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Node {
    pub fn directory(name: impl Into<String>, mode: Mode) -> Self {
        Self::with_kind(name, mode, NodeKind::Directory(Directory::default()))
    }

    pub fn file(name: impl Into<String>, contents: Vec<u8>, mode: Mode) -> Self {
        Self::with_kind(name, mode, NodeKind::File(RegularFile { contents }))
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>, mode: Mode) -> Self {
        let target = target.into();
        Self::with_kind(name, mode, NodeKind::Symlink(SymbolicLink { target }))
    }

    fn with_kind(name: impl Into<String>, mode: Mode, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            mode,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for the root and for nodes not yet attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn file_type(&self) -> FileType {
        match self.kind {
            NodeKind::Directory(_) => FileType::Directory,
            NodeKind::File(_) => FileType::File,
            NodeKind::Symlink(_) => FileType::Symlink,
        }
    }

    /// Byte size as `metadata()` reports it.
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::Directory(_) => 0,
            NodeKind::File(file) => file.len() as u64,
            NodeKind::Symlink(link) => link.target.len() as u64,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match &self.kind {
            NodeKind::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&RegularFile> {
        match &self.kind {
            NodeKind::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&SymbolicLink> {
        match &self.kind {
            NodeKind::Symlink(link) => Some(link),
            _ => None,
        }
    }

    /// True for a real directory, not a link to one.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, NodeKind::Symlink(_))
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match &mut self.kind {
            NodeKind::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub(crate) fn as_file_mut(&mut self) -> Option<&mut RegularFile> {
        match &mut self.kind {
            NodeKind::File(file) => Some(file),
            _ => None,
        }
    }
}
