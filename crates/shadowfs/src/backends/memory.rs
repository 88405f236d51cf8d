//! In-memory filesystem backend.
//!
//! Every operation validates its preconditions against the tree before
//! touching it, so a failed call leaves the tree exactly as it was.

use shadowfs_glob::GlobFlags;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::mode::Mode;
use crate::node::{Node, NodeId, NodeKind};
use crate::ops::Filesystem;
use crate::path;
use crate::tree::Tree;
use crate::types::{Metadata, PutFlags, ScandirOrder};

/// In-memory filesystem.
///
/// All data is lost when dropped.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    tree: Tree,
    umask: u32,
    last_error: Option<String>,
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystem {
    /// Create an empty filesystem with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(&FsConfig::default())
    }

    /// Create an empty filesystem from `config`, creating the configured
    /// working directory if it does not exist yet.
    pub fn with_config(config: &FsConfig) -> FsResult<Self> {
        config.validate()?;
        let mut fs = Self::from_parts(config);
        let cwd = config.working_directory.as_str();
        if cwd != "/" {
            if fs.tree.resolve(cwd).is_none() {
                fs.try_mkdir(cwd, 0o777, true)?;
            }
            fs.try_chdir(cwd)?;
        }
        Ok(fs)
    }

    fn from_parts(config: &FsConfig) -> Self {
        Self {
            tree: Tree::new(Mode::new(config.root_mode), config.symlink_limit),
            umask: config.umask & Mode::MASK,
            last_error: None,
        }
    }

    /// The underlying node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The node at `path`, without following a final link.
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.tree.node(self.tree.resolve(path)?)
    }

    fn record<T>(&mut self, result: FsResult<T>) -> FsResult<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                e.emit();
                self.last_error = Some(e.message().to_string());
            }
        }
        result
    }

    fn lookup(&self, path: &str) -> Option<NodeId> {
        self.tree.resolve(path)
    }

    fn new_file_mode(&self) -> Mode {
        Mode::masked(0o666, self.umask)
    }

    /// The real directory `id` denotes, following links.
    fn real_directory(&self, id: NodeId) -> Option<NodeId> {
        self.tree
            .follow(id)
            .filter(|&target| self.tree.node(target).is_some_and(Node::is_directory))
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> FsResult<NodeId> {
        if !path::is_valid_name(node.name()) {
            return Err(FsError::invalid_argument(format!(
                "Invalid entry name {:?}",
                node.name()
            )));
        }
        let id = self.tree.insert(parent, node).ok_or_else(|| {
            FsError::wrong_type(format!("{} is not a directory", self.tree.path_of(parent)))
        })?;
        tracing::debug!(path = %self.tree.path_of(id), "node created");
        Ok(id)
    }

    fn detach(&mut self, id: NodeId) {
        let path = self.tree.path_of(id);
        if self.tree.remove(id) {
            tracing::debug!(%path, "node removed");
        }
    }

    /// Replace the file behind `existing` (following links), or create a
    /// new file `name` inside `dir`. Either way the file ends up with the
    /// umask-adjusted file mode.
    fn store_file(
        &mut self,
        dir: NodeId,
        name: &str,
        existing: Option<NodeId>,
        contents: Vec<u8>,
    ) -> FsResult<()> {
        let mode = self.new_file_mode();
        if let Some(existing) = existing {
            let node = self
                .tree
                .follow(existing)
                .and_then(|target| self.tree.node_mut(target))
                .filter(|node| node.as_file().is_some())
                .ok_or_else(|| FsError::wrong_type(format!("{name} is not a file")))?;
            node.set_mode(mode);
            if let Some(file) = node.as_file_mut() {
                file.set_contents(contents);
            }
            return Ok(());
        }

        let dir = self
            .real_directory(dir)
            .ok_or_else(|| FsError::wrong_type(format!("Parent of {name} is not a directory")))?;
        self.attach(dir, Node::file(name, contents, mode))?;
        Ok(())
    }

    fn try_chdir(&mut self, path: &str) -> FsResult<()> {
        let id = self.lookup(path).ok_or_else(|| {
            FsError::not_found(format!("Directory {path} not found")).with_diagnostic(
                "chdir",
                path,
                "No such file or directory (errno 2)",
            )
        })?;
        let target = match self.tree.follow(id) {
            None => {
                return Err(FsError::not_found(format!("Link target of {path} not found"))
                    .with_diagnostic("chdir", path, "No such file or directory (errno 2)"));
            }
            Some(target) => target,
        };
        if !self.tree.node(target).is_some_and(Node::is_directory) {
            return Err(FsError::wrong_type(format!("Path {path} is not a directory"))
                .with_diagnostic("chdir", path, "Not a directory"));
        }

        self.tree.set_working_directory(target);
        tracing::debug!(cwd = %self.tree.path_of(target), "working directory changed");
        Ok(())
    }

    fn try_chmod(&mut self, path: &str, mode: u32) -> FsResult<()> {
        let id = self
            .lookup(path)
            .ok_or_else(|| FsError::not_found(format!("Path {path} not found")))?;
        if !self.tree.is_writable(id) {
            return Err(FsError::permission_denied(format!("Path {path} is not writable")));
        }

        let mode = Mode::new(mode);
        if let Some(node) = self.tree.node_mut(id) {
            node.set_mode(mode);
        }
        tracing::debug!(path, %mode, "mode changed");
        Ok(())
    }

    fn try_copy(&mut self, source: &str, dest: &str) -> FsResult<()> {
        let (dest_dir_path, dest_name) = path::split(dest);
        let src = self
            .lookup(source)
            .ok_or_else(|| FsError::not_found(format!("Source {source} not found")))?;
        let dest_dir = self.lookup(&dest_dir_path).ok_or_else(|| {
            FsError::not_found(format!("Destination directory {dest_dir_path} does not exist"))
        })?;
        let existing = self.lookup(dest);

        if !self.tree.is_file(src) {
            return Err(FsError::wrong_type(format!("Source {source} is not a file")));
        }
        if !self.tree.is_readable(src) {
            return Err(FsError::permission_denied(format!(
                "Source {source} is not readable"
            )));
        }
        match existing {
            Some(existing) => {
                if !self.tree.is_writable(existing) {
                    return Err(FsError::permission_denied(format!(
                        "Destination {dest} is not writable"
                    )));
                }
                if !self.tree.is_file(existing) {
                    return Err(FsError::wrong_type(format!(
                        "Destination {dest} is not a file, but exists"
                    )));
                }
            }
            None => {
                if !self.tree.is_writable(dest_dir) {
                    return Err(FsError::permission_denied(format!(
                        "Destination directory {dest_dir_path} is not writable"
                    )));
                }
            }
        }
        if !self.tree.is_dir(dest_dir) {
            return Err(FsError::wrong_type(format!(
                "Destination directory {dest_dir_path} is not a directory"
            )));
        }

        let contents = self.tree.contents(src).map(<[u8]>::to_vec).unwrap_or_default();
        self.store_file(dest_dir, &dest_name, existing, contents)
    }

    fn try_file_get_contents(&self, path: &str) -> FsResult<Vec<u8>> {
        let id = self
            .lookup(path)
            .ok_or_else(|| FsError::not_found(format!("File {path} not found")))?;
        let target = self
            .tree
            .follow(id)
            .ok_or_else(|| FsError::not_found(format!("Link target of {path} not found")))?;
        let contents = self
            .tree
            .node(target)
            .and_then(Node::as_file)
            .ok_or_else(|| FsError::wrong_type(format!("Path {path} is not a file")))?;
        if !self.tree.is_readable(id) {
            return Err(FsError::permission_denied(format!("File {path} is not readable")));
        }
        Ok(contents.contents().to_vec())
    }

    fn try_file_put_contents(&mut self, path: &str, data: &[u8], flags: PutFlags) -> FsResult<usize> {
        let existing = self.lookup(path);
        if let Some(existing) = existing {
            if !self.tree.is_writable(existing) {
                return Err(FsError::permission_denied(format!(
                    "Path exists already and is not writable ({path})"
                )));
            }
            if !self.tree.is_file(existing) {
                return Err(FsError::wrong_type(format!(
                    "Path exists already and is not a file ({path})"
                )));
            }
        }

        let (dir_path, name) = path::split(path);
        let dir = self.lookup(&dir_path).ok_or_else(|| {
            FsError::not_found(format!("Parent directory does not exist ({path})"))
        })?;
        if !self.tree.is_dir(dir) {
            return Err(FsError::wrong_type(format!(
                "Parent is not a directory ({dir_path})"
            )));
        }
        if existing.is_none() && !self.tree.is_writable(dir) {
            return Err(FsError::permission_denied(format!(
                "Parent directory is not writable ({dir_path})"
            )));
        }

        let append = flags.contains(PutFlags::APPEND);
        let mut contents = Vec::new();
        if let (true, Some(existing)) = (append, existing) {
            if !self.tree.is_readable(existing) {
                return Err(FsError::permission_denied(format!(
                    "Request to append, but file is not readable ({path})"
                )));
            }
            contents.extend_from_slice(self.tree.contents(existing).unwrap_or_default());
        }
        contents.extend_from_slice(data);

        self.store_file(dir, &name, existing, contents)?;
        Ok(data.len())
    }

    fn try_fileperms(&self, path: &str) -> FsResult<u32> {
        self.node(path)
            .map(|node| node.mode().bits())
            .ok_or_else(|| FsError::not_found(format!("Path {path} not found")))
    }

    fn try_filesize(&self, path: &str) -> FsResult<u64> {
        let id = self
            .lookup(path)
            .ok_or_else(|| FsError::not_found(format!("Path {path} not found")))?;
        let target = self
            .tree
            .follow(id)
            .and_then(|target| self.tree.node(target))
            .ok_or_else(|| FsError::not_found(format!("Link target of {path} not found")))?;
        Ok(match target.as_file() {
            Some(file) => file.len() as u64,
            None => 0,
        })
    }

    fn try_metadata(&self, path: &str) -> FsResult<Metadata> {
        let node = self
            .node(path)
            .ok_or_else(|| FsError::not_found(format!("Path {path} not found")))?;
        Ok(Metadata {
            kind: node.file_type(),
            mode: node.mode(),
            size: node.size(),
        })
    }

    fn try_glob(&self, pattern: &str, flags: GlobFlags) -> FsResult<Vec<String>> {
        let cwd = self.getcwd();
        Ok(shadowfs_glob::glob(&self.tree, &cwd, pattern, flags)?)
    }

    fn try_mkdir(&mut self, path: &str, mode: u32, recursive: bool) -> FsResult<()> {
        let mut created = None;
        let result = self.make_directory(path, mode, recursive, &mut created);
        if result.is_err() {
            if let Some(top) = created {
                self.detach(top);
            }
        }
        result
    }

    /// Create `path`, and with `recursive` its missing ancestors first.
    /// `created` receives the topmost directory this call added.
    fn make_directory(
        &mut self,
        path: &str,
        mode: u32,
        recursive: bool,
        created: &mut Option<NodeId>,
    ) -> FsResult<()> {
        if path.is_empty() {
            return Err(FsError::not_found("Pathname is empty").with_diagnostic(
                "mkdir",
                path,
                "No such file or directory",
            ));
        }
        if self.lookup(path).is_some() {
            return Err(FsError::already_exists(format!("Pathname ({path}) exists"))
                .with_diagnostic("mkdir", path, "File exists"));
        }

        let (parent_path, name) = path::split(path);
        let mut parent = self.lookup(&parent_path);
        if parent.is_none() && recursive {
            self.make_directory(&parent_path, mode | 0o700, true, created)?;
            parent = self.lookup(&parent_path);
        }
        let parent = parent.ok_or_else(|| {
            FsError::not_found(format!(
                "Destination directory ({parent_path}) does not exist"
            ))
            .with_diagnostic("mkdir", path, "No such file or directory")
        })?;
        let dir = self.real_directory(parent).ok_or_else(|| {
            FsError::wrong_type(format!("Path contains a file ({parent_path})"))
                .with_diagnostic("mkdir", path, "Not a directory")
        })?;
        if !self.tree.is_writable(parent) {
            return Err(FsError::permission_denied(format!(
                "Destination directory ({parent_path}) is not writable"
            ))
            .with_diagnostic("mkdir", path, "Permission denied"));
        }

        let mode = Mode::masked(mode, self.umask);
        let id = self.attach(dir, Node::directory(name, mode))?;
        created.get_or_insert(id);
        Ok(())
    }

    fn try_readlink(&self, path: &str) -> FsResult<String> {
        let id = self.lookup(path).ok_or_else(|| {
            FsError::not_found(format!("Path {path} does not exist")).with_diagnostic(
                "readlink",
                path,
                "No such file or directory",
            )
        })?;
        if !self.tree.is_readable(id) {
            return Err(FsError::permission_denied(format!("Path {path} is not readable")));
        }
        self.tree
            .node(id)
            .and_then(Node::as_symlink)
            .map(|link| link.target().to_string())
            .ok_or_else(|| {
                FsError::invalid_argument(format!("Path {path} is not a link")).with_diagnostic(
                    "readlink",
                    path,
                    "Invalid argument",
                )
            })
    }

    fn try_rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        let (dir_path, name) = path::split(to);
        let source = self
            .lookup(from)
            .ok_or_else(|| FsError::not_found(format!("Source {from} not found")))?;
        let dest_dir = self.lookup(&dir_path).ok_or_else(|| {
            FsError::not_found(format!("Destination directory {dir_path} does not exist"))
        })?;
        if self.lookup(to).is_some() {
            return Err(FsError::already_exists(format!("Destination {to} exists")));
        }
        if !self.tree.is_readable(source) {
            return Err(FsError::permission_denied(format!("Source {from} is not readable")));
        }
        if !self.tree.is_writable(dest_dir) {
            return Err(FsError::permission_denied(format!(
                "Destination {to} is not writable"
            )));
        }
        let target_dir = self.real_directory(dest_dir).ok_or_else(|| {
            FsError::wrong_type(format!("Destination directory {dir_path} is not a directory"))
        })?;
        if self.tree.is_within(source, target_dir) {
            return Err(FsError::invalid_argument(format!(
                "Cannot move {from} into itself"
            )));
        }
        if !path::is_valid_name(&name) {
            return Err(FsError::invalid_argument(format!("Invalid entry name {name:?}")));
        }
        self.check_movable(source)?;

        self.relocate(source, target_dir, &name)
    }

    /// Every node of the subtree must be readable (to be copied) and
    /// writable (to be removed afterwards).
    fn check_movable(&self, id: NodeId) -> FsResult<()> {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(node) = self.tree.node(next) else {
                continue;
            };
            if !node.mode().is_readable() || !node.mode().is_writable() {
                return Err(FsError::permission_denied(format!(
                    "Cannot move {}: permission denied",
                    self.tree.path_of(next)
                )));
            }
            if let Some(dir) = node.as_directory() {
                pending.extend(dir.entries().map(|(_, child)| child));
            }
        }
        Ok(())
    }

    fn relocate(&mut self, source: NodeId, into: NodeId, name: &str) -> FsResult<()> {
        let node = self
            .tree
            .node(source)
            .ok_or_else(|| FsError::not_found(format!("{name} vanished during rename")))?;
        let mode = node.mode();
        let kind = node.kind().clone();

        match kind {
            NodeKind::File(file) => {
                let copy = Node::file(name, file.contents().to_vec(), self.new_file_mode());
                self.attach(into, copy)?;
            }
            NodeKind::Symlink(link) => {
                self.attach(into, Node::symlink(name, link.target(), mode))?;
            }
            NodeKind::Directory(dir) => {
                let created = self.attach(
                    into,
                    Node::directory(name, Mode::masked(0o777, self.umask)),
                )?;
                if self.tree.working_directory() == source {
                    self.tree.set_working_directory(created);
                }
                for (child_name, child) in dir.entries() {
                    self.relocate(child, created, child_name)?;
                }
            }
        }

        self.detach(source);
        Ok(())
    }

    fn try_rmdir(&mut self, path: &str) -> FsResult<()> {
        let id = self.lookup(path).ok_or_else(|| {
            FsError::not_found(format!("Path {path} does not exist")).with_diagnostic(
                "rmdir",
                path,
                "No such file or directory",
            )
        })?;
        if !self.tree.is_writable(id) {
            return Err(FsError::permission_denied(format!(
                "Directory {path} is not writable"
            )));
        }
        let empty = self
            .tree
            .node(id)
            .and_then(Node::as_directory)
            .map(|dir| dir.is_empty())
            .ok_or_else(|| {
                FsError::wrong_type(format!("Path {path} is not a directory")).with_diagnostic(
                    "rmdir",
                    path,
                    "Not a directory",
                )
            })?;
        if id == self.tree.root() {
            return Err(FsError::permission_denied("Cannot remove the root directory")
                .with_diagnostic("rmdir", path, "Device or resource busy"));
        }
        if !empty {
            return Err(FsError::not_empty(format!("Directory {path} is not empty"))
                .with_diagnostic("rmdir", path, "Directory not empty"));
        }

        self.detach(id);
        Ok(())
    }

    fn try_scandir(&self, path: &str, order: ScandirOrder) -> FsResult<Vec<String>> {
        let id = self
            .lookup(path)
            .ok_or_else(|| FsError::not_found(format!("Path {path} does not exist")))?;
        if !self.tree.is_readable(id) {
            return Err(FsError::permission_denied(format!(
                "Directory {path} is not readable"
            )));
        }
        let dir = self
            .tree
            .directory(id)
            .ok_or_else(|| FsError::wrong_type(format!("Path {path} is not a directory")))?;

        let mut names: Vec<String> = [".", ".."]
            .into_iter()
            .chain(dir.names())
            .map(str::to_string)
            .collect();
        match order {
            ScandirOrder::Ascending => names.sort(),
            ScandirOrder::Descending => names.sort_by(|a, b| b.cmp(a)),
            ScandirOrder::Unsorted => {}
        }
        Ok(names)
    }

    fn try_symlink(&mut self, target: &str, link: &str) -> FsResult<()> {
        if self.lookup(link).is_some() {
            return Err(FsError::already_exists(format!("Link path {link} already exists"))
                .with_diagnostic("symlink", link, "File exists"));
        }
        let (dir_path, name) = path::split(link);
        let dir = self.lookup(&dir_path).ok_or_else(|| {
            FsError::not_found(format!("Link directory {dir_path} does not exist"))
                .with_diagnostic("symlink", link, "No such file or directory")
        })?;
        if !self.tree.is_writable(dir) {
            return Err(FsError::permission_denied(format!(
                "Link directory {dir_path} is not writable"
            )));
        }
        let dir = self.real_directory(dir).ok_or_else(|| {
            FsError::wrong_type(format!("Link directory {dir_path} is not a directory"))
                .with_diagnostic("symlink", link, "Not a directory")
        })?;

        let points_at_dir = self
            .tree
            .resolve_from(dir, target)
            .is_some_and(|t| self.tree.is_dir(t));
        let bits = if points_at_dir { 0o777 } else { 0o666 };
        let mode = Mode::masked(bits, self.umask);
        self.attach(dir, Node::symlink(name, target, mode))?;
        Ok(())
    }

    fn try_touch(&mut self, path: &str) -> FsResult<()> {
        if self.lookup(path).is_some() {
            return Ok(());
        }
        self.try_file_put_contents(path, b"", PutFlags::empty())
            .map(|_| ())
    }

    fn try_unlink(&mut self, path: &str) -> FsResult<()> {
        let id = self.lookup(path).ok_or_else(|| {
            FsError::not_found(format!("File {path} does not exist")).with_diagnostic(
                "unlink",
                path,
                "No such file or directory",
            )
        })?;
        if !self.tree.is_writable(id) {
            return Err(FsError::permission_denied(format!("File {path} is not writable")));
        }
        if self.tree.node(id).is_some_and(Node::is_directory) {
            return Err(FsError::wrong_type(format!("Path {path} is a directory"))
                .with_diagnostic("unlink", path, "Operation not permitted"));
        }

        self.detach(id);
        Ok(())
    }
}

impl Filesystem for MemoryFilesystem {
    fn chdir(&mut self, path: &str) -> FsResult<()> {
        let result = self.try_chdir(path);
        self.record(result)
    }

    fn getcwd(&self) -> String {
        self.tree.path_of(self.tree.working_directory())
    }

    fn umask(&mut self, mask: Option<u32>) -> u32 {
        let previous = self.umask;
        if let Some(mask) = mask {
            self.umask = mask & Mode::MASK;
            tracing::debug!(umask = %Mode::new(self.umask), "umask changed");
        }
        previous
    }

    fn file_exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn file_get_contents(&mut self, path: &str) -> FsResult<Vec<u8>> {
        let result = self.try_file_get_contents(path);
        self.record(result)
    }

    fn fileperms(&mut self, path: &str) -> FsResult<u32> {
        let result = self.try_fileperms(path);
        self.record(result)
    }

    fn filesize(&mut self, path: &str) -> FsResult<u64> {
        let result = self.try_filesize(path);
        self.record(result)
    }

    fn metadata(&mut self, path: &str) -> FsResult<Metadata> {
        let result = self.try_metadata(path);
        self.record(result)
    }

    fn readlink(&mut self, path: &str) -> FsResult<String> {
        let result = self.try_readlink(path);
        self.record(result)
    }

    fn scandir(&mut self, path: &str, order: ScandirOrder) -> FsResult<Vec<String>> {
        let result = self.try_scandir(path, order);
        self.record(result)
    }

    fn glob(&mut self, pattern: &str, flags: GlobFlags) -> FsResult<Vec<String>> {
        let result = self.try_glob(pattern, flags);
        self.record(result)
    }

    fn chmod(&mut self, path: &str, mode: u32) -> FsResult<()> {
        let result = self.try_chmod(path, mode);
        self.record(result)
    }

    fn copy(&mut self, source: &str, dest: &str) -> FsResult<()> {
        let result = self.try_copy(source, dest);
        self.record(result)
    }

    fn file_put_contents(&mut self, path: &str, data: &[u8], flags: PutFlags) -> FsResult<usize> {
        let result = self.try_file_put_contents(path, data, flags);
        self.record(result)
    }

    fn mkdir(&mut self, path: &str, mode: u32, recursive: bool) -> FsResult<()> {
        let result = self.try_mkdir(path, mode, recursive);
        self.record(result)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        let result = self.try_rename(from, to);
        self.record(result)
    }

    fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let result = self.try_rmdir(path);
        self.record(result)
    }

    fn symlink(&mut self, target: &str, link: &str) -> FsResult<()> {
        let result = self.try_symlink(target, link);
        self.record(result)
    }

    fn touch(&mut self, path: &str) -> FsResult<()> {
        let result = self.try_touch(path);
        self.record(result)
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        let result = self.try_unlink(path);
        self.record(result)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|id| self.tree.is_dir(id))
    }

    fn is_file(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|id| self.tree.is_file(id))
    }

    fn is_link(&self, path: &str) -> bool {
        self.node(path).is_some_and(Node::is_symlink)
    }

    fn is_readable(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|id| self.tree.is_readable(id))
    }

    fn is_writable(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|id| self.tree.is_writable(id))
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsErrorKind;
    use crate::types::LineFlags;

    fn fs() -> MemoryFilesystem {
        MemoryFilesystem::new()
    }

    #[test]
    fn test_write_and_read() {
        let mut fs = fs();
        assert_eq!(fs.file_put_contents("/hello.txt", b"Hello, World!", PutFlags::empty()).unwrap(), 13);
        assert_eq!(fs.file_get_contents("/hello.txt").unwrap(), b"Hello, World!");
        assert_eq!(fs.fileperms("/hello.txt").unwrap(), 0o666);
        assert!(fs.last_error().is_none());
    }

    #[test]
    fn test_append() {
        let mut fs = fs();
        fs.file_put_contents("/log", b"one\n", PutFlags::APPEND).unwrap();
        fs.file_put_contents("/log", b"two\n", PutFlags::APPEND).unwrap();
        assert_eq!(fs.file_get_contents("/log").unwrap(), b"one\ntwo\n");

        fs.file_put_contents("/log", b"reset", PutFlags::empty()).unwrap();
        assert_eq!(fs.file_get_contents("/log").unwrap(), b"reset");
    }

    #[test]
    fn test_overwrite_resets_mode() {
        let mut fs = fs();
        fs.umask(Some(0o022));
        fs.file_put_contents("/f", b"a", PutFlags::empty()).unwrap();
        fs.chmod("/f", 0o600).unwrap();
        fs.file_put_contents("/f", b"b", PutFlags::empty()).unwrap();
        assert_eq!(fs.fileperms("/f").unwrap(), 0o644);

        fs.chmod("/f", 0o600).unwrap();
        fs.file_put_contents("/f", b"c", PutFlags::APPEND).unwrap();
        assert_eq!(fs.fileperms("/f").unwrap(), 0o644);
        assert_eq!(fs.file_get_contents("/f").unwrap(), b"bc");

        fs.touch("/src").unwrap();
        fs.chmod("/f", 0o600).unwrap();
        fs.copy("/src", "/f").unwrap();
        assert_eq!(fs.fileperms("/f").unwrap(), 0o644);
        assert_eq!(fs.filesize("/f").unwrap(), 0);
    }

    #[test]
    fn test_recursive_mkdir_failure_removes_created_parents() {
        let mut fs = fs();
        fs.mkdir("/keep", 0o777, false).unwrap();
        fs.umask(Some(0o200));
        let before = fs.tree().len();

        let err = fs.mkdir("/keep/a/b/c", 0o777, true).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::PermissionDenied);
        assert!(!fs.file_exists("/keep/a"));
        assert!(fs.is_dir("/keep"));
        assert_eq!(fs.tree().len(), before);

        fs.umask(Some(0o022));
        fs.mkdir("/keep/a/b/c", 0o777, true).unwrap();
        assert!(fs.is_dir("/keep/a/b/c"));
    }

    #[test]
    fn test_paths_through_files_do_not_exist() {
        let mut fs = fs();
        fs.mkdir("/d", 0o777, false).unwrap();
        fs.file_put_contents("/d/file", b"f", PutFlags::empty()).unwrap();
        fs.file_put_contents("/d/other", b"o", PutFlags::empty()).unwrap();

        assert!(!fs.file_exists("/d/file/."));
        assert!(!fs.is_file("/d/file/."));
        assert!(!fs.is_dir("/d/file/.."));
        assert!(fs.file_get_contents("/d/file/../other").is_err());

        let err = fs.mkdir("/d/file/..", 0o777, false).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::WrongType);
        let err = fs
            .file_put_contents("/d/file/../other", b"x", PutFlags::empty())
            .unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);
        assert_eq!(fs.file_get_contents("/d/other").unwrap(), b"o");
    }

    #[test]
    fn test_write_through_symlink() {
        let mut fs = fs();
        fs.file_put_contents("/target", b"old", PutFlags::empty()).unwrap();
        fs.symlink("/target", "/link").unwrap();
        fs.file_put_contents("/link", b"new", PutFlags::empty()).unwrap();
        assert_eq!(fs.file_get_contents("/target").unwrap(), b"new");
        assert!(fs.is_link("/link"));
    }

    #[test]
    fn test_put_into_missing_parent() {
        let mut fs = fs();
        let err = fs.file_put_contents("/no/such/file", b"x", PutFlags::empty()).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);
        assert_eq!(fs.last_error(), Some("Parent directory does not exist (/no/such/file)"));
    }

    #[test]
    fn test_put_onto_directory() {
        let mut fs = fs();
        fs.mkdir("/d", 0o777, false).unwrap();
        let err = fs.file_put_contents("/d", b"x", PutFlags::empty()).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::WrongType);
    }

    #[test]
    fn test_mkdir_and_scandir() {
        let mut fs = fs();
        fs.mkdir("/dir", 0o755, false).unwrap();
        fs.touch("/dir/b").unwrap();
        fs.touch("/dir/a").unwrap();
        fs.mkdir("/dir/c", 0o755, false).unwrap();

        assert_eq!(
            fs.scandir("/dir", ScandirOrder::Ascending).unwrap(),
            vec![".", "..", "a", "b", "c"]
        );
        assert_eq!(
            fs.scandir("/dir", ScandirOrder::Descending).unwrap(),
            vec!["c", "b", "a", "..", "."]
        );
        assert_eq!(
            fs.scandir("/dir", ScandirOrder::Unsorted).unwrap(),
            vec![".", "..", "b", "a", "c"]
        );
    }

    #[test]
    fn test_mkdir_recursive_modes() {
        let mut fs = fs();
        fs.umask(Some(0o022));
        fs.mkdir("/a/b/c", 0o555, true).unwrap();
        assert_eq!(fs.fileperms("/a/b/c").unwrap(), 0o555);
        assert_eq!(fs.fileperms("/a/b").unwrap(), 0o755);
        assert_eq!(fs.fileperms("/a").unwrap(), 0o755);
    }

    #[test]
    fn test_mkdir_failures_leave_tree_unchanged() {
        let mut fs = fs();
        fs.touch("/file").unwrap();
        let before = fs.tree().len();

        let err = fs.mkdir("/file/sub", 0o777, true).unwrap_err();
        assert_eq!(err.diagnostic(), Some("mkdir(): Not a directory"));

        let err = fs.mkdir("/missing/sub", 0o777, false).unwrap_err();
        assert_eq!(err.diagnostic(), Some("mkdir(): No such file or directory"));

        let err = fs.mkdir("", 0o777, false).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);

        assert_eq!(fs.tree().len(), before);
    }

    #[test]
    fn test_rmdir() {
        let mut fs = fs();
        fs.mkdir("/d", 0o777, false).unwrap();
        fs.touch("/d/f").unwrap();

        let err = fs.rmdir("/d").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotEmpty);
        assert_eq!(err.diagnostic(), Some("rmdir(/d): Directory not empty"));

        fs.unlink("/d/f").unwrap();
        fs.rmdir("/d").unwrap();
        assert!(!fs.file_exists("/d"));

        let err = fs.rmdir("/").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::PermissionDenied);
    }

    #[test]
    fn test_rmdir_on_link_to_directory() {
        let mut fs = fs();
        fs.mkdir("/d", 0o777, false).unwrap();
        fs.symlink("/d", "/l").unwrap();
        let err = fs.rmdir("/l").unwrap_err();
        assert_eq!(err.diagnostic(), Some("rmdir(/l): Not a directory"));
        fs.unlink("/l").unwrap();
        assert!(fs.is_dir("/d"));
    }

    #[test]
    fn test_unlink_directory_is_refused() {
        let mut fs = fs();
        fs.mkdir("/d", 0o777, false).unwrap();
        let err = fs.unlink("/d").unwrap_err();
        assert_eq!(err.diagnostic(), Some("unlink(/d): Operation not permitted"));
    }

    #[test]
    fn test_copy() {
        let mut fs = fs();
        fs.file_put_contents("/src", b"data", PutFlags::empty()).unwrap();
        fs.chmod("/src", 0o644).unwrap();
        fs.copy("/src", "/dst").unwrap();
        assert_eq!(fs.file_get_contents("/dst").unwrap(), b"data");
        assert_eq!(fs.fileperms("/dst").unwrap(), 0o666);

        let err = fs.copy("/missing", "/dst2").unwrap_err();
        assert_eq!(fs.last_error(), Some("Source /missing not found"));
        assert_eq!(err.kind(), FsErrorKind::NotFound);

        fs.mkdir("/dir", 0o777, false).unwrap();
        let err = fs.copy("/src", "/dir").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::WrongType);
    }

    #[test]
    fn test_rename_file() {
        let mut fs = fs();
        fs.file_put_contents("/old", b"x", PutFlags::empty()).unwrap();
        fs.rename("/old", "/new").unwrap();
        assert!(!fs.file_exists("/old"));
        assert_eq!(fs.file_get_contents("/new").unwrap(), b"x");
    }

    #[test]
    fn test_rename_directory_tree() {
        let mut fs = fs();
        fs.mkdir("/a/b", 0o777, true).unwrap();
        fs.file_put_contents("/a/b/f", b"deep", PutFlags::empty()).unwrap();
        fs.symlink("b/f", "/a/link").unwrap();
        fs.chdir("/a/b").unwrap();

        fs.rename("/a", "/moved").unwrap();

        assert!(!fs.file_exists("/a"));
        assert_eq!(fs.file_get_contents("/moved/b/f").unwrap(), b"deep");
        assert_eq!(fs.readlink("/moved/link").unwrap(), "b/f");
        assert_eq!(fs.file_get_contents("/moved/link").unwrap(), b"deep");
        assert_eq!(fs.getcwd(), "/moved/b");
    }

    #[test]
    fn test_rename_refusals() {
        let mut fs = fs();
        fs.mkdir("/a", 0o777, false).unwrap();
        fs.touch("/b").unwrap();

        let err = fs.rename("/a", "/b").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::AlreadyExists);

        let err = fs.rename("/a", "/a/inside").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::InvalidArgument);

        fs.touch("/a/locked").unwrap();
        fs.chmod("/a/locked", 0o444).unwrap();
        let before = fs.tree().len();
        let err = fs.rename("/a", "/c").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::PermissionDenied);
        assert_eq!(fs.tree().len(), before);
        assert!(fs.file_exists("/a/locked"));
    }

    #[test]
    fn test_symlink_and_readlink() {
        let mut fs = fs();
        fs.mkdir("/a", 0o777, false).unwrap();
        fs.symlink("/a/file", "/a/link").unwrap();
        assert_eq!(fs.readlink("/a/link").unwrap(), "/a/file");
        assert!(fs.is_link("/a/link"));
        assert!(!fs.is_file("/a/link"));
        assert!(fs.file_exists("/a/link"));

        let err = fs.file_get_contents("/a/link").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);

        let err = fs.symlink("/x", "/a/link").unwrap_err();
        assert_eq!(err.diagnostic(), Some("symlink(): File exists"));

        fs.touch("/a/file").unwrap();
        let err = fs.readlink("/a/file").unwrap_err();
        assert_eq!(err.diagnostic(), Some("readlink(): Invalid argument"));
    }

    #[test]
    fn test_symlink_mode_depends_on_target() {
        let mut fs = fs();
        fs.umask(Some(0o022));
        fs.mkdir("/d", 0o777, false).unwrap();
        fs.symlink("d", "/to_dir").unwrap();
        fs.symlink("/nothing", "/to_nothing").unwrap();
        assert_eq!(fs.fileperms("/to_dir").unwrap(), 0o755);
        assert_eq!(fs.fileperms("/to_nothing").unwrap(), 0o644);
    }

    #[test]
    fn test_chdir_and_relative_paths() {
        let mut fs = fs();
        fs.mkdir("/work/sub", 0o777, true).unwrap();
        fs.chdir("/work").unwrap();
        fs.file_put_contents("sub/f", b"rel", PutFlags::empty()).unwrap();
        assert_eq!(fs.file_get_contents("/work/sub/f").unwrap(), b"rel");
        assert_eq!(fs.getcwd(), "/work");

        fs.touch("/plain").unwrap();
        let err = fs.chdir("/plain").unwrap_err();
        assert_eq!(err.diagnostic(), Some("chdir(): Not a directory"));
        let err = fs.chdir("/nope").unwrap_err();
        assert_eq!(err.diagnostic(), Some("chdir(): No such file or directory (errno 2)"));
        assert_eq!(fs.getcwd(), "/work");
    }

    #[test]
    fn test_cwd_falls_back_when_removed() {
        let mut fs = fs();
        fs.mkdir("/a/b", 0o777, true).unwrap();
        fs.chdir("/a/b").unwrap();
        fs.rmdir("/a/b").unwrap();
        assert_eq!(fs.getcwd(), "/a");
    }

    #[test]
    fn test_file_lines() {
        let mut fs = fs();
        fs.file_put_contents("/f", b"\n\nLine 3\nLine 4\n\nLine 6", PutFlags::empty())
            .unwrap();
        let lines = fs
            .file("/f", LineFlags::IGNORE_NEW_LINES | LineFlags::SKIP_EMPTY_LINES)
            .unwrap();
        assert_eq!(lines, vec![b"Line 3".to_vec(), b"Line 4".to_vec(), b"Line 6".to_vec()]);
    }

    #[test]
    fn test_filesize_and_metadata() {
        let mut fs = fs();
        fs.file_put_contents("/f", b"12345", PutFlags::empty()).unwrap();
        fs.symlink("/f", "/l").unwrap();
        fs.mkdir("/d", 0o700, false).unwrap();

        assert_eq!(fs.filesize("/f").unwrap(), 5);
        assert_eq!(fs.filesize("/l").unwrap(), 5);
        assert_eq!(fs.filesize("/d").unwrap(), 0);
        assert!(fs.filesize("/missing").is_err());

        let meta = fs.metadata("/l").unwrap();
        assert!(meta.is_symlink());
        assert_eq!(meta.size, 2);
        assert_eq!(fs.metadata("/d").unwrap().mode, Mode::new(0o700));
    }

    #[test]
    fn test_touch_keeps_contents() {
        let mut fs = fs();
        fs.file_put_contents("/f", b"keep", PutFlags::empty()).unwrap();
        fs.touch("/f").unwrap();
        fs.touch("/f").unwrap();
        assert_eq!(fs.file_get_contents("/f").unwrap(), b"keep");
    }

    #[test]
    fn test_last_error_is_cleared() {
        let mut fs = fs();
        assert!(fs.file_get_contents("/missing").is_err());
        assert_eq!(fs.last_error(), Some("File /missing not found"));
        fs.touch("/present").unwrap();
        assert!(fs.last_error().is_none());
    }

    #[test]
    fn test_with_config_creates_working_directory() {
        let config = FsConfig::new()
            .with_umask(0o027)
            .with_working_directory("/home/test");
        let mut fs = MemoryFilesystem::with_config(&config).unwrap();
        assert_eq!(fs.getcwd(), "/home/test");
        assert!(fs.is_dir("/home"));

        fs.touch("notes").unwrap();
        assert_eq!(fs.fileperms("/home/test/notes").unwrap(), 0o640);
        assert_eq!(fs.umask(None), 0o027);
    }
}
