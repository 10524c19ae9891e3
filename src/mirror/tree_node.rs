use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use snafu::ResultExt;
use walkdir::DirEntry;

use crate::mirror::error::{IoFailureSnafu, SyncError};

/// Kind of a filesystem node, as seen during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File { modified: SystemTime },
}

/// A path found under one of the two roots, together with its location
/// relative to that root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    path: PathBuf,
    relative: PathBuf,
    kind: NodeKind,
}

impl TreeNode {
    /// Classifies a walk entry. Symlinks are classified by their target: a link
    /// to a directory is a directory (the walk does not descend into it), any
    /// other link is a file carrying its target's modification time.
    pub fn from_entry(root: &Path, entry: &DirEntry) -> Result<Self, SyncError> {
        let path = entry.path().to_path_buf();
        let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();

        let kind = if entry.file_type().is_dir() || (entry.path_is_symlink() && path.is_dir()) {
            NodeKind::Directory
        } else {
            let modified = modified_time(&path).context(IoFailureSnafu {
                action: "stat",
                path: path.clone(),
            })?;
            NodeKind::File { modified }
        };

        Ok(Self {
            path,
            relative,
            kind,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// The same relative location under another root.
    pub fn counterpart_in(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }
}

/// Modification time of `path`, following symlinks.
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
