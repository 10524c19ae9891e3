use std::path::Path;

use snafu::ResultExt;

use crate::mirror::error::{IoFailureSnafu, SyncError};
use crate::mirror::tree_node::{NodeKind, TreeNode, modified_time};

/// What the forward pass does for one source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    CreateDir,
    CopyFile,
    UpdateFile,
    /// Directory already present, or file with an identical modification time.
    Skip,
}

impl SyncDecision {
    /// Compares a source node with its replica counterpart without touching
    /// either tree.
    ///
    /// Modification times are compared for exact equality. A replica on a
    /// filesystem with coarser timestamp resolution therefore never compares
    /// equal and is rewritten on every pass.
    pub fn decide(node: &TreeNode, replica_path: &Path) -> Result<Self, SyncError> {
        let replica_exists = exists(replica_path)?;

        let decision = match node.kind() {
            NodeKind::Directory if replica_exists => SyncDecision::Skip,
            NodeKind::Directory => SyncDecision::CreateDir,
            NodeKind::File { .. } if !replica_exists => SyncDecision::CopyFile,
            NodeKind::File { modified } => {
                let replica_modified = modified_time(replica_path).context(IoFailureSnafu {
                    action: "stat",
                    path: replica_path,
                })?;
                if replica_modified == modified {
                    SyncDecision::Skip
                } else {
                    SyncDecision::UpdateFile
                }
            }
        };

        Ok(decision)
    }
}

/// What the reverse pass does for one replica node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionDecision {
    DeleteFile,
    Keep,
}

impl DeletionDecision {
    /// Replica files without a source counterpart are deleted. Directories are
    /// always kept, even when the source no longer has them.
    pub fn decide(node: &TreeNode, source_path: &Path) -> Result<Self, SyncError> {
        if node.is_dir() || exists(source_path)? {
            Ok(DeletionDecision::Keep)
        } else {
            Ok(DeletionDecision::DeleteFile)
        }
    }
}

fn exists(path: &Path) -> Result<bool, SyncError> {
    path.try_exists().context(IoFailureSnafu {
        action: "stat",
        path,
    })
}
