use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rstest::fixture;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::mirror::tree_node::TreeNode;

/// A source and a replica root side by side in a temporary directory.
/// Only the source root exists initially.
pub struct Trees {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub replica: PathBuf,
}

#[fixture]
pub fn trees() -> Trees {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source");
    let replica = temp_dir.path().join("replica");
    fs::create_dir(&source).expect("Failed to create source");
    Trees {
        temp_dir,
        source,
        replica,
    }
}

pub fn at_secs(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn write_with_mtime(path: &Path, contents: &str, modified: SystemTime) {
    fs::write(path, contents).expect("Failed to write");
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .expect("Failed to set mtime");
}

pub fn node_named(root: &Path, name: &str) -> TreeNode {
    let entry = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_name() == name)
        .expect("Entry not found");
    TreeNode::from_entry(root, &entry).expect("Failed to classify node")
}
