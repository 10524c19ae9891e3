use std::path::{Path, PathBuf};

use compio::fs;
use derive_more::Display;
use snafu::{ResultExt, ensure};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::action_log::{ActionRecord, ActionSink};
use crate::mirror::copy::copy_preserving_times;
use crate::mirror::decision::{DeletionDecision, SyncDecision};
use crate::mirror::error::{
    IoFailureSnafu, LogWriteSnafu, SourceMissingSnafu, SourceNotDirectorySnafu, SyncError,
};
use crate::mirror::tree_node::TreeNode;

/// Counts of what a single pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display(
    "{created_dirs} directories created, {copied} copied, {updated} updated, {unchanged} unchanged, {removed} removed"
)]
pub struct SyncReport {
    pub created_dirs: usize,
    pub copied: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl SyncReport {
    /// Number of actions that changed the replica.
    pub fn mutations(&self) -> usize {
        self.created_dirs + self.copied + self.updated + self.removed
    }

    fn tally(&mut self, record: &ActionRecord) {
        match record {
            ActionRecord::CreatedDirectory(_) => self.created_dirs += 1,
            ActionRecord::CopiedFile(_) => self.copied += 1,
            ActionRecord::UpdatedFile(_) => self.updated += 1,
            ActionRecord::Unchanged(_) => self.unchanged += 1,
            ActionRecord::RemovedFile(_) => self.removed += 1,
        }
    }
}

/// One-way mirror of a source tree onto a replica tree.
///
/// Holds no state between passes: every call to [`MirrorEngine::sync`] walks
/// both trees from scratch.
#[derive(Debug, Clone)]
pub struct MirrorEngine {
    source_root: PathBuf,
    replica_root: PathBuf,
}

impl MirrorEngine {
    pub fn new(source_root: impl Into<PathBuf>, replica_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            replica_root: replica_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn replica_root(&self) -> &Path {
        &self.replica_root
    }

    /// Runs one full pass: creates and updates from the source, then removes
    /// replica files the source no longer has.
    ///
    /// The first failing filesystem operation aborts the pass and leaves the
    /// replica partially synced. Replica directories are never removed.
    pub async fn sync(&self, sink: &mut impl ActionSink) -> Result<SyncReport, SyncError> {
        self.check_source()?;
        self.bootstrap_replica().await?;

        let mut pass = Pass {
            sink,
            report: SyncReport::default(),
        };
        self.forward_pass(&mut pass).await?;
        self.reverse_pass(&mut pass).await?;

        Ok(pass.report)
    }

    fn check_source(&self) -> Result<(), SyncError> {
        let exists = self.source_root.try_exists().context(IoFailureSnafu {
            action: "stat",
            path: &self.source_root,
        })?;
        ensure!(
            exists,
            SourceMissingSnafu {
                path: &self.source_root
            }
        );
        ensure!(
            self.source_root.is_dir(),
            SourceNotDirectorySnafu {
                path: &self.source_root
            }
        );
        Ok(())
    }

    async fn bootstrap_replica(&self) -> Result<(), SyncError> {
        let exists = self.replica_root.try_exists().context(IoFailureSnafu {
            action: "stat",
            path: &self.replica_root,
        })?;
        if !exists {
            debug!("Creating replica root {}", self.replica_root.display());
            fs::create_dir_all(&self.replica_root)
                .await
                .context(IoFailureSnafu {
                    action: "create directory",
                    path: &self.replica_root,
                })?;
        }
        Ok(())
    }

    async fn forward_pass(&self, pass: &mut Pass<'_, impl ActionSink>) -> Result<(), SyncError> {
        debug!("Walking source tree {}", self.source_root.display());
        for entry in walk(&self.source_root) {
            let entry = entry.map_err(|err| SyncError::from_walk(&self.source_root, err))?;
            let node = TreeNode::from_entry(&self.source_root, &entry)?;
            let replica_path = node.counterpart_in(&self.replica_root);

            let decision = SyncDecision::decide(&node, &replica_path)?;
            trace!("{:?} {}", decision, node.relative().display());

            match decision {
                SyncDecision::CreateDir => {
                    fs::create_dir(&replica_path)
                        .await
                        .context(IoFailureSnafu {
                            action: "create directory",
                            path: &replica_path,
                        })?;
                    pass.record(ActionRecord::CreatedDirectory(replica_path))?;
                }
                SyncDecision::CopyFile => {
                    copy_file(node.path(), &replica_path).await?;
                    pass.record(ActionRecord::CopiedFile(replica_path))?;
                }
                SyncDecision::UpdateFile => {
                    fs::remove_file(&replica_path)
                        .await
                        .context(IoFailureSnafu {
                            action: "remove",
                            path: &replica_path,
                        })?;
                    copy_file(node.path(), &replica_path).await?;
                    pass.record(ActionRecord::UpdatedFile(replica_path))?;
                }
                SyncDecision::Skip if node.is_dir() => {}
                SyncDecision::Skip => pass.record(ActionRecord::Unchanged(replica_path))?,
            }
        }
        Ok(())
    }

    async fn reverse_pass(&self, pass: &mut Pass<'_, impl ActionSink>) -> Result<(), SyncError> {
        debug!("Walking replica tree {}", self.replica_root.display());
        for entry in walk(&self.replica_root) {
            let entry = entry.map_err(|err| SyncError::from_walk(&self.replica_root, err))?;
            let node = TreeNode::from_entry(&self.replica_root, &entry)?;
            let source_path = node.counterpart_in(&self.source_root);

            let decision = DeletionDecision::decide(&node, &source_path)?;
            trace!("{:?} {}", decision, node.relative().display());

            if decision == DeletionDecision::DeleteFile {
                fs::remove_file(node.path())
                    .await
                    .context(IoFailureSnafu {
                        action: "remove",
                        path: node.path(),
                    })?;
                pass.record(ActionRecord::RemovedFile(node.path().to_path_buf()))?;
            }
        }
        Ok(())
    }
}

/// Per-pass accumulator.
struct Pass<'a, S> {
    sink: &'a mut S,
    report: SyncReport,
}

impl<S: ActionSink> Pass<'_, S> {
    fn record(&mut self, record: ActionRecord) -> Result<(), SyncError> {
        self.report.tally(&record);
        self.sink.record(record).context(LogWriteSnafu)
    }
}

/// Depth-first walk below `root`, parents before children. Sorting buffers
/// each directory's listing, so entries may be removed while walking.
fn walk(root: &Path) -> walkdir::IntoIter {
    WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter()
}

async fn copy_file(source: &Path, destination: &Path) -> Result<(), SyncError> {
    copy_preserving_times(source, destination)
        .await
        .context(IoFailureSnafu {
            action: "copy",
            path: destination,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::test_support::{Trees, at_secs, trees, write_with_mtime};
    use crate::mirror::tree_node::modified_time;
    use rstest::*;
    use std::fs;

    async fn sync(trees: &Trees) -> (Result<SyncReport, SyncError>, Vec<ActionRecord>) {
        let mut records = Vec::new();
        let result = MirrorEngine::new(&trees.source, &trees.replica)
            .sync(&mut records)
            .await;
        (result, records)
    }

    async fn sync_ok(trees: &Trees) -> (SyncReport, Vec<ActionRecord>) {
        let (result, records) = sync(trees).await;
        (result.expect("Sync failed"), records)
    }

    #[rstest]
    #[compio::test]
    async fn copies_new_file_with_its_modification_time(trees: Trees) {
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));

        let (report, records) = sync_ok(&trees).await;

        let replica_file = trees.replica.join("a.txt");
        assert_eq!(fs::read_to_string(&replica_file).unwrap(), "hi");
        assert_eq!(modified_time(&replica_file).unwrap(), at_secs(1_000));
        assert_eq!(records, vec![ActionRecord::CopiedFile(replica_file)]);
        assert_eq!(report.copied, 1);
    }

    #[rstest]
    #[compio::test]
    async fn updates_file_whose_modification_time_changed(trees: Trees) {
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));
        sync_ok(&trees).await;
        write_with_mtime(&trees.source.join("a.txt"), "bye", at_secs(2_000));

        let (report, records) = sync_ok(&trees).await;

        let replica_file = trees.replica.join("a.txt");
        assert_eq!(fs::read_to_string(&replica_file).unwrap(), "bye");
        assert_eq!(modified_time(&replica_file).unwrap(), at_secs(2_000));
        assert_eq!(records, vec![ActionRecord::UpdatedFile(replica_file)]);
        assert_eq!(report.updated, 1);
    }

    #[rstest]
    #[compio::test]
    async fn removes_file_missing_from_source(trees: Trees) {
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));
        fs::create_dir(&trees.replica).unwrap();
        fs::write(trees.replica.join("b.txt"), "old").unwrap();

        let (report, records) = sync_ok(&trees).await;

        assert!(!trees.replica.join("b.txt").exists());
        assert!(records.contains(&ActionRecord::RemovedFile(trees.replica.join("b.txt"))));
        assert_eq!(report.removed, 1);
    }

    #[rstest]
    #[compio::test]
    async fn second_pass_changes_nothing(trees: Trees) {
        fs::create_dir_all(trees.source.join("docs").join("drafts")).unwrap();
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));
        write_with_mtime(&trees.source.join("docs").join("b.txt"), "b", at_secs(1_100));
        write_with_mtime(
            &trees.source.join("docs").join("drafts").join("c.txt"),
            "c",
            at_secs(1_200),
        );
        let (first, _) = sync_ok(&trees).await;

        let (second, records) = sync_ok(&trees).await;

        assert_eq!(first.mutations(), 5);
        assert_eq!(second.mutations(), 0);
        assert_eq!(second.unchanged, 3);
        assert!(
            records
                .iter()
                .all(|record| matches!(record, ActionRecord::Unchanged(_)))
        );
    }

    #[rstest]
    #[compio::test]
    async fn creates_nested_directories_top_down(trees: Trees) {
        fs::create_dir_all(trees.source.join("a").join("b").join("c")).unwrap();

        let (report, records) = sync_ok(&trees).await;

        assert!(trees.replica.join("a").join("b").join("c").is_dir());
        assert_eq!(
            records,
            vec![
                ActionRecord::CreatedDirectory(trees.replica.join("a")),
                ActionRecord::CreatedDirectory(trees.replica.join("a").join("b")),
                ActionRecord::CreatedDirectory(trees.replica.join("a").join("b").join("c")),
            ]
        );
        assert_eq!(report.created_dirs, 3);
    }

    #[rstest]
    #[compio::test]
    async fn bootstraps_missing_replica_root_with_parents(mut trees: Trees) {
        trees.replica = trees.temp_dir.path().join("deep").join("replica");
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));

        sync_ok(&trees).await;

        assert!(trees.replica.join("a.txt").is_file());
    }

    #[rstest]
    #[compio::test]
    async fn keeps_replica_directory_absent_from_source(trees: Trees) {
        fs::create_dir_all(trees.replica.join("old")).unwrap();
        fs::write(trees.replica.join("old").join("stale.txt"), "x").unwrap();

        let (_, records) = sync_ok(&trees).await;

        assert!(trees.replica.join("old").is_dir());
        assert!(!trees.replica.join("old").join("stale.txt").exists());
        assert_eq!(
            records,
            vec![ActionRecord::RemovedFile(
                trees.replica.join("old").join("stale.txt")
            )]
        );
    }

    #[rstest]
    #[compio::test]
    async fn equal_modification_time_skips_differing_contents(trees: Trees) {
        write_with_mtime(&trees.source.join("a.txt"), "new", at_secs(1_000));
        fs::create_dir(&trees.replica).unwrap();
        write_with_mtime(&trees.replica.join("a.txt"), "old", at_secs(1_000));

        let (report, _) = sync_ok(&trees).await;

        assert_eq!(report.unchanged, 1);
        assert_eq!(fs::read_to_string(trees.replica.join("a.txt")).unwrap(), "old");
    }

    #[rstest]
    #[compio::test]
    async fn missing_source_touches_nothing(mut trees: Trees) {
        trees.source = trees.temp_dir.path().join("absent");

        let (result, records) = sync(&trees).await;

        assert!(matches!(result, Err(SyncError::SourceMissing { .. })));
        assert!(records.is_empty());
        assert!(!trees.replica.exists());
    }

    #[rstest]
    #[compio::test]
    async fn source_file_instead_of_directory_is_rejected(mut trees: Trees) {
        trees.source = trees.temp_dir.path().join("plain.txt");
        fs::write(&trees.source, "not a dir").unwrap();
        fs::create_dir(&trees.replica).unwrap();
        fs::write(trees.replica.join("keep.txt"), "x").unwrap();

        let (result, records) = sync(&trees).await;

        assert!(matches!(result, Err(SyncError::SourceNotDirectory { .. })));
        assert!(records.is_empty());
        assert!(trees.replica.join("keep.txt").exists());
    }

    #[rstest]
    #[compio::test]
    async fn failing_operation_aborts_the_pass(mut trees: Trees) {
        trees.replica = trees.temp_dir.path().join("replica.txt");
        fs::write(&trees.replica, "a file, not a directory").unwrap();
        write_with_mtime(&trees.source.join("a.txt"), "hi", at_secs(1_000));

        let (result, records) = sync(&trees).await;

        match result {
            Err(SyncError::IoFailure { path, .. }) => {
                assert_eq!(path, trees.replica.join("a.txt"));
            }
            other => panic!("Expected IoFailure, got {other:?}"),
        }
        assert!(records.is_empty());
    }

    #[rstest]
    #[case::flat(&["a.txt", "b.txt"])]
    #[case::nested(&["docs/a.txt", "docs/deep/b.txt", "c.txt"])]
    #[case::unicode(&["тест/файл.txt", "🚀.md"])]
    #[compio::test]
    async fn replica_matches_source_after_pass(trees: Trees, #[case] files: &[&str]) {
        for (index, file) in files.iter().enumerate() {
            let path = trees.source.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            write_with_mtime(&path, file, at_secs(1_000 + index as u64));
        }

        sync_ok(&trees).await;

        for file in files {
            let source_file = trees.source.join(file);
            let replica_file = trees.replica.join(file);
            assert_eq!(
                fs::read(&replica_file).unwrap(),
                fs::read(&source_file).unwrap()
            );
            assert_eq!(
                modified_time(&replica_file).unwrap(),
                modified_time(&source_file).unwrap()
            );
        }
    }

    #[cfg(unix)]
    #[rstest]
    #[compio::test]
    async fn symlinked_source_directory_becomes_plain_directory(trees: Trees) {
        let elsewhere = trees.temp_dir.path().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        fs::write(elsewhere.join("inner.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&elsewhere, trees.source.join("linked")).unwrap();

        let (first, records) = sync_ok(&trees).await;
        let (second, _) = sync_ok(&trees).await;

        let replica_dir = trees.replica.join("linked");
        assert!(replica_dir.is_dir());
        assert!(!replica_dir.is_symlink());
        assert!(!replica_dir.join("inner.txt").exists());
        assert_eq!(records, vec![ActionRecord::CreatedDirectory(replica_dir)]);
        assert_eq!(first.mutations(), 1);
        assert_eq!(second.mutations(), 0);
    }
}
