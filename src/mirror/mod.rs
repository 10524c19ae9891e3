//! One-way mirroring of a source tree onto a replica tree.
//!
//! A pass walks the source to create and update replica entries, then walks
//! the replica to remove files the source no longer has. Files are compared by
//! modification time only; copies carry the source's modification time so the
//! next pass sees them as unchanged.

mod copy;
mod decision;
mod engine;
mod error;
mod tree_node;

#[cfg(test)]
mod test_support;

pub use engine::MirrorEngine;
pub use error::SyncError;
