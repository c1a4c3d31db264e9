//! Mount safety guard
//!
//! Hard precondition in front of every destructive operation. Mount status
//! is queried live at check time, never cached, and the batch gate is
//! all-or-nothing: either every drive in the pool is observed unmounted, or
//! no drive in the pool gets formatted.

use crate::command::CommandRunner;
use crate::{Drive, LifecycleState, QualError, QualResult};

pub struct MountGuard;

impl MountGuard {
    /// Query the live mount table for any entry referencing the drive.
    ///
    /// `findmnt` exits non-zero when no entry matches; that is the valid
    /// "not mounted" answer, not a fault.
    pub fn is_mounted(runner: &dyn CommandRunner, drive: &Drive) -> QualResult<bool> {
        let output = runner.run("findmnt", &["--source", &drive.addressable_path])?;
        Ok(output.success && !output.stdout.trim().is_empty())
    }

    /// Verify every drive in the pool is unmounted before any of them is
    /// touched. Short-circuits on the first mounted drive and fails the
    /// whole batch naming the offending path.
    pub fn guard_batch(runner: &dyn CommandRunner, drives: &mut [Drive]) -> QualResult<()> {
        for drive in drives.iter() {
            if Self::is_mounted(runner, drive)? {
                tracing::error!(
                    path = %drive.addressable_path,
                    "mounted drive in pool, aborting batch"
                );
                return Err(QualError::MountedDrive {
                    path: drive.addressable_path.clone(),
                });
            }
            tracing::debug!(path = %drive.addressable_path, "drive is not mounted");
        }

        // Only transition once the whole batch has been vetted
        for drive in drives.iter_mut() {
            drive.lifecycle = LifecycleState::MountChecked;
        }

        Ok(())
    }
}
