// Qualification Orchestrator - composes the drive lifecycle for each command
//
// Strictly sequential by design: discovery, the batch mount gate, per-drive
// formatting and per-run benchmark execution happen in program order with
// blocking gateway calls. A destructive format must never race a mount
// observation, so there is deliberately no concurrency here and no
// cancellation once a format command has been issued.

use crate::command::CommandRunner;
use crate::drives::{DriveDiscovery, MountGuard, SecureFormat};
use crate::scheduler::{TestOutcome, TestRun, TestScheduler};
use crate::{Drive, LifecycleState, QualConfig, QualResult};
use std::path::Path;

/// Result of one `run-test` invocation
#[derive(Debug)]
pub struct RunReport {
    /// Selected drives with their final lifecycle states
    pub drives: Vec<Drive>,
    pub runs: Vec<TestRun>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.runs
            .iter()
            .all(|run| run.outcome == TestOutcome::Passed)
    }
}

pub struct QualOrchestrator<'a> {
    config: QualConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> QualOrchestrator<'a> {
    pub fn new(config: QualConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Discovery only: the naturally ordered pool for the configured model
    pub fn discover(&self) -> QualResult<Vec<Drive>> {
        DriveDiscovery::discover(self.runner, &self.config.device_identifier)
    }

    /// Discovery -> batch mount gate -> per-drive format across the full
    /// pool. No drive is formatted unless every drive in the pool was
    /// observed unmounted; a format failure halts the invocation without
    /// rolling back drives already formatted.
    pub fn setup_raid(&self) -> QualResult<Vec<Drive>> {
        let mut pool = self.discover()?;
        if pool.is_empty() {
            tracing::warn!("no drives matched the device identifier, nothing to format");
            return Ok(pool);
        }

        MountGuard::guard_batch(self.runner, &mut pool)?;

        for drive in pool.iter_mut() {
            SecureFormat::format(self.runner, drive, self.config.secure_erase)?;
        }

        tracing::info!(count = pool.len(), "pool formatted and ready");
        Ok(pool)
    }

    /// Discovery -> scheduling -> suite execution for the configured prefix
    /// of the pool. A failing benchmark fails its drive and skips that
    /// drive's remaining tests; other drives still run.
    pub fn run_test(&self) -> QualResult<RunReport> {
        let pool = self.discover()?;

        let mut runs = TestScheduler::schedule(
            &pool,
            self.config.drives_to_test,
            &self.config.suite,
            Path::new(&self.config.output_dir),
        )?;

        let mut drives: Vec<Drive> = pool
            .into_iter()
            .take(self.config.drives_to_test)
            .collect();
        for drive in drives.iter_mut() {
            drive.lifecycle = LifecycleState::UnderTest;
        }

        for run in runs.iter_mut() {
            let drive = drives
                .iter_mut()
                .find(|d| d.addressable_path == run.drive_path)
                .expect("every scheduled run maps to a selected drive");

            // A drive that already failed skips its remaining tests
            if drive.lifecycle == LifecycleState::Failed {
                run.outcome = TestOutcome::Failed(format!(
                    "skipped: earlier test failed on {}",
                    run.drive_path
                ));
                continue;
            }

            TestScheduler::execute(self.runner, &self.config.engine_command, run)?;

            if let TestOutcome::Failed(_) = run.outcome {
                drive.lifecycle = LifecycleState::Failed;
            }
        }

        for drive in drives.iter_mut() {
            if drive.lifecycle == LifecycleState::UnderTest {
                drive.lifecycle = LifecycleState::Completed;
            }
        }

        Ok(RunReport { drives, runs })
    }
}
