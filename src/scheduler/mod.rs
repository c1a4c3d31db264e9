//! Test scheduler
//!
//! Takes a fixed-size prefix of the naturally ordered, formatted pool and
//! drives each selected drive through the benchmark suite in declared
//! order. Every (drive, test) pair gets its own working and report
//! directory, derived from the controller stem and the test name, so
//! repeated runs never collide and any output traces back to its origin.
//! Benchmark execution itself is delegated to the external engine; this
//! module's contract ends at a fully parameterized, isolated invocation
//! target per run and its recorded outcome.

use crate::command::CommandRunner;
use crate::{Drive, QualError, QualResult, TestCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};


/// Outcome of one benchmark invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Pending,
    Passed,
    Failed(String),
}

/// One (drive, test) pair with its isolated storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    /// Addressable path handed to the benchmark engine
    pub drive_path: String,
    pub test: TestCase,
    pub working_dir: PathBuf,
    pub report_dir: PathBuf,
    pub outcome: TestOutcome,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Parameter file consumed by the external benchmark engine
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineParameters {
    pub device: String,
    pub test: TestCase,
    pub working_dir: PathBuf,
    pub report_dir: PathBuf,
}

pub struct TestScheduler;

impl TestScheduler {
    /// Produce one provisioned [`TestRun`] per (drive, test) pair for the
    /// first `count` drives of the pool.
    ///
    /// `count` exceeding the pool size is a precondition violation, never a
    /// silent truncation: "the first N drives" must mean the same N drives
    /// on every invocation.
    pub fn schedule(
        pool: &[Drive],
        count: usize,
        suite: &[TestCase],
        base_dir: &Path,
    ) -> QualResult<Vec<TestRun>> {
        if count > pool.len() {
            return Err(QualError::Schedule {
                requested: count,
                available: pool.len(),
            });
        }

        let mut runs = Vec::with_capacity(count * suite.len());
        for drive in &pool[..count] {
            for test in suite {
                runs.push(Self::provision(drive, *test, base_dir)?);
            }
        }

        tracing::info!(
            drives = count,
            tests = suite.len(),
            runs = runs.len(),
            "scheduled qualification runs"
        );

        Ok(runs)
    }

    /// Create the working and report directories for one (drive, test) pair.
    ///
    /// Layout: `<base>/<controller stem>/<test>/{work,report}`. The
    /// controller stem is unique per drive and the test name unique within
    /// the suite, so no two runs share a directory.
    fn provision(drive: &Drive, test: TestCase, base_dir: &Path) -> QualResult<TestRun> {
        let stem = controller_stem(&drive.control_path());
        let run_dir = base_dir.join(&stem).join(test.name());
        let working_dir = run_dir.join("work");
        let report_dir = run_dir.join("report");

        fs::create_dir_all(&working_dir)?;
        fs::create_dir_all(&report_dir)?;

        tracing::debug!(
            drive = %drive.addressable_path,
            test = %test,
            dir = %run_dir.display(),
            "provisioned test run"
        );

        Ok(TestRun {
            drive_path: drive.addressable_path.clone(),
            test,
            working_dir,
            report_dir,
            outcome: TestOutcome::Pending,
            started_at: None,
            finished_at: None,
        })
    }

    /// Write the engine parameter file into the run's working directory and
    /// return its path.
    pub fn write_parameters(run: &TestRun) -> QualResult<PathBuf> {
        let params = EngineParameters {
            device: run.drive_path.clone(),
            test: run.test,
            working_dir: run.working_dir.clone(),
            report_dir: run.report_dir.clone(),
        };

        let path = run.working_dir.join("parameters.json");
        let json = serde_json::to_string_pretty(&params)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Hand one run to the external benchmark engine and record the outcome
    /// from its exit status. A failing benchmark is a recorded result, not a
    /// gateway error.
    pub fn execute(
        runner: &dyn CommandRunner,
        engine_command: &str,
        run: &mut TestRun,
    ) -> QualResult<()> {
        let params_path = Self::write_parameters(run)?;

        tracing::info!(
            drive = %run.drive_path,
            test = %run.test,
            "running benchmark"
        );

        run.started_at = Some(Utc::now());
        let output = runner.run(engine_command, &[&params_path.to_string_lossy()])?;
        run.finished_at = Some(Utc::now());

        run.outcome = if output.success {
            TestOutcome::Passed
        } else {
            let reason = format!(
                "engine exited with status {:?}: {}",
                output.code,
                output.stderr.trim()
            );
            tracing::error!(drive = %run.drive_path, test = %run.test, %reason, "benchmark failed");
            TestOutcome::Failed(reason)
        };

        Ok(())
    }
}

/// Directory-safe stem of a control path: `/dev/nvme0` -> `nvme0`
fn controller_stem(control_path: &str) -> String {
    Path::new(control_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| control_path.trim_start_matches('/').replace('/', "_"))
}
