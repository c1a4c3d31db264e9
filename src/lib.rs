// Allow uppercase acronyms for industry-standard terms like IOPS, NVMe, RAID
#![allow(clippy::upper_case_acronyms)]

pub mod command;
pub mod drives;
pub mod logging;
pub mod qual_orchestrator;
pub mod scheduler;

// Re-export the orchestrator for convenience
pub use qual_orchestrator::QualOrchestrator;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error taxonomy for the qualification orchestrator
///
/// Every command surface catches these at its top level, logs at error
/// severity and terminates with a non-zero status. The only designed-benign
/// negatives ("not mounted", "no crypto-erase support") are ordinary values,
/// not error variants.
#[derive(Error, Debug)]
pub enum QualError {
    #[error("process must run with root privileges")]
    Privilege,

    #[error("device inventory query failed: {0}")]
    Discovery(String),

    #[error("drive {path} is mounted; aborting batch before any format is issued")]
    MountedDrive { path: String },

    #[error("format of {path} failed: {reason}")]
    Format { path: String, reason: String },

    #[error("requested {requested} drives but pool only holds {available}")]
    Schedule { requested: usize, available: usize },

    #[error("{0} is not yet implemented")]
    Unimplemented(&'static str),

    #[error("failed to invoke '{program}': {source}")]
    CommandFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type QualResult<T> = Result<T, QualError>;

/// Model substring used to filter the device inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String);

impl DeviceIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceIdentifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of a drive moving through one qualification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Discovered,
    MountChecked,
    Formatted,
    UnderTest,
    Completed,
    Failed,
}

/// Erase mode resolved from the controller capability probe, once per format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EraseMode {
    /// User-data erase (`--ses=1`)
    Standard,
    /// Cryptographic erase (`--ses=2`)
    Crypto,
}

impl EraseMode {
    /// Flag value for the nvme format secure-erase-settings argument
    pub fn ses_flag(&self) -> &'static str {
        match self {
            EraseMode::Standard => "--ses=1",
            EraseMode::Crypto => "--ses=2",
        }
    }
}

/// One physical storage device under qualification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drive {
    /// Namespace block path as reported by inventory, e.g. /dev/nvme0n1
    pub addressable_path: String,
    pub lifecycle: LifecycleState,
}

impl Drive {
    pub fn new(addressable_path: impl Into<String>) -> Self {
        Self {
            addressable_path: addressable_path.into(),
            lifecycle: LifecycleState::Discovered,
        }
    }

    /// Whole-controller administrative path, derived from the addressable path
    pub fn control_path(&self) -> String {
        drives::format::control_path(&self.addressable_path)
    }
}

/// Named benchmark from the fixed qualification suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCase {
    Iops,
    Latency,
    Throughput,
}

impl TestCase {
    pub fn name(&self) -> &'static str {
        match self {
            TestCase::Iops => "iops",
            TestCase::Latency => "latency",
            TestCase::Throughput => "throughput",
        }
    }

    /// The full suite in its declared execution order
    pub fn full_suite() -> Vec<TestCase> {
        vec![TestCase::Iops, TestCase::Latency, TestCase::Throughput]
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Qualification run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualConfig {
    /// Model substring selecting the drives under test
    pub device_identifier: DeviceIdentifier,
    /// How many drives from the head of the ordered pool get tested
    pub drives_to_test: usize,
    /// Benchmark suite, executed in declared order per drive
    pub suite: Vec<TestCase>,
    /// Root directory for per-run working/report directories
    pub output_dir: String,
    /// External benchmark engine command, invoked once per test run
    pub engine_command: String,
    /// Request crypto erase where the controller supports it
    pub secure_erase: bool,
}

impl Default for QualConfig {
    fn default() -> Self {
        Self {
            device_identifier: DeviceIdentifier::from("MTFDKCC15T3TFR"),
            drives_to_test: 2,
            suite: TestCase::full_suite(),
            output_dir: "./qual-runs".to_string(),
            engine_command: "sss_pts_test".to_string(),
            secure_erase: false,
        }
    }
}
