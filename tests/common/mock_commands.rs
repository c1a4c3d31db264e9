//! Mock command execution infrastructure for integration tests
//!
//! Provides a registry-backed [`CommandRunner`] plus canned output for the
//! external tools the orchestrator shells out to (nvme-cli, findmnt, the
//! benchmark engine), so full flows run without touching real hardware.

use ssd_qual::command::{CommandOutput, CommandRunner};
use ssd_qual::{QualError, QualResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry-driven mock gateway with an invocation log
pub struct MockGateway {
    responses: Arc<Mutex<HashMap<String, CommandOutput>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn key(program: &str, args: &[&str]) -> String {
        let mut key = program.to_string();
        for arg in args {
            key.push(' ');
            key.push_str(arg);
        }
        key
    }

    pub fn register(&self, program: &str, args: &[&str], output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .insert(Self::key(program, args), output);
    }

    pub fn register_success(&self, program: &str, args: &[&str], stdout: &str) {
        self.register(
            program,
            args,
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                success: true,
                code: Some(0),
            },
        );
    }

    pub fn register_failure(&self, program: &str, args: &[&str], code: i32, stderr: &str) {
        self.register(
            program,
            args,
            CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                success: false,
                code: Some(code),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockGateway {
    fn run(&self, program: &str, args: &[&str]) -> QualResult<CommandOutput> {
        let key = Self::key(program, args);
        self.calls.lock().unwrap().push(key.clone());

        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| QualError::CommandFailed {
                program: program.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no mock registered for '{}'", key),
                ),
            })
    }
}

/// Canned nvme-cli output
pub struct MockNvmeData;

impl MockNvmeData {
    /// `nvme list` table for the given (path, model) records
    pub fn list_output(records: &[(&str, &str)]) -> String {
        let mut out = String::from(
            "Node             SN                   Model                Namespace Usage\n\
             ---------------- -------------------- -------------------- --------- -----\n",
        );
        for (i, (path, model)) in records.iter().enumerate() {
            out.push_str(&format!(
                "{:<16} SN{:04}SERIAL         {:<20} 1         15.36 TB\n",
                path, i, model
            ));
        }
        out
    }

    /// `nvme id-ctrl` output with the given Format NVM attributes value
    pub fn id_ctrl_output(model: &str, fna: &str) -> String {
        format!(
            "NVME Identify Controller:\n\
             vid       : 0x1344\n\
             ssvid     : 0x1344\n\
             sn        : 232323232323\n\
             mn        : {}\n\
             fr        : 45A3\n\
             fna       : {}\n\
             vwc       : 0\n",
            model, fna
        )
    }

    /// `nvme format` output carrying the literal success marker
    pub fn format_success() -> String {
        "Success formatting namespace:ffffffff\n".to_string()
    }

    /// `nvme format` output without the marker (tool still exits 0)
    pub fn format_partial() -> String {
        "format completed with warnings\n".to_string()
    }
}

/// Canned findmnt output
pub struct MockFindmntData;

impl MockFindmntData {
    pub fn mounted(path: &str, target: &str) -> String {
        format!(
            "TARGET    SOURCE         FSTYPE OPTIONS\n{:<9} {:<14} ext4   rw,relatime\n",
            target, path
        )
    }
}

/// Register the full set of responses for one unmounted, formattable drive
pub fn register_clean_drive(gateway: &MockGateway, ctrl: &str, block: &str) {
    gateway.register_failure("findmnt", &["--source", block], 1, "");
    gateway.register_success(
        "nvme",
        &["format", ctrl, "--namespace-id=0xffffffff"],
        &MockNvmeData::format_success(),
    );
}
