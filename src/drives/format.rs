//! Secure format executor
//!
//! Converts a drive's addressable namespace path to its whole-controller
//! control path, resolves the erase mode from the controller's Format NVM
//! attributes, and issues the format against every namespace on the
//! controller. Destructive and irreversible by design; the mount guard is
//! the only abort point and it sits before this module is ever reached.

use crate::command::CommandRunner;
use crate::{Drive, EraseMode, LifecycleState, QualError, QualResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NAMESPACE_SUFFIX: Regex =
        Regex::new(r"^(?P<ctrl>.*nvme\d+)n\d+$").expect("namespace suffix regex");
}

/// nvme-cli prints this on a completed format; the exit status alone is not
/// trusted because the tool can exit 0 on partial success.
const SUCCESS_MARKER: &str = "Success";

/// Format NVM attributes bit for cryptographic erase support
/// (Identify Controller `fna`, bit 2). Documented assumption: the probe
/// output's `fna` value is the authoritative capability field.
const FNA_CRYPTO_ERASE: u32 = 0x4;

/// Derive the whole-controller administrative path from a namespace block
/// path: `/dev/nvme0n1` -> `/dev/nvme0`. Idempotent; a path without a
/// namespace suffix passes through unchanged.
pub fn control_path(addressable: &str) -> String {
    match NAMESPACE_SUFFIX.captures(addressable) {
        Some(caps) => caps["ctrl"].to_string(),
        None => addressable.to_string(),
    }
}

pub struct SecureFormat;

impl SecureFormat {
    /// Format every namespace on the drive's controller.
    ///
    /// With `secure`, the erase mode is resolved once from the controller
    /// capability probe: crypto erase where supported, user-data erase
    /// otherwise (the downgrade is logged). The captured output must carry
    /// the literal success marker or the format counts as failed no matter
    /// what the exit status claims.
    pub fn format(runner: &dyn CommandRunner, drive: &mut Drive, secure: bool) -> QualResult<()> {
        let result = Self::format_inner(runner, drive, secure);
        drive.lifecycle = if result.is_ok() {
            LifecycleState::Formatted
        } else {
            LifecycleState::Failed
        };
        result
    }

    fn format_inner(runner: &dyn CommandRunner, drive: &Drive, secure: bool) -> QualResult<()> {
        let ctrl = drive.control_path();

        // All namespaces on the controller, not just the addressable one
        let mut args = vec!["format", ctrl.as_str(), "--namespace-id=0xffffffff"];

        let erase_mode = if secure {
            Some(Self::resolve_erase_mode(runner, &ctrl, drive)?)
        } else {
            None
        };
        if let Some(mode) = erase_mode {
            args.push(mode.ses_flag());
        }

        tracing::info!(
            path = %drive.addressable_path,
            control_path = %ctrl,
            erase_mode = ?erase_mode,
            "formatting all namespaces"
        );

        let output = runner.run("nvme", &args)?;
        if !output.combined().contains(SUCCESS_MARKER) {
            return Err(QualError::Format {
                path: drive.addressable_path.clone(),
                reason: format!(
                    "success marker missing from format output (exit status {:?})",
                    output.code
                ),
            });
        }

        tracing::info!(path = %drive.addressable_path, "format verified");
        Ok(())
    }

    /// Probe the controller's Format NVM attributes and pick the erase mode.
    /// No crypto-erase support is a valid negative answer: fall back to the
    /// user-data erase and say so.
    pub(crate) fn resolve_erase_mode(
        runner: &dyn CommandRunner,
        ctrl: &str,
        drive: &Drive,
    ) -> QualResult<EraseMode> {
        let output = runner.run("nvme", &["id-ctrl", ctrl])?;
        if !output.success {
            return Err(QualError::Format {
                path: drive.addressable_path.clone(),
                reason: format!(
                    "capability probe failed with status {:?}: {}",
                    output.code,
                    output.stderr.trim()
                ),
            });
        }

        let fna = Self::parse_fna(&output.stdout).ok_or_else(|| QualError::Format {
            path: drive.addressable_path.clone(),
            reason: "capability probe output carried no parsable fna field".to_string(),
        })?;

        if fna & FNA_CRYPTO_ERASE != 0 {
            tracing::info!(control_path = %ctrl, fna, "controller supports crypto erase");
            Ok(EraseMode::Crypto)
        } else {
            tracing::warn!(
                control_path = %ctrl,
                fna,
                "no crypto-erase support, downgrading to user-data erase"
            );
            Ok(EraseMode::Standard)
        }
    }

    /// Extract the `fna` value from identify-controller output. Accepts the
    /// nvme-cli text rendering (`fna       : 0x4`), hex or decimal.
    pub(crate) fn parse_fna(output: &str) -> Option<u32> {
        let value = output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("fna"))?
            .split(':')
            .nth(1)?
            .split_whitespace()
            .next()?
            .to_string();

        match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => value.parse().ok(),
        }
    }
}
