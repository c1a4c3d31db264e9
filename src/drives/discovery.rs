//! Drive discovery
//!
//! Queries the device inventory, filters records for the configured model
//! identifier and returns the pool in natural order. The scheduler later
//! takes a fixed-size prefix of this sequence, so the ordering has to be
//! deterministic and human-expected: nvme2n1 before nvme10n1, regardless of
//! the order the inventory happens to emit lines in.

use crate::command::CommandRunner;
use crate::{DeviceIdentifier, Drive, QualError, QualResult};
use std::cmp::Ordering;

pub struct DriveDiscovery;

impl DriveDiscovery {
    /// List drives whose inventory record contains `identifier`, naturally
    /// ordered by addressable path. An empty pool is a valid result.
    pub fn discover(
        runner: &dyn CommandRunner,
        identifier: &DeviceIdentifier,
    ) -> QualResult<Vec<Drive>> {
        tracing::info!(identifier = %identifier, "querying device inventory");

        let output = runner.run("nvme", &["list"])?;
        if !output.success {
            return Err(QualError::Discovery(format!(
                "nvme list exited with status {:?}: {}",
                output.code,
                output.stderr.trim()
            )));
        }

        let mut paths: Vec<String> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.contains(identifier.as_str()))
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();

        paths.sort_by(|a, b| natural_cmp(a, b));

        tracing::info!(count = paths.len(), "discovered drives: {:?}", paths);

        Ok(paths.into_iter().map(Drive::new).collect())
    }
}

/// Natural-order comparison: embedded digit runs compare by numeric value,
/// everything else byte-wise, segments interleaved left to right.
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.numeric, r.numeric) {
                    (true, true) => numeric_cmp(l.text, r.text),
                    _ => l.text.cmp(r.text),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

struct Segment<'a> {
    numeric: bool,
    text: &'a str,
}

/// Split into maximal runs of digits / non-digits
fn segments(s: &str) -> impl Iterator<Item = Segment<'_>> {
    let bytes = s.as_bytes();
    let mut start = 0;

    std::iter::from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let numeric = bytes[start].is_ascii_digit();
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() == numeric {
            end += 1;
        }
        let seg = Segment {
            numeric,
            text: &s[start..end],
        };
        start = end;
        Some(seg)
    })
}

/// Compare two digit runs by value without parsing: ignore leading zeros,
/// longer run of significant digits wins, then byte-wise.
fn numeric_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
