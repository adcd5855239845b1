//! CSV report export for active leases.
//!
//! Produces the on-demand tabular export of the lease table: one row per
//! active lease with the client, its address, and the remaining TTL at the
//! moment of export. The destination path is chosen by the caller.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::lease::{ActiveLease, LeasePool};

const HEADER: [&str; 3] = ["Client", "IP Address", "Time Remaining"];

/// Renders lease rows as CSV text, header included.
///
/// The remaining TTL is formatted with an `s` suffix, e.g. `584s`.
pub fn render_csv(entries: &[ActiveLease]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADER)?;

    for entry in entries {
        writer.write_record([
            entry.client_id.clone(),
            entry.address.to_string(),
            format!("{}s", entry.remaining_seconds),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| std::io::Error::other(error.to_string()))?;
    let report =
        String::from_utf8(bytes).map_err(|error| std::io::Error::other(error.to_string()))?;
    Ok(report)
}

/// Writes the active-lease report for time `now` to `path`.
///
/// Returns the number of lease rows written (header excluded).
pub async fn export_csv<P: AsRef<Path>>(
    pool: &LeasePool,
    path: P,
    now: DateTime<Utc>,
) -> Result<usize> {
    let entries = pool.list_active(now).await;
    let report = render_csv(&entries)?;
    tokio::fs::write(path, report).await?;
    Ok(entries.len())
}
