//! The text file capturing the server's combined output.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Prefix of the header line written at the start of every run.
pub const SINK_HEADER_PREFIX: &str = "--- Server Started at";

/// Truncates the sink, writes the run header, and returns an append handle.
///
/// The returned handle is positioned at the end of the header so the child
/// appends after it.
pub fn prepare_sink(path: &Path) -> io::Result<File> {
    prepare_sink_at(path, OffsetDateTime::now_utc())
}

pub(crate) fn prepare_sink_at(path: &Path, started_at: OffsetDateTime) -> io::Result<File> {
    let stamp = started_at.format(&Rfc3339).map_err(io::Error::other)?;
    let mut header = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    writeln!(header, "{SINK_HEADER_PREFIX} {stamp} ---")?;
    header.sync_all()?;
    drop(header);
    OpenOptions::new().append(true).open(path)
}
