//! Incremental tailing of the server log for known failure signatures.
//!
//! The log is advisory: read failures are treated as "nothing new" and the
//! next poll tries again.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

use tracing::{debug, trace};

const MONITOR_TARGET: &str = "tether::monitor";

/// Longest unterminated line held between polls before it is scanned early.
const PARTIAL_LINE_LIMIT: usize = 64 * 1024;

/// A recognised condition reported by the server through its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignalKind {
    /// The server cannot reach the editor's debugging endpoint.
    EditorNotDetected,
}

impl SignalKind {
    /// Every signal the monitor looks for.
    pub const ALL: [Self; 1] = [Self::EditorNotDetected];

    /// Substring whose presence in a log line raises the signal.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::EditorNotDetected => "CDP not found",
        }
    }

    fn matches(self, line: &str) -> bool {
        line.contains(self.marker())
    }

    fn longest_marker() -> usize {
        Self::ALL
            .iter()
            .map(|kind| kind.marker().len())
            .max()
            .unwrap_or(0)
    }
}

/// Read position within the sink. Only ever moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCursor {
    path: PathBuf,
    offset: u64,
}

impl LogCursor {
    /// Starts reading `path` from the beginning.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    fn read_new(&mut self) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut fresh = Vec::new();
        file.read_to_end(&mut fresh)?;
        self.offset += fresh.len() as u64;
        Ok(fresh)
    }
}

/// Tails the sink and raises each [`SignalKind`] at most once per run.
#[derive(Debug)]
pub struct LogSignalMonitor {
    cursor: LogCursor,
    fired: BTreeSet<SignalKind>,
    partial: Vec<u8>,
}

impl LogSignalMonitor {
    /// Monitors the sink at `path` from its first byte.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cursor: LogCursor::new(path),
            fired: BTreeSet::new(),
            partial: Vec::new(),
        }
    }

    /// Current read position.
    #[must_use]
    pub const fn cursor(&self) -> &LogCursor {
        &self.cursor
    }

    /// Returns signals seen for the first time since the previous poll.
    ///
    /// A line still being written is held back until its newline arrives,
    /// so a marker split across two writes is not missed.
    pub fn poll_new_signals(&mut self) -> BTreeSet<SignalKind> {
        let fresh = match self.cursor.read_new() {
            Ok(fresh) => fresh,
            Err(error) => {
                trace!(target: MONITOR_TARGET, %error, "server log not readable");
                return BTreeSet::new();
            }
        };
        if fresh.is_empty() {
            return BTreeSet::new();
        }

        self.partial.extend_from_slice(&fresh);
        let complete = match self.partial.iter().rposition(|byte| *byte == b'\n') {
            Some(newline) => {
                let rest = self.partial.split_off(newline + 1);
                std::mem::replace(&mut self.partial, rest)
            }
            None => Vec::new(),
        };

        let mut raised = BTreeSet::new();
        for line in String::from_utf8_lossy(&complete).lines() {
            self.raise_matches(line, &mut raised);
        }
        if self.partial.len() > PARTIAL_LINE_LIMIT {
            self.shed_partial(&mut raised);
        }
        raised
    }

    /// Scans an oversized unterminated line, keeping only a tail short enough
    /// that no marker fits inside it.
    fn shed_partial(&mut self, raised: &mut BTreeSet<SignalKind>) {
        let mut fragment = std::mem::take(&mut self.partial);
        self.raise_matches(&String::from_utf8_lossy(&fragment), raised);
        let keep = SignalKind::longest_marker().saturating_sub(1);
        self.partial = fragment.split_off(fragment.len().saturating_sub(keep));
        trace!(target: MONITOR_TARGET, kept = self.partial.len(), "long log line truncated");
    }

    fn raise_matches(&mut self, line: &str, raised: &mut BTreeSet<SignalKind>) {
        for kind in SignalKind::ALL {
            if !self.fired.contains(&kind) && kind.matches(line) {
                debug!(target: MONITOR_TARGET, ?kind, "signal detected in server log");
                self.fired.insert(kind);
                raised.insert(kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Sink {
        _dir: TempDir,
        path: PathBuf,
    }

    impl Sink {
        fn append(&self, text: &str) {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .expect("open sink");
            file.write_all(text.as_bytes()).expect("append");
        }
    }

    #[fixture]
    fn sink() -> Sink {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("server_log.txt");
        fs::write(&path, "--- Server Started at 2026-10-14T09:30:00Z ---\n").expect("header");
        Sink { _dir: dir, path }
    }

    #[rstest]
    fn marker_fires_once_per_run(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        sink.append("[CDP] CDP not found on ports 9000-9003\n");
        assert_eq!(
            monitor.poll_new_signals(),
            BTreeSet::from([SignalKind::EditorNotDetected])
        );

        sink.append("[CDP] CDP not found on ports 9000-9003\n");
        assert!(monitor.poll_new_signals().is_empty());
    }

    #[rstest]
    fn cursor_advances_by_bytes_appended(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        monitor.poll_new_signals();
        let start = monitor.cursor().offset();
        assert_eq!(start, fs::metadata(&sink.path).expect("metadata").len());

        monitor.poll_new_signals();
        assert_eq!(monitor.cursor().offset(), start);

        let appended = "listening on https://0.0.0.0:3000\n";
        sink.append(appended);
        monitor.poll_new_signals();
        assert_eq!(monitor.cursor().offset(), start + appended.len() as u64);
    }

    #[rstest]
    fn marker_split_across_writes_is_detected(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        sink.append("[CDP] CDP not ");
        assert!(monitor.poll_new_signals().is_empty());
        sink.append("found\n");
        assert_eq!(
            monitor.poll_new_signals(),
            BTreeSet::from([SignalKind::EditorNotDetected])
        );
    }

    #[test]
    fn missing_sink_yields_nothing() {
        let mut monitor = LogSignalMonitor::new("/nonexistent/server_log.txt");
        assert!(monitor.poll_new_signals().is_empty());
        assert_eq!(monitor.cursor().offset(), 0);
    }

    #[rstest]
    fn truncated_sink_stalls_until_it_regrows(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        monitor.poll_new_signals();
        let offset = monitor.cursor().offset();

        fs::write(&sink.path, "CDP not found\n").expect("truncate");
        assert!(monitor.poll_new_signals().is_empty());
        assert_eq!(monitor.cursor().offset(), offset);
    }

    #[rstest]
    fn unterminated_output_is_bounded(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        monitor.poll_new_signals();

        sink.append(&"x".repeat(PARTIAL_LINE_LIMIT + 10));
        sink.append("CDP no");
        assert!(monitor.poll_new_signals().is_empty());
        assert_eq!(monitor.partial.len(), SignalKind::longest_marker() - 1);

        sink.append("t found\n");
        assert_eq!(
            monitor.poll_new_signals(),
            BTreeSet::from([SignalKind::EditorNotDetected])
        );
    }

    #[rstest]
    fn marker_inside_oversized_line_is_detected(sink: Sink) {
        let mut monitor = LogSignalMonitor::new(&sink.path);
        sink.append("[CDP] CDP not found ");
        sink.append(&"y".repeat(PARTIAL_LINE_LIMIT));
        assert_eq!(
            monitor.poll_new_signals(),
            BTreeSet::from([SignalKind::EditorNotDetected])
        );
        assert!(monitor.partial.len() < PARTIAL_LINE_LIMIT);
    }
}
