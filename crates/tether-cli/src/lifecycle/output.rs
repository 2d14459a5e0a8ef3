use std::fmt;
use std::io::{self, Write};

use super::LifecycleError;

/// Operator-facing streams, injected so tests can capture them.
pub struct LauncherOutput<W: Write, E: Write> {
    stdout: W,
    stderr: E,
}

impl<W: Write, E: Write> LauncherOutput<W, E> {
    /// Wraps the two streams.
    pub const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    /// Writes one line to stdout and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Output`] when the stream rejects the write.
    pub fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        write_line(&mut self.stdout, args)
    }

    /// Writes one line to stderr and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Output`] when the stream rejects the write.
    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        write_line(&mut self.stderr, args)
    }

    /// Writes pre-rendered text verbatim to stdout.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Output`] when the stream rejects the write.
    pub fn stdout_block(&mut self, block: &str) -> Result<(), LifecycleError> {
        emit_block(&mut self.stdout, block).map_err(LifecycleError::Output)
    }
}

fn write_line(stream: &mut impl Write, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
    emit_line(stream, args).map_err(LifecycleError::Output)
}

fn emit_line(stream: &mut impl Write, args: fmt::Arguments<'_>) -> io::Result<()> {
    stream.write_fmt(args)?;
    stream.write_all(b"\n")?;
    stream.flush()
}

fn emit_block(stream: &mut impl Write, block: &str) -> io::Result<()> {
    stream.write_all(block.as_bytes())?;
    stream.flush()
}
