//! Text lines written to the diagnostic channel.

use core::fmt;
use std::io::{self, Write};

/// Line terminator of the channel.
pub const LINE_END: &str = "\r\n";

/// A detection worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Sweep angle in degrees.
    pub angle: u16,
    /// Measured distance in sensor units.
    pub distance: u32,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALERT: Object Detected -> Angle: {} | Dist: {} cm",
            self.angle, self.distance
        )
    }
}

/// Writes the banner and alert lines to a blocking byte sink.
///
/// Every line is written in full and flushed before returning, so a slow
/// channel stalls the caller rather than queueing output.
#[derive(Debug)]
pub struct AlertReporter<W> {
    sink: W,
}

impl<W: Write> AlertReporter<W> {
    /// Wrap a sink.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Announce the scanner and its detection threshold.
    pub fn banner(&mut self, threshold: u32) -> io::Result<()> {
        self.write_line(format_args!(
            "System Initialized. Scanning for objects < {threshold}cm..."
        ))
    }

    /// Emit one detection line.
    pub fn report(&mut self, angle: u16, distance: u32) -> io::Result<()> {
        self.write_line(format_args!("{}", Alert { angle, distance }))
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) -> io::Result<()> {
        let line = format!("{line}{LINE_END}");
        self.sink.write_all(line.as_bytes())?;
        self.sink.flush()
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
