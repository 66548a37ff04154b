use anyhow::Context;
use std::{
    io::{self, Write},
    time::Duration,
};
use tracing::info;

use crate::config::OutputSettings;

/// Open the diagnostic channel: a serial port when one is configured,
/// otherwise stdout.
pub fn open_output(settings: &OutputSettings) -> anyhow::Result<Box<dyn Write + Send>> {
    match settings.port.as_deref() {
        Some(port_name) => {
            let port = serialport::new(port_name, settings.baud_rate)
                .timeout(Duration::from_millis(settings.write_timeout_ms))
                .open()
                .with_context(|| format!("failed to open serial port {port_name:?}"))?;
            info!(port = port_name, baud = settings.baud_rate, "Alerts go to serial port.");
            Ok(Box::new(port))
        }
        None => {
            info!("Alerts go to stdout.");
            Ok(Box::new(io::stdout()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_without_port() {
        let settings = OutputSettings {
            port: None,
            ..OutputSettings::default()
        };
        assert!(open_output(&settings).is_ok());
    }

    #[test]
    fn test_missing_port_is_an_error() {
        let settings = OutputSettings {
            port: Some("/dev/does-not-exist-sonar".into()),
            ..OutputSettings::default()
        };
        let err = open_output(&settings).err().expect("port should not open");
        assert!(err.to_string().contains("does-not-exist-sonar"));
    }
}
