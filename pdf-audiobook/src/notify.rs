//! Completion notifications.
//!
//! Notification failures are logged and never fail a conversion.

use std::io::Write;
use std::path::Path;
use std::process::Command;

const TITLE: &str = "Audiobook Ready";
const APP_NAME: &str = "Audiobook Creator";
const POPUP_TIMEOUT_SECS: u32 = 10;

/// Something that tells the user a conversion finished.
pub trait Notifier: Send + Sync {
    fn notify(&self, output: &Path);
}

/// Prints a status line.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, output: &Path) {
        println!(
            "\nAudiobook creation complete! File saved as: {}",
            output.display()
        );
    }
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn notify(&self, _output: &Path) {
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|()| stderr.flush()) {
            log::debug!("Could not ring terminal bell: {}", e);
        }
    }
}

/// Desktop platforms with a popup command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopPlatform {
    Linux,
    MacOs,
    Unsupported,
}

impl DesktopPlatform {
    /// Detect the current platform.
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            DesktopPlatform::MacOs
        } else if cfg!(target_os = "linux") {
            DesktopPlatform::Linux
        } else {
            DesktopPlatform::Unsupported
        }
    }
}

/// Shows a desktop popup through the platform's notification command.
#[derive(Debug)]
pub struct DesktopNotifier {
    platform: DesktopPlatform,
}

impl DesktopNotifier {
    pub fn new(platform: DesktopPlatform) -> Self {
        Self { platform }
    }

    fn popup_command(&self, message: &str) -> Option<Command> {
        match self.platform {
            DesktopPlatform::Linux => {
                let mut command = Command::new("notify-send");
                command
                    .args(["--app-name", APP_NAME])
                    .args(["--expire-time", &(POPUP_TIMEOUT_SECS * 1000).to_string()])
                    .arg(TITLE)
                    .arg(message);
                Some(command)
            }
            DesktopPlatform::MacOs => {
                let script = format!(
                    "display notification \"{}\" with title \"{}\"",
                    applescript_escape(message),
                    applescript_escape(TITLE)
                );
                let mut command = Command::new("osascript");
                command.arg("-e").arg(script);
                Some(command)
            }
            DesktopPlatform::Unsupported => None,
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, output: &Path) {
        let message = format!("Your audiobook has been created: {}", output.display());
        let Some(mut command) = self.popup_command(&message) else {
            log::debug!("No desktop notifications on this platform");
            return;
        };

        match command.output() {
            Ok(result) if result.status.success() => {}
            Ok(result) => log::warn!(
                "Desktop notification failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            ),
            Err(e) => log::warn!("Desktop notification unavailable: {}", e),
        }
    }
}

/// Sends the same notification through several channels.
#[derive(Default)]
pub struct CompositeNotifier {
    channels: Vec<Box<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: impl Notifier + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }
}

impl Notifier for CompositeNotifier {
    fn notify(&self, output: &Path) {
        for channel in &self.channels {
            channel.notify(output);
        }
    }
}

/// Does nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _output: &Path) {}
}

/// Notifier for this platform: status line, bell and popup.
pub fn default_notifier(enabled: bool) -> Box<dyn Notifier> {
    if !enabled {
        return Box::new(NoopNotifier);
    }

    Box::new(
        CompositeNotifier::new()
            .with(ConsoleNotifier)
            .with(BellNotifier)
            .with(DesktopNotifier::new(DesktopPlatform::detect())),
    )
}

fn applescript_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
