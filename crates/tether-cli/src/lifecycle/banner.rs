//! Operator-facing text printed around the run.

use std::io::Write;
use std::path::Path;

use super::{LauncherOutput, LifecycleError};
use crate::cli::LaunchMode;
use crate::connectivity::ConnectivityResult;
use crate::passcode::Passcode;

const RULE_WIDTH: usize = 50;

/// Debug port the editor must expose for the server to find it.
pub const EDITOR_DEBUG_PORT: u16 = 9000;

pub(crate) fn write_starting<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
    mode: LaunchMode,
) -> Result<(), LifecycleError> {
    output.stdout_line(format_args!("🚀 Starting server ({} mode)...", mode.label()))
}

pub(crate) fn write_temporary_passcode<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
    passcode: &Passcode,
) -> Result<(), LifecycleError> {
    output.stdout_line(format_args!(
        "⚠️  No APP_PASSWORD configured. Using temporary passcode: {passcode}"
    ))
}

pub(crate) fn write_tunnel_preamble<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
    token_configured: bool,
) -> Result<(), LifecycleError> {
    if !token_configured {
        output.stdout_line(format_args!(
            "⚠️  Warning: NGROK_AUTHTOKEN not configured. The tunnel might expire."
        ))?;
    }
    output.stdout_line(format_args!("PLEASE WAIT... Establishing tunnel..."))
}

/// Prints the connection banner for the resolved addresses.
pub(crate) fn write_connection_banner<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
    connectivity: &ConnectivityResult,
    passcode: &Passcode,
    qr: Option<&str>,
) -> Result<(), LifecycleError> {
    let heavy = "=".repeat(RULE_WIDTH);
    output.stdout_line(format_args!("\n{heavy}"))?;
    match connectivity.mode() {
        LaunchMode::Local => {
            output.stdout_line(format_args!("📡 LOCAL WI-FI ACCESS"))?;
            output.stdout_line(format_args!("{heavy}"))?;
            output.stdout_line(format_args!("🔗 URL: {}", connectivity.base_url()))?;
            output.stdout_line(format_args!(
                "🔑 Passcode: not required on local Wi-Fi"
            ))?;
            output.stdout_line(format_args!("\n📱 Scan this QR code to connect:"))?;
        }
        LaunchMode::Tunnel => {
            output.stdout_line(format_args!("   🌍 GLOBAL WEB ACCESS"))?;
            output.stdout_line(format_args!("{heavy}"))?;
            output.stdout_line(format_args!("🔗 Base URL: {}", connectivity.base_url()))?;
            output.stdout_line(format_args!("🔑 Passcode: {passcode}"))?;
            output.stdout_line(format_args!(
                "\n📱 Scan this magic QR code (logs in automatically):"
            ))?;
        }
    }
    if let Some(art) = qr {
        output.stdout_block(art)?;
        output.stdout_line(format_args!(""))?;
    }

    output.stdout_line(format_args!("{}", "-".repeat(RULE_WIDTH)))?;
    output.stdout_line(format_args!("📝 Steps to connect:"))?;
    for (index, step) in connection_steps(connectivity, passcode).iter().enumerate() {
        output.stdout_line(format_args!("{}. {step}", index + 1))?;
    }
    output.stdout_line(format_args!("{heavy}"))
}

fn connection_steps(connectivity: &ConnectivityResult, passcode: &Passcode) -> Vec<String> {
    match connectivity.mode() {
        LaunchMode::Local => vec![
            String::from("Make sure your phone is on the SAME Wi-Fi network as this computer."),
            String::from("Open your phone's camera app or a QR scanner."),
            String::from("Scan the code above OR type the URL into your browser."),
            String::from("You should be connected automatically!"),
        ],
        LaunchMode::Tunnel => vec![
            String::from("Switch your phone to mobile data or turn off Wi-Fi."),
            String::from("Open your phone's camera app or a QR scanner."),
            String::from("Scan the code above to log in automatically."),
            format!("Or visit {}", connectivity.base_url()),
            format!("Enter passcode: {passcode}"),
            String::from("You should be connected automatically!"),
        ],
    }
}

pub(crate) fn write_running_notice<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
    sink: &Path,
) -> Result<(), LifecycleError> {
    output.stdout_line(format_args!(
        "✅ Server is running in background. Logs -> {}",
        sink.display()
    ))?;
    output.stdout_line(format_args!("⌨️  Press Ctrl+C to stop."))
}

pub(crate) fn write_editor_not_detected<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
) -> Result<(), LifecycleError> {
    let bang = "!".repeat(RULE_WIDTH);
    output.stdout_line(format_args!("\n{bang}"))?;
    output.stdout_line(format_args!("❌ ERROR: Antigravity editor not detected!"))?;
    output.stdout_line(format_args!("{bang}"))?;
    output.stdout_line(format_args!("   The server cannot see your editor."))?;
    output.stdout_line(format_args!("   1. Close Antigravity."))?;
    output.stdout_line(format_args!("   2. Re-open it with the debug flag:"))?;
    output.stdout_line(format_args!(
        "      antigravity . --remote-debugging-port={EDITOR_DEBUG_PORT}"
    ))?;
    output.stdout_line(format_args!(
        "   3. Or use the 'Open with Antigravity (Debug)' context menu."
    ))?;
    output.stdout_line(format_args!("{bang}\n"))
}

pub(crate) fn write_shutting_down<W: Write, E: Write>(
    output: &mut LauncherOutput<W, E>,
) -> Result<(), LifecycleError> {
    output.stdout_line(format_args!("\n👋 Shutting down..."))
}
