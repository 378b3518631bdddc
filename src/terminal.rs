// SPDX-License-Identifier: GPL-3.0-only

//! Interactive terminal scanner
//!
//! Reads one command per line from stdin while a scan runs in the
//! background:
//!
//! | Input      | Action                     |
//! |------------|----------------------------|
//! | *(empty)*  | Start a scan               |
//! | `d`        | List devices               |
//! | `s <id>`   | Select a device            |
//! | `c`        | Cancel the running scan    |
//! | `q`        | Quit                       |

use crate::app::{Notifier, ScannerPage, TerminalNotifier, TriggerOutcome};
use crate::config::Config;
use crate::decode_service::{DecodeService, Submitter};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    Devices,
    Select(String),
    Cancel,
    Quit,
    Help,
    Unknown(String),
}

/// Parse an input line
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "" => Command::Scan,
        "d" | "devices" => Command::Devices,
        "s" | "select" if !rest.is_empty() => Command::Select(rest.to_string()),
        "c" | "cancel" => Command::Cancel,
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Run the interactive scanner until `q` or end of input
///
/// A missing token does not prevent listing or scanning; submissions
/// report it instead.
pub fn run(config: &Config, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let service = DecodeService::for_session(config, dry_run);
    let page = ScannerPage::from_config(config, service, TerminalNotifier);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session(page))
}

enum Event {
    Line(Option<String>),
    Decoded(Option<crate::QrDetection>),
}

async fn session<S: Submitter, N: Notifier>(
    mut page: ScannerPage<S, N>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = page.mount();
    info!(?outcome, "Interactive session started");
    if outcome.is_ready() {
        print_devices(&page);
    }
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if !page.is_scanning() {
            prompt();
        }

        let event = if page.is_scanning() {
            tokio::select! {
                line = lines.next_line() => Event::Line(line?),
                detection = page.next_decoded() => Event::Decoded(detection),
            }
        } else {
            Event::Line(lines.next_line().await?)
        };

        match event {
            Event::Decoded(Some(detection)) => {
                eprintln!("Decoded {} bytes, submitting...", detection.payload.len());
                let outcome = page.submit_decoded(&detection).await;
                debug!(?outcome, "Submission finished");
            }
            // Stream failures were already reported by the page
            Event::Decoded(None) => {}
            Event::Line(None) => break,
            Event::Line(Some(line)) => match parse_command(&line) {
                Command::Scan => match page.trigger_scan() {
                    TriggerOutcome::Started { device_id } => {
                        eprintln!("Scanning with {} (c to cancel)", device_id);
                    }
                    TriggerOutcome::NoDeviceSelected => eprintln!("No camera selected"),
                    TriggerOutcome::AlreadyScanning => eprintln!("Already scanning"),
                    // Reported through the notifier
                    TriggerOutcome::Failed(_) => {}
                },
                Command::Devices => print_devices(&page),
                Command::Select(id) => {
                    if page.is_scanning() {
                        eprintln!("Cancel the running scan before switching cameras");
                    } else if !page.select_device(&id) {
                        eprintln!("Unknown device: {}", id);
                    }
                }
                Command::Cancel => {
                    if page.is_scanning() {
                        page.cancel_scan_detached();
                        eprintln!("Scan cancelled");
                    }
                }
                Command::Quit => break,
                Command::Help => print_help(),
                Command::Unknown(input) => eprintln!("Unknown command: {}", input),
            },
        }
    }

    page.teardown();
    Ok(())
}

fn print_devices<S: Submitter, N: Notifier>(page: &ScannerPage<S, N>) {
    if page.devices().is_empty() {
        eprintln!("No cameras listed");
        return;
    }
    let selected = page.selected_device_id();
    for device in page.devices() {
        let marker = if selected == Some(device.id.as_str()) {
            "*"
        } else {
            " "
        };
        eprintln!("{} {}", marker, device);
    }
}

fn print_help() {
    eprintln!("Enter: scan   d: devices   s <id>: select   c: cancel   q: quit");
}

fn prompt() {
    eprint!("qrscan> ");
    let _ = std::io::stderr().flush();
}
