// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanner operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning and submitting a single code
//! - Decoding a still image

use qrscan::app::frame_processor::QrDetection;
use qrscan::app::{ScanOutcome, SubmitOutcome, TerminalNotifier, TriggerOutcome};
use qrscan::backends::camera::CameraBackendType;
use qrscan::backends::camera::image_files::load_image_frame;
use qrscan::decode_service::{DecodeService, DryRun};
use qrscan::errors::DecodeError;
use qrscan::{Config, QrDetector, ScannerPage};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Flags of `qrscan scan`
pub struct ScanArgs {
    pub device: Option<String>,
    pub images: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub dry_run: bool,
}

/// Load the config file and apply the image source flag on top
fn load_config(images: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(dir) = images {
        config.backend = CameraBackendType::ImageFiles;
        config.image_dir = Some(dir);
    }
    debug!(?config, "Effective configuration");
    Ok(config)
}

/// List all available cameras
pub fn list_devices(images: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(images)?;
    let mut page = ScannerPage::from_config(&config, DryRun, TerminalNotifier);

    if !page.mount().is_ready() {
        // The notifier already explained why
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    let selected = page.selected_device_id().map(str::to_string);
    for (index, device) in page.devices().iter().enumerate() {
        let marker = if selected.as_deref() == Some(device.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} [{}] {}", marker, index, device.label);
        println!("      Id: {}", device.id);
        if let Some(info) = &device.device_info {
            println!("      Driver: {} ({})", info.driver, info.bus);
        }
    }
    println!();

    page.teardown();
    Ok(())
}

/// Scan until the first code is decoded, then submit it
pub fn scan(args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args.images)?;
    if let Some(device) = args.device {
        config.preferred_device = Some(device);
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(timeout) = args.timeout {
        config.scan_timeout_secs = Some(timeout);
    }

    let service = DecodeService::from_config(&config, args.dry_run)?;
    let mut page = ScannerPage::from_config(&config, service, TerminalNotifier);

    if !page.mount().is_ready() {
        return Err("No camera available for scanning".into());
    }
    if let Some(device) = page.selected_device() {
        eprintln!("Using camera: {}", device);
    }

    // Ctrl+C cancels the scan instead of killing the process
    let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = cancel_tx.send(true);
    })?;

    let timeout = config.scan_timeout();
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        match page.trigger_scan() {
            TriggerOutcome::Started { .. } => {}
            TriggerOutcome::NoDeviceSelected => return Err("No camera selected".to_string()),
            other => return Err(format!("Scan not started: {:?}", other)),
        }
        eprintln!("Scanning... (press Ctrl+C to stop)");

        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let wake = tokio::select! {
            detection = page.next_decoded() => Wake::Decoded(detection),
            _ = cancel_rx.changed() => Wake::Cancelled,
            _ = deadline => Wake::TimedOut(timeout.unwrap_or_default()),
        };

        let outcome = match wake {
            Wake::Decoded(Some(detection)) => {
                report_detection(&detection);
                ScanOutcome::Completed(page.submit_decoded(&detection).await)
            }
            Wake::Decoded(None) => ScanOutcome::NoResult,
            Wake::Cancelled => {
                page.cancel_scan_detached();
                return Err("Scan cancelled".to_string());
            }
            Wake::TimedOut(limit) => {
                page.cancel_scan_detached();
                return Err(format!("No QR code found within {}s", limit.as_secs()));
            }
        };
        Ok(outcome)
    });
    page.teardown();

    match result? {
        ScanOutcome::Completed(SubmitOutcome::Submitted(_)) => Ok(()),
        ScanOutcome::Completed(_) => Err("Submission failed".into()),
        ScanOutcome::NoResult => Err("Scanning stopped without a result".into()),
        ScanOutcome::NotStarted(outcome) => Err(format!("Scan not started: {:?}", outcome).into()),
    }
}

enum Wake {
    Decoded(Option<QrDetection>),
    Cancelled,
    TimedOut(Duration),
}

fn report_detection(detection: &QrDetection) {
    info!(
        bytes = detection.payload.len(),
        version = ?detection.version,
        "Decoded QR code"
    );
    eprintln!("Decoded {} bytes", detection.payload.len());
}

/// Decode every QR code in a still image and print it
pub fn decode_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let frame = load_image_frame(path)?;
    let detector = QrDetector::with_max_dimension(config.max_dimension);

    let detections = match detector.detect(&frame) {
        Ok(detections) => detections,
        Err(DecodeError::NoCode) => {
            return Err(format!("No QR code found in {}", path.display()).into());
        }
        Err(e) => return Err(e.into()),
    };

    for (index, detection) in detections.iter().enumerate() {
        if detections.len() > 1 {
            println!("[{}]", index);
        }
        println!("Text: {}", detection.content);
        println!("Hex:  {}", detection.payload_hex());
        if let Some(version) = detection.version {
            println!("Version: {}", version);
        }
    }

    Ok(())
}

/// Run the interactive scanner
pub fn interactive(dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    qrscan::terminal::run(&config, dry_run)
}
