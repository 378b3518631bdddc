// SPDX-License-Identifier: GPL-3.0-only

//! Scanner page
//!
//! Owns the enumerated devices, the current selection and at most one
//! active decode loop. The page is driven from a single task: `mount` once,
//! then any number of `trigger_scan` / `next_decoded` / `submit_decoded`
//! cycles, then `teardown`.

use crate::app::frame_processor::{FrameDecoder, QrDetection, QrDetector};
use crate::app::notice::{Notice, Notifier};
use crate::app::selection::{SelectionPolicy, policy_for};
use crate::app::state::{
    EnumerationOutcome, ScanOutcome, ScanPhase, SubmitOutcome, TriggerOutcome,
};
use crate::backends::camera::{
    BackendError, CameraBackendManager, CameraDevice, DecodeSubscription, FrameStream, LoopAction,
};
use crate::config::Config;
use crate::decode_service::Submitter;
use crate::errors::{DecodeError, SubmissionError};
use crate::media::latin1;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Messages from a decode loop thread
#[derive(Debug)]
enum ScanEvent {
    Decoded(QrDetection),
    Failed(BackendError),
}

struct ActiveScan {
    subscription: DecodeSubscription,
    events: mpsc::UnboundedReceiver<ScanEvent>,
}

/// The scanner component
pub struct ScannerPage<S, N> {
    manager: CameraBackendManager,
    decoder: Arc<dyn FrameDecoder>,
    policy: Box<dyn SelectionPolicy>,
    submitter: S,
    notifier: N,
    devices: Vec<CameraDevice>,
    selected: Option<String>,
    phase: ScanPhase,
    active: Option<ActiveScan>,
}

impl<S: Submitter, N: Notifier> ScannerPage<S, N> {
    pub fn new(
        manager: CameraBackendManager,
        decoder: Arc<dyn FrameDecoder>,
        policy: Box<dyn SelectionPolicy>,
        submitter: S,
        notifier: N,
    ) -> Self {
        Self {
            manager,
            decoder,
            policy,
            submitter,
            notifier,
            devices: Vec::new(),
            selected: None,
            phase: ScanPhase::Idle,
            active: None,
        }
    }

    /// Wire a page from configuration: backend, detector bound and
    /// device preference
    pub fn from_config(config: &Config, submitter: S, notifier: N) -> Self {
        let manager = CameraBackendManager::new(config.backend, config.image_dir.as_deref());
        let decoder = Arc::new(QrDetector::with_max_dimension(config.max_dimension));
        Self::new(
            manager,
            decoder,
            policy_for(config.preferred_device.as_deref()),
            submitter,
            notifier,
        )
    }

    /// Enumerated devices (empty before mount or after teardown)
    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    /// Currently selected device id
    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_device(&self) -> Option<&CameraDevice> {
        let id = self.selected.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    pub fn is_scanning(&self) -> bool {
        self.phase.is_scanning()
    }

    /// Request camera access and list devices
    ///
    /// Failures are surfaced once through the notifier and leave the
    /// selection empty.
    pub fn mount(&mut self) -> EnumerationOutcome {
        if let Err(e) = self.manager.check_access() {
            warn!(error = %e, "Camera access check failed");
            return match e {
                BackendError::NotAvailable(_) => {
                    self.notifier.notify(Notice::Unsupported);
                    EnumerationOutcome::Unsupported
                }
                _ => {
                    self.notifier.notify(Notice::PermissionDenied);
                    EnumerationOutcome::PermissionDenied
                }
            };
        }

        match self.manager.enumerate_cameras() {
            Ok(devices) => {
                self.selected = self.policy.select(&devices);
                self.devices = devices;
                info!(
                    count = self.devices.len(),
                    selected = self.selected.as_deref().unwrap_or("<none>"),
                    "Scanner mounted"
                );
                EnumerationOutcome::Ready {
                    count: self.devices.len(),
                }
            }
            Err(BackendError::DeviceNotFound(_)) => {
                info!("No cameras to select");
                self.notifier.notify(Notice::NoDevicesFound);
                EnumerationOutcome::NoDevices
            }
            Err(e) => {
                warn!(error = %e, "Camera enumeration failed");
                self.notifier.notify(Notice::PermissionDenied);
                EnumerationOutcome::PermissionDenied
            }
        }
    }

    /// Select a listed device
    ///
    /// Returns false and keeps the current selection for unknown ids.
    pub fn select_device(&mut self, id: &str) -> bool {
        if !self.devices.iter().any(|d| d.id == id) {
            debug!(id, "Ignoring selection of unknown device");
            return false;
        }
        info!(id, "Device selected");
        self.selected = Some(id.to_string());
        true
    }

    /// Start a decode loop on the selected device
    pub fn trigger_scan(&mut self) -> TriggerOutcome {
        if self.phase.is_scanning() {
            warn!("Scan already in progress, ignoring trigger");
            return TriggerOutcome::AlreadyScanning;
        }
        let Some(device) = self.selected_device().cloned() else {
            debug!("Scan triggered without a selected device");
            return TriggerOutcome::NoDeviceSelected;
        };

        let (sender, events) = mpsc::unbounded_channel();
        let subscription = match spawn_decode_loop(
            &self.manager,
            Arc::clone(&self.decoder),
            device.clone(),
            sender,
        ) {
            Ok(subscription) => subscription,
            Err(e) => {
                let message = format!("could not start decode loop: {}", e);
                self.finish_with_error(Notice::ScanFailed(message.clone()));
                return TriggerOutcome::Failed(message);
            }
        };

        self.active = Some(ActiveScan {
            subscription,
            events,
        });
        self.phase = ScanPhase::Scanning {
            device_id: device.id.clone(),
            started_at: Instant::now(),
        };

        TriggerOutcome::Started {
            device_id: device.id,
        }
    }

    /// Wait for the active loop's decode result
    ///
    /// Returns `None` when no loop is active, or when the loop ended without
    /// decoding anything. The loop is stopped before this returns either way;
    /// every event is sent by a loop that is already exiting, so the join
    /// does not wait on the device. Cancel safe: dropping the future leaves
    /// the scan running.
    pub async fn next_decoded(&mut self) -> Option<QrDetection> {
        let event = self.active.as_mut()?.events.recv().await;

        if let Some(mut active) = self.active.take() {
            active.subscription.stop();
        }

        match event {
            Some(ScanEvent::Decoded(detection)) => {
                info!(bytes = detection.payload.len(), "QR code decoded");
                self.phase = ScanPhase::Decoded;
                Some(detection)
            }
            Some(ScanEvent::Failed(e)) => {
                self.phase = ScanPhase::Error;
                self.notifier.notify(Notice::ScanFailed(e.to_string()));
                self.phase = ScanPhase::Idle;
                None
            }
            None => {
                self.phase = ScanPhase::Idle;
                None
            }
        }
    }

    /// Encode a decoded payload, submit it and show the result
    pub async fn submit_decoded(&mut self, detection: &QrDetection) -> SubmitOutcome {
        self.phase = ScanPhase::Decoded;

        let payload = match latin1::encode(&detection.content) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Decoded text is not single-byte encodable");
                self.finish_with_error(Notice::EncodingFailed(e.to_string()));
                return SubmitOutcome::NotEncodable(e);
            }
        };

        match self.submitter.submit(payload).await {
            Ok(response) => {
                self.notifier.notify(Notice::Response(response.clone()));
                self.phase = ScanPhase::Idle;
                SubmitOutcome::Submitted(response)
            }
            Err(e) => {
                let notice = match &e {
                    SubmissionError::Http { status, body } => Notice::SubmissionFailed {
                        status: *status,
                        body: body.clone(),
                    },
                    other => Notice::TransportFailed(other.to_string()),
                };
                self.finish_with_error(notice);
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Trigger, wait for the first decode, and submit it
    pub async fn scan_once(&mut self) -> ScanOutcome {
        match self.trigger_scan() {
            TriggerOutcome::Started { .. } => {}
            other => return ScanOutcome::NotStarted(other),
        }
        match self.next_decoded().await {
            Some(detection) => ScanOutcome::Completed(self.submit_decoded(&detection).await),
            None => ScanOutcome::NoResult,
        }
    }

    /// Stop the active loop without a result
    ///
    /// Waits until the stream is released, which takes at most one frame
    /// read on a healthy device.
    pub fn cancel_scan(&mut self) {
        if let Some(mut active) = self.active.take() {
            info!(
                device = self.phase.device_id().unwrap_or(""),
                elapsed_secs = self.phase.elapsed_secs(),
                "Cancelling scan"
            );
            active.subscription.stop();
        }
        self.phase = ScanPhase::Idle;
    }

    /// Stop the active loop without waiting for the device
    ///
    /// For async callers: a stalled frame read cannot block the task. The
    /// loop thread releases the stream once that read returns.
    pub fn cancel_scan_detached(&mut self) {
        if let Some(mut active) = self.active.take() {
            info!(
                device = self.phase.device_id().unwrap_or(""),
                elapsed_secs = self.phase.elapsed_secs(),
                "Cancelling scan without waiting"
            );
            active.subscription.detach();
        }
        self.phase = ScanPhase::Idle;
    }

    /// Release every resource the page holds
    pub fn teardown(&mut self) {
        self.cancel_scan();
        self.devices.clear();
        self.selected = None;
        debug!("Scanner torn down");
    }

    fn finish_with_error(&mut self, notice: Notice) {
        self.phase = ScanPhase::Error;
        self.notifier.notify(notice);
        self.phase = ScanPhase::Idle;
    }
}

/// Start the decode loop thread for one device
///
/// The stream is opened on the loop thread. The first decoded code is sent
/// and ends the loop; decode misses are logged and the next frame is read.
fn spawn_decode_loop(
    manager: &CameraBackendManager,
    decoder: Arc<dyn FrameDecoder>,
    device: CameraDevice,
    sender: mpsc::UnboundedSender<ScanEvent>,
) -> std::io::Result<DecodeSubscription> {
    let backend = manager.backend();
    let init_sender = sender.clone();
    let name = format!("decode-{}", device.label);

    DecodeSubscription::start(
        &name,
        move || match backend.open_stream(&device) {
            Ok(stream) => Ok(stream),
            Err(e) => {
                let message = e.to_string();
                let _ = init_sender.send(ScanEvent::Failed(e));
                Err(message)
            }
        },
        move |stream: &mut Box<dyn FrameStream>| {
            let frame = match stream.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Frame capture failed, ending scan");
                    let _ = sender.send(ScanEvent::Failed(e));
                    return LoopAction::Stop;
                }
            };

            match decoder.decode(&frame) {
                Ok(detection) => {
                    let _ = sender.send(ScanEvent::Decoded(detection));
                    LoopAction::Stop
                }
                Err(DecodeError::NoCode) => {
                    trace!("No QR code in frame");
                    LoopAction::Continue
                }
                Err(e) => {
                    debug!(error = %e, "Frame decode failed");
                    LoopAction::Continue
                }
            }
        },
    )
}
