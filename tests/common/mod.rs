// SPDX-License-Identifier: MPL-2.0

//! Test doubles shared by the integration tests

#![allow(dead_code)]

use qrscan::app::frame_processor::{FrameDecoder, FrameRegion, QrDetection};
use qrscan::app::{FirstDevice, Notice, Notifier, ScannerPage};
use qrscan::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendManager, CameraBackendType,
    CameraDevice, CameraFrame, FrameStream,
};
use qrscan::decode_service::Submitter;
use qrscan::errors::{DecodeError, SubmissionError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How many streams were opened and released
#[derive(Clone, Default)]
pub struct StreamCounters {
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl StreamCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Camera backend with a fixed device list
pub struct MockBackend {
    devices: Vec<CameraDevice>,
    access: BackendResult<()>,
    fail_open: bool,
    stall: Option<Arc<AtomicBool>>,
    counters: StreamCounters,
}

impl MockBackend {
    pub fn with_devices(count: usize) -> Self {
        let devices = (0..count)
            .map(|i| CameraDevice::new(format!("/dev/video{}", i * 2), format!("Camera {}", i)))
            .collect();
        Self {
            devices,
            access: Ok(()),
            fail_open: false,
            stall: None,
            counters: StreamCounters::default(),
        }
    }

    pub fn denied() -> Self {
        Self {
            access: Err(BackendError::PermissionDenied("video group".to_string())),
            ..Self::with_devices(1)
        }
    }

    pub fn unsupported() -> Self {
        Self {
            access: Err(BackendError::NotAvailable("no video4linux".to_string())),
            ..Self::with_devices(0)
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Frame reads block while `stall` is set
    pub fn stalling(mut self, stall: Arc<AtomicBool>) -> Self {
        self.stall = Some(stall);
        self
    }

    pub fn counters(&self) -> StreamCounters {
        self.counters.clone()
    }
}

impl CameraBackend for MockBackend {
    fn check_access(&self) -> BackendResult<()> {
        self.access.clone()
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        Ok(self.devices.clone())
    }

    fn open_stream(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameStream>> {
        if self.fail_open {
            return Err(BackendError::IoError(format!("{} is busy", device.id)));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            released: Arc::clone(&self.counters.released),
            stall: self.stall.clone(),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::ImageFiles
    }
}

struct MockStream {
    released: Arc<AtomicUsize>,
    stall: Option<Arc<AtomicBool>>,
}

impl FrameStream for MockStream {
    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        std::thread::sleep(Duration::from_millis(1));
        while self.stall.as_ref().is_some_and(|stall| stall.load(Ordering::SeqCst)) {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(CameraFrame::gray(4, 4, vec![0; 16]))
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Decoder that finds `text` on the n-th call (1-based), or never
pub struct ScriptedDecoder {
    succeed_on: Option<usize>,
    text: String,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDecoder {
    pub fn succeeding_on(call: usize, text: &str) -> Self {
        Self {
            succeed_on: Some(call),
            text: text.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn never() -> Self {
        Self {
            succeed_on: None,
            text: String::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn decode(&self, _frame: &CameraFrame) -> Result<QrDetection, DecodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.succeed_on {
            // Decoders report text as read; the page does the byte encoding
            Some(n) if call >= n => Ok(QrDetection {
                bounds: FrameRegion::full(),
                content: self.text.clone(),
                payload: self.text.as_bytes().to_vec(),
                version: None,
            }),
            _ => Err(DecodeError::NoCode),
        }
    }
}

/// Notifier that remembers every notice
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Submitter that records payloads and answers with a canned result
#[derive(Clone)]
pub struct RecordingSubmitter {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    response: Result<Value, SubmissionError>,
}

impl RecordingSubmitter {
    pub fn answering(response: Result<Value, SubmissionError>) -> Self {
        Self {
            payloads: Arc::new(Mutex::new(Vec::new())),
            response,
        }
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

impl Submitter for RecordingSubmitter {
    async fn submit(&self, payload: Vec<u8>) -> Result<Value, SubmissionError> {
        self.payloads.lock().unwrap().push(payload);
        self.response.clone()
    }
}

pub type TestPage<S> = ScannerPage<S, Arc<RecordingNotifier>>;

/// Page over mocks, selecting the first device by default
pub fn page<S: Submitter>(
    backend: MockBackend,
    decoder: ScriptedDecoder,
    submitter: S,
) -> (TestPage<S>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let page = ScannerPage::new(
        CameraBackendManager::with_backend(Box::new(backend)),
        Arc::new(decoder),
        Box::new(FirstDevice),
        submitter,
        Arc::clone(&notifier),
    );
    (page, notifier)
}

/// One request as seen by [`serve_once`]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Answer a single HTTP request on a local port
///
/// Returns the endpoint URL and a handle resolving to the captured request.
pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();

        let length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let request_body = buf[header_end..header_end + length].to_vec();

        let reason = match status {
            200 => "OK",
            401 => "Unauthorized",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        CapturedRequest {
            request_line,
            headers,
            body: request_body,
        }
    });

    (format!("http://{}/decode", addr), handle)
}

/// Raw bytes stored in [`QR_MODULES`]: NUL, high control bytes and accented
/// ISO-8859-1 letters
pub const QR_PAYLOAD: [u8; 18] = [
    0x4F, 0x6C, 0xE1, 0x00, 0xFF, 0x80, b' ', b'S', 0xE3, b'o', b' ', b'J', b'o', b's', 0xE9,
    b' ', 0xE7, 0xFC,
];

/// Version 2-L byte-mode symbol holding [`QR_PAYLOAD`], `#` is dark
pub const QR_MODULES: [&str; 25] = [
    "#######.##...##.#.#######",
    "#.....#........##.#.....#",
    "#.###.#.#..###.#..#.###.#",
    "#.###.#.##.#...#..#.###.#",
    "#.###.#.####.####.#.###.#",
    "#.....#..#..#.###.#.....#",
    "#######.#.#.#.#.#.#######",
    ".........#.#.##..........",
    "####..#.#....##.##..###.#",
    ".##..#.###.........#.#...",
    ".#....##......#.#.##.#..#",
    "#..###.....####.####..#..",
    "#...#.####.#......#.##.#.",
    ".###.#.#..##.#.#####...##",
    ".#.#..#..##.#.##....#.##.",
    "#...#...#.#.##....#...##.",
    "..###.##..##....#######.#",
    "........###.##.##...##...",
    "#######..####...#.#.#.###",
    "#.....#..##.#..##...#.###",
    "#.###.#...####..#####.#..",
    "#.###.#.#.#.###.####.#.##",
    "#.###.#.#.####.###.##..#.",
    "#.....#.##........##..#..",
    "#######.##..#.#......####",
];

/// Render [`QR_MODULES`] with `module_px` pixels per module and a quiet
/// zone of `quiet` modules on every side
pub fn render_qr(module_px: u32, quiet: u32) -> image::GrayImage {
    let side = (QR_MODULES.len() as u32 + 2 * quiet) * module_px;
    image::GrayImage::from_fn(side, side, |x, y| {
        let row = (y / module_px).checked_sub(quiet);
        let col = (x / module_px).checked_sub(quiet);
        let dark = match (row, col) {
            (Some(row), Some(col)) => QR_MODULES
                .get(row as usize)
                .and_then(|line| line.as_bytes().get(col as usize))
                .is_some_and(|&module| module == b'#'),
            _ => false,
        };
        image::Luma([if dark { 0 } else { 255 }])
    })
}

/// Paste `image` onto a white canvas with its top-left corner at (x, y)
pub fn on_canvas(image: &image::GrayImage, width: u32, height: u32, x: u32, y: u32) -> image::GrayImage {
    let mut canvas = image::GrayImage::from_pixel(width, height, image::Luma([255]));
    image::imageops::replace(&mut canvas, image, x as i64, y as i64);
    canvas
}

/// Fresh directory under the system temp dir
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("qrscan-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
