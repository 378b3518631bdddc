// SPDX-License-Identifier: GPL-3.0-only
//! Cancellable decode loop threads
//!
//! A [`DecodeSubscription`] owns one thread that opens a frame source,
//! runs a per-frame closure until it asks to stop or the subscription is
//! stopped, and then drops the source. Dropping the subscription stops the
//! thread, so a camera stream never outlives the handle that started it.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Process the next frame
    Continue,
    /// Stop the loop and release the source
    Stop,
}

/// Handle to a running decode loop
///
/// ```ignore
/// let mut subscription = DecodeSubscription::start(
///     "decode-/dev/video0",
///     move || backend.open_stream(&device).map_err(|e| e.to_string()),
///     move |stream| match decoder.decode(&stream.next_frame()?) {
///         Ok(detection) => { deliver(detection); LoopAction::Stop }
///         Err(_) => LoopAction::Continue,
///     },
/// )?;
///
/// // Later (or on teardown)
/// subscription.stop();
/// ```
pub struct DecodeSubscription {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
    stopped: bool,
    name: String,
}

impl DecodeSubscription {
    /// Start a loop in a separate thread
    ///
    /// `init_fn` runs once on the new thread to open the source. If it
    /// fails the thread exits without calling `loop_fn`. The source is
    /// dropped on the loop thread when the loop ends.
    pub fn start<S, I, F>(name: &str, init_fn: I, loop_fn: F) -> io::Result<Self>
    where
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let builder = thread::Builder::new().name(name.chars().take(15).collect());
        Self::start_on(builder, name, init_fn, loop_fn)
    }

    /// Start a loop on a thread built by `builder`
    pub fn start_on<S, I, F>(
        builder: thread::Builder,
        name: &str,
        init_fn: I,
        mut loop_fn: F,
    ) -> io::Result<Self>
    where
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let iterations = Arc::new(AtomicU64::new(0));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_iterations = Arc::clone(&iterations);
        let thread_name = name.to_string();

        info!(name = %name, "Starting decode loop");

        let thread_handle = builder
            .spawn(move || {
                let mut source = match init_fn() {
                    Ok(source) => source,
                    Err(e) => {
                        warn!(name = %thread_name, error = %e, "Failed to open frame source");
                        return;
                    }
                };
                debug!(name = %thread_name, "Frame source opened");

                while !thread_stop.load(Ordering::SeqCst) {
                    thread_iterations.fetch_add(1, Ordering::SeqCst);
                    if loop_fn(&mut source) == LoopAction::Stop {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }

                drop(source);
                info!(name = %thread_name, "Decode loop exited, source released");
            })
            .inspect_err(|e| warn!(name = %name, error = %e, "Failed to spawn decode loop thread"))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            iterations,
            stopped: false,
            name: name.to_string(),
        })
    }

    /// Check if the loop thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Whether [`stop`](Self::stop) has already run
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of loop iterations started so far
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop without waiting for it
    pub fn request_stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the source to be released
    ///
    /// Only the first call has any effect.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        debug!(name = %self.name, "Stopping decode loop");
        self.request_stop();
        self.join();
    }

    /// Stop the loop without waiting for it
    ///
    /// The thread is detached: it exits, and drops the source, once the
    /// frame read in progress returns. Only valid as a first stop.
    pub fn detach(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        debug!(name = %self.name, "Detaching decode loop");
        self.request_stop();
        self.thread_handle.take();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take()
            && let Err(e) = handle.join()
        {
            warn!(name = %self.name, "Decode loop thread panicked: {:?}", e);
        }
    }
}

impl Drop for DecodeSubscription {
    fn drop(&mut self) {
        if !self.stopped {
            debug!(name = %self.name, "DecodeSubscription dropped, stopping loop");
            self.stop();
        }
    }
}

impl std::fmt::Debug for DecodeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSubscription")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("stopped", &self.stopped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut subscription = DecodeSubscription::start(
            "test-loop",
            || Ok(()),
            move |_: &mut ()| {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
        )
        .unwrap();

        while subscription.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        subscription.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
        assert_eq!(subscription.iterations(), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut subscription = DecodeSubscription::start(
            "test-loop",
            || Ok(()),
            move |_: &mut ()| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                LoopAction::Continue
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        subscription.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
        assert!(!subscription.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut subscription =
            DecodeSubscription::start("test-idem", || Ok(()), |_: &mut ()| LoopAction::Stop)
                .unwrap();
        subscription.stop();
        assert!(subscription.is_stopped());
        subscription.stop();
        assert!(subscription.is_stopped());
    }

    #[test]
    fn test_init_failure_skips_loop() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let mut subscription = DecodeSubscription::start(
            "test-fail-init",
            || Err::<(), _>("no such device".to_string()),
            move |_: &mut ()| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        )
        .unwrap();

        subscription.stop();
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(subscription.iterations(), 0);
    }

    #[test]
    fn test_drop_releases_source() {
        struct Source(Arc<AtomicBool>);
        impl Drop for Source {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let released_clone = Arc::clone(&released);

        let subscription = DecodeSubscription::start(
            "test-drop",
            move || Ok(Source(released_clone)),
            |_: &mut Source| {
                thread::sleep(Duration::from_millis(5));
                LoopAction::Continue
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(subscription.is_running());
        drop(subscription);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        // No address space can hold this stack
        let builder = thread::Builder::new().stack_size(1 << 50);
        let result = DecodeSubscription::start_on(
            builder,
            "test-spawn",
            || Ok(()),
            |_: &mut ()| LoopAction::Stop,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_detach_returns_while_source_blocks() {
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        let released = Arc::new(AtomicBool::new(false));
        let released_clone = Arc::clone(&released);

        struct Source(Arc<AtomicBool>);
        impl Drop for Source {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let mut subscription = DecodeSubscription::start(
            "test-detach",
            move || Ok((Source(released_clone), gate_rx)),
            |(_, gate): &mut (Source, std::sync::mpsc::Receiver<()>)| {
                // Blocks like a stalled device until the gate opens
                let _ = gate.recv();
                LoopAction::Continue
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        subscription.detach();
        assert!(subscription.is_stopped());
        assert!(!released.load(Ordering::SeqCst));

        drop(gate_tx);
        for _ in 0..200 {
            if released.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(released.load(Ordering::SeqCst));

        // Dropping a detached subscription does not wait again
        drop(subscription);
    }
}
