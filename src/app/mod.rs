// SPDX-License-Identifier: GPL-3.0-only

//! Scanner application logic
//!
//! # Architecture
//!
//! - `scanner`: the [`ScannerPage`] component (enumeration, selection, scan trigger)
//! - `state`: scan state machine and operation outcomes
//! - `selection`: default device selection policies
//! - `notice`: user-visible notices and the [`Notifier`] surface
//! - `frame_processor`: per-frame QR detection

pub mod frame_processor;
pub mod notice;
pub mod scanner;
pub mod selection;
pub mod state;

pub use notice::{Notice, Notifier, TerminalNotifier};
pub use scanner::ScannerPage;
pub use selection::{FirstDevice, PreferredDevice, SelectionPolicy, policy_for};
pub use state::{EnumerationOutcome, ScanOutcome, ScanPhase, SubmitOutcome, TriggerOutcome};
