// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for the scan loop
//!
//! [`ScanLoopController`] moves a [`Scanner`] onto a dedicated thread that
//! ticks it continuously. Control requests arrive as [`LoopCommand`]s on a
//! channel and are applied by the same thread between ticks, so a toggle
//! can never land in the middle of an attempt.

use super::{ScanOutcome, Scanner};
use crate::constants::timing::LOOP_POLL_INTERVAL;
use crate::errors::{ScanError, ScanResult};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Action returned by the outcome observer to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Requests applied by the loop thread
#[derive(Debug)]
pub enum LoopCommand {
    Start,
    Stop,
    /// Run one attempt regardless of the timer
    ScanOnce,
    /// Save the current frame and send back the path
    SaveFrame(Sender<ScanResult<PathBuf>>),
    Pause(bool),
    Shutdown,
}

/// Controller for a scanner running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = ScanLoopController::start_with_observer("scanner", scanner, |outcome| {
///     match outcome {
///         Ok(ScanOutcome::Decoded { result, .. }) => {
///             println!("{}", result.text);
///             LoopAction::Stop
///         }
///         _ => LoopAction::Continue,
///     }
/// });
///
/// // Later, stop the loop and get the scanner back
/// let scanner = controller.stop();
/// ```
pub struct ScanLoopController {
    /// Thread handle for joining; the thread hands the scanner back
    thread_handle: Option<JoinHandle<Scanner>>,
    commands: Sender<LoopCommand>,
    /// Name for logging
    name: String,
}

impl ScanLoopController {
    /// Start ticking `scanner` on a new thread
    pub fn start(name: &str, scanner: Scanner) -> Self {
        Self::start_with_observer(name, scanner, |_| LoopAction::Continue)
    }

    /// Start ticking `scanner`, passing every attempt's outcome to `observer`
    ///
    /// The loop ends when the observer returns `LoopAction::Stop`, on a
    /// `Shutdown` command, or when the controller is dropped.
    pub fn start_with_observer<F>(name: &str, mut scanner: Scanner, mut observer: F) -> Self
    where
        F: FnMut(&ScanResult<ScanOutcome>) -> LoopAction + Send + 'static,
    {
        let (commands, receiver) = mpsc::channel();
        let name_clone = name.to_string();

        info!(name = %name, "Starting scan loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Scan loop thread started");

            loop {
                let outcome = match receiver.recv_timeout(LOOP_POLL_INTERVAL) {
                    Ok(LoopCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }
                    Ok(command) => apply(&mut scanner, command),
                    Err(RecvTimeoutError::Timeout) => None,
                };

                let outcome = outcome.or_else(|| scanner.tick(Instant::now()));
                if let Some(outcome) = outcome
                    && observer(&outcome) == LoopAction::Stop
                {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }
            }

            scanner.shutdown();
            info!(name = %name_clone, "Scan loop thread exiting");
            scanner
        });

        Self {
            thread_handle: Some(thread_handle),
            commands,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Queue a command; returns false if the loop has already exited
    pub fn send(&self, command: LoopCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start_scanning(&self) -> bool {
        self.send(LoopCommand::Start)
    }

    pub fn stop_scanning(&self) -> bool {
        self.send(LoopCommand::Stop)
    }

    pub fn scan_once(&self) -> bool {
        self.send(LoopCommand::ScanOnce)
    }

    pub fn set_paused(&self, paused: bool) -> bool {
        self.send(LoopCommand::Pause(paused))
    }

    /// Save the current frame, waiting for the loop thread to do it
    pub fn save_current_frame(&self) -> ScanResult<PathBuf> {
        let (reply, response) = mpsc::channel();
        if !self.send(LoopCommand::SaveFrame(reply)) {
            return Err(ScanError::LoopStopped);
        }
        response.recv().map_err(|_| ScanError::LoopStopped)?
    }

    /// Stop the loop, wait for the thread and take the scanner back
    ///
    /// Returns `None` if the loop thread panicked.
    pub fn stop(mut self) -> Option<Scanner> {
        self.shutdown()
    }

    /// Wait for the loop to end on its own (observer stop)
    pub fn join(mut self) -> Option<Scanner> {
        self.join_thread()
    }

    fn shutdown(&mut self) -> Option<Scanner> {
        debug!(name = %self.name, "Requesting scan loop stop");
        // Fails only when the thread is already gone, which join reports
        let _ = self.commands.send(LoopCommand::Shutdown);
        self.join_thread()
    }

    fn join_thread(&mut self) -> Option<Scanner> {
        let handle = self.thread_handle.take()?;
        debug!(name = %self.name, "Waiting for scan loop thread to finish");
        match handle.join() {
            Ok(scanner) => {
                debug!(name = %self.name, "Scan loop thread finished");
                Some(scanner)
            }
            Err(e) => {
                warn!(name = %self.name, "Scan loop thread panicked: {:?}", e);
                None
            }
        }
    }
}

impl Drop for ScanLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "ScanLoopController dropped, stopping loop");
            self.shutdown();
        }
    }
}

/// Apply a command on the loop thread; manual scans yield an outcome
fn apply(scanner: &mut Scanner, command: LoopCommand) -> Option<ScanResult<ScanOutcome>> {
    match command {
        LoopCommand::Start => scanner.start_scanning(),
        LoopCommand::Stop => scanner.stop_scanning(),
        LoopCommand::Pause(paused) => scanner.set_paused(paused),
        LoopCommand::ScanOnce => return Some(scanner.scan_once()),
        LoopCommand::SaveFrame(reply) => {
            // The requester may have given up waiting
            let _ = reply.send(scanner.save_current_frame());
        }
        LoopCommand::Shutdown => {}
    }
    None
}
