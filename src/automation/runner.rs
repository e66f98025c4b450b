//! Session runner - starts the answering worker thread.
//!
//! Only one session may run per runner. The GUI owns a single runner, so
//! there is at most one worker per process. A start request while a worker
//! is active is rejected, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::automation::config::SessionConfig;
use crate::automation::error::SessionError;
use crate::automation::ports::Services;
use crate::automation::session::InteractionSession;
use crate::automation::state::{SessionStatus, StopFlag};

/// Clears the running flag when the worker exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Caller-side view of a running session.
pub struct SessionHandle {
    stop: StopFlag,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<SessionStatus>>,
}

impl SessionHandle {
    /// Asks the worker to stop after the current unit of work.
    pub fn stop(&self) {
        self.stop.request();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Waits for the worker and returns its terminal status.
    pub fn join(mut self) -> SessionStatus {
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .unwrap_or_else(|_| SessionStatus::Failed("session worker panicked".to_string())),
            None => SessionStatus::Idle,
        }
    }
}

#[derive(Default)]
pub struct SessionRunner {
    active: Arc<AtomicBool>,
}

impl SessionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Validates `config` and starts the session on a background thread.
    ///
    /// Returns immediately after spawning the worker.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a session from this runner is still active
    /// - `Configuration` if the config fails validation
    pub fn start(
        &self,
        config: SessionConfig,
        services: Services,
    ) -> Result<SessionHandle, SessionError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyRunning);
        }

        if let Err(e) = config.validate() {
            self.active.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let stop = StopFlag::new();
        let worker_stop = stop.clone();
        let guard = RunningGuard(self.active.clone());
        let log = services.log.clone();

        log.append(&format!(
            "Starting {} session: {} questions, region {}",
            config.mode, config.total_questions, config.region
        ));

        let worker = thread::spawn(move || {
            let _guard = guard;
            let mut session = InteractionSession::new(config, services, worker_stop);
            let status = session.run();
            log.append(&format!("Session thread finished: {}", status));
            status
        });

        Ok(SessionHandle {
            stop,
            running: self.active.clone(),
            worker: Some(worker),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::config::SessionMode;
    use crate::automation::geometry::{Point, Rect};
    use crate::automation::ports::OcrMode;
    use crate::automation::testing::{Fakes, option_words, positioned, word};
    use std::collections::BTreeMap;
    use std::sync::mpsc;

    fn config(total: u32) -> SessionConfig {
        SessionConfig {
            region: Rect::new(0, 0, 800, 600),
            mode: SessionMode::Fixed,
            ocr_mode: OcrMode::Accurate,
            total_questions: total,
            interval_ms: 0,
            click_delay_ms: 0,
            next_delay_ms: 0,
            scroll_delay_ms: 0,
            ..SessionConfig::default()
        }
    }

    fn page() -> crate::automation::ports::Recognition {
        let mut words = vec![word("1.", 20, 10)];
        words.extend(option_words(100));
        positioned(words)
    }

    #[test]
    fn test_session_runs_to_completion() {
        let runner = SessionRunner::new();
        let (services, recorder, _) = Fakes::new(vec![page()]).into_services();

        let handle = runner.start(config(2), services).unwrap();
        assert_eq!(handle.join(), SessionStatus::Completed);
        assert!(!runner.is_running());
        assert_eq!(recorder.clicks().len(), 2);
    }

    #[test]
    fn test_second_start_is_rejected_while_running() {
        let runner = SessionRunner::new();
        let (gate_tx, gate_rx) = mpsc::channel();
        let mut fakes = Fakes::new(vec![page()]);
        fakes.oracle.gate = Some(gate_rx);
        let (services, _, _) = fakes.into_services();

        let handle = runner.start(config(1), services).unwrap();
        assert!(handle.is_running());

        let (other, _, _) = Fakes::new(vec![page()]).into_services();
        assert!(matches!(
            runner.start(config(1), other),
            Err(SessionError::AlreadyRunning)
        ));

        gate_tx.send(()).unwrap();
        assert_eq!(handle.join(), SessionStatus::Completed);

        let (again, _, _) = Fakes::new(vec![page()]).into_services();
        assert!(runner.start(config(1), again).unwrap().join().is_terminal());
    }

    #[test]
    fn test_stop_ends_session_as_stopped() {
        let runner = SessionRunner::new();
        let (gate_tx, gate_rx) = mpsc::channel();
        let mut fakes = Fakes::new(vec![page()]);
        fakes.oracle.gate = Some(gate_rx);
        let (services, recorder, _) = fakes.into_services();

        let handle = runner.start(config(5), services).unwrap();
        handle.stop();
        // The worker may see the stop before ever reaching the oracle
        let _ = gate_tx.send(());

        assert_eq!(handle.join(), SessionStatus::Stopped);
        // The question in flight when stop was requested is the last one answered
        assert!(recorder.clicks().len() <= 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_at_start() {
        let runner = SessionRunner::new();
        let mut bad = config(1);
        bad.ocr_mode = OcrMode::Basic;
        bad.option_positions = Some(BTreeMap::new());
        let (services, recorder, _) = Fakes::new(vec![page()]).into_services();

        assert!(matches!(
            runner.start(bad, services),
            Err(SessionError::Configuration(_))
        ));
        assert!(!runner.is_running());
        assert!(recorder.events().is_empty());

        let mut good = config(1);
        good.option_positions = Some(BTreeMap::from([("A".to_string(), Point::new(1, 1))]));
        let (services, _, _) = Fakes::new(vec![page()]).into_services();
        assert_eq!(
            runner.start(good, services).unwrap().join(),
            SessionStatus::Completed
        );
    }
}
