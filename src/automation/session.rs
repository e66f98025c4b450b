//! The answering state machine.
//!
//! Runs on the worker thread and drives capture → recognize → ask → click
//! cycles in one of two loops:
//! - fixed page: one question per screen, advanced with a "next" button
//! - scroll: a long page of numbered questions, answered window by window
//!
//! The stop flag is checked at the top of every iteration or window and
//! before each question inside a window. A click sequence already in
//! progress always runs to completion.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::automation::answer::{normalize, resolve};
use crate::automation::config::{SessionConfig, SessionMode};
use crate::automation::error::SessionError;
use crate::automation::geometry::Point;
use crate::automation::markers::{parse_option_markers, parse_question_markers};
use crate::automation::ports::{OcrMode, Recognition, Services};
use crate::automation::scroll::ScrollWindowTracker;
use crate::automation::state::{SessionStatus, StopFlag};

/// Characters of recognized text shown in the log.
const TEXT_PREVIEW_CHARS: usize = 50;

/// How a loop ended when no fatal error occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopExit {
    Finished,
    Stopped,
}

pub struct InteractionSession {
    config: SessionConfig,
    services: Services,
    stop: StopFlag,
    status: SessionStatus,
    tracker: ScrollWindowTracker,
    /// Current iteration (fixed) or window (scroll), 1-based
    current: u32,
    start_time: Instant,
}

impl InteractionSession {
    pub fn new(config: SessionConfig, services: Services, stop: StopFlag) -> Self {
        let tracker = ScrollWindowTracker::new(config.region.height(), config.scroll_overlap);
        Self {
            config,
            services,
            stop,
            status: SessionStatus::Idle,
            tracker,
            current: 0,
            start_time: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &ScrollWindowTracker {
        &self.tracker
    }

    #[cfg(test)]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Runs the configured loop to its end and returns the terminal status.
    pub fn run(&mut self) -> SessionStatus {
        self.status = SessionStatus::Running;
        self.start_time = Instant::now();

        let result = self.config.validate().and_then(|()| match self.config.mode {
            SessionMode::Fixed => self.run_fixed(),
            SessionMode::Scroll => self.run_scroll(),
        });

        self.status = match result {
            Ok(LoopExit::Finished) => SessionStatus::Completed,
            Ok(LoopExit::Stopped) => {
                self.log("Session stopped");
                SessionStatus::Stopped
            }
            Err(e) => {
                self.log(&format!("Session failed: {}", e));
                SessionStatus::Failed(e.to_string())
            }
        };
        self.status.clone()
    }

    fn run_fixed(&mut self) -> Result<LoopExit, SessionError> {
        let total = self.config.total_questions;
        self.log(&format!("Starting fixed-page session: {} questions", total));

        for index in 1..=total {
            if self.stop.is_requested() {
                return Ok(LoopExit::Stopped);
            }

            self.current = index;
            let is_last = index == total;

            if let Err(e) = self.answer_fixed_question(index, is_last) {
                // One bad question never ends the run
                self.log(&format!("Question {}/{}: {}", index, total, e));
                continue;
            }

            if !is_last && !self.stop.is_requested() {
                pause(self.config.interval_ms);
            }
        }

        self.log(&format!(
            "Session complete: {} questions in {:.1}s",
            total,
            self.start_time.elapsed().as_secs_f32()
        ));
        Ok(LoopExit::Finished)
    }

    /// Capture, recognize, ask, click, and advance for one fixed-page question.
    fn answer_fixed_question(&mut self, index: u32, is_last: bool) -> Result<(), SessionError> {
        let total = self.config.total_questions;
        let prefix = format!("Question {}/{}", index, total);

        let image = self.services.capture.capture(self.config.region)?;
        self.log(&format!("{}: captured", prefix));

        let recognition = self
            .services
            .recognizer
            .recognize(&image, self.config.ocr_mode)?;
        self.log(&format!(
            "{}: recognized \"{}\"",
            prefix,
            preview(recognition.text())
        ));

        let options = match (self.config.explicit_options(), recognition.words()) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(words)) => {
                let extracted = parse_option_markers(words, self.config.region.origin());
                self.log(&format!(
                    "{}: extracted options {:?}",
                    prefix,
                    extracted.keys().collect::<Vec<_>>()
                ));
                extracted
            }
            (None, None) => {
                return Err(SessionError::Configuration(
                    "no option positions available".to_string(),
                ));
            }
        };

        let answer = self
            .services
            .oracle
            .ask(recognition.text(), &self.config.model)?;
        self.log(&format!("{}: answer {}", prefix, answer));

        self.click_answer(&prefix, &answer, &options)?;

        if !is_last && !self.config.auto_next {
            if let Some(next) = self.config.next_button {
                self.services.pointer.click(next.x, next.y)?;
                pause(self.config.next_delay_ms);
                self.log(&format!("{}: clicked next {}", prefix, next));
            }
        }

        Ok(())
    }

    fn run_scroll(&mut self) -> Result<LoopExit, SessionError> {
        let region = self.config.region;
        let target = self.config.total_questions as usize;
        let scroll_at = region.center();

        let mode = if self.config.ocr_mode.returns_positions() {
            self.config.ocr_mode
        } else {
            self.log(&format!(
                "Warning: scroll mode needs word positions, switching OCR from {} to {}",
                self.config.ocr_mode,
                OcrMode::Accurate
            ));
            OcrMode::Accurate
        };

        self.log(&format!(
            "Starting scroll session: {} questions, window height {}, overlap {}",
            target,
            region.height(),
            self.config.scroll_overlap
        ));

        while self.tracker.answered_count() < target {
            if self.stop.is_requested() {
                return Ok(LoopExit::Stopped);
            }
            self.current += 1;

            // Capture and recognition failures end the run
            let image = self.services.capture.capture(region)?;
            self.log(&format!(
                "Window {}: captured, answered {}/{}",
                self.current,
                self.tracker.answered_count(),
                target
            ));

            let (text, words) = match self.services.recognizer.recognize(&image, mode)? {
                Recognition::Positioned { text, words } => (text, words),
                Recognition::Plain(_) => {
                    return Err(SessionError::Recognition(
                        "recognizer returned no word positions".to_string(),
                    ));
                }
            };

            let questions = parse_question_markers(&words);
            self.log(&format!(
                "Window {}: question ids {:?}",
                self.current,
                questions.keys().collect::<Vec<_>>()
            ));

            if questions.is_empty() {
                self.log(&format!(
                    "Window {}: no question numbers found, scrolling blind",
                    self.current
                ));
                let distance = self.tracker.blind_step();
                self.scroll(distance, scroll_at)?;
                continue;
            }

            let pending = self.tracker.unanswered_in_view(&questions);
            if pending.is_empty() {
                self.log(&format!(
                    "Window {}: every visible question is answered",
                    self.current
                ));
                let distance = self.tracker.next_distance(&questions);
                self.scroll(distance, scroll_at)?;
                continue;
            }

            let options = match self.config.explicit_options() {
                Some(explicit) => explicit.clone(),
                None => parse_option_markers(&words, region.origin()),
            };

            for id in pending {
                if self.stop.is_requested() || self.tracker.answered_count() >= target {
                    break;
                }

                // Every question in the window is asked with the whole window text.
                if let Err(e) = self.answer_in_window(id, &text, &options) {
                    self.log(&format!("Question {}: {}", id, e));
                }

                // Marked even on failure so an unreachable question cannot stall the loop
                self.tracker.mark_answered(id);
                self.log(&format!(
                    "Question {}: done ({}/{})",
                    id,
                    self.tracker.answered_count(),
                    target
                ));

                if !self.stop.is_requested() {
                    pause(self.config.interval_ms);
                }
            }

            if self.tracker.answered_count() < target && !self.stop.is_requested() {
                let distance = self.tracker.next_distance(&questions);
                self.scroll(distance, scroll_at)?;
            }
        }

        // The loop only exits here once the target is reached, even if a
        // stop arrived while the last question was being answered
        self.log(&format!(
            "Session complete: {} questions in {} windows, {:.1}s",
            self.tracker.answered_count(),
            self.current,
            self.start_time.elapsed().as_secs_f32()
        ));
        Ok(LoopExit::Finished)
    }

    fn answer_in_window(
        &mut self,
        id: u32,
        window_text: &str,
        options: &BTreeMap<String, Point>,
    ) -> Result<(), SessionError> {
        let prefix = format!("Question {}", id);
        let answer = self.services.oracle.ask(window_text, &self.config.model)?;
        self.log(&format!("{}: answer {}", prefix, answer));
        self.click_answer(&prefix, &answer, options)
    }

    /// Clicks every resolvable token of `answer`. Unknown tokens are logged and skipped.
    fn click_answer(
        &mut self,
        prefix: &str,
        answer: &str,
        options: &BTreeMap<String, Point>,
    ) -> Result<(), SessionError> {
        let tokens = normalize(answer);
        self.log(&format!("{}: tokens {:?}", prefix, tokens));

        for token in &tokens {
            match resolve(token, options) {
                Some((label, point)) => {
                    self.services.pointer.click(point.x, point.y)?;
                    pause(self.config.click_delay_ms);
                    self.log(&format!("{}: clicked {} at {}", prefix, label, point));
                }
                None => {
                    self.log(&format!(
                        "{}: warning - option {} has no known position",
                        prefix, token
                    ));
                }
            }
        }

        Ok(())
    }

    fn scroll(&mut self, distance: i32, at: Point) -> Result<(), SessionError> {
        self.services.pointer.scroll(distance, at)?;
        self.log(&format!("Scrolled {} px", distance));
        pause(self.config.scroll_delay_ms);
        Ok(())
    }

    fn log(&self, msg: &str) {
        self.services.log.append(msg);
    }
}

fn pause(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > TEXT_PREVIEW_CHARS {
        format!("{}...", flat.chars().take(TEXT_PREVIEW_CHARS).collect::<String>())
    } else {
        flat
    }
}
