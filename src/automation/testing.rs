//! In-memory collaborators for session and runner tests.

use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, mpsc};

use crate::automation::error::SessionError;
use crate::automation::geometry::{Point, PositionedWord, Rect, WordBox};
use crate::automation::ports::{
    AnswerOracle, LogSink, OcrMode, PointerInjector, Recognition, ScreenCapture, Services,
    TextRecognizer,
};
use crate::automation::state::StopFlag;

/// Everything the fakes observed, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Capture(Rect),
    Recognize(OcrMode),
    Ask(String),
    Click(i32, i32),
    Scroll(i32, Point),
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Scroll(d, _) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(*e)).count()
    }
}

#[derive(Default)]
pub struct MemoryLog(Mutex<Vec<String>>);

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn append(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Capture that fails on the listed 1-based call numbers.
pub struct FakeCapture {
    pub recorder: Recorder,
    pub fail_on: Vec<usize>,
    calls: usize,
}

impl ScreenCapture for FakeCapture {
    fn capture(&mut self, region: Rect) -> Result<RgbaImage, SessionError> {
        self.calls += 1;
        self.recorder.push(Event::Capture(region));
        if self.fail_on.contains(&self.calls) {
            return Err(SessionError::Capture("screen unavailable".to_string()));
        }
        Ok(RgbaImage::new(1, 1))
    }
}

/// Recognizer replaying scripted results; the last one repeats once the script runs out.
pub struct FakeRecognizer {
    pub recorder: Recorder,
    pub script: VecDeque<Recognition>,
    last: Option<Recognition>,
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&mut self, _image: &RgbaImage, mode: OcrMode) -> Result<Recognition, SessionError> {
        self.recorder.push(Event::Recognize(mode));
        if let Some(next) = self.script.pop_front() {
            self.last = Some(next);
        }
        self.last
            .clone()
            .ok_or_else(|| SessionError::Recognition("no scripted result".to_string()))
    }
}

/// Oracle replaying scripted answers; `Err` entries simulate oracle failures.
pub struct FakeOracle {
    pub recorder: Recorder,
    pub answers: VecDeque<Result<String, String>>,
    pub default_answer: String,
    /// Requested after the given number of asks, to exercise cancellation.
    pub stop_after: Option<(usize, StopFlag)>,
    /// Blocks every ask until a message arrives.
    pub gate: Option<mpsc::Receiver<()>>,
    asks: usize,
}

impl AnswerOracle for FakeOracle {
    fn ask(&mut self, question_text: &str, _model: &str) -> Result<String, SessionError> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        self.asks += 1;
        self.recorder.push(Event::Ask(question_text.to_string()));
        if let Some((after, flag)) = &self.stop_after {
            if self.asks >= *after {
                flag.request();
            }
        }
        match self.answers.pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(msg)) => Err(SessionError::Oracle(msg)),
            None => Ok(self.default_answer.clone()),
        }
    }
}

pub struct FakePointer {
    pub recorder: Recorder,
    pub fail_scroll: bool,
}

impl PointerInjector for FakePointer {
    fn click(&mut self, x: i32, y: i32) -> Result<(), SessionError> {
        self.recorder.push(Event::Click(x, y));
        Ok(())
    }

    fn scroll(&mut self, delta_pixels: i32, at: Point) -> Result<(), SessionError> {
        self.recorder.push(Event::Scroll(delta_pixels, at));
        if self.fail_scroll {
            return Err(SessionError::Injection("wheel rejected".to_string()));
        }
        Ok(())
    }
}

/// Builder for a full set of fakes sharing one recorder.
pub struct Fakes {
    pub recorder: Recorder,
    pub log: Arc<MemoryLog>,
    pub capture: FakeCapture,
    pub recognizer: FakeRecognizer,
    pub oracle: FakeOracle,
    pub pointer: FakePointer,
}

impl Fakes {
    pub fn new(script: Vec<Recognition>) -> Self {
        let recorder = Recorder::default();
        Self {
            log: Arc::new(MemoryLog::default()),
            capture: FakeCapture {
                recorder: recorder.clone(),
                fail_on: Vec::new(),
                calls: 0,
            },
            recognizer: FakeRecognizer {
                recorder: recorder.clone(),
                script: script.into(),
                last: None,
            },
            oracle: FakeOracle {
                recorder: recorder.clone(),
                answers: VecDeque::new(),
                default_answer: "A".to_string(),
                stop_after: None,
                gate: None,
                asks: 0,
            },
            pointer: FakePointer {
                recorder: recorder.clone(),
                fail_scroll: false,
            },
            recorder,
        }
    }

    pub fn into_services(self) -> (Services, Recorder, Arc<MemoryLog>) {
        let services = Services {
            capture: Box::new(self.capture),
            recognizer: Box::new(self.recognizer),
            oracle: Box::new(self.oracle),
            pointer: Box::new(self.pointer),
            log: self.log.clone(),
        };
        (services, self.recorder, self.log)
    }
}

/// A word box 40x20 at (left, top).
pub fn word(text: &str, left: i32, top: i32) -> PositionedWord {
    PositionedWord::new(text, WordBox::new(left, top, 40, 20))
}

/// Positional recognition whose text is the words joined by newlines.
pub fn positioned(words: Vec<PositionedWord>) -> Recognition {
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Recognition::Positioned { text, words }
}

/// Option markers A-D stacked below `top`, left edge at x = 20.
pub fn option_words(top: i32) -> Vec<PositionedWord> {
    ["A.", "B.", "C.", "D."]
        .iter()
        .enumerate()
        .map(|(i, label)| word(label, 20, top + 40 * i as i32))
        .collect()
}
