//! Calibration wizard implementation.
//!
//! The user points at the screen and presses a hotkey for each item:
//! F2/F3 for the region corners, F1 for option and next-button centers.
//! Each capture waits for Y (confirm) or N (redo). Enter skips the current
//! item and keeps the configured value; Escape aborts without applying.

use crate::automation::geometry::{Point, Rect};
use crate::automation::markers::OPTION_MARKERS;
use crate::automation::ports::LogSink;
use crate::calibration::state::{CalibrationItems, CalibrationStep};

/// Hotkeys understood by the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationKey {
    /// Record a point (options, next button).
    RecordPoint,
    /// Record the region's top-left corner.
    RecordTopLeft,
    /// Record the region's bottom-right corner.
    RecordBottomRight,
    Confirm,
    Redo,
    Skip,
    Abort,
}

/// Result of feeding one key to the wizard.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardOutcome {
    /// Still collecting.
    Continue,
    Aborted,
    /// Every step is done; the collected items are ready to apply.
    Complete(CalibrationItems),
}

/// Runtime context for an active calibration.
#[derive(Debug)]
pub struct CalibrationWizard {
    current_step: CalibrationStep,
    items: CalibrationItems,
    /// Top-left corner waiting for its bottom-right partner.
    pending_top_left: Option<Point>,
    awaiting_confirmation: bool,
    /// Whether the next-button step is part of this run (fixed page only).
    include_next: bool,
}

impl CalibrationWizard {
    pub fn new(include_next: bool, log: &dyn LogSink) -> Self {
        log.append("===== 标定开始 =====");
        log.append("F1 记录点 | F2 区域左上角 | F3 区域右下角");
        log.append("Y 确认 | N 重做 | Enter 跳过 (保留原值) | Esc 取消");

        let wizard = Self {
            current_step: CalibrationStep::RegionTopLeft,
            items: CalibrationItems::default(),
            pending_top_left: None,
            awaiting_confirmation: false,
            include_next,
        };
        wizard.print_step_instructions(log);
        wizard
    }

    pub fn current_step(&self) -> CalibrationStep {
        self.current_step
    }

    pub fn items(&self) -> &CalibrationItems {
        &self.items
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    /// One-line prompt for the current step, shown in the GUI.
    pub fn prompt(&self) -> String {
        let step = format!(
            "步骤 {}/{}: {}",
            self.current_step.step_number(),
            CalibrationStep::total_steps(self.include_next),
            self.current_step.description()
        );
        let action = if self.awaiting_confirmation {
            "按 Y 确认, N 重做"
        } else {
            match self.current_step {
                CalibrationStep::RegionTopLeft => "鼠标移到区域左上角, 按 F2",
                CalibrationStep::RegionBottomRight => "鼠标移到区域右下角, 按 F3",
                CalibrationStep::Option(_) | CalibrationStep::NextButton => {
                    "鼠标移到中心, 按 F1 (Enter 跳过)"
                }
                CalibrationStep::Complete => "",
            }
        };
        format!("{} - {}", step, action)
    }

    /// Handles one hotkey press with the cursor position at the time of the press.
    pub fn handle_key(
        &mut self,
        key: CalibrationKey,
        cursor: Point,
        log: &dyn LogSink,
    ) -> WizardOutcome {
        match key {
            CalibrationKey::Abort => {
                log.append("标定已取消, 未修改任何设置");
                return WizardOutcome::Aborted;
            }
            CalibrationKey::Confirm => {
                if self.awaiting_confirmation {
                    self.awaiting_confirmation = false;
                    self.advance_to_next_step(log);
                }
            }
            CalibrationKey::Redo => {
                if self.awaiting_confirmation {
                    self.awaiting_confirmation = false;
                    self.forget_current_capture();
                    log.append("重做当前步骤");
                    self.current_step = rewind_to_step_start(self.current_step);
                    self.print_step_instructions(log);
                }
            }
            CalibrationKey::RecordPoint if !self.awaiting_confirmation => {
                self.handle_point_capture(cursor, log);
            }
            CalibrationKey::RecordTopLeft if !self.awaiting_confirmation => {
                self.handle_top_left_capture(cursor, log);
            }
            CalibrationKey::RecordBottomRight if !self.awaiting_confirmation => {
                self.handle_bottom_right_capture(cursor, log);
            }
            CalibrationKey::Skip if !self.awaiting_confirmation => {
                log.append("跳过当前步骤 (保留原值)");
                self.skip_current_step(log);
            }
            _ => {}
        }

        if self.current_step == CalibrationStep::Complete {
            log.append("===== 标定完成 =====");
            return WizardOutcome::Complete(self.items.clone());
        }
        WizardOutcome::Continue
    }

    fn handle_point_capture(&mut self, cursor: Point, log: &dyn LogSink) {
        if !self.current_step.expects_point() {
            log.append("当前步骤记录区域, 请用 F2/F3");
            return;
        }

        match self.current_step {
            CalibrationStep::Option(_) => {
                if let Some(marker) = self.current_step.option_marker() {
                    self.items.options.insert(marker, cursor);
                }
            }
            CalibrationStep::NextButton => self.items.next_button = Some(cursor),
            _ => {}
        }

        log.append(&format!("已记录 {}: {}", self.current_step.description(), cursor));
        self.awaiting_confirmation = true;
    }

    fn handle_top_left_capture(&mut self, cursor: Point, log: &dyn LogSink) {
        if self.current_step != CalibrationStep::RegionTopLeft {
            log.append("当前步骤不需要左上角 (F2)");
            return;
        }

        log.append(&format!("左上角: {}", cursor));
        self.pending_top_left = Some(cursor);
        self.current_step = CalibrationStep::RegionBottomRight;
        log.append("鼠标移到区域右下角, 按 F3");
    }

    fn handle_bottom_right_capture(&mut self, cursor: Point, log: &dyn LogSink) {
        if self.current_step != CalibrationStep::RegionBottomRight {
            log.append("当前步骤不需要右下角 (F3)");
            return;
        }

        let Some(top_left) = self.pending_top_left else {
            log.append("请先用 F2 记录左上角");
            self.current_step = CalibrationStep::RegionTopLeft;
            return;
        };

        let region = Rect::new(top_left.x, top_left.y, cursor.x, cursor.y);
        if !region.is_valid() {
            log.append("右下角必须在左上角的右下方, 请重新按 F2 记录左上角");
            self.pending_top_left = None;
            self.current_step = CalibrationStep::RegionTopLeft;
            return;
        }

        log.append(&format!(
            "截图区域: {} ({} x {})",
            region,
            region.width(),
            region.height()
        ));
        self.items.region = Some(region);
        self.pending_top_left = None;
        self.awaiting_confirmation = true;
    }

    fn advance_to_next_step(&mut self, log: &dyn LogSink) {
        log.append("已确认");
        self.current_step = self.step_after(self.current_step);
        if self.current_step != CalibrationStep::Complete {
            self.print_step_instructions(log);
        }
    }

    /// Skips to the start of the next item without recording.
    fn skip_current_step(&mut self, log: &dyn LogSink) {
        self.pending_top_left = None;
        self.current_step = self.step_after(self.current_step);
        if self.current_step != CalibrationStep::Complete {
            self.print_step_instructions(log);
        }
    }

    fn step_after(&self, step: CalibrationStep) -> CalibrationStep {
        let after_options = if self.include_next {
            CalibrationStep::NextButton
        } else {
            CalibrationStep::Complete
        };

        match step {
            CalibrationStep::RegionTopLeft | CalibrationStep::RegionBottomRight => {
                CalibrationStep::Option(0)
            }
            CalibrationStep::Option(index) if index + 1 < OPTION_MARKERS.len() => {
                CalibrationStep::Option(index + 1)
            }
            CalibrationStep::Option(_) => after_options,
            CalibrationStep::NextButton | CalibrationStep::Complete => CalibrationStep::Complete,
        }
    }

    /// Drops the value captured in the current step before a redo.
    fn forget_current_capture(&mut self) {
        self.pending_top_left = None;
        match self.current_step {
            CalibrationStep::RegionTopLeft | CalibrationStep::RegionBottomRight => {
                self.items.region = None;
            }
            CalibrationStep::Option(_) => {
                if let Some(marker) = self.current_step.option_marker() {
                    self.items.options.remove(marker);
                }
            }
            CalibrationStep::NextButton => self.items.next_button = None,
            CalibrationStep::Complete => {}
        }
    }

    fn print_step_instructions(&self, log: &dyn LogSink) {
        log.append(&self.prompt());
    }
}

/// Rewinds to the start of the current item (a region goes back to its top-left).
fn rewind_to_step_start(step: CalibrationStep) -> CalibrationStep {
    match step {
        CalibrationStep::RegionBottomRight => CalibrationStep::RegionTopLeft,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::MemoryLog;

    const CURSOR: Point = Point { x: 0, y: 0 };

    fn press(wizard: &mut CalibrationWizard, key: CalibrationKey, log: &MemoryLog) -> WizardOutcome {
        wizard.handle_key(key, CURSOR, log)
    }

    fn point_at(
        wizard: &mut CalibrationWizard,
        key: CalibrationKey,
        x: i32,
        y: i32,
        log: &MemoryLog,
    ) -> WizardOutcome {
        wizard.handle_key(key, Point::new(x, y), log)
    }

    #[test]
    fn test_full_run_collects_region_options_and_next() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);

        point_at(&mut wizard, CalibrationKey::RecordTopLeft, 100, 200, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::RegionBottomRight);
        point_at(&mut wizard, CalibrationKey::RecordBottomRight, 900, 800, &log);
        assert!(wizard.is_awaiting_confirmation());
        press(&mut wizard, CalibrationKey::Confirm, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::Option(0));

        point_at(&mut wizard, CalibrationKey::RecordPoint, 150, 400, &log);
        press(&mut wizard, CalibrationKey::Confirm, &log);
        point_at(&mut wizard, CalibrationKey::RecordPoint, 150, 460, &log);
        press(&mut wizard, CalibrationKey::Confirm, &log);

        // C through 错 are not on this page
        for _ in 2..OPTION_MARKERS.len() {
            press(&mut wizard, CalibrationKey::Skip, &log);
        }
        assert_eq!(wizard.current_step(), CalibrationStep::NextButton);

        point_at(&mut wizard, CalibrationKey::RecordPoint, 850, 750, &log);
        let outcome = press(&mut wizard, CalibrationKey::Confirm, &log);

        let WizardOutcome::Complete(items) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(items.region, Some(Rect::new(100, 200, 900, 800)));
        assert_eq!(items.options.len(), 2);
        assert_eq!(items.options.get("A"), Some(&Point::new(150, 400)));
        assert_eq!(items.options.get("B"), Some(&Point::new(150, 460)));
        assert_eq!(items.next_button, Some(Point::new(850, 750)));
        assert!(log.contains("标定完成"));
    }

    #[test]
    fn test_scroll_run_ends_after_options() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(false, &log);

        press(&mut wizard, CalibrationKey::Skip, &log);
        let mut outcome = WizardOutcome::Continue;
        for _ in 0..OPTION_MARKERS.len() {
            outcome = press(&mut wizard, CalibrationKey::Skip, &log);
        }

        assert_eq!(outcome, WizardOutcome::Complete(CalibrationItems::default()));
    }

    #[test]
    fn test_redo_discards_capture() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);
        press(&mut wizard, CalibrationKey::Skip, &log);

        point_at(&mut wizard, CalibrationKey::RecordPoint, 10, 10, &log);
        assert_eq!(wizard.items().options.get("A"), Some(&Point::new(10, 10)));
        press(&mut wizard, CalibrationKey::Redo, &log);
        assert!(wizard.items().options.is_empty());
        assert_eq!(wizard.current_step(), CalibrationStep::Option(0));

        point_at(&mut wizard, CalibrationKey::RecordPoint, 20, 30, &log);
        press(&mut wizard, CalibrationKey::Confirm, &log);
        assert_eq!(wizard.items().options.get("A"), Some(&Point::new(20, 30)));
        assert_eq!(wizard.current_step(), CalibrationStep::Option(1));
    }

    #[test]
    fn test_region_redo_restarts_at_top_left() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);

        point_at(&mut wizard, CalibrationKey::RecordTopLeft, 0, 0, &log);
        point_at(&mut wizard, CalibrationKey::RecordBottomRight, 500, 500, &log);
        press(&mut wizard, CalibrationKey::Redo, &log);

        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);
        assert_eq!(wizard.items().region, None);
    }

    #[test]
    fn test_inverted_region_is_rejected() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);

        point_at(&mut wizard, CalibrationKey::RecordTopLeft, 500, 500, &log);
        point_at(&mut wizard, CalibrationKey::RecordBottomRight, 100, 900, &log);

        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);
        assert_eq!(wizard.items().region, None);
        assert!(!wizard.is_awaiting_confirmation());
        assert!(log.contains("右下角必须在左上角的右下方"));
    }

    #[test]
    fn test_wrong_key_for_step_is_ignored() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);

        point_at(&mut wizard, CalibrationKey::RecordPoint, 10, 10, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);
        assert!(!wizard.is_awaiting_confirmation());

        point_at(&mut wizard, CalibrationKey::RecordBottomRight, 10, 10, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);

        // Confirm without a capture does nothing
        press(&mut wizard, CalibrationKey::Confirm, &log);
        assert_eq!(wizard.current_step(), CalibrationStep::RegionTopLeft);
    }

    #[test]
    fn test_captures_wait_for_confirmation() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);
        press(&mut wizard, CalibrationKey::Skip, &log);

        point_at(&mut wizard, CalibrationKey::RecordPoint, 10, 10, &log);
        // Neither skip nor another capture moves on until Y/N
        press(&mut wizard, CalibrationKey::Skip, &log);
        point_at(&mut wizard, CalibrationKey::RecordPoint, 99, 99, &log);

        assert_eq!(wizard.current_step(), CalibrationStep::Option(0));
        assert_eq!(wizard.items().options.get("A"), Some(&Point::new(10, 10)));
        assert!(wizard.prompt().contains("按 Y 确认"));
    }

    #[test]
    fn test_abort() {
        let log = MemoryLog::default();
        let mut wizard = CalibrationWizard::new(true, &log);
        point_at(&mut wizard, CalibrationKey::RecordTopLeft, 0, 0, &log);

        assert_eq!(
            press(&mut wizard, CalibrationKey::Abort, &log),
            WizardOutcome::Aborted
        );
        assert!(log.contains("标定已取消"));
    }

    #[test]
    fn test_prompt_shows_progress() {
        let log = MemoryLog::default();
        let wizard = CalibrationWizard::new(false, &log);
        assert_eq!(wizard.prompt(), "步骤 1/9: 截图区域 - 左上角 - 鼠标移到区域左上角, 按 F2");
        assert!(log.contains("Esc 取消"));
    }
}
