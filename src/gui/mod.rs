//! GUI module for the application.
//!
//! Provides a graphical interface using egui/eframe for configuring and
//! controlling answering sessions.

pub mod render;
pub mod state;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use eframe::egui::{self, Vec2};

use crate::automation::config::SessionMode;
use crate::automation::input::SendInputPointer;
use crate::automation::ports::{LogSink, Services};
use crate::automation::runner::{SessionHandle, SessionRunner};
use crate::calibration::{CalibrationWizard, KeyPoller, WizardOutcome, get_cursor_position};
use crate::capture::GdiScreenCapture;
use crate::config::AppConfig;
use crate::logging::SharedLog;
use crate::ocr::BaiduOcr;
use crate::oracle::DeepSeekOracle;

use state::{DisplayStatus, GuiState};

/// Main GUI application struct.
pub struct GuiApp {
    state: GuiState,
    runner: SessionRunner,
    handle: Option<SessionHandle>,
    log: SharedLog,
    /// Active calibration and the key state it polls.
    calibration: Option<(CalibrationWizard, KeyPoller)>,
}

impl GuiApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::setup_fonts(&cc.egui_ctx);

        Self {
            state: GuiState::new(AppConfig::load()),
            runner: SessionRunner::new(),
            handle: None,
            log: SharedLog::default(),
            calibration: None,
        }
    }

    /// Setup fonts with Chinese support.
    fn setup_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        let font_paths = [
            "C:\\Windows\\Fonts\\msyh.ttc",   // Microsoft YaHei
            "C:\\Windows\\Fonts\\simhei.ttf", // SimHei
            "C:\\Windows\\Fonts\\simsun.ttc", // SimSun
        ];

        let mut font_loaded = false;
        for font_path in &font_paths {
            if let Ok(font_data) = std::fs::read(font_path) {
                fonts.font_data.insert(
                    "cjk_font".to_owned(),
                    egui::FontData::from_owned(font_data).into(),
                );
                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    fonts
                        .families
                        .entry(family)
                        .or_default()
                        .insert(0, "cjk_font".to_owned());
                }

                crate::log(&format!("Loaded CJK font from: {}", font_path));
                font_loaded = true;
                break;
            }
        }

        if !font_loaded {
            crate::log("Warning: Could not load a CJK font. Text may not display correctly.");
        }

        ctx.set_fonts(fonts);
    }

    /// Builds the concrete collaborators from the current config.
    fn build_services(&self) -> Result<Services> {
        let config = &self.state.config;
        let recognizer = BaiduOcr::new(
            config.baidu_basic.credentials(),
            config.baidu_accurate.credentials(),
        )
        .context("failed to create OCR client")?;
        let oracle = DeepSeekOracle::new(config.deepseek_api_key.trim())
            .context("failed to create DeepSeek client")?;

        Ok(Services {
            capture: Box::new(GdiScreenCapture),
            recognizer: Box::new(recognizer),
            oracle: Box::new(oracle),
            pointer: Box::new(SendInputPointer),
            log: Arc::new(self.log.clone()),
        })
    }

    /// Poll the worker and collect its result once it has exited.
    fn update_session_status(&mut self) {
        let finished = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_running());
        if !finished {
            return;
        }

        if let Some(handle) = self.handle.take() {
            let status = handle.join();
            crate::log(&format!("GUI: Session ended: {}", status));
            self.state.status = if status.is_terminal() {
                DisplayStatus::Finished(status)
            } else {
                DisplayStatus::Idle
            };
        }
    }

    fn handle_start(&mut self) {
        self.state.sync_session();

        if let Err(e) = self.state.config.session.validate() {
            crate::log(&format!("GUI: Invalid settings: {}", e));
            self.state.status = DisplayStatus::Error(e.to_string());
            return;
        }

        if let Err(e) = self.state.config.save() {
            crate::log(&format!("GUI: Failed to save config: {:#}", e));
        }

        let services = match self.build_services() {
            Ok(services) => services,
            Err(e) => {
                crate::log(&format!("GUI: {:#}", e));
                self.state.status = DisplayStatus::Error(format!("{:#}", e));
                return;
            }
        };

        self.log.clear();
        let session = self.state.config.session.clone();
        let total = session.total_questions;

        match self.runner.start(session, services) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state.status = DisplayStatus::Running {
                    total,
                    start_time: Instant::now(),
                };
                crate::log(&format!("GUI: Started session with {} questions", total));
            }
            Err(e) => {
                self.state.status = DisplayStatus::Error(e.to_string());
                crate::log(&format!("GUI: Failed to start session: {}", e));
            }
        }
    }

    fn start_calibration(&mut self) {
        if self.calibration.is_some() || self.state.status.is_active() {
            return;
        }
        let include_next = self.state.config.session.mode == SessionMode::Fixed;
        let wizard = CalibrationWizard::new(include_next, &self.log);
        self.calibration = Some((wizard, KeyPoller::new()));
    }

    fn cancel_calibration(&mut self) {
        if self.calibration.take().is_some() {
            self.log.append("标定已取消, 未修改任何设置");
        }
    }

    /// Feeds fresh hotkey presses to the wizard and applies the result when done.
    fn poll_calibration(&mut self) {
        let Some((wizard, keys)) = self.calibration.as_mut() else {
            return;
        };
        let Some(key) = keys.poll() else {
            return;
        };

        let cursor = match get_cursor_position() {
            Ok(cursor) => cursor,
            Err(e) => {
                self.log.append(&format!("无法读取鼠标位置: {:#}", e));
                return;
            }
        };

        match wizard.handle_key(key, cursor, &self.log) {
            WizardOutcome::Continue => {}
            WizardOutcome::Aborted => self.calibration = None,
            WizardOutcome::Complete(items) => {
                self.calibration = None;
                if items.is_empty() {
                    self.log.append("没有记录新的坐标");
                    return;
                }
                self.state.apply_calibration(&items);
                match self.state.config.save() {
                    Ok(()) => self.log.append("标定结果已保存"),
                    Err(e) => crate::log(&format!("GUI: Failed to save config: {:#}", e)),
                }
            }
        }
    }

    fn handle_stop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.stop();
            crate::log("GUI: Requested session stop");
            if let DisplayStatus::Running { start_time, .. } = self.state.status {
                self.state.status = DisplayStatus::Stopping { start_time };
            }
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_session_status();

        self.poll_calibration();

        // Keep the log and elapsed time fresh while a worker is alive
        if self.state.status.is_active() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
        // Hotkeys are polled per frame, so keep frames coming while calibrating
        if self.calibration.is_some() {
            ctx.request_repaint_after(Duration::from_millis(30));
        }

        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                render::render_log(ui, &self.log.snapshot());
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("自动答题助手");

            egui::ScrollArea::vertical().show(ui, |ui| {
                let calibrating = self.calibration.is_some();
                let editable = !self.state.status.is_active() && !calibrating;
                ui.add_enabled_ui(editable, |ui| {
                    render::render_credentials(ui, &mut self.state);
                    render::render_session_settings(ui, &mut self.state);
                });

                let wizard = self.calibration.as_ref().map(|(wizard, _)| wizard);
                let (calibrate_clicked, cancel_clicked) =
                    render::render_calibration(ui, &self.state, wizard);
                if calibrate_clicked {
                    self.start_calibration();
                }
                if cancel_clicked {
                    self.cancel_calibration();
                }

                let (start_clicked, stop_clicked) =
                    render::render_controls(ui, &self.state, calibrating);
                if start_clicked && !calibrating {
                    self.handle_start();
                }
                if stop_clicked {
                    self.handle_stop();
                }

                render::render_status(ui, &self.state);
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
            crate::log("GUI: Window closed, stopping session");
        }
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui() -> eframe::Result<()> {
    crate::log("GUI: Creating native options...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(640.0, 760.0))
            .with_min_inner_size(Vec2::new(480.0, 480.0))
            .with_title("Quiz Autopilot"),
        ..Default::default()
    };

    eframe::run_native(
        "Quiz Autopilot",
        options,
        Box::new(|cc| {
            crate::log("GUI: Creating GuiApp instance...");
            Ok(Box::new(GuiApp::new(cc)))
        }),
    )
}
