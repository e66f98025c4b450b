//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, Color32, RichText};

use super::state::{DisplayStatus, GuiState};
use crate::automation::config::{SUPPORTED_MODELS, SessionMode};
use crate::automation::ports::OcrMode;
use crate::automation::state::SessionStatus;
use crate::calibration::CalibrationWizard;
use crate::config::mask_secret;

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(4.0);
    ui.label(RichText::new(title).strong());
    ui.add_space(4.0);
}

/// A secret field that shows the masked value unless secrets are revealed.
fn secret_field(ui: &mut egui::Ui, label: &str, value: &mut String, reveal: bool) {
    ui.horizontal(|ui| {
        ui.label(label);
        if reveal {
            ui.add(egui::TextEdit::singleline(value).desired_width(280.0));
        } else if value.is_empty() {
            ui.label(RichText::new("(未设置)").color(Color32::GRAY));
        } else {
            ui.monospace(mask_secret(value));
        }
    });
}

fn coordinate(ui: &mut egui::Ui, value: &mut i32) {
    ui.add(egui::DragValue::new(value).range(-10000..=10000).speed(1.0));
}

/// Render the API key fields.
pub fn render_credentials(ui: &mut egui::Ui, state: &mut GuiState) {
    section(ui, "API 密钥");

    ui.checkbox(&mut state.show_secrets, "显示 / 编辑密钥");
    let reveal = state.show_secrets;
    let config = &mut state.config;

    secret_field(ui, "DeepSeek API Key:", &mut config.deepseek_api_key, reveal);
    secret_field(ui, "百度 OCR (标准) API Key:", &mut config.baidu_basic.api_key, reveal);
    secret_field(ui, "百度 OCR (标准) Secret Key:", &mut config.baidu_basic.secret_key, reveal);
    secret_field(ui, "百度 OCR (高精度) API Key:", &mut config.baidu_accurate.api_key, reveal);
    secret_field(
        ui,
        "百度 OCR (高精度) Secret Key:",
        &mut config.baidu_accurate.secret_key,
        reveal,
    );
}

/// Render mode, model and coordinate settings.
pub fn render_session_settings(ui: &mut egui::Ui, state: &mut GuiState) {
    section(ui, "答题设置");

    let session = &mut state.config.session;

    ui.horizontal(|ui| {
        ui.label("模式:");
        ui.radio_value(&mut session.mode, SessionMode::Fixed, "固定页面");
        ui.radio_value(&mut session.mode, SessionMode::Scroll, "滚动页面");
    });

    ui.horizontal(|ui| {
        ui.label("模型:");
        for model in SUPPORTED_MODELS {
            ui.radio_value(&mut session.model, model.to_string(), model);
        }
    });

    ui.horizontal(|ui| {
        ui.label("OCR:");
        ui.radio_value(&mut session.ocr_mode, OcrMode::Basic, "标准");
        ui.radio_value(&mut session.ocr_mode, OcrMode::Accurate, "高精度 (含位置)");
    });

    ui.horizontal(|ui| {
        ui.label("截图区域:");
        coordinate(ui, &mut session.region.x1);
        coordinate(ui, &mut session.region.y1);
        ui.label("-");
        coordinate(ui, &mut session.region.x2);
        coordinate(ui, &mut session.region.y2);
    });

    ui.horizontal(|ui| {
        ui.label("题目数量:");
        ui.add(
            egui::DragValue::new(&mut session.total_questions)
                .range(1..=9999)
                .speed(1.0),
        );
        ui.label("间隔 (ms):");
        ui.add(
            egui::DragValue::new(&mut session.interval_ms)
                .range(0..=600_000)
                .speed(100.0),
        );
    });

    match session.mode {
        SessionMode::Fixed => {
            ui.checkbox(&mut session.auto_next, "点击选项后自动跳转下一题");
        }
        SessionMode::Scroll => {
            ui.horizontal(|ui| {
                ui.label("滚动重叠 (px):");
                ui.add(
                    egui::DragValue::new(&mut session.scroll_overlap)
                        .range(0..=5000)
                        .speed(10.0),
                );
                ui.label("滚动等待 (ms):");
                ui.add(
                    egui::DragValue::new(&mut session.scroll_delay_ms)
                        .range(0..=60_000)
                        .speed(100.0),
                );
            });
        }
    }

    section(ui, "选项坐标 (未勾选时从 OCR 结果识别)");
    egui::Grid::new("option_rows")
        .num_columns(3)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for row in &mut state.option_rows {
                ui.checkbox(&mut row.enabled, row.label);
                ui.add_enabled_ui(row.enabled, |ui| coordinate(ui, &mut row.x));
                ui.add_enabled_ui(row.enabled, |ui| coordinate(ui, &mut row.y));
                ui.end_row();
            }
        });

    if state.config.session.mode == SessionMode::Fixed {
        ui.horizontal(|ui| {
            ui.checkbox(&mut state.next_enabled, "下一题按钮:");
            ui.add_enabled_ui(state.next_enabled, |ui| {
                coordinate(ui, &mut state.next_button.x);
                coordinate(ui, &mut state.next_button.y);
            });
        });
    }
}

/// Render the start/stop buttons.
/// Returns (start_clicked, stop_clicked).
pub fn render_controls(ui: &mut egui::Ui, state: &GuiState, calibrating: bool) -> (bool, bool) {
    let mut start_clicked = false;
    let mut stop_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        let is_active = state.status.is_active();

        ui.add_enabled_ui(!is_active && !calibrating, |ui| {
            if ui.button(RichText::new("▶ 开始答题").size(16.0)).clicked() {
                start_clicked = true;
            }
        });

        ui.add_space(20.0);

        ui.add_enabled_ui(matches!(state.status, DisplayStatus::Running { .. }), |ui| {
            if ui.button(RichText::new("◼ 停止").size(16.0)).clicked() {
                stop_clicked = true;
            }
        });
    });

    (start_clicked, stop_clicked)
}

/// Render the calibration panel.
/// Returns (start_clicked, cancel_clicked).
pub fn render_calibration(
    ui: &mut egui::Ui,
    state: &GuiState,
    wizard: Option<&CalibrationWizard>,
) -> (bool, bool) {
    let mut start_clicked = false;
    let mut cancel_clicked = false;

    section(ui, "坐标标定");

    match wizard {
        None => {
            ui.label(
                RichText::new("用鼠标指向屏幕上的区域、选项和下一题按钮, 按热键记录坐标")
                    .color(Color32::GRAY),
            );
            ui.add_enabled_ui(!state.status.is_active(), |ui| {
                if ui.button("🎯 开始标定").clicked() {
                    start_clicked = true;
                }
            });
        }
        Some(wizard) => {
            let prompt_color = if wizard.is_awaiting_confirmation() {
                Color32::from_rgb(200, 150, 0)
            } else {
                Color32::from_rgb(0, 120, 200)
            };
            ui.label(RichText::new(wizard.prompt()).color(prompt_color));

            let items = wizard.items();
            ui.label(format!(
                "已记录: 区域 {} | 选项 {} 个 | 下一题 {}",
                if items.region.is_some() { "✓" } else { "-" },
                items.options.len(),
                if items.next_button.is_some() { "✓" } else { "-" },
            ));
            ui.label(
                RichText::new("F1 记录点 | F2/F3 区域角 | Y 确认 | N 重做 | Enter 跳过 | Esc 取消")
                    .small(),
            );
            if ui.button("取消标定").clicked() {
                cancel_clicked = true;
            }
        }
    }

    (start_clicked, cancel_clicked)
}

/// Render the status line.
pub fn render_status(ui: &mut egui::Ui, state: &GuiState) {
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label("状态:");

        let status_color = match &state.status {
            DisplayStatus::Idle => Color32::GRAY,
            DisplayStatus::Running { .. } => Color32::from_rgb(0, 120, 200),
            DisplayStatus::Stopping { .. } => Color32::from_rgb(200, 150, 0),
            DisplayStatus::Finished(SessionStatus::Completed) => Color32::from_rgb(0, 150, 0),
            DisplayStatus::Finished(SessionStatus::Failed(_)) | DisplayStatus::Error(_) => {
                Color32::from_rgb(200, 0, 0)
            }
            DisplayStatus::Finished(_) => Color32::from_rgb(200, 150, 0),
        };

        ui.label(RichText::new(state.status.status_text()).color(status_color));

        if let Some(elapsed) = state.status.elapsed_text() {
            ui.add_space(12.0);
            ui.label(format!("用时 {}", elapsed));
        }
    });
}

/// Render the session log, newest line at the bottom.
pub fn render_log(ui: &mut egui::Ui, lines: &[String]) {
    ui.label(RichText::new("运行日志").strong());
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for line in lines {
                ui.monospace(line);
            }
        });
}
