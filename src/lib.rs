#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use eframe::egui::{
    self, Button, CentralPanel, Color32, Layout, RichText, TextEdit, TopBottomPanel, Window,
};

use config::{Config, Theme};
use controller::AlarmController;
use state::{PlaybackStatus, SchedulingStatus};

pub mod audio;
pub mod bridge;
pub mod communication;
pub mod config;
/// the alarm lifecycle state machine
pub mod controller;
pub mod state;
pub mod wake;

/// the nightstand gui, purely a view over the controller's state
/// holds nothing of its own beyond the raw text in the time field
pub struct AlarmClock {
    config: Config,
    controller: AlarmController,
    time_input: String,
    in_config: bool,
}

impl AlarmClock {
    #[must_use]
    pub fn new(config: Config, controller: AlarmController) -> Self {
        let time_input = prefill_time(Local::now().naive_local(), config.default_wake_time)
            .format("%Y-%m-%dT%H:%M")
            .to_string();
        Self {
            config,
            controller,
            time_input,
            in_config: false,
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        Window::new("settings ⚙").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("time format");
                ui.text_edit_singleline(&mut self.config.time_format);
            });
            if ui.button("x").clicked() {
                self.in_config = false;
            }
        });
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new({
                    if self.config.theme == Theme::Dark {
                        "🌞"
                    } else {
                        "🌙"
                    }
                }));
                if theme_btn.clicked() {
                    self.config.theme = !self.config.theme;
                }
                ui.centered_and_justified(|ui| {
                    ui.label(format!(
                        "Time: {}",
                        Local::now().naive_local().format(&self.config.time_format)
                    ));
                });
                ui.with_layout(Layout::right_to_left(eframe::emath::Align::Min), |ui| {
                    if ui.button("⚙").on_hover_text("settings").clicked() {
                        self.in_config = true;
                    }
                });
            });
        });
    }

    /// black screen, alarm stays armed, double-click brings the ui back
    fn render_night_overlay(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let response = ui.interact(
                    ui.max_rect(),
                    ui.id().with("night_overlay"),
                    egui::Sense::click(),
                );
                let text = match &self.controller.state().scheduling {
                    SchedulingStatus::Pending(at) => {
                        format!("alarm armed for {}\ndouble-click to wake", at.format("%H:%M"))
                    }
                    _ => "double-click to wake".to_string(),
                };
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(text).color(Color32::from_gray(60)).size(18.0));
                });
                if response.double_clicked() {
                    self.controller.set_night_mode(false);
                }
            });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.controller.state().last_message.as_str());
        });
    }

    fn render_body(&mut self, ctx: &egui::Context) {
        let (scheduling, playback, sound_path, sound_enabled) = {
            let state = self.controller.state();
            (
                state.scheduling.clone(),
                state.playback,
                state.sound_path.clone(),
                state.sound_enabled,
            )
        };
        CentralPanel::default().show(ctx, |ui| {
            ui.heading("set alarm time");
            ui.horizontal(|ui| {
                ui.add(TextEdit::singleline(&mut self.time_input).hint_text("2030-01-01T07:00"));
                if ui.button("schedule wake").clicked() {
                    let raw = self.time_input.clone();
                    self.controller.request_schedule(&raw);
                }
                if ui.button("cancel schedule").clicked() {
                    self.controller.request_cancel();
                }
            });
            match &scheduling {
                SchedulingStatus::Pending(at) => {
                    ui.label(format!("armed for {}", at.format("%Y-%m-%d %H:%M")));
                }
                SchedulingStatus::Failed(reason) => {
                    ui.colored_label(Color32::RED, reason);
                }
                SchedulingStatus::Unscheduled => {
                    ui.label("no alarm armed");
                }
            }

            ui.separator();
            ui.heading("alarm sound");
            ui.horizontal(|ui| {
                ui.label(sound_path.file_name().map_or_else(
                    || "no sound selected".to_string(),
                    |name| name.to_string_lossy().to_string(),
                ))
                .on_hover_text(sound_path.display().to_string());
                if ui.button("browse...").clicked() {
                    if let Some(path) = pick_sound_file() {
                        self.controller.set_sound_path(path);
                    }
                }
            });
            let mut sound_enabled = sound_enabled;
            if ui
                .checkbox(&mut sound_enabled, "ring when the alarm fires")
                .clicked()
            {
                self.controller.set_sound_enabled(sound_enabled);
            }
            ui.horizontal(|ui| {
                if ui.button("test play (max volume)").clicked() {
                    self.controller.request_play_test();
                }
                if ui.button("stop audio").clicked() {
                    self.controller.request_stop();
                }
                if playback == PlaybackStatus::Testing {
                    ui.spinner();
                    ui.label("ringing");
                }
            });

            ui.separator();
            ui.heading("night mode");
            ui.label("turn the screen black to prevent burn-in while keeping the alarm armed");
            if ui.button("enter night mode").clicked() {
                self.controller.set_night_mode(true);
            }
        });
    }
}

impl eframe::App for AlarmClock {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // drain resolved commands first so this frame renders confirmed state
        self.controller.pump();
        // keep the clock ticking and the pump running even with no input
        ctx.request_repaint_after(Duration::from_millis(200));

        ctx.set_visuals(self.config.theme.into());
        if self.controller.state().night_mode {
            self.render_night_overlay(ctx);
            return;
        }
        if self.in_config {
            self.render_settings(ctx);
        }
        self.render_header(ctx);
        self.render_status_bar(ctx);
        self.render_body(ctx);
    }
}

/// file picker for the alarm sound, starts in the user's audio directory
fn pick_sound_file() -> Option<PathBuf> {
    let file_dialog = rfd::FileDialog::new()
        .set_title("Pick alarm sound")
        .add_filter("audio", &["mp3", "wav", "aiff", "m4a", "ogg", "oga", "flac"]);
    let file_dialog = match directories::UserDirs::new()
        .and_then(|user_dirs| user_dirs.audio_dir().map(Path::to_path_buf))
    {
        Some(audio_path) => file_dialog.set_directory(audio_path),
        None => file_dialog,
    };
    file_dialog.pick_file()
}

/// next occurrence of the configured wake time, tomorrow if today's is gone
fn prefill_time(now: NaiveDateTime, wake: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(wake);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn prefill_picks_today_while_the_wake_time_is_ahead() {
        let wake = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        assert_eq!(prefill_time(at(6, 0), wake), at(7, 0));
    }

    #[test]
    fn prefill_rolls_to_tomorrow_once_the_wake_time_is_gone() {
        let wake = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let prefilled = prefill_time(at(8, 0), wake);
        assert_eq!(
            prefilled,
            NaiveDate::from_ymd_opt(2030, 1, 2)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap()
        );
    }
}
