/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use std::ops::RangeInclusive;

/// Values tuned from the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub progress: f32,
    pub displacement_strength: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            progress: 0.0,
            displacement_strength: 0.0025,
        }
    }
}

pub struct ControlSpec {
    pub label: &'static str,
    pub range: RangeInclusive<f32>,
    pub step: f64,
}

impl ControlSpec {
    pub const PROGRESS: ControlSpec = ControlSpec {
        label: "progress",
        range: 0.0..=1.0,
        step: 0.01,
    };
    pub const DISPLACEMENT: ControlSpec = ControlSpec {
        label: "displacement strength",
        range: 0.0..=0.01,
        step: 0.0001,
    };

    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    Progress(f32),
    DisplacementStrength(f32),
}

impl Settings {
    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::Progress(value) => {
                self.progress = ControlSpec::PROGRESS.clamp(value);
            }
            SettingChange::DisplacementStrength(value) => {
                self.displacement_strength = ControlSpec::DISPLACEMENT.clamp(value);
            }
        }
    }
}

fn slider(ui: &mut egui::Ui, value: &mut f32, spec: &ControlSpec) -> bool {
    ui.add(
        egui::Slider::new(value, spec.range.clone())
            .step_by(spec.step)
            .text(spec.label),
    )
    .changed()
}

/// Shows the two sliders, returning what the user changed during this frame.
pub fn show_debug_panel(egui_context: &egui::Context, settings: &Settings) -> Vec<SettingChange> {
    let mut changes = Vec::new();
    let mut edited = *settings;
    egui::Window::new("Settings")
        .resizable(false)
        .show(egui_context, |ui| {
            if slider(ui, &mut edited.progress, &ControlSpec::PROGRESS) {
                changes.push(SettingChange::Progress(edited.progress));
            }
            if slider(
                ui,
                &mut edited.displacement_strength,
                &ControlSpec::DISPLACEMENT,
            ) {
                changes.push(SettingChange::DisplacementStrength(
                    edited.displacement_strength,
                ));
            }
        });
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.progress, 0.0);
        assert_eq!(settings.displacement_strength, 0.0025);
    }

    #[test]
    fn changes_stay_in_range() {
        let mut settings = Settings::default();
        settings.apply(SettingChange::Progress(0.42));
        assert_eq!(settings.progress, 0.42);
        settings.apply(SettingChange::Progress(3.0));
        assert_eq!(settings.progress, 1.0);
        settings.apply(SettingChange::DisplacementStrength(-1.0));
        assert_eq!(settings.displacement_strength, 0.0);
    }

    #[test]
    fn panel_without_input_changes_nothing() {
        let egui_context = egui::Context::default();
        let settings = Settings::default();
        let mut changes = Vec::new();
        let _ = egui_context.run(egui::RawInput::default(), |ctx| {
            changes = show_debug_panel(ctx, &settings);
        });
        assert!(changes.is_empty());
    }
}
