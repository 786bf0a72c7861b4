//! # UI Common Components and Utilities
//!
//! Widgets and styling shared by the publisher and subscriber windows: the
//! broker connection row, the scrolling log area and the warning dialog.

use eframe::egui::{self, Color32, Frame, Id, Modal, RichText, ScrollArea, Stroke, Ui};

use crate::connection::ConnectionPanel;
use crate::error::TweetError;
use crate::feed::ActivityLog;
use crate::mqtt::{ConnectionState, MqttStatus};

/// Centralized color palette for the dark theme.
pub struct UiColors;

impl UiColors {
    /// Background of log and feed areas (RGB: 20, 20, 20)
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected (RGB: 50, 200, 20) - Green
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Connecting (RGB: 230, 150, 20) - Orange
    pub const PENDING: Color32 = Color32::from_rgb(230, 150, 20);

    /// Disconnected or failed (RGB: 200, 50, 20) - Red
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Status label text and color for a connection state.
///
/// `error_target` names the area holding the error text, "log" or "feed".
pub fn status_label(state: ConnectionState, error_target: &str) -> (String, Color32) {
    match state {
        ConnectionState::Disconnected => ("Status: Disconnected".to_string(), UiColors::INACTIVE),
        ConnectionState::Connecting => ("Status: Connecting...".to_string(), UiColors::PENDING),
        ConnectionState::Connected => ("Status: Connected".to_string(), UiColors::ACTIVE),
        ConnectionState::Failed => (
            format!("Status: Error, see {}", error_target),
            UiColors::INACTIVE,
        ),
    }
}

/// Renders the "Broker Connection" group. Returns true when the connect
/// button was clicked.
pub fn connection_group(
    ui: &mut Ui,
    panel: &mut ConnectionPanel,
    stats: &MqttStatus,
    error_target: &str,
) -> bool {
    let mut clicked = false;
    ui.group(|ui| {
        ui.label(RichText::new("Broker Connection").strong());
        ui.horizontal(|ui| {
            let editable = matches!(
                panel.state(),
                ConnectionState::Disconnected | ConnectionState::Failed
            );
            ui.label("Broker:");
            ui.add_enabled(
                editable,
                egui::TextEdit::singleline(&mut panel.host).desired_width(200.0),
            );
            ui.label("Port:");
            ui.add_enabled(
                editable,
                egui::TextEdit::singleline(&mut panel.port).desired_width(60.0),
            );
            clicked = ui.button(panel.button_label()).clicked();
        });
        let (text, color) = status_label(panel.state(), error_target);
        ui.horizontal(|ui| {
            ui.colored_label(color, text);
            ui.weak(format!(
                "sent {} / received {}",
                stats.messages_sent, stats.messages_received
            ));
        });
    });
    clicked
}

/// Scrolling, read-only view of a log, pinned to the newest line.
pub fn log_area(ui: &mut Ui, id: &str, log: &ActivityLog) {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::EXTREME_BG)
        .inner_margin(4)
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            ScrollArea::vertical()
                .id_salt(id)
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for line in log.lines() {
                        ui.add(egui::Label::new(RichText::new(line).monospace()).wrap());
                    }
                });
        });
}

/// Shows `warning` in a modal dialog until it is dismissed.
pub fn warning_modal(ctx: &egui::Context, warning: &mut Option<TweetError>) {
    let Some(err) = warning.as_ref() else {
        return;
    };

    let mut dismissed = false;
    let response = Modal::new(Id::new("warning_modal")).show(ctx, |ui| {
        ui.set_width(280.0);
        ui.heading(err.title());
        ui.label(err.to_string());
        ui.separator();
        if ui.button("OK").clicked() {
            dismissed = true;
        }
    });

    if dismissed || response.should_close() {
        *warning = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_state_points_at_error_area() {
        let (text, color) = status_label(ConnectionState::Failed, "feed");
        assert_eq!(text, "Status: Error, see feed");
        assert_eq!(color, UiColors::INACTIVE);
        assert_eq!(
            status_label(ConnectionState::Connected, "log").1,
            UiColors::ACTIVE
        );
    }
}
