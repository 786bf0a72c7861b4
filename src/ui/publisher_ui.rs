//! Publisher window: connect to a broker and post tweets to a hashtag.

use eframe::egui::{self, RichText, TextEdit, Ui};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::common::{connection_group, log_area, warning_modal};
use crate::config::AppConfig;
use crate::connection::ConnectionPanel;
use crate::error::TweetError;
use crate::feed::ActivityLog;
use crate::mqtt::{MqttCommand, MqttEvent, MqttHandle};
use crate::publisher::{published_line, PublisherForm};

pub struct PublisherApp {
    config: AppConfig,
    mqtt: MqttHandle,
    events: mpsc::Receiver<MqttEvent>,
    connection: ConnectionPanel,
    form: PublisherForm,
    log: ActivityLog,
    warning: Option<TweetError>,
}

impl PublisherApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        mqtt: MqttHandle,
        events: mpsc::Receiver<MqttEvent>,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        PublisherApp {
            connection: ConnectionPanel::new(&config.mqtt),
            form: PublisherForm::with_username(config.default_username.clone()),
            log: ActivityLog::with_limit(config.feed_limit),
            config,
            mqtt,
            events,
            warning: None,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            debug!("Publisher got {:?}", event);
            if let Some(line) = self.connection.apply(&event) {
                self.log.push(line);
            }
            if let MqttEvent::Published { topic, payload } = event {
                self.log.push(published_line(&topic, &payload));
                self.form.clear_text();
            }
        }
    }

    fn send(&mut self, command: MqttCommand) {
        if let Err(e) = self.mqtt.send(command) {
            error!("Could not reach MQTT worker: {}", e);
            self.log.push(e.to_string());
        }
    }

    fn toggle_connection(&mut self) {
        match self.connection.toggle(&self.config.mqtt) {
            Ok((command, line)) => {
                info!("{}", line);
                self.log.push(line);
                self.send(command);
            }
            Err(e) => self.warning = Some(e),
        }
    }

    fn publish(&mut self) {
        match self.form.prepare(self.connection.is_connected()) {
            Ok(request) => self.send(request.into_command()),
            Err(e) => self.warning = Some(e),
        }
    }

    fn publish_group(&mut self, ui: &mut Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Publish Tweet").strong());
            egui::Grid::new("publish_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Username:");
                    ui.add(TextEdit::singleline(&mut self.form.username).desired_width(200.0));
                    ui.end_row();

                    ui.label("Hashtag:");
                    ui.horizontal(|ui| {
                        ui.add(
                            TextEdit::singleline(&mut self.form.hashtag).desired_width(200.0),
                        );
                        ui.label("(e.g., #iot or iot)");
                    });
                    ui.end_row();

                    ui.label("Tweet:");
                    ui.add(
                        TextEdit::multiline(&mut self.form.text)
                            .desired_rows(5)
                            .desired_width(360.0),
                    );
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Publish Tweet").clicked() {
                        self.publish();
                    }
                });
            });
        });
    }
}

impl eframe::App for PublisherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        ctx.request_repaint_after(Duration::from_millis(100));

        egui::CentralPanel::default().show(ctx, |ui| {
            let stats = self.mqtt.status();
            if connection_group(ui, &mut self.connection, &stats, "log") {
                self.toggle_connection();
            }
            ui.add_space(8.0);
            self.publish_group(ui);
            ui.add_space(8.0);
            ui.label(RichText::new("Log").strong());
            log_area(ui, "publisher_log", &self.log);
        });

        warning_modal(ctx, &mut self.warning);
    }
}

