//! Subscriber window: follow hashtags and watch the live feed.

use eframe::egui::{self, Frame, RichText, ScrollArea, Stroke, TextEdit, Ui};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::common::{connection_group, log_area, warning_modal, UiColors};
use crate::config::AppConfig;
use crate::connection::ConnectionPanel;
use crate::error::TweetError;
use crate::feed::ActivityLog;
use crate::hashtag::Hashtag;
use crate::mqtt::{MqttCommand, MqttEvent, MqttHandle};
use crate::subscriber::{subscribed_line, unsubscribed_line, Followup, SubscriptionBook};

pub struct SubscriberApp {
    config: AppConfig,
    mqtt: MqttHandle,
    events: mpsc::Receiver<MqttEvent>,
    connection: ConnectionPanel,
    book: SubscriptionBook,
    hashtag_entry: String,
    selected: Option<Hashtag>,
    feed: ActivityLog,
    warning: Option<TweetError>,
}

impl SubscriberApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        mqtt: MqttHandle,
        events: mpsc::Receiver<MqttEvent>,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        SubscriberApp {
            connection: ConnectionPanel::new(&config.mqtt),
            feed: ActivityLog::with_limit(config.feed_limit),
            config,
            mqtt,
            events,
            book: SubscriptionBook::default(),
            hashtag_entry: String::new(),
            selected: None,
            warning: None,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            debug!("Subscriber got {:?}", event);
            if let Some(line) = self.connection.apply(&event) {
                self.feed.push(line);
            }
            match event {
                MqttEvent::Connected => {
                    for command in self.book.resubscribe_all() {
                        self.send(command);
                    }
                }
                MqttEvent::Subscribed(topic) => self.feed.push(subscribed_line(&topic)),
                MqttEvent::Unsubscribed(topic) => self.feed.push(unsubscribed_line(&topic)),
                MqttEvent::Message(message) => self.feed.push_message(&message),
                _ => {}
            }
        }
    }

    fn send(&mut self, command: MqttCommand) {
        if let Err(e) = self.mqtt.send(command) {
            error!("Could not reach MQTT worker: {}", e);
            self.feed.push(e.to_string());
        }
    }

    fn follow_up(&mut self, followup: Followup) {
        match followup {
            Followup::Command(command) => self.send(command),
            Followup::Note(line) => self.feed.push(line),
        }
    }

    fn toggle_connection(&mut self) {
        match self.connection.toggle(&self.config.mqtt) {
            Ok((command, line)) => {
                info!("{}", line);
                self.feed.push(line);
                self.send(command);
            }
            Err(e) => self.warning = Some(e),
        }
    }

    fn subscribe(&mut self) {
        let connected = self.connection.is_connected();
        match self.book.subscribe(&self.hashtag_entry, connected) {
            Ok(followup) => self.follow_up(followup),
            Err(e) => self.warning = Some(e),
        }
    }

    fn unsubscribe(&mut self) {
        let connected = self.connection.is_connected();
        let selected = self.selected.take();
        match self
            .book
            .unsubscribe(selected.as_ref(), &self.hashtag_entry, connected)
        {
            Ok(followup) => self.follow_up(followup),
            Err(e) => self.warning = Some(e),
        }
    }

    fn subscription_group(&mut self, ui: &mut Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Hashtag Subscription").strong());
            ui.horizontal(|ui| {
                ui.label("Hashtag:");
                ui.add(
                    TextEdit::singleline(&mut self.hashtag_entry)
                        .hint_text("(e.g., #iot or iot)")
                        .desired_width(220.0),
                );
                if ui.button("Subscribe").clicked() {
                    self.subscribe();
                }
                if ui.button("Unsubscribe").clicked() {
                    self.unsubscribe();
                }
            });
        });
    }

    fn subscribed_list(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Subscribed Hashtags").strong());
        Frame::new()
            .stroke(Stroke::new(1.0, UiColors::BORDER))
            .inner_margin(4)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("subscribed_list")
                    .max_height(90.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        for tag in self.book.tags() {
                            let is_selected = self.selected.as_ref() == Some(tag);
                            if ui.selectable_label(is_selected, tag.to_string()).clicked() {
                                self.selected = if is_selected { None } else { Some(tag.clone()) };
                            }
                        }
                    });
            });
    }
}

impl eframe::App for SubscriberApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        ctx.request_repaint_after(Duration::from_millis(100));

        egui::CentralPanel::default().show(ctx, |ui| {
            let stats = self.mqtt.status();
            if connection_group(ui, &mut self.connection, &stats, "feed") {
                self.toggle_connection();
            }
            ui.add_space(8.0);
            self.subscription_group(ui);
            ui.add_space(8.0);
            self.subscribed_list(ui);
            ui.add_space(8.0);
            ui.label(RichText::new("Live Tweet Feed").strong());
            log_area(ui, "subscriber_feed", &self.feed);
        });

        warning_modal(ctx, &mut self.warning);
    }
}
