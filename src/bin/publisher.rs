use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use hashtag_feed::config::AppConfig;
use hashtag_feed::mqtt::MqttHandle;
use hashtag_feed::setup::setup;
use hashtag_feed::ui::PublisherApp;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = AppConfig::load().await;
    info!("Default broker {}", config.mqtt.address());

    let (mqtt, events) = MqttHandle::spawn("publisher", config.mqtt.channel_capacity);

    info!("Starting publisher UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("MQTT Twitter - Publisher")
        .with_inner_size([560.0, 480.0])
        .with_resizable(false);

    eframe::run_native(
        "MQTT Twitter - Publisher",
        native_options,
        Box::new(|cc| Ok(Box::new(PublisherApp::new(cc, config, mqtt, events)))),
    )
    .map_err(|e| eyre!("Publisher UI failed: {}", e))?;

    Ok(())
}
