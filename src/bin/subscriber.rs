use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use hashtag_feed::config::AppConfig;
use hashtag_feed::mqtt::MqttHandle;
use hashtag_feed::setup::setup;
use hashtag_feed::ui::SubscriberApp;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = AppConfig::load().await;
    info!("Default broker {}", config.mqtt.address());

    let (mqtt, events) = MqttHandle::spawn("subscriber", config.mqtt.channel_capacity);

    info!("Starting subscriber UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("MQTT Twitter - Subscriber")
        .with_inner_size([680.0, 560.0])
        .with_resizable(false);

    eframe::run_native(
        "MQTT Twitter - Subscriber",
        native_options,
        Box::new(|cc| Ok(Box::new(SubscriberApp::new(cc, config, mqtt, events)))),
    )
    .map_err(|e| eyre!("Subscriber UI failed: {}", e))?;

    Ok(())
}
