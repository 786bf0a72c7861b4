//! MQTT worker task.
//!
//! The forms never touch rumqttc directly. They push [`MqttCommand`]s into an
//! [`MqttHandle`] and drain [`MqttEvent`]s once per frame, so a slow broker can
//! never stall the UI thread.
//!
//! The worker is a two-state machine:
//!
//! ```text
//! Idle ──Connect──▶ Online ──Disconnect / error / broker DISCONNECT──▶ Idle
//! ```
//!
//! While `Online` it selects over incoming commands and the rumqttc event loop.
//! There is no automatic reconnect: a dropped connection is reported and the
//! worker waits for the next `Connect`.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use statum::{machine, state};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{clamp_capacity, MqttConfig};
use super::message_manager::{MqttCommand, MqttEvent, MqttMessage};
use crate::error::MqttError;

/// How long a disconnect waits for the DISCONNECT packet to leave the socket.
const DISCONNECT_FLUSH: Duration = Duration::from_secs(1);

/// Number of recent errors kept in [`MqttStatus`].
const MAX_ERRORS: usize = 20;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Snapshot of the worker, published through a watch channel.
#[derive(Clone, Debug, Default)]
pub struct MqttStatus {
    pub connection_state: ConnectionState,
    pub error_messages: Vec<String>,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub last_activity: Option<DateTime<Local>>,
}

impl MqttStatus {
    fn record_error(&mut self, message: &str) {
        self.error_messages.push(message.to_string());
        if self.error_messages.len() > MAX_ERRORS {
            let overflow = self.error_messages.len() - MAX_ERRORS;
            self.error_messages.drain(..overflow);
        }
    }

    fn touch(&mut self) {
        self.last_activity = Some(Local::now());
    }
}

struct Link {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Link { .. }")
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Close,
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    Online,
}

#[machine]
#[derive(Debug)]
pub struct MqttSession<S: SessionState> {
    // Used in the client id, "publisher" or "subscriber"
    role: String,

    commands: mpsc::Receiver<MqttCommand>,
    events: mpsc::Sender<MqttEvent>,
    status: watch::Sender<MqttStatus>,
    cancel: CancellationToken,

    // Present while Online
    link: Option<Link>,
}

impl<S: SessionState> MqttSession<S> {
    fn emit(&self, event: MqttEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Event queue full, dropping {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped");
            }
        }
    }

    fn update_status(&self, update: impl FnOnce(&mut MqttStatus)) {
        self.status.send_modify(update);
    }

    fn set_state(&self, state: ConnectionState) {
        self.update_status(|status| {
            status.connection_state = state;
            status.touch();
        });
    }

    fn report_error(&self, message: String) {
        error!("{}", message);
        self.update_status(|status| status.record_error(&message));
        self.emit(MqttEvent::Error(message));
    }

    fn report_connection_failure(&self, message: String) {
        error!("{}", message);
        self.update_status(|status| {
            status.connection_state = ConnectionState::Failed;
            status.record_error(&message);
            status.touch();
        });
        self.emit(MqttEvent::ConnectionFailed(message));
    }
}

impl MqttSession<Idle> {
    pub fn create(
        role: &str,
        commands: mpsc::Receiver<MqttCommand>,
        events: mpsc::Sender<MqttEvent>,
        status: watch::Sender<MqttStatus>,
        cancel: CancellationToken,
    ) -> Self {
        Self::new(role.to_string(), commands, events, status, cancel, None)
    }

    /// Waits for a `Connect` command and opens the client.
    ///
    /// Returns `None` once the handle is dropped or cancelled.
    pub async fn wait_for_connect(mut self) -> Option<MqttSession<Online>> {
        loop {
            let command = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                command = self.commands.recv() => command?,
            };

            match command {
                MqttCommand::Connect(config) => {
                    self.open_link(&config);
                    return Some(self.transition());
                }
                MqttCommand::Disconnect => {
                    self.set_state(ConnectionState::Disconnected);
                    self.emit(MqttEvent::Disconnected);
                }
                other => {
                    warn!("Dropping {:?} while disconnected", other);
                    self.report_error(format!("Not connected, dropped {}", describe(&other)));
                }
            }
        }
    }

    fn open_link(&mut self, config: &MqttConfig) {
        info!("Connecting to {} as {}", config.address(), self.role);
        let mut options = MqttOptions::new(
            config.client_id(&self.role),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        let (client, eventloop) = AsyncClient::new(options, config.capacity());
        self.link = Some(Link { client, eventloop });
        self.set_state(ConnectionState::Connecting);
    }
}

impl MqttSession<Online> {
    /// Drives the connection until it closes.
    ///
    /// Returns the idle session for the next connect, or `None` on shutdown.
    pub async fn run(mut self) -> Option<MqttSession<Idle>> {
        loop {
            let step = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.close_link().await;
                    return None;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.close_link().await;
                        return None;
                    }
                },
                event = poll_link(&mut self.link) => self.handle_event(event),
            };

            if step == Step::Close {
                self.link = None;
                debug!("Connection closed, waiting for next connect");
                return Some(self.transition());
            }
        }
    }

    async fn handle_command(&mut self, command: MqttCommand) -> Step {
        let Some(link) = self.link.as_ref() else {
            return Step::Close;
        };

        match command {
            MqttCommand::Connect(config) => {
                warn!("Ignoring connect to {} while online", config.address());
                self.report_error("Already connected, disconnect first.".to_string());
                Step::Continue
            }
            MqttCommand::Disconnect => {
                self.close_link().await;
                self.set_state(ConnectionState::Disconnected);
                self.emit(MqttEvent::Disconnected);
                Step::Close
            }
            MqttCommand::Publish { topic, payload } => {
                match link.client.try_publish(
                    topic.clone(),
                    QoS::AtMostOnce,
                    false,
                    payload.clone().into_bytes(),
                ) {
                    Ok(()) => {
                        debug!("Queued publish to {}", topic);
                        self.update_status(|status| {
                            status.messages_sent += 1;
                            status.touch();
                        });
                        self.emit(MqttEvent::Published { topic, payload });
                    }
                    Err(e) => self.report_error(format!("Publish error: {}", e)),
                }
                Step::Continue
            }
            MqttCommand::Subscribe(topic) => {
                match link.client.try_subscribe(topic.clone(), QoS::AtMostOnce) {
                    Ok(()) => self.emit(MqttEvent::Subscribed(topic)),
                    Err(e) => self.report_error(format!("Subscribe error for '{}': {}", topic, e)),
                }
                Step::Continue
            }
            MqttCommand::Unsubscribe(topic) => {
                match link.client.try_unsubscribe(topic.clone()) {
                    Ok(()) => self.emit(MqttEvent::Unsubscribed(topic)),
                    Err(e) => {
                        self.report_error(format!("Unsubscribe error for '{}': {}", topic, e))
                    }
                }
                Step::Continue
            }
        }
    }

    fn handle_event(&mut self, event: Result<Event, ConnectionError>) -> Step {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("Connected to broker");
                    self.set_state(ConnectionState::Connected);
                    self.emit(MqttEvent::Connected);
                    Step::Continue
                } else {
                    self.report_connection_failure(format!(
                        "Failed to connect. Code: {:?}",
                        ack.code
                    ));
                    Step::Close
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = MqttMessage::from_payload(publish.topic.clone(), &publish.payload);
                debug!("Received message on {}", message.topic);
                self.update_status(|status| {
                    status.messages_received += 1;
                    status.touch();
                });
                self.emit(MqttEvent::Message(message));
                Step::Continue
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                info!("Broker closed the session");
                self.set_state(ConnectionState::Disconnected);
                self.emit(MqttEvent::Disconnected);
                Step::Close
            }
            Ok(other) => {
                debug!("MQTT event: {:?}", other);
                Step::Continue
            }
            Err(ConnectionError::ConnectionRefused(code)) => {
                self.report_connection_failure(format!("Failed to connect. Code: {:?}", code));
                Step::Close
            }
            Err(e) => {
                self.report_connection_failure(format!("Connection failed: {}", e));
                Step::Close
            }
        }
    }

    async fn close_link(&mut self) {
        let Some(mut link) = self.link.take() else {
            return;
        };

        if let Err(e) = link.client.try_disconnect() {
            debug!("Disconnect request failed: {}", e);
            return;
        }

        // DISCONNECT is only written while the event loop is polled
        let flushed = tokio::time::timeout(DISCONNECT_FLUSH, async {
            loop {
                match link.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;

        if flushed.is_err() {
            debug!("Timed out flushing DISCONNECT");
        }
    }
}

async fn poll_link(link: &mut Option<Link>) -> Result<Event, ConnectionError> {
    match link {
        Some(link) => link.eventloop.poll().await,
        None => std::future::pending().await,
    }
}

fn describe(command: &MqttCommand) -> String {
    match command {
        MqttCommand::Connect(config) => format!("connect to {}", config.address()),
        MqttCommand::Disconnect => "disconnect".to_string(),
        MqttCommand::Publish { topic, .. } => format!("publish to '{}'", topic),
        MqttCommand::Subscribe(topic) => format!("subscribe to '{}'", topic),
        MqttCommand::Unsubscribe(topic) => format!("unsubscribe from '{}'", topic),
    }
}

async fn run_session(mut session: MqttSession<Idle>) {
    info!("MQTT worker started");
    loop {
        let Some(online) = session.wait_for_connect().await else {
            break;
        };
        match online.run().await {
            Some(idle) => session = idle,
            None => break,
        }
    }
    info!("MQTT worker stopped");
}

/// Owner side of the worker task. Dropping it stops the worker.
pub struct MqttHandle {
    commands: mpsc::Sender<MqttCommand>,
    status: watch::Receiver<MqttStatus>,
    cancel: CancellationToken,
}

impl MqttHandle {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// `role` ends up in the client id. `capacity` is clamped like
    /// [`MqttConfig::capacity`]. The returned receiver yields every
    /// [`MqttEvent`] the worker produces.
    pub fn spawn(role: &str, capacity: usize) -> (Self, mpsc::Receiver<MqttEvent>) {
        let capacity = clamp_capacity(capacity);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        // Incoming messages can arrive in bursts between two frames
        let (event_tx, event_rx) = mpsc::channel(capacity * 4);
        let (status_tx, status_rx) = watch::channel(MqttStatus::default());
        let cancel = CancellationToken::new();

        let session = MqttSession::create(role, command_rx, event_tx, status_tx, cancel.clone());
        let task_handle = tokio::spawn(run_session(session));
        debug!("MQTT worker spawned with handle: {:?}", task_handle);

        (
            Self {
                commands: command_tx,
                status: status_rx,
                cancel,
            },
            event_rx,
        )
    }

    pub fn send(&self, command: MqttCommand) -> Result<(), MqttError> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MqttError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => MqttError::WorkerGone,
        })
    }

    pub fn status(&self) -> MqttStatus {
        self.status.borrow().clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for MqttHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(10);

    async fn next_event(events: &mut mpsc::Receiver<MqttEvent>) -> MqttEvent {
        timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("worker dropped event channel")
    }

    #[tokio::test]
    async fn publish_while_idle_is_reported() {
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        handle
            .send(MqttCommand::Publish {
                topic: "twitter/iot".to_string(),
                payload: "alice: hi".to_string(),
            })
            .unwrap();

        match next_event(&mut events).await {
            MqttEvent::Error(message) => {
                assert_eq!(message, "Not connected, dropped publish to 'twitter/iot'")
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(handle.status().error_messages.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_while_idle_confirms() {
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        handle.send(MqttCommand::Disconnect).unwrap();
        assert_eq!(next_event(&mut events).await, MqttEvent::Disconnected);
        assert_eq!(
            handle.status().connection_state,
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn refused_connection_is_reported_and_worker_recovers() {
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        // Nothing listens on port 1
        let config = MqttConfig::default().with_broker("127.0.0.1", 1);
        handle.send(MqttCommand::Connect(config)).unwrap();

        match next_event(&mut events).await {
            MqttEvent::ConnectionFailed(message) => {
                assert!(message.starts_with("Connection failed"))
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(handle.status().connection_state, ConnectionState::Failed);

        // Back in Idle: publishing is rejected locally again
        handle
            .send(MqttCommand::Subscribe("twitter/iot".to_string()))
            .unwrap();
        match next_event(&mut events).await {
            MqttEvent::Error(message) => assert!(message.starts_with("Not connected")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    /// Reads one MQTT packet, returning the fixed header byte and the body.
    async fn read_packet(socket: &mut TcpStream) -> (u8, Vec<u8>) {
        let header = socket.read_u8().await.unwrap();
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let byte = socket.read_u8().await.unwrap();
            len |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0; len];
        socket.read_exact(&mut body).await.unwrap();
        (header, body)
    }

    /// Accepts the worker's TCP connection and answers its CONNECT.
    async fn accept_with_connack(listener: &TcpListener, code: u8) -> TcpStream {
        let (mut socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (header, _) = timeout(WAIT, read_packet(&mut socket)).await.unwrap();
        assert_eq!(header, 0x10);
        socket.write_all(&[0x20, 0x02, 0x00, code]).await.unwrap();
        socket
    }

    async fn local_broker() -> (TcpListener, MqttConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = MqttConfig::default().with_broker("127.0.0.1", port);
        (listener, config)
    }

    #[tokio::test]
    async fn online_session_round_trip() {
        let (listener, config) = local_broker().await;
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        handle.send(MqttCommand::Connect(config)).unwrap();

        let mut socket = accept_with_connack(&listener, 0x00).await;
        assert_eq!(next_event(&mut events).await, MqttEvent::Connected);
        assert_eq!(handle.status().connection_state, ConnectionState::Connected);

        // QoS 0 PUBLISH on twitter/iot with an invalid UTF-8 byte
        let mut frame = vec![0x30, 16, 0x00, 11];
        frame.extend_from_slice(b"twitter/iot");
        frame.extend_from_slice(b"hi\xff");
        socket.write_all(&frame).await.unwrap();
        match next_event(&mut events).await {
            MqttEvent::Message(message) => {
                assert_eq!(message.topic, "twitter/iot");
                assert_eq!(message.content, "hi\u{FFFD}");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(handle.status().messages_received, 1);

        handle
            .send(MqttCommand::Publish {
                topic: "twitter/iot".to_string(),
                payload: "alice: hi".to_string(),
            })
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            MqttEvent::Published {
                topic: "twitter/iot".to_string(),
                payload: "alice: hi".to_string(),
            }
        );
        let (header, body) = timeout(WAIT, read_packet(&mut socket)).await.unwrap();
        // PUBLISH, QoS 0, retain and dup cleared
        assert_eq!(header, 0x30);
        assert_eq!(&body[..2], &[0x00, 11]);
        assert_eq!(&body[2..13], b"twitter/iot");
        assert_eq!(&body[13..], b"alice: hi");

        handle.send(MqttCommand::Disconnect).unwrap();
        let (header, _) = timeout(WAIT, read_packet(&mut socket)).await.unwrap();
        assert_eq!(header, 0xE0);
        assert_eq!(next_event(&mut events).await, MqttEvent::Disconnected);
        assert_eq!(
            handle.status().connection_state,
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn rejected_connack_is_reported() {
        let (listener, config) = local_broker().await;
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        handle.send(MqttCommand::Connect(config)).unwrap();

        // Return code 5: not authorized
        let _socket = accept_with_connack(&listener, 0x05).await;
        assert_eq!(
            next_event(&mut events).await,
            MqttEvent::ConnectionFailed("Failed to connect. Code: NotAuthorized".to_string())
        );
        assert_eq!(handle.status().connection_state, ConnectionState::Failed);
    }

    #[tokio::test]
    async fn oversized_capacity_still_spawns() {
        let (handle, mut events) = MqttHandle::spawn("test", usize::MAX);
        handle.send(MqttCommand::Disconnect).unwrap();
        assert_eq!(next_event(&mut events).await, MqttEvent::Disconnected);
    }

    #[tokio::test]
    async fn shutdown_stops_worker() {
        let (handle, mut events) = MqttHandle::spawn("test", 8);
        handle.shutdown();

        // Worker exit drops the event sender
        let closed = timeout(WAIT, events.recv()).await.unwrap();
        assert!(closed.is_none());
        assert!(matches!(
            handle.send(MqttCommand::Disconnect),
            Err(MqttError::WorkerGone)
        ));
    }

    #[test]
    fn error_history_is_bounded() {
        let mut status = MqttStatus::default();
        for i in 0..(MAX_ERRORS + 5) {
            status.record_error(&format!("error {}", i));
        }
        assert_eq!(status.error_messages.len(), MAX_ERRORS);
        assert_eq!(status.error_messages[0], "error 5");
    }
}
