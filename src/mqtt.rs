// mqtt.rs

use std::future::Future;

use anyhow::Context;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS,
    Transport,
};
use tokio::sync::{mpsc, watch};

use crate::*;

pub const DEVICE_CLASS: &str = "temperature";
pub const VALUE_TEMPLATE: &str = "{{ value_json.temperature | round(1) }}";

const KEEP_ALIVE: Duration = Duration::from_secs(25);
const REQUEST_CAP: usize = 10;

/// Home Assistant discovery descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MqttDevice {
    pub name: String,
    pub device_class: String,
    #[serde(rename = "unit_of_measurement")]
    pub unit: String,
    pub value_template: String,
    pub state_topic: String,
    pub unique_id: String,
}

impl MqttDevice {
    pub fn new(config: &MyConfig, topics: &MqttTopics) -> Self {
        let id = format!("{}_temperature", config.mqtt.client);
        MqttDevice {
            name: id.clone(),
            device_class: DEVICE_CLASS.into(),
            unit: config.unit.label(),
            value_template: VALUE_TEMPLATE.into(),
            state_topic: topics.state.clone(),
            unique_id: id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttTopics {
    pub config: String,
    pub state: String,
}

impl MqttTopics {
    pub fn new(prefix: &str) -> Self {
        MqttTopics {
            config: format!("{prefix}/config"),
            state: format!("{prefix}/state"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    ConnectionLost,
}

#[derive(Debug, PartialEq)]
pub enum LinkEvent {
    Attempting,
    Established,
    Refused(ConnectReturnCode),
    Failed(String),
    Reconnecting,
    Lost(String),
}

pub fn mqtt_options(mqtt: &MqttConfig) -> MqttOptions {
    let mut opts = MqttOptions::new(&mqtt.client, &mqtt.broker, mqtt.port);
    opts.set_keep_alive(KEEP_ALIVE);
    opts.set_clean_session(true);
    if !mqtt.username.is_empty() {
        opts.set_credentials(&mqtt.username, &mqtt.password);
    }
    if mqtt.tls {
        opts.set_transport(Transport::tls_with_default_config());
    }
    opts
}

/// Owns the event loop for the lifetime of the process. rumqttc reconnects on
/// the next poll after an error, so retrying is just waiting and polling again.
pub async fn drive_connection(
    mut eventloop: EventLoop,
    retry: Duration,
    link: watch::Sender<LinkState>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    link.send_replace(LinkState::Connecting);
    let _ = events.send(LinkEvent::Attempting);

    loop {
        match eventloop.poll().await {
            // refused CONNACKs come back as errors
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                link.send_replace(LinkState::Connected);
                let _ = events.send(LinkEvent::Established);
            }
            Ok(_) => {}
            Err(e) => {
                let previous = link.send_replace(LinkState::ConnectionLost);
                let event = match e {
                    ConnectionError::ConnectionRefused(code) => LinkEvent::Refused(code),
                    e if previous == LinkState::Connected => LinkEvent::Lost(e.to_string()),
                    e => LinkEvent::Failed(e.to_string()),
                };
                let _ = events.send(event);

                sleep(retry).await;
                link.send_replace(LinkState::Connecting);
                let _ = events.send(LinkEvent::Reconnecting);
            }
        }
    }
}

pub async fn log_link_events(mut events: mpsc::UnboundedReceiver<LinkEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Attempting => info!("Attempting to connect to MQTT broker..."),
            LinkEvent::Established => info!("Connection to MQTT broker established."),
            LinkEvent::Refused(code) => error!("MQTT broker refused connection: {code:?}."),
            LinkEvent::Failed(e) => warn!("MQTT connection attempt failed: {e}."),
            LinkEvent::Reconnecting => info!("Attempting to reconnect to MQTT broker..."),
            LinkEvent::Lost(e) => warn!("Connection to MQTT broker unexpectedly lost: {e}."),
        }
    }
}

pub trait StatePublisher {
    fn send(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

impl StatePublisher for AsyncClient {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        Ok(self.publish(topic, QoS::AtMostOnce, false, payload).await?)
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Published(f64),
    Skipped,
    Fatal(anyhow::Error),
}

pub struct MqttSender<P> {
    state: Arc<MyState>,
    publisher: P,
    link: watch::Receiver<LinkState>,
    topics: MqttTopics,
    descriptor: Vec<u8>,
}

impl<P: StatePublisher> MqttSender<P> {
    /// Fails only if the descriptor cannot be serialized.
    pub fn new(
        state: Arc<MyState>,
        publisher: P,
        link: watch::Receiver<LinkState>,
    ) -> anyhow::Result<Self> {
        let topics = MqttTopics::new(&state.config.mqtt.topic);
        let device = MqttDevice::new(&state.config, &topics);
        let descriptor =
            serde_json::to_vec(&device).context("Could not serialize MQTT device descriptor")?;

        Ok(MqttSender {
            state,
            publisher,
            link,
            topics,
            descriptor,
        })
    }

    pub fn topics(&self) -> &MqttTopics {
        &self.topics
    }

    pub async fn cycle(&self) -> CycleOutcome {
        if *self.link.borrow() != LinkState::Connected {
            debug!("MQTT not connected, skipping publish.");
            return CycleOutcome::Skipped;
        }

        let config = &self.state.config;
        let (json, temperature) = match json_report(config, &config.mqtt.client) {
            Ok(r) => r,
            Err(e) => {
                error!("Could not read temperature: {e}.");
                return CycleOutcome::Skipped;
            }
        };

        if let Err(e) = self
            .publisher
            .send(&self.topics.config, self.descriptor.clone())
            .await
        {
            return self.publish_failed(&self.topics.config, e);
        }

        if let Err(e) = self
            .publisher
            .send(&self.topics.state, json.into_bytes())
            .await
        {
            return self.publish_failed(&self.topics.state, e);
        }

        let cnt = self.state.mqtt_cnt.fetch_add(1, Ordering::Relaxed);
        info!(
            "#{cnt} Reported to MQTT broker {broker:?} on {topic:?}, temperature {temperature:.3} {unit}.",
            broker = config.mqtt.broker,
            topic = self.topics.state,
            unit = config.unit,
        );
        CycleOutcome::Published(temperature)
    }

    fn publish_failed(&self, topic: &str, e: PublishError) -> CycleOutcome {
        match e {
            PublishError::Rejected(_) => {
                error!("MQTT publish error on {topic:?}: {e}");
                CycleOutcome::Skipped
            }
            PublishError::Closed => CycleOutcome::Fatal(anyhow::Error::new(e)),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let interval = self.state.config.mqtt.interval;
        loop {
            if let CycleOutcome::Fatal(e) = self.cycle().await {
                return Err(e.context("MQTT sender stopped"));
            }
            sleep(interval).await;
        }
    }
}

pub async fn run_mqtt(state: Arc<MyState>) -> anyhow::Result<()> {
    let mqtt = &state.config.mqtt;
    info!(
        "MQTT enabled (broker: {:?}, port {}, TLS: {}, username: {:?}, topic prefix: {:?}).",
        mqtt.broker, mqtt.port, mqtt.tls, mqtt.username, mqtt.topic
    );

    let (client, eventloop) = AsyncClient::new(mqtt_options(mqtt), REQUEST_CAP);
    let (link_tx, link_rx) = watch::channel(LinkState::Disconnected);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let sender = MqttSender::new(state.clone(), client, link_rx)?;

    tokio::spawn(log_link_events(event_rx));
    tokio::spawn(drive_connection(eventloop, mqtt.interval, link_tx, event_tx));

    sender.run().await
}


// EOF
