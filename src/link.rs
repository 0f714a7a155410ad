use clap::ValueEnum;
use rumqttc::{Client, MqttOptions, QoS};
use serde::Serialize;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::protocol::ByteLink;

// ---------------------------------------------------------------------------
// Link identity
// ---------------------------------------------------------------------------

/// Which end of the link this instance is. Two instances joined to the same
/// court with opposite sides form one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

// ---------------------------------------------------------------------------
// Topic helpers
// ---------------------------------------------------------------------------

struct Topics {
    court_id: String,
}

impl Topics {
    fn new(court_id: &str) -> Self {
        Self {
            court_id: court_id.to_string(),
        }
    }

    /// The single-byte payload stream published by `side`.
    fn bytes(&self, side: Side) -> String {
        format!("tennis/court/{}/{}/byte", self.court_id, side.label())
    }

    fn join(&self) -> String {
        format!("tennis/court/{}/join", self.court_id)
    }
}

/// Join notification published once on connect, so a spectator (or the other
/// player's terminal) can see who is on the court.
#[derive(Debug, Serialize)]
struct JoinMsg {
    side: &'static str,
    timestamp: u64,
}

// ---------------------------------------------------------------------------
// Events the link thread sends back to the frame loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum LinkEvent {
    /// One payload byte from the opponent, in publish order.
    Byte(u8),
    /// MQTT connection established
    Connected,
    /// MQTT connection lost
    Disconnected,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

pub struct LinkConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub court_id: String,
    pub side: Side,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            court_id: "court-1".to_string(),
            side: Side::A,
            username: None,
            password: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Link handle - returned to the frame loop
// ---------------------------------------------------------------------------

/// The frame loop's end of the transport. `ByteLink` gives the game its
/// fire-and-forget send and non-blocking receive; connection status is
/// tracked on the side as events drain through.
pub struct LinkHandle {
    rx: mpsc::Receiver<LinkEvent>,
    tx: mpsc::SyncSender<u8>,
    connected: bool,
}

impl LinkHandle {
    pub fn connected(&self) -> bool {
        self.connected
    }
}

impl ByteLink for LinkHandle {
    fn send(&mut self, byte: u8) {
        // fire-and-forget; a full queue means the link thread is gone and the
        // receive side will show Disconnected
        self.tx.try_send(byte).ok();
    }

    fn try_recv(&mut self) -> Option<u8> {
        loop {
            match self.rx.try_recv() {
                Ok(LinkEvent::Byte(byte)) => return Some(byte),
                Ok(LinkEvent::Connected) => self.connected = true,
                Ok(LinkEvent::Disconnected) => self.connected = false,
                Err(_) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Spawn the MQTT thread
// ---------------------------------------------------------------------------

pub fn connect(config: LinkConfig) -> LinkHandle {
    let (event_tx, event_rx) = mpsc::channel::<LinkEvent>();
    let (byte_tx, byte_rx) = mpsc::sync_channel::<u8>(64);

    thread::spawn(move || {
        let topics = Topics::new(&config.court_id);
        // random suffix so two instances on one broker never collide
        let client_id = format!(
            "tennis-{}-{:04x}",
            config.side.label(),
            rand::random::<u16>()
        );

        let mut mqttoptions =
            MqttOptions::new(client_id, &config.broker_host, config.broker_port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));

        if let (Some(user), Some(pass)) = (config.username, config.password) {
            mqttoptions.set_credentials(user, pass);
        }

        let (client, mut connection) = Client::new(mqttoptions, 64);

        // The opponent's byte stream is all we listen to. QoS 2 because the
        // game protocol has no framing or retransmission of its own; the
        // transport carries the in-order-exactly-once guarantee.
        client
            .subscribe(topics.bytes(config.side.peer()), QoS::ExactlyOnce)
            .ok();

        // Announce join
        let join_payload = serde_json::to_vec(&JoinMsg {
            side: config.side.label(),
            timestamp: now_ms(),
        })
        .unwrap_or_default();
        client
            .publish(topics.join(), QoS::AtMostOnce, false, join_payload)
            .ok();

        // Sub-thread forwarding outgoing bytes, one publish per byte
        let publish_client = client.clone();
        let own_topic = topics.bytes(config.side);
        thread::spawn(move || {
            while let Ok(byte) = byte_rx.recv() {
                publish_client
                    .publish(&own_topic, QoS::ExactlyOnce, false, vec![byte])
                    .ok();
            }
        });

        // Main event loop for incoming MQTT messages
        let peer_topic = topics.bytes(config.side.peer());
        for notification in connection.iter() {
            match notification {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    event_tx.send(LinkEvent::Connected).ok();
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(msg))) => {
                    if msg.topic == peer_topic && msg.payload.len() == 1 {
                        event_tx.send(LinkEvent::Byte(msg.payload[0])).ok();
                    }
                }
                Err(_) => {
                    event_tx.send(LinkEvent::Disconnected).ok();
                    break;
                }
                _ => {}
            }
        }
    });

    LinkHandle {
        rx: event_rx,
        tx: byte_tx,
        connected: false,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
