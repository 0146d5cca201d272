//! Subscriber for external trigger topics (door and button sensors).
//!
//! Messages on the configured topics are handed to a [`MessageHandler`];
//! the shipped handler only logs them. Nothing here feeds back into the
//! playback loops — a future handler can hold a command sender and map
//! topics onto transport commands without touching this loop.

use playdeck_core::BrokerConfig;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub trait MessageHandler: Send + Sync {
    fn on_message(&self, topic: &str, payload: &[u8]);
}

/// Default handler: log the payload and do nothing else.
pub struct LogHandler;

impl MessageHandler for LogHandler {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        info!(%topic, payload = %String::from_utf8_lossy(payload), "message arrived");
    }
}

/// Runs the subscription until `shutdown` flips. Connection loss is waited
/// out and the session re-established; a single topic failing to subscribe
/// does not stop the others.
pub async fn run_ingress(
    cfg: BrokerConfig,
    handler: Arc<dyn MessageHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut options = MqttOptions::new(cfg.client_id.clone(), cfg.host.clone(), cfg.port);
    options.set_keep_alive(KEEP_ALIVE);
    let (client, mut eventloop) = AsyncClient::new(options, 16);

    let wanted: HashSet<String> = cfg.topics.iter().cloned().collect();

    loop {
        if *shutdown.borrow() {
            break;
        }
        let event = tokio::select! {
            ev = eventloop.poll() => ev,
            _ = shutdown.changed() => break,
        };
        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(broker = %cfg.address(), "connected to broker");
                // The broker forgets our subscriptions across reconnects.
                subscribe_all(&client, &cfg.topics).await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                deliver(&wanted, handler.as_ref(), &publish.topic, &publish.payload);
            }
            Ok(event) => {
                debug!(?event, "broker event");
            }
            Err(err) => {
                warn!(error = %err, "broker connection lost; retrying");
                let stopped = tokio::select! {
                    _ = tokio::time::sleep(RECONNECT_DELAY) => false,
                    changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
                };
                if stopped {
                    break;
                }
            }
        }
    }
    debug!("ingress stopped");
}

async fn subscribe_all(client: &AsyncClient, topics: &[String]) {
    for topic in topics {
        match client.subscribe(topic.clone(), QoS::AtLeastOnce).await {
            Ok(()) => info!(%topic, "subscribed"),
            Err(err) => warn!(%topic, error = %err, "subscribe failed; continuing with remaining topics"),
        }
    }
}

fn deliver(wanted: &HashSet<String>, handler: &dyn MessageHandler, topic: &str, payload: &[u8]) {
    if wanted.contains(topic) {
        handler.on_message(topic, payload);
    }
}
