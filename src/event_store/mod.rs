// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::error::AuctionError;
use crate::feed::FeedSignal;
use crate::message_broker::{KafkaConsumer, KafkaProducer};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Event Model
/// Row of the `auction_events` log, written in the same transaction as the change it
/// describes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub auction_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: i64,
}

impl StoredEvent {
    pub fn new(
        event: &AuctionEvent,
        timestamp: chrono::DateTime<chrono::Utc>,
        version: i64,
    ) -> Result<Self, AuctionError> {
        Ok(Self {
            auction_id: event.auction_id(),
            event_type: event.event_type().to_string(),
            data: serde_json::to_value(event)?,
            timestamp,
            version,
        })
    }
}
// endregion: --- Event Model

// region:    --- Event Publisher
/// Change stream fed by the stores after each committed write.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AuctionError>;
}

/// Delivers events straight to in-process feed subscribers.
pub struct BroadcastPublisher {
    signals: broadcast::Sender<FeedSignal>,
}

impl BroadcastPublisher {
    pub fn new(signals: broadcast::Sender<FeedSignal>) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AuctionError> {
        // No live subscription is not an error.
        if self.signals.send(FeedSignal::Changed(event.clone())).is_err() {
            debug!("{:<12} --> no subscribers for {}", "Publisher", event.event_type());
        }
        Ok(())
    }
}

/// Publishes events to Kafka, keyed by auction id so one auction's updates stay ordered.
pub struct KafkaPublisher {
    kafka_producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(kafka_producer: Arc<KafkaProducer>, topic: impl Into<String>) -> Self {
        Self {
            kafka_producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AuctionError> {
        let payload = serde_json::to_string(event)?;
        self.kafka_producer
            .send_message(&self.topic, &event.auction_id().to_string(), &payload)
            .await
            .map_err(AuctionError::Store)
    }
}
// endregion: --- Event Publisher

// region:    --- Event Consumer
/// Relays events from Kafka into the in-process feed channel.
pub struct EventConsumer {
    kafka_consumer: Arc<KafkaConsumer>,
    signals: broadcast::Sender<FeedSignal>,
}

impl EventConsumer {
    pub fn new(kafka_consumer: Arc<KafkaConsumer>, signals: broadcast::Sender<FeedSignal>) -> Self {
        EventConsumer {
            kafka_consumer,
            signals,
        }
    }

    pub async fn start(&self, topic: &str) {
        let signals = self.signals.clone();
        if let Err(e) = self
            .kafka_consumer
            .consume_events(topic, move |event| {
                let signals = signals.clone();
                Box::pin(async move {
                    info!(
                        "{:<12} --> relaying {} for auction {}",
                        "EventConsume",
                        event.event_type(),
                        event.auction_id()
                    );
                    if signals.send(FeedSignal::Changed(event)).is_err() {
                        debug!("{:<12} --> no subscribers to relay to", "EventConsume");
                    }
                    Ok(())
                })
            })
            .await
        {
            error!("{:<12} --> event consumption stopped: {:?}", "EventConsume", e);
        }
    }
}
// endregion: --- Event Consumer
