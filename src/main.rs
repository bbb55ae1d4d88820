// region:    --- Imports
use card_auction_service::config::{Config, StoreBackend};
use card_auction_service::database::DatabaseManager;
use card_auction_service::event_store::{
    BroadcastPublisher, EventConsumer, EventPublisher, KafkaPublisher,
};
use card_auction_service::feed::{signal_channel, Feed};
use card_auction_service::handlers::{self, AppState};
use card_auction_service::identity::AdminPolicy;
use card_auction_service::message_broker::KafkaManager;
use card_auction_service::scheduler::FeedTicker;
use card_auction_service::store::memory::InMemoryAuctionStore;
use card_auction_service::store::postgres::PostgresAuctionStore;
use card_auction_service::store::AuctionStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("{:<12} --> invalid configuration: {}", "Main", e);
        e
    })?;
    if config.admin_uid.is_none() {
        warn!(
            "{:<12} --> no administrator configured; listings cannot be approved",
            "Main"
        );
    }

    let signals = signal_channel();

    let store: Arc<dyn AuctionStore> = match config.backend {
        StoreBackend::Memory => {
            info!("{:<12} --> using the in-memory store", "Main");
            let publisher: Arc<dyn EventPublisher> =
                Arc::new(BroadcastPublisher::new(signals.clone()));
            Arc::new(InMemoryAuctionStore::new(publisher))
        }
        StoreBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .ok_or("PostgreSQL backend selected without database settings")?;
            let db_manager =
                Arc::new(DatabaseManager::connect(&pg.database_url, pg.max_connections).await?);
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> database initialization failed: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> database initialized", "Main");

            // Each instance needs its own group so every instance sees every event.
            let group_id = format!("auction-feed-{}", std::process::id());
            let kafka_manager = KafkaManager::new(&pg.kafka_brokers, &group_id)?;
            kafka_manager.create_topic(&pg.events_topic, 5, 1).await?;
            info!("{:<12} --> Kafka initialized", "Main");

            let event_consumer = EventConsumer::new(kafka_manager.get_consumer(), signals.clone());
            let topic = pg.events_topic.clone();
            tokio::spawn(async move {
                event_consumer.start(&topic).await;
            });

            let publisher: Arc<dyn EventPublisher> = Arc::new(KafkaPublisher::new(
                kafka_manager.get_producer(),
                pg.events_topic.clone(),
            ));
            Arc::new(PostgresAuctionStore::new(db_manager, publisher))
        }
    };
    FeedTicker::new(signals.clone(), config.feed_tick).start();

    let admin = AdminPolicy::new(config.admin_uid.clone());
    let state = AppState {
        feed: Feed::new(Arc::clone(&store), signals, admin.clone()),
        store,
        admin,
        horizon: config.auction_horizon(),
    };
    let routes_all = handlers::router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
