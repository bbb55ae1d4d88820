// region:    --- Imports
use crate::auction::model::AuctionStatus;
use crate::bidding::commands::{handle_place_bid, BidRequest};
use crate::error::AuctionError;
use crate::feed::{Feed, FeedFilter};
use crate::identity::{AdminPolicy, CurrentIdentity};
use crate::lifecycle::commands::handle_decision;
use crate::listing::commands::handle_submit_listing;
use crate::listing::NewListingRequest;
use crate::query::handlers::{self as query, AuctionView};
use crate::store::AuctionStore;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- App State
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub feed: Feed,
    pub admin: AdminPolicy,
    /// Furthest an auction's end time may lie from its submission.
    pub horizon: Duration,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<AuctionStatus>,
}

impl StatusQuery {
    fn filter(&self) -> FeedFilter {
        FeedFilter {
            status: self.status.unwrap_or(AuctionStatus::Approved),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auctions", get(handle_get_auctions).post(handle_create_auction))
        .route("/auctions/stream", get(handle_auction_stream))
        .route("/auctions/:id", get(handle_get_auction))
        .route(
            "/auctions/:id/bids",
            get(handle_get_bid_history).post(handle_bid),
        )
        .route("/auctions/:id/approve", post(handle_approve))
        .route("/auctions/:id/reject", post(handle_reject))
        .layer(cors)
        // Listings may embed their image as a data URL.
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20))
        .with_state(state)
}
// endregion: --- App State

// region:    --- Command Handlers

pub async fn handle_create_auction(
    State(state): State<AppState>,
    payload: Result<Json<NewListingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuctionError> {
    let Json(request) = payload?;
    let item = handle_submit_listing(request, state.horizon, state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(AuctionView::new(item, Utc::now()))))
}

pub async fn handle_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuctionError> {
    let Json(request) = payload?;
    let item = handle_place_bid(request.into_command(auction_id), state.store.as_ref()).await?;
    Ok(Json(AuctionView::new(item, Utc::now())))
}

pub async fn handle_approve(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    identity: CurrentIdentity,
) -> Result<impl IntoResponse, AuctionError> {
    decide(state, auction_id, AuctionStatus::Approved, identity).await
}

pub async fn handle_reject(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    identity: CurrentIdentity,
) -> Result<impl IntoResponse, AuctionError> {
    decide(state, auction_id, AuctionStatus::Rejected, identity).await
}

async fn decide(
    state: AppState,
    auction_id: i64,
    decision: AuctionStatus,
    identity: CurrentIdentity,
) -> Result<Json<AuctionView>, AuctionError> {
    let item = handle_decision(
        auction_id,
        decision,
        &identity,
        &state.admin,
        state.store.as_ref(),
    )
    .await?;
    Ok(Json(AuctionView::new(item, Utc::now())))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

pub async fn handle_get_auctions(
    State(state): State<AppState>,
    params: Result<Query<StatusQuery>, QueryRejection>,
    identity: CurrentIdentity,
) -> Result<impl IntoResponse, AuctionError> {
    let Query(params) = params?;
    let views = query::get_auctions(&state.feed, params.filter().status, &identity).await?;
    Ok(Json(views))
}

pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    identity: CurrentIdentity,
) -> Result<impl IntoResponse, AuctionError> {
    let view =
        query::get_auction(state.store.as_ref(), auction_id, &identity, &state.admin).await?;
    Ok(Json(view))
}

pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    identity: CurrentIdentity,
) -> Result<impl IntoResponse, AuctionError> {
    let bids =
        query::get_bid_history(state.store.as_ref(), auction_id, &identity, &state.admin).await?;
    Ok(Json(bids))
}

/// Server-sent events: one `auctions` event per delivered set. Closing the
/// connection cancels the subscription.
pub async fn handle_auction_stream(
    State(state): State<AppState>,
    params: Result<Query<StatusQuery>, QueryRejection>,
    identity: CurrentIdentity,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AuctionError> {
    let Query(params) = params?;
    let filter = params.filter();
    let subscription = state.feed.subscribe(filter, &identity).await?;
    info!("{:<12} --> stream opened for {} auctions", "HandlerQuery", filter.status);

    let (updates, cancel) = subscription.into_parts();
    let events = updates.map(move |items| {
        let _subscription = &cancel;
        Event::default()
            .event("auctions")
            .json_data(AuctionView::from_items(items, Utc::now()))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// endregion: --- Query Handlers
