//! # Registry HTTP API
//!
//! Builds the axum router that exposes the registry's HTTP interface.
//! All endpoints share application state through axum's `State` extractor;
//! the registry itself sits behind a `parking_lot::RwLock` and every
//! handler takes the lock for the duration of one registry call only.
//!
//! Mutation requests carry the acting address explicitly in the body.
//! The node trusts its callers — authentication belongs to whatever
//! gateway fronts it, not here. Successful mutations return the events
//! the operation emitted, in emission order.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                       |
//! |--------|-------------------------------|-----------------------------------|
//! | GET    | `/health`                     | Liveness probe                    |
//! | GET    | `/status`                     | Registry status summary           |
//! | GET    | `/config`                     | Collection identity and economics |
//! | GET    | `/spinners/:id`               | Spinner with owner/offer/bid      |
//! | GET    | `/owners/:address/spinners`   | Ordered holdings of an address    |
//! | GET    | `/accounts/:address`          | Pending balance and holdings count|
//! | POST   | `/admin/phase/advance`        | Advance the lifecycle one step    |
//! | POST   | `/admin/roles/:role`          | Reassign operator or treasurer    |
//! | POST   | `/admin/sweep`                | Sweep unencumbered funds          |
//! | POST   | `/admin/voting-contract`      | Register the voting contract      |
//! | POST   | `/admin/elections`            | Record an election outcome        |
//! | POST   | `/admin/destroy`              | Destroy the registry              |
//! | POST   | `/spinners/mint`              | Mint one spinner                  |
//! | POST   | `/spinners/bulk-mint`         | Mint a batch, all-or-nothing      |
//! | POST   | `/spinners/finish-minting`    | Permanently close minting         |
//! | POST   | `/purchase`                   | Buy from the vault at tier price  |
//! | POST   | `/spinners/:id/transfer`      | Direct ownership transfer         |
//! | POST   | `/spinners/:id/approve`       | Set or clear the approval         |
//! | POST   | `/spinners/:id/take`          | Approved transferee claims        |
//! | POST   | `/spinners/:id/offer`         | Post or replace a sale offer      |
//! | POST   | `/spinners/:id/offer/cancel`  | Withdraw the offer                |
//! | POST   | `/spinners/:id/buy`           | Buy through the standing offer    |
//! | POST   | `/spinners/:id/bid`           | Place a bid                       |
//! | POST   | `/spinners/:id/bid/withdraw`  | Withdraw the caller's bid         |
//! | POST   | `/spinners/:id/bid/accept`    | Accept the standing bid           |
//! | POST   | `/withdraw`                   | Pull the caller's pending balance |

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gyro_registry::{
    config, Address, Call, ContentHash, Event, Registry, RegistryError, Role, SpinnerId, Tier,
};

use crate::metrics::{NodeMetrics, SharedMetrics};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// When the node started.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// The registry itself. Handlers take the lock synchronously and
    /// never hold it across an await point.
    pub registry: Arc<RwLock<Registry>>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/config", get(config_handler))
        .route("/spinners/:id", get(spinner_handler))
        .route("/owners/:address/spinners", get(holdings_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/admin/phase/advance", post(advance_phase_handler))
        .route("/admin/roles/:role", post(set_role_handler))
        .route("/admin/sweep", post(sweep_handler))
        .route("/admin/voting-contract", post(voting_contract_handler))
        .route("/admin/elections", post(election_handler))
        .route("/admin/destroy", post(destroy_handler))
        .route("/spinners/mint", post(mint_handler))
        .route("/spinners/bulk-mint", post(bulk_mint_handler))
        .route("/spinners/finish-minting", post(finish_minting_handler))
        .route("/purchase", post(purchase_handler))
        .route("/spinners/:id/transfer", post(transfer_handler))
        .route("/spinners/:id/approve", post(approve_handler))
        .route("/spinners/:id/take", post(take_ownership_handler))
        .route("/spinners/:id/offer", post(offer_handler))
        .route("/spinners/:id/offer/cancel", post(cancel_offer_handler))
        .route("/spinners/:id/buy", post(buy_handler))
        .route("/spinners/:id/bid", post(bid_handler))
        .route("/spinners/:id/bid/withdraw", post(withdraw_bid_handler))
        .route("/spinners/:id/bid/accept", post(accept_bid_handler))
        .route("/withdraw", post(withdraw_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Current lifecycle phase, by name.
    pub phase: String,
    /// Whether new spinners can still be minted.
    pub minting_open: bool,
    /// Whether the registry has been destroyed.
    pub destroyed: bool,
    /// Total spinners ever minted.
    pub total_spinners: u64,
    /// Standing offers.
    pub offers: usize,
    /// Standing bids.
    pub bids: usize,
    /// Total value the registry holds, in base units.
    pub held_value: u64,
    /// Total pending pull-payment balances.
    pub pending_total: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /config`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub tier_caps: [u64; 4],
    pub tier_prices: [u64; 4],
    pub sale_fee_bps: u64,
    pub vault: Address,
}

/// Response payload for `GET /spinners/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SpinnerResponse {
    pub id: SpinnerId,
    pub content_hash: ContentHash,
    pub flux: u16,
    pub inertia: u16,
    pub friction: u16,
    pub tier: Tier,
    pub gold: bool,
    pub reserved: bool,
    pub owner: Address,
    pub approved: Option<Address>,
    pub offer: Option<gyro_registry::Offer>,
    pub bid: Option<gyro_registry::Bid>,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    /// Withdrawable pull-payment balance.
    pub pending: u64,
    /// Number of spinners held.
    pub spinner_count: u64,
    /// Whether this address is a registered moderator.
    pub moderator: bool,
}

/// Body shared by mutations that only need an acting address.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallerRequest {
    pub caller: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub caller: Address,
    pub address: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepRequest {
    pub caller: Address,
    pub to: Address,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionRequest {
    pub caller: Address,
    pub election_id: u64,
    pub approved: bool,
    pub moderator: Address,
}

/// One spinner's worth of mint input, used by both mint endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintSpec {
    pub content_hash: ContentHash,
    pub flux: u16,
    pub inertia: u16,
    pub friction: u16,
    pub tier: Tier,
    #[serde(default)]
    pub gold: bool,
    #[serde(default)]
    pub reserved: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MintRequest {
    pub caller: Address,
    #[serde(flatten)]
    pub spec: MintSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkMintRequest {
    pub caller: Address,
    pub spinners: Vec<MintSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub caller: Address,
    /// Value sent with the call, in base units.
    pub value: u64,
    pub tier: Tier,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub caller: Address,
    pub to: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub caller: Address,
    /// `null` clears the approval (serialized as the null address works too).
    pub to: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OfferRequest {
    pub caller: Address,
    pub price: u64,
    /// When set, only this address may buy.
    #[serde(default)]
    pub target: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayableRequest {
    pub caller: Address,
    /// Value sent with the call, in base units.
    pub value: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptBidRequest {
    pub caller: Address,
    /// The bid amount the seller saw and agreed to. Settlement fails if
    /// the standing bid is below this.
    pub min_accept: u64,
}

/// Envelope every successful mutation returns.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Operation-specific result payload.
    pub result: serde_json::Value,
    /// Events the operation emitted, in emission order.
    pub events: Vec<Event>,
}

/// Generic error body returned on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a registry refusal onto an HTTP status.
///
/// Authorization and relationship failures are 403; unknown assets 404;
/// lifecycle and state conflicts 409; bad economics in an otherwise
/// well-formed request 422.
fn status_for(err: &RegistryError) -> StatusCode {
    use RegistryError::*;
    match err {
        Unauthorized { .. } | NotOwner { .. } | NotSeller { .. } | NotBidder { .. }
        | NotApproved { .. } | NotAuthorizedBuyer { .. } => StatusCode::FORBIDDEN,
        InvalidAsset(_) | NotForSale(_) => StatusCode::NOT_FOUND,
        PhaseNotAllowed { .. } | InvalidPhaseTransition { .. } | MintingClosed | Destroyed
        | TierSoldOut { .. } | BidMismatch { .. } => StatusCode::CONFLICT,
        InsufficientPayment { .. } | BidTooLow { .. } | CannotBidOwnAsset(_)
        | InvalidRecipient | InvalidApproval { .. } | BatchLengthMismatch | AmountOverflow
        | InsufficientUnencumberedFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(err: RegistryError) -> Response {
    let status = status_for(&err);
    let body = ErrorResponse {
        error: err.to_string(),
    };
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Metrics Recording
// ---------------------------------------------------------------------------

/// Bumps counters from the events one mutation emitted.
fn record_events(metrics: &NodeMetrics, events: &[Event]) {
    for event in events {
        match event {
            Event::Minted { .. } => metrics.spinners_minted_total.inc(),
            Event::Transfer { .. } => metrics.transfers_total.inc(),
            Event::Bought { price, .. } => {
                metrics.sales_total.inc();
                metrics.sale_volume_total.inc_by(*price);
            }
            Event::BidAccepted { amount, .. } => {
                metrics.sales_total.inc();
                metrics.sale_volume_total.inc_by(*amount);
            }
            _ => {}
        }
    }
}

/// Resyncs the gauges from the registry's current state.
fn sync_gauges(metrics: &NodeMetrics, registry: &Registry) {
    metrics.active_offers.set(registry.offer_count() as i64);
    metrics.active_bids.set(registry.bid_count() as i64);
    metrics.held_value.set(registry.held_value() as i64);
    metrics.pending_total.set(registry.total_pending() as i64);
}

/// Runs one mutation under the write lock, then records metrics and
/// wraps the result with its drained events. The closure returns the
/// operation-specific result payload.
fn mutate<F>(state: &AppState, op: F) -> Response
where
    F: FnOnce(&mut Registry) -> gyro_registry::Result<serde_json::Value>,
{
    let mut registry = state.registry.write();
    match op(&mut registry) {
        Ok(result) => {
            let events = registry.take_events();
            record_events(&state.metrics, &events);
            sync_gauges(&state.metrics, &registry);
            drop(registry);
            (StatusCode::OK, Json(MutationResponse { result, events })).into_response()
        }
        Err(err) => {
            drop(registry);
            error_response(err)
        }
    }
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// Liveness probe for orchestrators. Intentionally does not inspect
/// registry state — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — registry status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read();
    let resp = StatusResponse {
        version: state.version.clone(),
        phase: registry.phase().to_string(),
        minting_open: registry.is_minting_open(),
        destroyed: registry.is_destroyed(),
        total_spinners: registry.count_of_deeds(),
        offers: registry.offer_count(),
        bids: registry.bid_count(),
        held_value: registry.held_value(),
        pending_total: registry.total_pending(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /config` — collection identity and economic constants.
async fn config_handler() -> impl IntoResponse {
    Json(ConfigResponse {
        name: config::COLLECTION_NAME.into(),
        symbol: config::COLLECTION_SYMBOL.into(),
        decimals: config::COLLECTION_DECIMALS,
        tier_caps: config::TIER_CAPS,
        tier_prices: config::TIER_PRICES,
        sale_fee_bps: config::SALE_FEE_BPS,
        vault: config::VAULT_ADDRESS,
    })
}

/// `GET /spinners/:id` — one spinner with its owner, approval, offer,
/// and bid. 404 for unminted ids.
async fn spinner_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
) -> Response {
    let registry = state.registry.read();
    let spinner = match registry.spinner(id) {
        Ok(s) => s.clone(),
        Err(err) => return error_response(err),
    };
    let owner = match registry.owner_of(id) {
        Ok(o) => o,
        Err(err) => return error_response(err),
    };
    let approved = registry.approved_for(id).unwrap_or(None);
    let resp = SpinnerResponse {
        id: spinner.id,
        content_hash: spinner.content_hash,
        flux: spinner.flux,
        inertia: spinner.inertia,
        friction: spinner.friction,
        tier: spinner.tier,
        gold: spinner.gold,
        reserved: spinner.reserved,
        owner,
        approved,
        offer: registry.offer_of(id).cloned(),
        bid: registry.bid_of(id).cloned(),
    };
    Json(resp).into_response()
}

/// `GET /owners/:address/spinners` — ordered holdings. Empty list for
/// strangers; bad hex is a 400.
async fn holdings_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let owner = match address.parse::<Address>() {
        Ok(a) => a,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };
    let registry = state.registry.read();
    let ids: Vec<SpinnerId> = registry.deeds_of(owner).to_vec();
    Json(ids).into_response()
}

/// `GET /accounts/:address` — pending balance and holdings count.
/// Unknown addresses are zeroed, not errors.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let addr = match address.parse::<Address>() {
        Ok(a) => a,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };
    let registry = state.registry.read();
    let resp = AccountResponse {
        address: addr,
        pending: registry.pending_of(addr),
        spinner_count: registry.count_of_deeds_by_owner(addr),
        moderator: registry.is_moderator(addr),
    };
    Json(resp).into_response()
}

// ---------------------------------------------------------------------------
// Administration Handlers
// ---------------------------------------------------------------------------

/// `POST /admin/phase/advance` — advance the lifecycle one step.
async fn advance_phase_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        let phase = registry.advance_phase(req.caller)?;
        Ok(serde_json::json!({ "phase": phase.to_string() }))
    })
}

/// `POST /admin/roles/:role` — reassign the operator or treasurer.
/// The owner role is fixed at construction and not reassignable here.
async fn set_role_handler(
    Path(role): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SetRoleRequest>,
) -> Response {
    match role.as_str() {
        "operator" => mutate(&state, |registry| {
            registry.set_operator(req.caller, req.address)?;
            Ok(serde_json::json!({ "role": Role::Operator, "address": req.address }))
        }),
        "treasurer" => mutate(&state, |registry| {
            registry.set_treasurer(req.caller, req.address)?;
            Ok(serde_json::json!({ "role": Role::Treasurer, "address": req.address }))
        }),
        other => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown role: {}", other),
            }),
        )
            .into_response(),
    }
}

/// `POST /admin/sweep` — sweep unencumbered funds. Treasurer only.
async fn sweep_handler(State(state): State<AppState>, Json(req): Json<SweepRequest>) -> Response {
    mutate(&state, |registry| {
        let amount = registry.sweep_operator_funds(req.caller, req.to, req.amount)?;
        Ok(serde_json::json!({ "swept": amount, "to": req.to }))
    })
}

/// `POST /admin/voting-contract` — register the voting contract address.
async fn voting_contract_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRoleRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.set_voting_contract(req.caller, req.address)?;
        Ok(serde_json::json!({ "voting_contract": req.address }))
    })
}

/// `POST /admin/elections` — record an election outcome.
async fn election_handler(
    State(state): State<AppState>,
    Json(req): Json<ElectionRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.record_election_outcome(req.caller, req.election_id, req.approved, req.moderator)?;
        Ok(serde_json::json!({
            "election_id": req.election_id,
            "approved": req.approved,
        }))
    })
}

/// `POST /admin/destroy` — destroy the registry. Owner only, permanent.
async fn destroy_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.destroy(req.caller)?;
        Ok(serde_json::json!({ "destroyed": true }))
    })
}

// ---------------------------------------------------------------------------
// Minting Handlers
// ---------------------------------------------------------------------------

/// `POST /spinners/mint` — mint one spinner into the vault.
async fn mint_handler(State(state): State<AppState>, Json(req): Json<MintRequest>) -> Response {
    mutate(&state, |registry| {
        let s = &req.spec;
        let id = registry.mint(
            req.caller,
            s.content_hash,
            s.flux,
            s.inertia,
            s.friction,
            s.tier,
            s.gold,
            s.reserved,
        )?;
        Ok(serde_json::json!({ "id": id }))
    })
}

/// `POST /spinners/bulk-mint` — mint a batch, all-or-nothing.
async fn bulk_mint_handler(
    State(state): State<AppState>,
    Json(req): Json<BulkMintRequest>,
) -> Response {
    // Decompose the list into the column format the registry takes.
    let hashes: Vec<ContentHash> = req.spinners.iter().map(|s| s.content_hash).collect();
    let fluxes: Vec<u16> = req.spinners.iter().map(|s| s.flux).collect();
    let inertias: Vec<u16> = req.spinners.iter().map(|s| s.inertia).collect();
    let frictions: Vec<u16> = req.spinners.iter().map(|s| s.friction).collect();
    let tiers: Vec<Tier> = req.spinners.iter().map(|s| s.tier).collect();
    let golds: Vec<bool> = req.spinners.iter().map(|s| s.gold).collect();
    let reserveds: Vec<bool> = req.spinners.iter().map(|s| s.reserved).collect();

    mutate(&state, |registry| {
        let ids = registry.bulk_mint(
            req.caller, &hashes, &fluxes, &inertias, &frictions, &tiers, &golds, &reserveds,
        )?;
        Ok(serde_json::json!({ "ids": ids }))
    })
}

/// `POST /spinners/finish-minting` — permanently close minting.
async fn finish_minting_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.finish_minting(req.caller)?;
        Ok(serde_json::json!({ "minting_open": false }))
    })
}

/// `POST /purchase` — buy a vault-held spinner at the fixed tier price.
async fn purchase_handler(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Response {
    mutate(&state, |registry| {
        let id = registry.purchase_tier(Call::with_value(req.caller, req.value), req.tier)?;
        Ok(serde_json::json!({ "id": id }))
    })
}

// ---------------------------------------------------------------------------
// Ownership Handlers
// ---------------------------------------------------------------------------

/// `POST /spinners/:id/transfer` — direct ownership transfer.
async fn transfer_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.transfer(req.caller, req.to, id)?;
        Ok(serde_json::json!({ "id": id, "owner": req.to }))
    })
}

/// `POST /spinners/:id/approve` — set or clear the approved transferee.
async fn approve_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Response {
    mutate(&state, |registry| {
        let to = req.to.unwrap_or(Address::NULL);
        registry.approve(req.caller, to, id)?;
        Ok(serde_json::json!({ "id": id, "approved": req.to }))
    })
}

/// `POST /spinners/:id/take` — the approved transferee claims the spinner.
async fn take_ownership_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.take_ownership(req.caller, id)?;
        Ok(serde_json::json!({ "id": id, "owner": req.caller }))
    })
}

// ---------------------------------------------------------------------------
// Marketplace Handlers
// ---------------------------------------------------------------------------

/// `POST /spinners/:id/offer` — post or replace a sale offer.
async fn offer_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<OfferRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.offer_for_sale(req.caller, id, req.price, req.target)?;
        Ok(serde_json::json!({ "id": id, "price": req.price, "target": req.target }))
    })
}

/// `POST /spinners/:id/offer/cancel` — withdraw the standing offer.
async fn cancel_offer_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.cancel_offer(req.caller, id)?;
        Ok(serde_json::json!({ "id": id }))
    })
}

/// `POST /spinners/:id/buy` — buy through the standing offer.
async fn buy_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<PayableRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.buy(Call::with_value(req.caller, req.value), id)?;
        Ok(serde_json::json!({ "id": id, "owner": req.caller }))
    })
}

/// `POST /spinners/:id/bid` — place a bid.
async fn bid_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<PayableRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.enter_bid(Call::with_value(req.caller, req.value), id)?;
        Ok(serde_json::json!({ "id": id, "amount": req.value }))
    })
}

/// `POST /spinners/:id/bid/withdraw` — withdraw the caller's bid.
async fn withdraw_bid_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.withdraw_bid(req.caller, id)?;
        Ok(serde_json::json!({ "id": id }))
    })
}

/// `POST /spinners/:id/bid/accept` — accept the standing bid.
async fn accept_bid_handler(
    Path(id): Path<SpinnerId>,
    State(state): State<AppState>,
    Json(req): Json<AcceptBidRequest>,
) -> Response {
    mutate(&state, |registry| {
        registry.accept_bid(req.caller, id, req.min_accept)?;
        Ok(serde_json::json!({ "id": id }))
    })
}

// ---------------------------------------------------------------------------
// Escrow Handlers
// ---------------------------------------------------------------------------

/// `POST /withdraw` — pull the caller's entire pending balance.
///
/// Returns the amount owed. The registry models custody only; whatever
/// actually moves the value acts on this response.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<CallerRequest>,
) -> Response {
    mutate(&state, |registry| {
        let amount = registry.withdraw(req.caller)?;
        Ok(serde_json::json!({ "withdrawn": amount }))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use gyro_registry::RegistryConfig;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Test AppState with small-denomination economics: Common costs
    /// 2000, fee 3%.
    fn test_app_state() -> (AppState, Address) {
        let owner = Address::random();
        let config = RegistryConfig {
            tier_caps: [10, 10, 10, 10],
            tier_prices: [2000, 8000, 20_000, 100_000],
            fee_bps: 300,
        };
        let state = AppState {
            version: "0.1.0-test".into(),
            started_at: chrono::Utc::now(),
            registry: Arc::new(RwLock::new(Registry::new(owner, config))),
            metrics: Arc::new(NodeMetrics::new()),
        };
        (state, owner)
    }

    /// Test state advanced to Beta with `n` Commons minted into the vault.
    fn marketplace_state(n: u64) -> (AppState, Address) {
        let (state, owner) = test_app_state();
        {
            let mut registry = state.registry.write();
            for i in 0..n {
                registry
                    .mint(
                        owner,
                        ContentHash::digest(&[i as u8]),
                        1,
                        2,
                        3,
                        Tier::Common,
                        false,
                        false,
                    )
                    .unwrap();
            }
            registry.advance_phase(owner).unwrap(); // Deployed
            registry.advance_phase(owner).unwrap(); // Beta
            registry.take_events();
        }
        (state, owner)
    }

    /// Sends a GET request and returns (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (state, _) = test_app_state();
        let router = create_router(state);
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_reflects_registry_state() {
        let (state, _) = marketplace_state(2);
        let router = create_router(state);
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.phase, "Beta");
        assert!(resp.minting_open);
        assert_eq!(resp.total_spinners, 2);
        assert_eq!(resp.held_value, 0);
    }

    #[tokio::test]
    async fn config_endpoint_returns_collection_identity() {
        let (state, _) = test_app_state();
        let router = create_router(state);
        let (status, body) = get(&router, "/config").await;

        assert_eq!(status, StatusCode::OK);
        let resp: ConfigResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.symbol, "GYRO");
        assert_eq!(resp.decimals, 0);
        assert_eq!(resp.sale_fee_bps, 300);
    }

    #[tokio::test]
    async fn mint_then_fetch_spinner() {
        let (state, owner) = test_app_state();
        let router = create_router(state);

        let (status, body) = post_json(
            &router,
            "/spinners/mint",
            serde_json::json!({
                "caller": owner,
                "content_hash": ContentHash::digest(b"imagehash"),
                "flux": 7,
                "inertia": 8,
                "friction": 9,
                "tier": "Rare",
                "gold": true,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.result["id"], 0);
        assert!(matches!(resp.events[0], Event::Minted { id: 0, .. }));

        let (status, body) = get(&router, "/spinners/0").await;
        assert_eq!(status, StatusCode::OK);
        let spinner: SpinnerResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(spinner.tier, Tier::Rare);
        assert!(spinner.gold);
        assert_eq!(spinner.owner, config::VAULT_ADDRESS);
        assert!(spinner.offer.is_none());
    }

    #[tokio::test]
    async fn unknown_spinner_is_404() {
        let (state, _) = test_app_state();
        let router = create_router(state);
        let (status, body) = get(&router, "/spinners/42").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("does not exist"));
    }

    #[tokio::test]
    async fn unauthorized_mint_is_403() {
        let (state, _) = test_app_state();
        let router = create_router(state);
        let outsider = Address::random();

        let (status, _) = post_json(
            &router,
            "/spinners/mint",
            serde_json::json!({
                "caller": outsider,
                "content_hash": ContentHash::digest(b"x"),
                "flux": 0,
                "inertia": 0,
                "friction": 0,
                "tier": "Common",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn premature_purchase_is_409() {
        let (state, owner) = test_app_state();
        state
            .registry
            .write()
            .mint(
                owner,
                ContentHash::digest(b"a"),
                0,
                0,
                0,
                Tier::Common,
                false,
                false,
            )
            .unwrap();
        let router = create_router(state);

        // Still in Created: phase gate refuses.
        let (status, _) = post_json(
            &router,
            "/purchase",
            serde_json::json!({
                "caller": Address::random(),
                "value": 2000,
                "tier": "Common",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn underpaid_purchase_is_422() {
        let (state, _) = marketplace_state(1);
        let router = create_router(state);

        let (status, body) = post_json(
            &router,
            "/purchase",
            serde_json::json!({
                "caller": Address::random(),
                "value": 1999,
                "tier": "Common",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("insufficient payment"));
    }

    #[tokio::test]
    async fn full_sale_cycle_over_http() {
        let (state, _) = marketplace_state(1);
        let router = create_router(state);
        let seller = Address::random();
        let buyer = Address::random();

        // Purchase from the vault.
        let (status, body) = post_json(
            &router,
            "/purchase",
            serde_json::json!({ "caller": seller, "value": 2000, "tier": "Common" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        let id = resp.result["id"].as_u64().unwrap();

        // Offer, then buy with change.
        let (status, _) = post_json(
            &router,
            &format!("/spinners/{}/offer", id),
            serde_json::json!({ "caller": seller, "price": 1000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            &router,
            &format!("/spinners/{}/buy", id),
            serde_json::json!({ "caller": buyer, "value": 1100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp
            .events
            .iter()
            .any(|e| matches!(e, Event::Bought { price: 1000, .. })));

        // Seller owed 970 (3% fee), buyer owed 100 change.
        let (_, body) = get(&router, &format!("/accounts/{}", seller)).await;
        let acct: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(acct.pending, 970);

        let (status, body) = post_json(
            &router,
            "/withdraw",
            serde_json::json!({ "caller": buyer }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.result["withdrawn"], 100);

        // Ownership seen through the read API.
        let (_, body) = get(&router, &format!("/owners/{}/spinners", buyer)).await;
        let ids: Vec<SpinnerId> = serde_json::from_slice(&body).unwrap();
        assert_eq!(ids, vec![id]);
    }

    #[tokio::test]
    async fn bulk_mint_rejects_over_cap_batches_atomically() {
        let (state, owner) = test_app_state();
        let router = create_router(state.clone());

        let spec = |b: u8, tier: &str| {
            serde_json::json!({
                "content_hash": ContentHash::digest(&[b]),
                "flux": 1, "inertia": 1, "friction": 1,
                "tier": tier,
            })
        };
        // Cap is 10 per tier; 11 Commons must fail as a whole.
        let batch: Vec<_> = (0..11u8).map(|i| spec(i, "Common")).collect();
        let (status, _) = post_json(
            &router,
            "/spinners/bulk-mint",
            serde_json::json!({ "caller": owner, "spinners": batch }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(state.registry.read().count_of_deeds(), 0);

        let batch: Vec<_> = (0..3u8).map(|i| spec(i, "Legendary")).collect();
        let (status, body) = post_json(
            &router,
            "/spinners/bulk-mint",
            serde_json::json!({ "caller": owner, "spinners": batch }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: MutationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.result["ids"], serde_json::json!([0, 1, 2]));
    }

    #[tokio::test]
    async fn mutations_update_metrics() {
        let (state, _) = marketplace_state(1);
        let router = create_router(state.clone());
        let buyer = Address::random();

        let (status, _) = post_json(
            &router,
            "/purchase",
            serde_json::json!({ "caller": buyer, "value": 2000, "tier": "Common" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(state.metrics.sales_total.get(), 1);
        assert_eq!(state.metrics.sale_volume_total.get(), 2000);
        assert_eq!(state.metrics.transfers_total.get(), 1);
        assert_eq!(state.metrics.held_value.get(), 2000);

        let rendered = state.metrics.encode().unwrap();
        assert!(rendered.contains("gyro_sales_total 1"));
    }

    #[tokio::test]
    async fn destroyed_registry_refuses_over_http() {
        let (state, owner) = marketplace_state(1);
        let router = create_router(state);

        let (status, _) = post_json(
            &router,
            "/admin/destroy",
            serde_json::json!({ "caller": owner }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            &router,
            "/withdraw",
            serde_json::json!({ "caller": Address::random() }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("destroyed"));
    }
}
