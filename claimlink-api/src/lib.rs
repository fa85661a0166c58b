mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use claimlink_execution::RelayError;
use claimlink_sequencer::SequencerHandle;
use claimlink_storage::Storage;
use claimlink_types::block::Block;
use claimlink_types::{Address, Amount, GlobalState, RelayEvent, TierFees, Transaction};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub use metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub global_state: Arc<RwLock<GlobalState>>,
    pub storage: Arc<Storage>,
    pub sequencer: SequencerHandle,
    pub metrics: Arc<Metrics>,
}

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Rejected(RelayError),
    Unavailable(String),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Rejected(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), Some(format!("{:?}", e.kind()))),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            ApiError::Internal(e) => {
                error!("API internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string(), None)
            }
        };
        (status, Json(ErrorBody { error, kind })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    let bytes = hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| ApiError::BadRequest(format!("invalid address {}: {}", raw, e)))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::BadRequest(format!("address {} must be 32 bytes", raw)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/state", get(get_state))
        .route("/relayers/:relayer", get(get_relayer))
        .route("/relayers/:relayer/principals/:principal", get(get_principal))
        .route("/relayers/:relayer/users/:index", get(get_user))
        .route("/accounts/:address", get(get_account))
        .route("/block/:height", get(get_block))
        .route("/metrics", get(get_metrics))
        .route("/tx", post(submit_tx))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind API on {}", addr))?;
    info!("API listening on {}", addr);
    axum::serve(listener, router(state)).await.context("API server failed")
}

async fn root() -> &'static str {
    "claimlink relayer API v0.1"
}

async fn get_state(State(state): State<AppState>) -> Json<GlobalState> {
    let guard = state.global_state.read().await;
    Json(guard.clone())
}

#[derive(Serialize)]
struct RelayerView {
    operator: String,
    fee_collector: String,
    previous_version: Option<String>,
    tiered: bool,
    base_fees: TierFees,
    guaranteed_fees: Option<TierFees>,
    gas_offset_correction: u64,
    registered: u64,
    disabled: u64,
    migrated: u64,
    total_fees_claimed: Amount,
    total_rewards_claimed: Amount,
}

async fn get_relayer(State(state): State<AppState>, Path(relayer): Path<String>) -> ApiResult<RelayerView> {
    let addr = parse_address(&relayer)?;
    let guard = state.global_state.read().await;
    let r = guard
        .relayer(&addr)
        .ok_or_else(|| ApiError::NotFound(format!("unknown relayer {}", relayer)))?;

    Ok(Json(RelayerView {
        operator: hex::encode(r.operator),
        fee_collector: hex::encode(r.fee_collector),
        previous_version: r.previous_version.map(hex::encode),
        tiered: r.is_tiered(),
        base_fees: r.fee_schedule.base_fees(),
        guaranteed_fees: r.fee_schedule.guaranteed_fees(),
        gas_offset_correction: r.fee_schedule.gas_offset_correction(),
        registered: r.registry.registered_count(),
        disabled: r.registry.disabled_count(),
        migrated: r.registry.migrated_count(),
        total_fees_claimed: r.total_fees_claimed,
        total_rewards_claimed: r.total_rewards_claimed,
    }))
}

#[derive(Serialize)]
struct PrincipalView {
    registered: bool,
    escrow_wallet: Option<String>,
    escrow_balance: Amount,
    max_gas_price: u64,
    max_fee_per_claim: Amount,
    auto_claim_disabled: bool,
    guaranteed_auto_claim_disabled: bool,
    migrated_from: Option<String>,
}

async fn get_principal(
    State(state): State<AppState>,
    Path((relayer, principal)): Path<(String, String)>,
) -> ApiResult<PrincipalView> {
    let relayer_addr = parse_address(&relayer)?;
    let principal_addr = parse_address(&principal)?;
    let guard = state.global_state.read().await;
    let r = guard
        .relayer(&relayer_addr)
        .ok_or_else(|| ApiError::NotFound(format!("unknown relayer {}", relayer)))?;

    let view = match r.principal(&principal_addr) {
        Some(account) => PrincipalView {
            registered: true,
            escrow_wallet: Some(hex::encode(account.escrow_wallet)),
            escrow_balance: guard.balance_of(&account.escrow_wallet),
            max_gas_price: account.max_gas_price,
            max_fee_per_claim: account.max_fee_per_claim,
            auto_claim_disabled: account.auto_claim_disabled,
            guaranteed_auto_claim_disabled: account.guaranteed_auto_claim_disabled,
            migrated_from: account.migrated_from.map(hex::encode),
        },
        None => PrincipalView {
            registered: false,
            escrow_wallet: None,
            escrow_balance: 0,
            max_gas_price: 0,
            max_fee_per_claim: 0,
            auto_claim_disabled: false,
            guaranteed_auto_claim_disabled: false,
            migrated_from: None,
        },
    };
    Ok(Json(view))
}

async fn get_user(
    State(state): State<AppState>,
    Path((relayer, index)): Path<(String, usize)>,
) -> ApiResult<String> {
    let addr = parse_address(&relayer)?;
    let guard = state.global_state.read().await;
    let r = guard
        .relayer(&addr)
        .ok_or_else(|| ApiError::NotFound(format!("unknown relayer {}", relayer)))?;
    r.registry
        .user_at(index)
        .map(|user| Json(hex::encode(user)))
        .ok_or_else(|| ApiError::NotFound(format!("no user at index {}", index)))
}

#[derive(Serialize)]
struct AccountView {
    nonce: u64,
    balance: Amount,
}

async fn get_account(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult<AccountView> {
    let addr = parse_address(&address)?;
    let guard = state.global_state.read().await;
    Ok(Json(AccountView { nonce: guard.nonce_of(&addr), balance: guard.balance_of(&addr) }))
}

async fn get_block(State(state): State<AppState>, Path(height): Path<u64>) -> ApiResult<Option<Block>> {
    let block = state
        .storage
        .load_block_by_height(height)
        .map_err(ApiError::Internal)?;
    Ok(Json(block))
}

async fn get_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let height = state
        .storage
        .load_tip()
        .map_err(ApiError::Internal)?
        .map(|(h, _)| h)
        .unwrap_or(0);
    let guard = state.global_state.read().await;
    let body = state
        .metrics
        .render(&guard, height)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("metrics encoding failed: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
        body,
    )
        .into_response())
}

#[derive(Serialize)]
struct TxResponse {
    tx_id: String,
    gas_used: u64,
    events: Vec<RelayEvent>,
}

async fn submit_tx(State(state): State<AppState>, Json(tx): Json<Transaction>) -> ApiResult<TxResponse> {
    let outcome = state
        .sequencer
        .submit(tx)
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    match outcome {
        Ok(receipt) => {
            state.metrics.record("applied");
            Ok(Json(TxResponse {
                tx_id: hex::encode(receipt.tx_id),
                gas_used: receipt.gas_used,
                events: receipt.events,
            }))
        }
        Err(e) => {
            state.metrics.record(&format!("{:?}", e.kind()));
            Err(ApiError::Rejected(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use claimlink_crypto::{address_of, keypair_from_seed, sign};
    use claimlink_execution::MockHost;
    use claimlink_sequencer::SequencerService;
    use claimlink_types::{FeeSchedule, RelayInstruction, RelayerState, ETHER, GWEI};
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};
    use tower::ServiceExt;

    const RELAYER: Address = [0xa1; 32];

    fn app() -> Router {
        let mut genesis = GlobalState::default();
        let schedule = FeeSchedule::base(TierFees { platform_fee: 5, claimer_fee: 10 }, 220_000);
        genesis.relayers.insert(RELAYER, RelayerState::new([1u8; 32], [2u8; 32], schedule));
        genesis.mint(address_of(&keypair_from_seed(b"alice")), ETHER);

        let global_state = Arc::new(RwLock::new(genesis));
        let storage = Arc::new(Storage::in_memory());
        let (sender, receiver) = mpsc::channel(16);
        let service = SequencerService::new(
            global_state.clone(),
            MockHost::default(),
            storage.clone(),
            receiver,
            Duration::from_secs(60),
        )
        .unwrap();
        let (stop, shutdown) = oneshot::channel::<()>();
        tokio::spawn(async move {
            service.run(shutdown).await;
            drop(stop);
        });

        router(AppState {
            global_state,
            storage,
            sequencer: SequencerHandle::new(sender),
            metrics: Arc::new(Metrics::new()),
        })
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    async fn post_tx(app: &Router, tx: &Transaction) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/tx")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(tx).unwrap()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn register_tx() -> Transaction {
        let key = keypair_from_seed(b"alice");
        let mut tx = Transaction {
            sender: address_of(&key),
            target: RELAYER,
            nonce: 0,
            value: 1_000,
            instruction: RelayInstruction::Register {
                max_gas_price: GWEI,
                max_fee_per_claim: ETHER,
                guaranteed_opt_out: false,
            },
            signature: vec![],
            gas_limit: 1_000_000,
            gas_price: 1,
        };
        tx.signature = sign(&key, &tx.signing_bytes());
        tx
    }

    #[tokio::test]
    async fn relayer_view_reports_schedule() {
        let app = app();
        let (status, body) = get(&app, &format!("/relayers/{}", hex::encode(RELAYER))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tiered"], false);
        assert_eq!(body["gas_offset_correction"], 220_000);
        assert_eq!(body["registered"], 0);
    }

    #[tokio::test]
    async fn bad_and_unknown_addresses() {
        let app = app();
        let (status, _) = get(&app, "/relayers/zz").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get(&app, &format!("/relayers/{}", hex::encode([9u8; 32]))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submitted_registration_is_visible() {
        let app = app();
        let tx = register_tx();

        let (status, body) = post_tx(&app, &tx).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["gas_used"].as_u64().unwrap() > 0);

        let uri = format!("/relayers/{}/principals/{}", hex::encode(RELAYER), hex::encode(tx.sender));
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registered"], true);
        assert_eq!(body["escrow_balance"], 1_000);

        let (_, body) = get(&app, &format!("/relayers/{}/users/0", hex::encode(RELAYER))).await;
        assert_eq!(body, serde_json::Value::String(hex::encode(tx.sender)));

        let (status, body) = post_tx(&app, &tx).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "InvalidTransaction");
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let app = app();
        post_tx(&app, &register_tx()).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("claimlink_transactions_total"));
        assert!(text.contains("claimlink_registered_principals"));
    }
}
