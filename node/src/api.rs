//! # REST + JSON-RPC API
//!
//! The HTTP face of the root node. Handlers never touch the root directly;
//! they talk to the runtime task through a [`RuntimeHandle`].
//!
//! ## Endpoints
//!
//! | Method | Path               | Description                          |
//! |--------|--------------------|--------------------------------------|
//! | GET    | `/health`          | Liveness check                       |
//! | GET    | `/status`          | Root summary: supply, topology, queue|
//! | POST   | `/rpc`             | JSON-RPC 2.0 gateway (`root_*`)      |
//! | GET    | `/wallets/:pubkey` | Key-only holder wallet               |
//!
//! ## Calling the root
//!
//! Every state-changing method takes the same params envelope:
//!
//! ```text
//! { "sender": { "pubkey": "<hex>", "signature": "<hex>" }          external
//!           | { "address": "<wc>:<hex>", "signature": "<hex>" },   internal
//!   "value":  "<amount>",                                          optional
//!   "args":   { ... } }
//! ```
//!
//! Every sender signs `method || 0x00 || json(args)` with Ed25519 (see
//! [`signing_payload`]). An external sender brings its key. An internal
//! sender signs with the key the node holds for that address: an account
//! key from `root.json`, or the holder key of a wallet in the book.
//! Addresses with neither are refused. Amounts are decimal strings or
//! JSON numbers.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use tip3_protocol::{
    Address, CodeBlob, GrantEntry, HolderIdentity, PublicKey, Sender,
};

use crate::runtime::{Call, Operation, RootSnapshot, RuntimeError, RuntimeHandle};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Handle to the runtime task owning the root.
    pub runtime: RuntimeHandle,
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/wallets/:pubkey", get(wallet_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// Malformed envelope.
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// The sender's signature does not verify.
pub const INVALID_SIGNATURE: i32 = -32003;
/// An internal sender the node holds no signing key for.
pub const UNKNOWN_ACCOUNT: i32 = -32004;
/// The root refused the call; `data.code` carries the root's error code.
pub const ROOT_REJECTED: i32 = -32010;
/// The calling wallet could not cover a burn.
pub const WALLET_REJECTED: i32 = -32011;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    /// Echoed back in the response.
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", message.into()))
    }
}

impl From<RuntimeError> for JsonRpcError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Root(root) => Self {
                code: ROOT_REJECTED,
                message: root.to_string(),
                data: Some(json!({ "code": root.code(), "fatal": root.is_fatal() })),
            },
            RuntimeError::Wallet(wallet) => Self::new(WALLET_REJECTED, wallet.to_string()),
            other => Self::new(INTERNAL_ERROR, format!("Internal error: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub started_at: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    pub root: RootSnapshot,
}

/// Error body of REST endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — 200 while the process is up.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.runtime.snapshot().await {
        Ok(root) => Json(StatusResponse {
            version: state.version.clone(),
            started_at: state.started_at.to_rfc3339(),
            timestamp: Utc::now().to_rfc3339(),
            root,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

/// `GET /wallets/:pubkey` — the key-only wallet of `pubkey`.
async fn wallet_handler(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
) -> impl IntoResponse {
    let holder = match PublicKey::from_hex(&pubkey).and_then(|pk| HolderIdentity::new(pk, None)) {
        Ok(holder) => holder,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    match state.runtime.wallet(holder).await {
        Ok(view) => Json(view).into_response(),
        Err(RuntimeError::Root(e)) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// `POST /rpc` — JSON-RPC 2.0 gateway.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let outcome = if req.jsonrpc != "2.0" {
        Err(JsonRpcError::new(
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ))
    } else {
        dispatch(&state, &req.method, req.params.as_ref()).await
    };

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => {
            debug!(method = %req.method, code = e.code, message = %e.message, "rpc error");
            (None, Some(e))
        }
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

async fn dispatch(
    state: &AppState,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, JsonRpcError> {
    let empty = json!({});
    let params = params.unwrap_or(&empty);

    match method {
        "root_version" => return Ok(json!(state.version)),
        "root_getInfo" => {
            let snapshot = state.runtime.snapshot().await?;
            return serde_json::to_value(snapshot)
                .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()));
        }
        "root_walletAddress" | "root_getWallet" => {
            let args = params.get("args").unwrap_or(params);
            let view = state.runtime.wallet(holder(args, "holder")?).await?;
            return Ok(if method == "root_walletAddress" {
                json!(view.address)
            } else {
                serde_json::to_value(view)
                    .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?
            });
        }
        _ => {}
    }

    let args = params.get("args").unwrap_or(&empty);
    let Some(op) = parse_operation(method, args)? else {
        return Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        ));
    };
    let sender = authenticate(state, method, params, args).await?;
    let value = match params.get("value") {
        None | Some(Value::Null) => 0,
        Some(v) => amount(v, "value")?,
    };

    let outcome = state.runtime.apply(Call { sender, value, op }).await?;
    serde_json::to_value(outcome).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Bytes an external sender signs for `method` with `args`.
///
/// `serde_json` orders object keys, so any client producing the same JSON
/// value signs the same bytes.
pub fn signing_payload(method: &str, args: &Value) -> Vec<u8> {
    let mut out = method.as_bytes().to_vec();
    out.push(0);
    out.extend_from_slice(args.to_string().as_bytes());
    out
}

async fn authenticate(
    state: &AppState,
    method: &str,
    params: &Value,
    args: &Value,
) -> Result<Sender, JsonRpcError> {
    let sender = params
        .get("sender")
        .ok_or_else(|| JsonRpcError::params("missing sender"))?;
    let signature = hex_bytes(field(sender, "signature")?, "sender.signature")?;
    let signature = Signature::from_slice(&signature)
        .map_err(|_| JsonRpcError::params("sender.signature must be 64 bytes"))?;
    let payload = signing_payload(method, args);

    if let Some(addr) = sender.get("address") {
        let address = address(addr, "sender.address")?;
        let key = state.runtime.signer_of(address).await?.ok_or_else(|| {
            JsonRpcError::new(UNKNOWN_ACCOUNT, format!("no signing key known for {address}"))
        })?;
        verify(&key, &payload, &signature)?;
        return Ok(Sender::Internal(address));
    }

    let pubkey = public_key(field(sender, "pubkey")?, "sender.pubkey")?;
    verify(&pubkey, &payload, &signature)?;
    Ok(Sender::External(pubkey))
}

fn verify(pubkey: &PublicKey, payload: &[u8], signature: &Signature) -> Result<(), JsonRpcError> {
    let key = VerifyingKey::from_bytes(pubkey.as_bytes())
        .map_err(|_| JsonRpcError::new(INVALID_SIGNATURE, "signing key is not an Ed25519 key"))?;
    key.verify_strict(payload, signature)
        .map_err(|_| JsonRpcError::new(INVALID_SIGNATURE, "signature does not verify"))
}

/// Maps a `root_*` method to its operation. `Ok(None)` for unknown methods.
fn parse_operation(method: &str, args: &Value) -> Result<Option<Operation>, JsonRpcError> {
    let op = match method {
        "root_setOldRoot" => Operation::SetOldRoot(opt_address(args, "old_root")?),
        "root_setNewRoot" => Operation::SetNewRoot(opt_address(args, "new_root")?),
        "root_setWalletTemplate" => Operation::SetWalletTemplate(blob(args, "code")?),
        "root_grantTokens" => Operation::GrantTokens {
            holder: holder(args, "holder")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
            funds: opt_amount(args, "funds")?,
            notify: opt_hex(args, "notify")?,
        },
        "root_grant" => Operation::Grant {
            dest: address(field(args, "dest")?, "dest")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
            funds: opt_amount(args, "funds")?,
            notify: opt_hex(args, "notify")?,
        },
        "root_mint" => Operation::Mint {
            tokens: amount(field(args, "tokens")?, "tokens")?,
        },
        "root_provisionWallet" => Operation::ProvisionWallet {
            holder: holder(args, "holder")?,
            funds: opt_amount(args, "funds")?,
        },
        "root_provisionWalletFree" => Operation::ProvisionWalletFree {
            pubkey: public_key(field(args, "pubkey")?, "pubkey")?,
        },
        "root_requestFunding" => Operation::RequestFunding {
            holder: holder(args, "holder")?,
        },
        "root_requestIndex" => Operation::RequestIndex {
            holder: holder(args, "holder")?,
        },
        "root_burn" => Operation::Burn {
            holder: holder(args, "holder")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
            to: bytes32(field(args, "to")?, "to")?,
        },
        "root_burnToNewRoot" => Operation::BurnToNewRoot {
            holder: holder(args, "holder")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
        },
        "root_burnToTrusted" => Operation::BurnToTrusted {
            system_contract: address(field(args, "system_contract")?, "system_contract")?,
            pubaddr: address(field(args, "pubaddr")?, "pubaddr")?,
            holder: holder(args, "holder")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
        },
        "root_acceptMigratedGrant" => Operation::AcceptMigratedGrant {
            holder: holder(args, "holder")?,
            tokens: amount(field(args, "tokens")?, "tokens")?,
        },
        "root_grantTrusted" => Operation::GrantTrusted {
            pubkey: public_key(field(args, "pubkey")?, "pubkey")?,
            value: amount(field(args, "value")?, "value")?,
        },
        "root_startBatch" => Operation::StartBatch {
            entries: entries(field(args, "entries")?)?,
            multiplier: amount(field(args, "multiplier")?, "multiplier")?,
            offset: amount(field(args, "offset")?, "offset")?,
        },
        "root_upgrade" => Operation::Upgrade(blob(args, "logic")?),
        "root_onIdleNotice" => Operation::IdleNotice,
        "root_requestTotalGranted" => Operation::RequestTotalGranted,
        _ => return Ok(None),
    };
    Ok(Some(op))
}

fn field<'a>(obj: &'a Value, name: &str) -> Result<&'a Value, JsonRpcError> {
    obj.get(name)
        .ok_or_else(|| JsonRpcError::params(format!("missing {name}")))
}

fn text<'a>(v: &'a Value, name: &str) -> Result<&'a str, JsonRpcError> {
    v.as_str()
        .ok_or_else(|| JsonRpcError::params(format!("{name} must be a string")))
}

fn amount(v: &Value, name: &str) -> Result<u128, JsonRpcError> {
    let parsed = match v {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| JsonRpcError::params(format!("{name} must be a non-negative integer")))
}

fn opt_amount(args: &Value, name: &str) -> Result<u128, JsonRpcError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => amount(v, name),
    }
}

fn address(v: &Value, name: &str) -> Result<Address, JsonRpcError> {
    text(v, name)?
        .parse()
        .map_err(|e| JsonRpcError::params(format!("{name}: {e}")))
}

fn opt_address(args: &Value, name: &str) -> Result<Option<Address>, JsonRpcError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => address(v, name).map(Some),
    }
}

fn public_key(v: &Value, name: &str) -> Result<PublicKey, JsonRpcError> {
    PublicKey::from_hex(text(v, name)?).map_err(|e| JsonRpcError::params(format!("{name}: {e}")))
}

fn hex_bytes(v: &Value, name: &str) -> Result<Vec<u8>, JsonRpcError> {
    let s = text(v, name)?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|_| JsonRpcError::params(format!("{name} must be hex")))
}

fn opt_hex(args: &Value, name: &str) -> Result<Option<Vec<u8>>, JsonRpcError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => hex_bytes(v, name).map(Some),
    }
}

fn bytes32(v: &Value, name: &str) -> Result<[u8; 32], JsonRpcError> {
    hex_bytes(v, name)?
        .as_slice()
        .try_into()
        .map_err(|_| JsonRpcError::params(format!("{name} must be 32 bytes")))
}

fn blob(args: &Value, name: &str) -> Result<CodeBlob, JsonRpcError> {
    Ok(CodeBlob::new(hex_bytes(field(args, name)?, name)?))
}

/// `{ "pubkey": hex?, "owner": "wc:hex"? }`, at least one of them.
fn holder(args: &Value, name: &str) -> Result<HolderIdentity, JsonRpcError> {
    let obj = field(args, name)?;
    let pubkey = match obj.get("pubkey") {
        None | Some(Value::Null) => PublicKey::ZERO,
        Some(v) => public_key(v, "holder.pubkey")?,
    };
    let owner = opt_address(obj, "owner")?;
    HolderIdentity::new(pubkey, owner).map_err(|e| JsonRpcError::params(format!("{name}: {e}")))
}

fn entries(v: &Value) -> Result<Vec<GrantEntry>, JsonRpcError> {
    v.as_array()
        .ok_or_else(|| JsonRpcError::params("entries must be an array"))?
        .iter()
        .map(|entry| {
            Ok(GrantEntry {
                pubkey: public_key(field(entry, "pubkey")?, "entries[].pubkey")?,
                tokens: amount(field(entry, "tokens")?, "entries[].tokens")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountKey;
    use crate::runtime::tests::{boot_with, checker, config};
    use axum::body::Body;
    use axum::http::Request;
    use ed25519_dalek::{Signer, SigningKey};
    use http_body_util::BodyExt;
    use tip3_protocol::storage::LedgerDb;
    use tower::ServiceExt;

    fn owner_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn checker_key() -> SigningKey {
        SigningKey::from_bytes(&[0x22u8; 32])
    }

    fn pubkey_of(key: &SigningKey) -> PublicKey {
        PublicKey::from_bytes(key.verifying_key().to_bytes())
    }

    /// A router over a fresh root owned by [`owner_key`], relaying for the
    /// checker with [`checker_key`].
    fn test_router(supply: u128) -> Router {
        let mut config = config(supply);
        config.params.root_pubkey = pubkey_of(&owner_key());
        config.accounts.push(AccountKey {
            address: checker(),
            pubkey: pubkey_of(&checker_key()),
        });
        let runtime = boot_with(LedgerDb::open_temporary().unwrap(), &config);
        let (handle, _task) = RuntimeHandle::spawn(runtime);
        create_router(AppState {
            version: "0.1.0-test".into(),
            runtime: handle,
            started_at: Utc::now(),
        })
    }

    /// Sends a GET request and returns (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    /// Sends a POST request with a JSON body and returns (status, body_bytes).
    async fn post_json(router: &Router, path: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    async fn rpc(router: &Router, method: &str, params: Value) -> JsonRpcResponse {
        let (status, body) = post_json(
            router,
            "/rpc",
            json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    /// Params signed by `key`.
    fn signed(key: &SigningKey, method: &str, args: Value) -> Value {
        let signature = key.sign(&signing_payload(method, &args));
        json!({
            "sender": {
                "pubkey": hex::encode(key.verifying_key().to_bytes()),
                "signature": hex::encode(signature.to_bytes()),
            },
            "args": args,
        })
    }

    /// Params sent in the name of `address`, signed by `key`.
    fn signed_as(key: &SigningKey, address: &Address, method: &str, args: Value) -> Value {
        let signature = key.sign(&signing_payload(method, &args));
        json!({
            "sender": {
                "address": address.to_string(),
                "signature": hex::encode(signature.to_bytes()),
            },
            "args": args,
        })
    }

    fn grant_args(holder: u8, tokens: &str) -> Value {
        json!({ "holder": { "pubkey": hex::encode([holder; 32]) }, "tokens": tokens })
    }

    // -- REST -------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = test_router(0);
        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_the_root() {
        let router = test_router(1_000);
        let (status, body) = get(&router, "/status").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["version"], "0.1.0-test");
        assert_eq!(json["root"]["symbol"], "TOK");
        assert_eq!(json["root"]["total_supply"], "1000");
        assert_eq!(json["root"]["checker"], checker().to_string());
    }

    #[tokio::test]
    async fn wallet_endpoint_rejects_bad_keys() {
        let router = test_router(0);
        let (status, body) = get(&router, "/wallets/not-hex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("public key"));
    }

    // -- JSON-RPC envelope --------------------------------------------------------

    #[tokio::test]
    async fn wrong_version_is_an_invalid_request() {
        let router = test_router(0);
        let (_, body) = post_json(
            &router,
            "/rpc",
            json!({ "jsonrpc": "1.0", "method": "root_getInfo", "id": 7 }),
        )
        .await;
        let resp: JsonRpcResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(resp.id, json!(7));
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let router = test_router(0);
        let resp = rpc(&router, "root_selfDestruct", json!({})).await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn get_info_returns_the_snapshot() {
        let router = test_router(5);
        let resp = rpc(&router, "root_getInfo", Value::Null).await;
        let info = resp.result.unwrap();
        assert_eq!(info["name"], "Token");
        assert_eq!(info["decimals"], 9);
        assert_eq!(info["total_granted"], "0");
    }

    // -- Root calls ---------------------------------------------------------------

    #[tokio::test]
    async fn signed_grant_reaches_the_wallet() {
        let router = test_router(1_000);
        let params = signed(&owner_key(), "root_grantTokens", grant_args(1, "250"));
        let resp = rpc(&router, "root_grantTokens", params).await;
        assert!(resp.error.is_none(), "{:?}", resp.error);
        let wallet = resp.result.unwrap()["result"]["wallet"].clone();

        let (status, body) = get(&router, &format!("/wallets/{}", hex::encode([1u8; 32]))).await;
        assert_eq!(status, StatusCode::OK);
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["address"], wallet);
        assert_eq!(view["balance"], "250");
        assert_eq!(view["deployed"], true);
    }

    #[tokio::test]
    async fn tampered_args_fail_verification() {
        let router = test_router(1_000);
        let mut params = signed(&owner_key(), "root_grantTokens", grant_args(1, "10"));
        params["args"]["tokens"] = json!("1000");
        let resp = rpc(&router, "root_grantTokens", params).await;
        assert_eq!(resp.error.unwrap().code, INVALID_SIGNATURE);
    }

    #[tokio::test]
    async fn stranger_is_refused_with_the_root_code() {
        let router = test_router(1_000);
        let stranger = SigningKey::from_bytes(&[9u8; 32]);
        let params = signed(&stranger, "root_grantTokens", grant_args(1, "10"));
        let err = rpc(&router, "root_grantTokens", params).await.error.unwrap();
        assert_eq!(err.code, ROOT_REJECTED);
        assert_eq!(err.data.unwrap()["code"], 100);
    }

    #[tokio::test]
    async fn oversized_grant_reports_insufficient_supply() {
        let router = test_router(100);
        let params = signed(&owner_key(), "root_grantTokens", grant_args(1, "101"));
        let err = rpc(&router, "root_grantTokens", params).await.error.unwrap();
        assert_eq!(err.data.unwrap()["code"], 101);
    }

    fn batch_args() -> Value {
        json!({
            "entries": [
                { "pubkey": hex::encode([1u8; 32]), "tokens": 100 },
                { "pubkey": hex::encode([2u8; 32]), "tokens": "200" },
            ],
            "multiplier": 9000,
            "offset": 5,
        })
    }

    #[tokio::test]
    async fn checker_runs_a_batch() {
        let router = test_router(0);
        let params = signed_as(&checker_key(), &checker(), "root_startBatch", batch_args());
        let resp = rpc(&router, "root_startBatch", params).await;
        assert!(resp.error.is_none(), "{:?}", resp.error);

        let info = rpc(&router, "root_getInfo", Value::Null).await.result.unwrap();
        assert_eq!(info["total_supply"], "300");
        assert_eq!(info["pending_messages"], 0);

        let view = rpc(
            &router,
            "root_getWallet",
            json!({ "holder": { "pubkey": hex::encode([2u8; 32]) } }),
        )
        .await
        .result
        .unwrap();
        assert_eq!(view["balance"], "15");
    }

    #[tokio::test]
    async fn claiming_the_checker_needs_its_key() {
        let router = test_router(0);
        let unsigned = json!({ "sender": { "address": checker().to_string() }, "args": batch_args() });
        let err = rpc(&router, "root_startBatch", unsigned).await.error.unwrap();
        assert_eq!(err.code, INVALID_PARAMS);

        let forged = signed_as(&owner_key(), &checker(), "root_startBatch", batch_args());
        let err = rpc(&router, "root_startBatch", forged).await.error.unwrap();
        assert_eq!(err.code, INVALID_SIGNATURE);

        let info = rpc(&router, "root_getInfo", Value::Null).await.result.unwrap();
        assert_eq!(info["total_supply"], "0");
    }

    #[tokio::test]
    async fn unknown_internal_sender_is_refused() {
        let router = test_router(1_000);
        let stranger = Address::new(0, [0x55; 32]);
        let args = json!({ "holder": { "pubkey": hex::encode([1u8; 32]) }, "tokens": "5" });
        let params = signed_as(&owner_key(), &stranger, "root_acceptMigratedGrant", args);
        let err = rpc(&router, "root_acceptMigratedGrant", params).await.error.unwrap();
        assert_eq!(err.code, UNKNOWN_ACCOUNT);
    }

    #[tokio::test]
    async fn only_the_holder_burns_from_a_wallet() {
        let router = test_router(1_000);
        let holder_key = SigningKey::from_bytes(&[5u8; 32]);
        let holder_hex = hex::encode(holder_key.verifying_key().to_bytes());
        let grant = json!({ "holder": { "pubkey": holder_hex }, "tokens": "100" });
        let resp = rpc(&router, "root_grantTokens", signed(&owner_key(), "root_grantTokens", grant)).await;
        let wallet: Address = resp.result.unwrap()["result"]["wallet"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let burn = json!({
            "holder": { "pubkey": holder_hex },
            "tokens": "40",
            "to": hex::encode([0u8; 32]),
        });
        let thief = SigningKey::from_bytes(&[6u8; 32]);
        let err = rpc(&router, "root_burn", signed_as(&thief, &wallet, "root_burn", burn.clone()))
            .await
            .error
            .unwrap();
        assert_eq!(err.code, INVALID_SIGNATURE);

        let resp = rpc(&router, "root_burn", signed_as(&holder_key, &wallet, "root_burn", burn)).await;
        assert!(resp.error.is_none(), "{:?}", resp.error);

        let (_, body) = get(&router, &format!("/wallets/{holder_hex}")).await;
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["balance"], "60");
        let info = rpc(&router, "root_getInfo", Value::Null).await.result.unwrap();
        assert_eq!(info["total_supply"], "960");
    }

    #[tokio::test]
    async fn malformed_amount_is_invalid_params() {
        let router = test_router(1_000);
        let params = signed(&owner_key(), "root_grantTokens", grant_args(1, "-3"));
        let err = rpc(&router, "root_grantTokens", params).await.error.unwrap();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn holder_needs_a_credential() {
        let router = test_router(1_000);
        let args = json!({ "holder": {}, "tokens": "1" });
        let params = signed(&owner_key(), "root_grantTokens", args);
        let err = rpc(&router, "root_grantTokens", params).await.error.unwrap();
        assert_eq!(err.code, INVALID_PARAMS);
    }
}
