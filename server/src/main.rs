//! idtoken-server: HTTP adapter for the ID token verification core
//!
//! Lightweight HTTP/1 server using hyper. Each connection runs on its own
//! task; all verification state lives in the shared provider.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use idtoken_core::auth::{callback, login};
use idtoken_core::config::Config;
use idtoken_core::error::{ApiError, ErrorResponse};
use idtoken_core::provider::Provider;

mod platform;

use platform::{ProcessEnv, ReqwestHttpClient, SystemClock};

/// Shared application state
struct AppState {
    provider: Provider,
    environment: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .map_err(|_| "PORT must be a number")?;

    let config = Config::from_env(&ProcessEnv)?;
    let http = Arc::new(ReqwestHttpClient::new(config.fetch_timeout)?);
    let provider = Provider::from_config(&config, http, Arc::new(SystemClock)).await?;

    tracing::info!(
        issuer = %provider.metadata.issuer,
        client_id = %provider.metadata.client_id,
        jwks_uri = %provider.metadata.jwks_uri,
        token_endpoint = %provider.metadata.token_endpoint,
        "provider configured"
    );

    let state = Arc::new(AppState {
        provider,
        environment: config.environment.clone(),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!(port, "idtoken-server listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let state = state.clone();

        tokio::spawn(async move {
            let io = hyper_util::rt::TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, &state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %e, "connection error");
            }
        });
    }
}

type HyperResponse = Response<Full<Bytes>>;

async fn handle_request(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<HyperResponse, std::convert::Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = route_request(req, state).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "request");
    Ok(response)
}

async fn route_request(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/health") => handle_health(state),
        (Method::GET, "/api/config") => json_response(StatusCode::OK, &state.provider.metadata),
        (Method::GET, "/api/jwks") => handle_jwks(state).await,
        (Method::POST, "/api/login") => handle_login(req, state).await,
        (Method::POST, "/api/callback") => handle_callback(req, state).await,
        _ => json_response(StatusCode::NOT_FOUND, &serde_json::json!({"error": "not_found"})),
    }
}

fn handle_health(state: &AppState) -> HyperResponse {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "environment": state.environment,
            "issuer": state.provider.metadata.issuer,
            "clientId": state.provider.metadata.client_id,
        }),
    )
}

async fn handle_jwks(state: &AppState) -> HyperResponse {
    match state.provider.key_set().ensure_fresh().await {
        Ok(status) => {
            let cache_expiry = status
                .expires_at
                .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0))
                .map(|dt| dt.to_rfc3339());
            json_response(
                StatusCode::OK,
                &serde_json::json!({
                    "keysCount": status.key_ids.len(),
                    "keyIds": status.key_ids,
                    "cacheExpiry": cache_expiry,
                    "jwksUri": status.jwks_uri,
                }),
            )
        }
        Err(e) => error_response(&e),
    }
}

async fn handle_login(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let request: login::LoginRequest = match read_json(req).await {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    match login::handle(request, &state.provider).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(&e),
    }
}

async fn handle_callback(req: Request<Incoming>, state: &AppState) -> HyperResponse {
    let request: callback::CallbackRequest = match read_json(req).await {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    match callback::handle(request, &state.provider).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(&e),
    }
}

async fn read_json<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T, ApiError> {
    let body = req
        .collect()
        .await
        .map_err(|_| ApiError::invalid_request("failed to read body"))?
        .to_bytes();

    serde_json::from_slice(&body).map_err(|e| ApiError::invalid_request(format!("invalid JSON body: {}", e)))
}

fn error_response(err: &ApiError) -> HyperResponse {
    tracing::warn!(error = %err, "request failed");
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(err);
    json_response(status, &body)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> HyperResponse {
    let json = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}
