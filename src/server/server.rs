use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use super::metrics::{metrics_handler, record_login_attempt};
use super::session::Session;
use super::{
    log_requests, make_pin_routes, make_place_routes, make_playlist_routes, state::*,
    ServerConfig,
};
use crate::auth::{AuthError, Authenticator};
use crate::error::{SongPinError, SongPinResult};
use crate::member::MemberManager;
use crate::pin::{EngineSettings, PinEngine};
use crate::store::{MemberId, SongPinStore};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub member_id: Option<MemberId>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct SignupBody {
    pub handle: String,
    pub nickname: String,
    pub password: String,
}

#[derive(Serialize)]
struct SignupResponse {
    member_id: MemberId,
}

#[derive(Deserialize)]
struct LoginBody {
    pub handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    member_id: MemberId,
    expires: i64,
}

#[derive(Serialize)]
struct MeResponse {
    member_id: MemberId,
    handle: String,
    nickname: String,
}

fn auth_failure(err: AuthError) -> SongPinError {
    match err {
        AuthError::CacheUnavailable(err) => {
            SongPinError::ExternalDependencyFailure(format!("Token cache unavailable: {:#}", err))
        }
        AuthError::InvalidToken(msg) => SongPinError::InvalidInput(msg),
        AuthError::Internal(err) => SongPinError::Store(err),
    }
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        member_id: session.map(|s| s.member_id),
    };
    Json(stats)
}

async fn signup(
    State(member_manager): State<MemberManager>,
    Json(body): Json<SignupBody>,
) -> SongPinResult<impl IntoResponse> {
    debug!("signup() called for handle {}", body.handle);
    let member_id = member_manager.signup(&body.handle, &body.nickname, &body.password)?;
    Ok((StatusCode::CREATED, Json(SignupResponse { member_id })))
}

async fn login(
    State(member_manager): State<MemberManager>,
    State(authenticator): State<Authenticator>,
    Json(body): Json<LoginBody>,
) -> SongPinResult<impl IntoResponse> {
    debug!("login() called for handle {}", body.handle);
    let start = Instant::now();

    let Some(member) = member_manager.verify_login(&body.handle, &body.password)? else {
        record_login_attempt("failure", start.elapsed());
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "UNAUTHENTICATED",
                "message": "Wrong handle or password",
            })),
        )
            .into_response());
    };

    let issued = authenticator.issue_token(member.id).map_err(|err| {
        error!("Error with auth token generation: {}", err);
        auth_failure(err)
    })?;
    record_login_attempt("success", start.elapsed());
    Ok((
        StatusCode::CREATED,
        Json(LoginSuccessResponse {
            token: issued.token,
            member_id: member.id,
            expires: issued.claims.exp,
        }),
    )
        .into_response())
}

async fn logout(
    session: Session,
    State(authenticator): State<Authenticator>,
) -> SongPinResult<StatusCode> {
    authenticator.revoke(&session.claims).map_err(auth_failure)?;
    debug!("Member {} logged out", session.member_id);
    Ok(StatusCode::OK)
}

async fn get_me(
    session: Session,
    State(member_manager): State<MemberManager>,
) -> SongPinResult<Json<MeResponse>> {
    let member = member_manager.get_member(session.member_id)?;
    Ok(Json(MeResponse {
        member_id: member.id,
        handle: member.handle,
        nickname: member.nickname,
    }))
}

pub fn make_app(
    config: ServerConfig,
    store: SongPinStore,
    engine_settings: EngineSettings,
    authenticator: Authenticator,
) -> Router {
    let pin_engine = PinEngine::new(store.clone(), engine_settings);
    let state = ServerState::new(config.clone(), store, pin_engine, authenticator);

    let auth_routes: Router = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let v1_routes: Router = Router::new()
        .route("/me", get(get_me))
        .with_state(state.clone())
        .merge(make_pin_routes(state.clone()))
        .merge(make_playlist_routes(state.clone()));

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/places", make_place_routes(state.clone()))
        .nest("/v1", v1_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

pub async fn run_server(
    config: ServerConfig,
    store: SongPinStore,
    engine_settings: EngineSettings,
    authenticator: Authenticator,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, store, engine_settings, authenticator);

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?)
}
