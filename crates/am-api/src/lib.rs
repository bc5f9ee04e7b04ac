use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    extract::State,
    extract::connect_info::ConnectInfo,
    http::Method,
    http::Request,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use am_common::db::{PgStore, create_pool_from_url, create_pool_from_url_checked, run_migrations};
use am_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use am_common::matching::MatchingConfig;
use am_common::run_id;
use am_common::service::MatchService;
use am_common::store::InMemoryStore;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod store;

use auth::{AuthConfig, AuthMode, JwtAlgorithm, JwtKeyKind};
use error::ApiError;
use handlers::{health, matches, personality, profiles};
use store::AppStore;

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const METRICS_PORT_ENV: &str = "AM_METRICS_PORT";
const DEFAULT_METRICS_PORT: u16 = 9102;

#[derive(Debug, Clone, Parser)]
#[command(name = "am-api", about = "HTTP API for activity match generation and ranking")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "AM_API_KEY")]
    api_key: Option<String>,

    /// Authentication mode: api_key | jwt
    #[arg(long, env = "AUTH_MODE", default_value = "api_key", value_enum)]
    auth_mode: AuthMode,

    /// JWT secret for symmetric algorithms
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// PEM public key for asymmetric algorithms
    #[arg(long, env = "JWT_PUBLIC_KEY")]
    jwt_public_key: Option<String>,

    #[arg(long, env = "JWT_ALGORITHM", default_value = "hs512", value_enum)]
    jwt_algorithm: JwtAlgorithm,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "AM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "AM_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key,
            jwt_secret: cli.jwt_secret,
            jwt_public_key: cli.jwt_public_key,
            jwt_algorithm: cli.jwt_algorithm,
        };
        validate_auth(&auth)?;

        Ok(Self {
            database_url: cli.database_url,
            port: cli.port,
            cors_origins,
            auth,
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            database_url: "postgres://am:am@localhost:5432/matchmaking".into(),
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
        }
    }
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ApiError> {
    let missing = match auth.mode {
        AuthMode::ApiKey if auth.api_key.is_none() => Some("AM_API_KEY is required when AUTH_MODE=api_key"),
        AuthMode::Jwt => match auth.jwt_algorithm.key_kind() {
            JwtKeyKind::Secret if auth.jwt_secret.is_none() => {
                Some("JWT_SECRET is required when AUTH_MODE=jwt with symmetric algorithms")
            }
            JwtKeyKind::RsaPem | JwtKeyKind::EcPem if auth.jwt_public_key.is_none() => {
                Some("JWT_PUBLIC_KEY is required when AUTH_MODE=jwt with asymmetric algorithms")
            }
            _ => None,
        },
        _ => None,
    };

    match missing {
        Some(message) => Err(ApiError::BadRequest(message.into())),
        None => Ok(()),
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
    generate: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub global_per_sec: u64,
    pub global_burst: u32,
    /// Strict generation fans out one task per candidate, so it gets its own budget.
    pub generate_per_sec: u64,
    pub generate_burst: u32,
}

impl RateLimitConfig {
    fn parse_env<T: std::str::FromStr + PartialOrd + Default>(name: &str) -> Option<T> {
        env::var(name)
            .ok()
            .and_then(|value| value.trim().parse::<T>().ok())
            .filter(|value| *value > T::default())
    }

    pub fn from_env() -> Self {
        Self {
            global_per_sec: Self::parse_env("AM_RATE_LIMIT_GLOBAL_PER_SEC").unwrap_or(20),
            global_burst: Self::parse_env("AM_RATE_LIMIT_GLOBAL_BURST").unwrap_or(40),
            generate_per_sec: Self::parse_env("AM_RATE_LIMIT_GENERATE_PER_SEC").unwrap_or(2),
            generate_burst: Self::parse_env("AM_RATE_LIMIT_GENERATE_BURST").unwrap_or(5),
        }
    }
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = (1_000_000_000u64 / per_second.max(1)).max(1);
    let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst);

    Arc::new(RateLimiter::keyed(quota))
}

pub fn default_rate_limits() -> RateLimits {
    let cfg = RateLimitConfig::from_env();
    RateLimits {
        global: build_ip_limiter(cfg.global_per_sec, cfg.global_burst),
        generate: build_ip_limiter(cfg.generate_per_sec, cfg.generate_burst),
    }
}

pub struct AppState<S = PgStore> {
    pub service: MatchService<S>,
    pub config: AppConfig,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState<S = PgStore> = Arc<AppState<S>>;

impl<S> axum::extract::FromRef<SharedState<S>> for AuthConfig {
    fn from_ref(input: &SharedState<S>) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ])
        .allow_credentials(true)
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    match ip {
        Some(client_ip) if limiter.check_key(&client_ip).is_err() => {
            Err(ApiError::TooManyRequests("rate limit exceeded".into()))
        }
        _ => Ok(()),
    }
}

async fn global_rate_limit<S: AppStore>(
    State(state): State<SharedState<S>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.global, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn generate_rate_limit<S: AppStore>(
    State(state): State<SharedState<S>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.generate, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router<S: AppStore>(state: SharedState<S>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route(
            "/matches/generate",
            post(matches::generate::<S>).route_layer(middleware::from_fn_with_state(
                state.clone(),
                generate_rate_limit::<S>,
            )),
        )
        .route("/matches/score", post(matches::score::<S>))
        .route("/matches/:id/status", patch(matches::update_status::<S>))
        .route("/users/:user_id", get(profiles::get_profile::<S>))
        .route("/users/:user_id/matches", get(matches::list_for_user::<S>))
        .route("/users/:user_id/ranked", get(matches::ranked::<S>))
        .route(
            "/users/:user_id/availability",
            put(profiles::put_availability::<S>),
        )
        .route("/users/:user_id/resources", put(profiles::put_resources::<S>))
        .route("/personality/questions", get(personality::questions::<S>))
        .route("/personality/complete", post(personality::complete::<S>));

    Router::new()
        .route("/health", get(health::readyz::<S>))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz::<S>))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit::<S>,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

fn build_state<S: AppStore>(store: S, config: AppConfig, matching: MatchingConfig) -> SharedState<S> {
    Arc::new(AppState {
        service: MatchService::new(Arc::new(store), matching),
        config,
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

/// Postgres-backed state whose pool never connects; for router tests that do
/// not reach the database.
pub fn test_state(api_key: &str) -> SharedState {
    let pool = create_pool_from_url("postgres://am:am@localhost:5432/matchmaking")
        .expect("pool should build without connecting");

    build_state(
        PgStore::new(pool),
        AppConfig::for_tests(AuthConfig::api_key(api_key)),
        MatchingConfig::default(),
    )
}

/// State over an in-memory store, for end-to-end handler tests.
pub fn memory_state(api_key: &str, store: InMemoryStore) -> SharedState<InMemoryStore> {
    build_state(
        store,
        AppConfig::for_tests(AuthConfig::api_key(api_key)),
        MatchingConfig::default(),
    )
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let pool = create_pool_from_url_checked(&config.database_url).await?;
    run_migrations(&pool).await?;

    am_metrics::init_metrics(METRICS_PORT_ENV, DEFAULT_METRICS_PORT);

    let matching = MatchingConfig::from_env();
    info!(
        weights = ?matching.weights,
        min_compatibility_score = matching.min_compatibility_score,
        strict_match_limit = matching.strict.max_matches,
        "matching configuration loaded"
    );

    let state = build_state(PgStore::new(pool), config.clone(), matching);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, auth_mode = ?config.auth.mode, process_id = run_id::process(), "am-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal<S>(state: SharedState<S>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);
    info!("shutdown requested; draining");

    // Let load balancers observe /readyz as not ready before the listener closes.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;
    use tower::ServiceExt;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_envs(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(var, value)| {
                let old = env::var(var).ok();
                match value {
                    Some(v) => unsafe { env::set_var(var, v) },
                    None => unsafe { env::remove_var(var) },
                }
                (*var, old)
            })
            .collect();

        f();

        for (var, previous_value) in previous {
            match previous_value {
                Some(v) => unsafe { env::set_var(var, v) },
                None => unsafe { env::remove_var(var) },
            }
        }
    }

    fn cli(auth_mode: AuthMode) -> Cli {
        Cli {
            database_url: "postgres://am:am@localhost:5432/matchmaking".into(),
            port: 3001,
            api_key: None,
            auth_mode,
            jwt_secret: None,
            jwt_public_key: None,
            jwt_algorithm: JwtAlgorithm::Hs512,
            cors_origins: "http://localhost:3000, https://app.example.com".into(),
        }
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = create_router(memory_state("test-key", InMemoryStore::new()));

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn rate_limit_config_respects_env_overrides() {
        with_envs(
            &[
                ("AM_RATE_LIMIT_GLOBAL_PER_SEC", Some("10")),
                ("AM_RATE_LIMIT_GLOBAL_BURST", Some("25")),
                ("AM_RATE_LIMIT_GENERATE_PER_SEC", Some("0")),
                ("AM_RATE_LIMIT_GENERATE_BURST", None),
            ],
            || {
                assert_eq!(
                    RateLimitConfig::from_env(),
                    RateLimitConfig {
                        global_per_sec: 10,
                        global_burst: 25,
                        generate_per_sec: 2,
                        generate_burst: 5,
                    }
                );
            },
        );
    }

    #[test]
    fn config_requires_credentials_for_auth_mode() {
        assert!(AppConfig::from_cli(cli(AuthMode::ApiKey)).is_err());
        assert!(AppConfig::from_cli(cli(AuthMode::Jwt)).is_err());

        let mut with_key = cli(AuthMode::ApiKey);
        with_key.api_key = Some("k".into());
        let config = AppConfig::from_cli(with_key).unwrap();
        assert_eq!(config.cors_origins.len(), 2);

        let mut wildcard = cli(AuthMode::ApiKey);
        wildcard.api_key = Some("k".into());
        wildcard.cors_origins = "*".into();
        assert!(AppConfig::from_cli(wildcard).is_err());
    }

    #[test]
    fn limiter_blocks_after_burst() {
        let limiter = build_ip_limiter(1, 2);
        let ip: IpAddr = [10, 0, 0, 1].into();

        assert!(enforce_rate_limit(&limiter, Some(ip)).is_ok());
        assert!(enforce_rate_limit(&limiter, Some(ip)).is_ok());
        assert!(matches!(
            enforce_rate_limit(&limiter, Some(ip)),
            Err(ApiError::TooManyRequests(_))
        ));
        assert!(enforce_rate_limit(&limiter, None).is_ok());
    }
}
