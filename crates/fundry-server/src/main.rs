mod expiry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use fundry_api::auth::{self, AppState, AppStateInner};
use fundry_api::config::PlatformConfig;
use fundry_api::middleware::{attach_claims, require_auth};
use fundry_api::{campaigns, files, investments, notifications, payments};
use fundry_rates::RateService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundry=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("FUNDRY_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FUNDRY_DB_PATH").unwrap_or_else(|_| "fundry.db".into());
    let host = std::env::var("FUNDRY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FUNDRY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let expiry_interval_secs: u64 = std::env::var("FUNDRY_EXPIRY_INTERVAL_SECS")
        .unwrap_or_else(|_| "3600".into())
        .parse()?;
    let config = PlatformConfig::from_env();

    // Init database
    let db = fundry_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        config,
        rates: RateService::with_default_sources(fundry_rates::DEFAULT_TTL),
        http: reqwest::Client::new(),
    });

    // Stale-pledge expiry in the background
    tokio::spawn(expiry::run_expiry_loop(state.clone(), expiry_interval_secs));

    // Routes. Campaign reads are public but run attach_claims so a
    // logged-in founder sees their own drafts, private links and private
    // updates through the same endpoints.
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/campaigns", get(campaigns::list_campaigns))
        .route("/api/campaigns/{campaign_id}", get(campaigns::get_campaign))
        .route(
            "/api/campaigns/{campaign_id}/updates",
            get(campaigns::list_campaign_updates),
        )
        .route(
            "/api/campaigns/link/{token}",
            get(campaigns::get_campaign_by_private_link),
        )
        .route("/api/payments/callback", post(payments::payment_callback))
        .layer(middleware::from_fn(attach_claims))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/me", get(auth::me))
        .route("/api/me/onboarding", post(auth::complete_onboarding))
        .route("/api/campaigns", post(campaigns::create_campaign))
        .route(
            "/api/campaigns/{campaign_id}",
            axum::routing::patch(campaigns::update_campaign),
        )
        .route(
            "/api/campaigns/{campaign_id}/status",
            post(campaigns::update_campaign_status),
        )
        .route(
            "/api/campaigns/{campaign_id}/updates",
            post(campaigns::create_campaign_update),
        )
        .route(
            "/api/campaigns/{campaign_id}/invest",
            post(investments::pledge),
        )
        .route("/api/investments", get(investments::list_my_investments))
        .route(
            "/api/investments/{investment_id}/safe-preview",
            get(investments::safe_preview),
        )
        .route(
            "/api/investments/{investment_id}/terms",
            post(investments::accept_terms),
        )
        .route(
            "/api/investments/{investment_id}/sign",
            post(investments::sign),
        )
        .route(
            "/api/investments/{investment_id}/pay",
            post(payments::init_payment),
        )
        .route(
            "/api/investments/{investment_id}/agreement",
            get(investments::get_agreement),
        )
        .route(
            "/api/investments/{investment_id}/agreement/countersign",
            post(investments::counter_sign),
        )
        .route(
            "/api/me/files",
            get(files::list_uploads).post(files::record_upload),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/{notification_id}/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Fundry server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
