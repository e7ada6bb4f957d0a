use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use registration_payments::config::AppConfig;
use registration_payments::gateways::stripe::StripeCheckoutGateway;
use registration_payments::gateways::CheckoutGateway;
use registration_payments::intents::store_redis::RedisIntentStore;
use registration_payments::intents::IntentStore;
use registration_payments::repo::payment_records_repo::PaymentRecordsRepo;
use registration_payments::repo::registrations_repo::RegistrationsRepo;
use registration_payments::service::checkout::CheckoutService;
use registration_payments::service::intent_sweeper::IntentSweeper;
use registration_payments::service::manual_confirm::ManualConfirmation;
use registration_payments::service::materializer::RegistrationMaterializer;
use registration_payments::service::reconciler::ConfirmationReconciler;
use registration_payments::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let intent_store: Arc<dyn IntentStore> = Arc::new(RedisIntentStore::new(&cfg.redis_url)?);
    let gateway: Arc<dyn CheckoutGateway> = Arc::new(StripeCheckoutGateway {
        base_url: cfg.checkout_base_url.clone(),
        secret_key: cfg.checkout_secret_key.clone(),
        webhook_secret: cfg.checkout_webhook_secret.clone(),
        timeout_ms: cfg.gateway_timeout_ms,
        client: reqwest::Client::new(),
    });

    let registrations_repo = RegistrationsRepo { pool: pool.clone() };
    let payments_repo = PaymentRecordsRepo { pool: pool.clone() };
    let materializer = RegistrationMaterializer {
        pool: pool.clone(),
        registrations_repo: registrations_repo.clone(),
        payments_repo: payments_repo.clone(),
    };
    let reconciler = ConfirmationReconciler {
        gateway: gateway.clone(),
        intents: intent_store.clone(),
        payments_repo: payments_repo.clone(),
        materializer: materializer.clone(),
    };
    let checkout_service = CheckoutService {
        gateway: gateway.clone(),
        intents: intent_store.clone(),
        materializer,
        currency: cfg.currency.clone(),
        intent_ttl_secs: cfg.intent_ttl_secs,
        success_url: cfg.checkout_success_url.clone(),
        cancel_url: cfg.checkout_cancel_url.clone(),
    };
    let manual_confirmation = ManualConfirmation {
        payments_repo: payments_repo.clone(),
    };

    let sweeper = IntentSweeper {
        intents: intent_store.clone(),
        interval: std::time::Duration::from_secs(cfg.sweep_interval_secs),
    };
    tokio::spawn(sweeper.run());

    let state = AppState {
        checkout_service,
        reconciler,
        manual_confirmation,
        gateway,
        intents: intent_store,
        pool,
        redis_client: redis::Client::open(cfg.redis_url.clone())?,
        currency: cfg.currency.clone(),
        intent_ttl_secs: cfg.intent_ttl_secs,
    };

    let admin_key = cfg.internal_api_key.clone();
    let admin_routes = Router::new()
        .route(
            "/admin/payments/:payment_id/confirm",
            post(registration_payments::http::handlers::manual_confirm::confirm_payment),
        )
        .route(
            "/admin/intents/:reference",
            put(registration_payments::http::handlers::intents::put_intent)
                .get(registration_payments::http::handlers::intents::get_intent),
        )
        .layer(from_fn_with_state(
            admin_key,
            registration_payments::http::middleware::admin_auth::require_internal_api_key,
        ));

    let app = Router::new()
        .route("/health", get(registration_payments::http::handlers::registrations::health))
        .route(
            "/registrations",
            post(registration_payments::http::handlers::registrations::submit_registration),
        )
        .route(
            "/payments/checkout/webhook",
            post(registration_payments::http::handlers::webhooks::checkout_webhook),
        )
        .route(
            "/payments/checkout/verify",
            get(registration_payments::http::handlers::verify::verify_checkout),
        )
        .route("/ops/readiness", get(registration_payments::http::handlers::ops::readiness))
        .route("/ops/liveness", get(registration_payments::http::handlers::ops::liveness))
        .merge(admin_routes)
        .layer(from_fn_with_state(
            registration_payments::http::middleware::rate_limit::RateLimitState {
                redis_client: redis::Client::open(cfg.redis_url.clone())?,
                max_per_minute: 300,
            },
            registration_payments::http::middleware::rate_limit::enforce,
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
