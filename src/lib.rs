use std::sync::Arc;

pub mod config;
pub mod domain {
    pub mod intent;
    pub mod registration;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod intents;
        pub mod manual_confirm;
        pub mod ops;
        pub mod registrations;
        pub mod verify;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
}
pub mod intents;
pub mod repo {
    pub mod payment_records_repo;
    pub mod registrations_repo;
}
pub mod service {
    pub mod checkout;
    pub mod intent_sweeper;
    pub mod manual_confirm;
    pub mod materializer;
    pub mod reconciler;
}

#[derive(Clone)]
pub struct AppState {
    pub checkout_service: service::checkout::CheckoutService,
    pub reconciler: service::reconciler::ConfirmationReconciler,
    pub manual_confirmation: service::manual_confirm::ManualConfirmation,
    pub gateway: Arc<dyn gateways::CheckoutGateway>,
    pub intents: Arc<dyn intents::IntentStore>,
    pub pool: sqlx::PgPool,
    pub redis_client: redis::Client,
    pub currency: String,
    pub intent_ttl_secs: u64,
}
