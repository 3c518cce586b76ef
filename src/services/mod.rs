pub mod auth;
pub mod billing_scheduler;
pub mod chat_service;
pub mod credential_store;
pub mod message_cache;
pub mod metering;
pub mod payment_gateway;
pub mod scheduler;

pub use billing_scheduler::{BillingRunSummary, BillingScheduler, PaymentOutcome};
pub use chat_service::ChatService;
pub use credential_store::CredentialStore;
pub use message_cache::MessageCache;
pub use metering::MeteringService;
pub use payment_gateway::PaymentGatewayClient;
