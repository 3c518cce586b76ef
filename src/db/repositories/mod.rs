pub mod billing_repository;
pub mod chat_repository;
pub mod message_repository;
pub mod subscription_repository;
pub mod transaction_repository;
pub mod user_repository;

pub use billing_repository::{Billing, BillingRepository};
pub use chat_repository::{Chat, ChatRepository};
pub use message_repository::{MessageRecord, MessageRepository};
pub use subscription_repository::{Subscription, SubscriptionRepository};
pub use transaction_repository::{TransactionRecord, TransactionRepository};
pub use user_repository::{GoogleCredentials, MeteringState, User, UserRepository};
