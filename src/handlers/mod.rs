pub mod billing_handlers;
pub mod chat_handlers;
pub mod health;
