pub mod google_client;
pub mod llm_client;

pub use google_client::GoogleClient;
pub use llm_client::LlmClient;
