use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub google: GoogleConfig,
    pub payment: PaymentConfig,
    pub scheduler: SchedulerConfig,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub client_key: String,
    pub client_secret: String,
    pub base_url: String,
    pub monthly_amount: i64,
    pub goods_name: String,
    pub token_grant: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub shared_secret: String,
    pub daily_cron: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    pub message_ttl_secs: u64,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // App config
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "schedai-server".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Database config
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| {
                AppError::Configuration("SERVER_PORT must be a valid port number".to_string())
            })?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Auth config
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Configuration("JWT_SECRET must be set".to_string()))?;

        // Language-model provider
        let llm_api_key = env::var("LLM_API_KEY")
            .map_err(|_| AppError::Configuration("LLM_API_KEY must be set".to_string()))?;
        let llm_base_url = env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        // Google OAuth client (used for access-token refresh)
        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| AppError::Configuration("GOOGLE_CLIENT_ID must be set".to_string()))?;
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| AppError::Configuration("GOOGLE_CLIENT_SECRET must be set".to_string()))?;

        // Payment gateway
        let payment_client_key = env::var("PAYMENT_CLIENT_KEY")
            .map_err(|_| AppError::Configuration("PAYMENT_CLIENT_KEY must be set".to_string()))?;
        let payment_client_secret = env::var("PAYMENT_CLIENT_SECRET").map_err(|_| {
            AppError::Configuration("PAYMENT_CLIENT_SECRET must be set".to_string())
        })?;
        let payment_base_url = env::var("PAYMENT_BASE_URL")
            .unwrap_or_else(|_| "https://api.nicepay.co.kr".to_string());
        let monthly_amount = env::var("PAYMENT_MONTHLY_AMOUNT")
            .unwrap_or_else(|_| "9900".to_string())
            .parse::<i64>()
            .map_err(|_| {
                AppError::Configuration("PAYMENT_MONTHLY_AMOUNT must be a valid number".to_string())
            })?;
        let goods_name =
            env::var("PAYMENT_GOODS_NAME").unwrap_or_else(|_| "SchedAI Premium".to_string());
        let token_grant = env::var("PREMIUM_TOKEN_GRANT")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<i32>()
            .map_err(|_| {
                AppError::Configuration("PREMIUM_TOKEN_GRANT must be a valid number".to_string())
            })?;

        // Daily billing trigger
        let scheduler_shared_secret = env::var("SCHEDULER_SHARED_SECRET").map_err(|_| {
            AppError::Configuration("SCHEDULER_SHARED_SECRET must be set".to_string())
        })?;
        let daily_cron = env::var("BILLING_DAILY_CRON").ok();

        // Message cache
        let message_ttl_secs = env::var("MESSAGE_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .map_err(|_| {
                AppError::Configuration("MESSAGE_CACHE_TTL_SECS must be a valid number".to_string())
            })?;

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            database: DatabaseConfig { url: database_url },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            auth: AuthConfig { jwt_secret },
            llm: LlmConfig {
                api_key: llm_api_key,
                base_url: llm_base_url,
            },
            google: GoogleConfig {
                client_id: google_client_id,
                client_secret: google_client_secret,
            },
            payment: PaymentConfig {
                client_key: payment_client_key,
                client_secret: payment_client_secret,
                base_url: payment_base_url,
                monthly_amount,
                goods_name,
                token_grant,
            },
            scheduler: SchedulerConfig {
                shared_secret: scheduler_shared_secret,
                daily_cron,
            },
            cache: CacheConfig { message_ttl_secs },
        })
    }
}
