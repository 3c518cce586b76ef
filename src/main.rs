use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use log::info;
use std::io;
use std::sync::Arc;

use schedai_server::clients::{GoogleClient, LlmClient};
use schedai_server::config::AppSettings;
use schedai_server::db::connection::{create_pool, verify_connection};
use schedai_server::db::repositories::{
    BillingRepository, ChatRepository, MessageRepository, SubscriptionRepository,
    TransactionRepository, UserRepository,
};
use schedai_server::routes;
use schedai_server::services::auth::jwt;
use schedai_server::services::{
    BillingScheduler, ChatService, CredentialStore, MessageCache, MeteringService,
    PaymentGatewayClient, scheduler,
};
use schedai_server::tools::ToolRegistry;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = AppSettings::from_env()
        .map_err(|e| io::Error::other(format!("Configuration error: {}", e)))?;
    info!(
        "Starting {} ({})",
        settings.app.name, settings.app.environment
    );

    jwt::init_jwt_keys(&settings.auth.jwt_secret)
        .map_err(|e| io::Error::other(format!("JWT key initialization failed: {}", e)))?;

    let pool = create_pool(&settings.database.url)
        .await
        .map_err(|e| io::Error::other(format!("Database pool creation failed: {}", e)))?;
    verify_connection(&pool)
        .await
        .map_err(|e| io::Error::other(format!("Database connection check failed: {}", e)))?;

    let http = reqwest::Client::new();

    let user_repo = UserRepository::new(pool.clone());
    let chat_repo = ChatRepository::new(pool.clone());
    let message_repo = MessageRepository::new(pool.clone());
    let billing_repo = BillingRepository::new(pool.clone());
    let transaction_repo = TransactionRepository::new(pool.clone());
    let subscription_repo = SubscriptionRepository::new(pool.clone());

    let llm = Arc::new(LlmClient::new(
        http.clone(),
        settings.llm.api_key.clone(),
        settings.llm.base_url.clone(),
    ));
    let google = Arc::new(GoogleClient::new(http.clone()));
    let credentials = Arc::new(CredentialStore::new(
        user_repo.clone(),
        http.clone(),
        settings.google.client_id.clone(),
        settings.google.client_secret.clone(),
    ));
    let gateway = PaymentGatewayClient::new(
        http.clone(),
        settings.payment.base_url.clone(),
        settings.payment.client_key.clone(),
        settings.payment.client_secret.clone(),
    );

    let metering = MeteringService::new(
        pool.clone(),
        user_repo.clone(),
        chat_repo.clone(),
        message_repo.clone(),
    );
    let chat_service = ChatService::new(
        metering,
        user_repo.clone(),
        chat_repo,
        message_repo,
        llm,
        google,
        Arc::new(ToolRegistry::new()),
        credentials,
        MessageCache::new(settings.cache.message_ttl_secs),
    );
    let billing = BillingScheduler::new(
        billing_repo,
        transaction_repo,
        subscription_repo,
        user_repo,
        gateway,
        settings.payment.monthly_amount,
        settings.payment.goods_name.clone(),
        settings.payment.token_grant,
    );

    // Optional in-process cron; most deployments trigger billing through the
    // webhook instead. The scheduler handle must outlive the server.
    let _billing_job = match &settings.scheduler.daily_cron {
        Some(cron) => Some(
            scheduler::start_billing_job(cron, Arc::new(billing.clone()))
                .await
                .map_err(|e| io::Error::other(format!("Billing job startup failed: {}", e)))?,
        ),
        None => None,
    };

    let bind_addr = (settings.server.host.clone(), settings.server.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    let settings_data = web::Data::new(settings.clone());
    let chat_data = web::Data::new(chat_service);
    let billing_data = web::Data::new(billing);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);
        for origin in &settings.server.cors_origins {
            cors = if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            };
        }

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(settings_data.clone())
            .app_data(chat_data.clone())
            .app_data(billing_data.clone())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
