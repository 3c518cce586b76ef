use crate::handlers::{billing_handlers, chat_handlers, health};
use crate::middleware::SecureAuthentication;
use actix_web::web;

/// Route table.
///
/// `/api` requires a bearer JWT; `/webhooks` carries its own shared-secret
/// check inside the handler; `/health` is open.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_check)
        .service(
            web::scope("/api")
                .wrap(SecureAuthentication)
                .service(chat_handlers::stream_chat_turn)
                .service(chat_handlers::get_chat_messages)
                .service(billing_handlers::charge_billing_key),
        )
        .service(web::scope("/webhooks").service(billing_handlers::run_daily_billing));
}
