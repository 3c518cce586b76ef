use crate::config::AppSettings;
use crate::error::{AppError, AppResult};
use crate::services::{BillingScheduler, PaymentOutcome};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse, post, web};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPaymentRequest {
    pub amount: Option<i64>,
    pub goods_name: Option<String>,
}

/// Daily billing trigger, called by an external cron with a shared secret.
/// Per-record failures are absorbed into the summary; the webhook itself
/// only fails when the batch cannot run at all.
#[post("/billing/daily")]
pub async fn run_daily_billing(
    req: HttpRequest,
    settings: web::Data<AppSettings>,
    billing: web::Data<BillingScheduler>,
) -> AppResult<HttpResponse> {
    verify_shared_secret(&req, &settings.scheduler.shared_secret)?;

    let summary = billing.handle_daily_payments().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "summary": summary,
    })))
}

/// Manual charge of one billing agreement, used by support tooling and by
/// the first charge right after card registration.
#[post("/payments/{bid}")]
pub async fn charge_billing_key(
    path: web::Path<String>,
    body: web::Json<ManualPaymentRequest>,
    billing: web::Data<BillingScheduler>,
) -> AppResult<HttpResponse> {
    let bid = path.into_inner();
    let request = body.into_inner();

    let amount = request
        .amount
        .ok_or_else(|| AppError::BadRequest("amount is required".to_string()))?;
    let goods_name = request
        .goods_name
        .ok_or_else(|| AppError::BadRequest("goodsName is required".to_string()))?;

    info!("Manual charge requested for billing key {}", bid);
    match billing.execute_payment(&bid, amount, &goods_name).await? {
        PaymentOutcome::Charged {
            result_code,
            result_msg,
            tid,
            ..
        } => Ok(HttpResponse::Ok().json(json!({
            "resultCode": result_code,
            "resultMsg": result_msg,
            "tid": tid,
        }))),
        PaymentOutcome::Duplicate => Ok(HttpResponse::Ok().json(json!({
            "resultCode": "DUPLICATE",
            "resultMsg": "Payment already attempted today",
            "tid": null,
        }))),
    }
}

fn verify_shared_secret(req: &HttpRequest, expected: &str) -> AppResult<()> {
    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    match presented {
        Some(secret) if secret == expected => Ok(()),
        _ => {
            warn!("Rejected daily billing trigger: bad or missing shared secret");
            Err(AppError::Unauthorized(
                "Invalid scheduler credentials".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn shared_secret_requires_an_exact_bearer_match() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer s3cret"))
            .to_http_request();
        assert!(verify_shared_secret(&req, "s3cret").is_ok());
        assert!(verify_shared_secret(&req, "other").is_err());

        let bare = TestRequest::default().to_http_request();
        assert!(verify_shared_secret(&bare, "s3cret").is_err());

        let wrong_scheme = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic s3cret"))
            .to_http_request();
        assert!(verify_shared_secret(&wrong_scheme, "s3cret").is_err());
    }
}
