use crate::error::{AppError, AppResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Hard ceiling on a single charge call. A gateway that answers slower than
/// this is treated as a network failure, not a verdict.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// The gateway's approval code.
pub const RESULT_CODE_PAID: &str = "0000";

/// The gateway's answer to a charge attempt. Any well-formed response is a
/// verdict, approved or declined; only transport failures are errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayChargeResponse {
    pub result_code: String,
    pub result_msg: String,
    pub tid: Option<String>,
}

impl GatewayChargeResponse {
    pub fn is_paid(&self) -> bool {
        self.result_code == RESULT_CODE_PAID
    }
}

/// Client for the card-on-file payment gateway. Charges are keyed by the
/// billing key (`bid`) issued when the card was registered.
#[derive(Debug, Clone)]
pub struct PaymentGatewayClient {
    http: Client,
    base_url: String,
    client_key: String,
    client_secret: String,
    timeout: Duration,
}

impl PaymentGatewayClient {
    pub fn new(http: Client, base_url: String, client_key: String, client_secret: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_key,
            client_secret,
            timeout: GATEWAY_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Charge a stored card once. A slow or unreachable gateway surfaces as
    /// `AppError::External`; a decline comes back as a normal response with a
    /// non-approval result code.
    pub async fn charge_subscription(
        &self,
        bid: &str,
        amount: i64,
        goods_name: &str,
    ) -> AppResult<GatewayChargeResponse> {
        let url = format!("{}/v1/subscribe/{}/payments", self.base_url, bid);
        let order_id = Uuid::new_v4().to_string();
        debug!("Charging billing key {} (order {})", bid, order_id);

        // The timeout covers the whole exchange: a gateway that returns
        // headers and then stalls on the body is as much a network failure
        // as one that never answers.
        let exchange = async {
            let response = self
                .http
                .post(&url)
                .header("Authorization", self.basic_auth())
                .json(&json!({
                    "orderId": order_id,
                    "amount": amount,
                    "goodsName": goods_name,
                    "cardQuota": 0,
                    "useShopInterest": false,
                }))
                .send()
                .await
                .map_err(|e| AppError::External(format!("Payment gateway request failed: {}", e)))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| AppError::External(format!("Payment gateway read failed: {}", e)))?;
            Ok::<_, AppError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                AppError::External(format!(
                    "Payment gateway timed out after {:?}",
                    self.timeout
                ))
            })??;

        // Declines arrive as a 2xx with a non-approval resultCode, and some
        // gateway errors as a 4xx with the same body shape. Either way the
        // body is the verdict; only an unparseable body is a transport error.

        serde_json::from_str::<GatewayChargeResponse>(&body).map_err(|_| {
            AppError::External(format!(
                "Payment gateway returned unexpected response ({}): {}",
                status, body
            ))
        })
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.client_key, self.client_secret);
        format!("Basic {}", BASE64.encode(credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base_url: String) -> PaymentGatewayClient {
        PaymentGatewayClient::new(
            reqwest::Client::new(),
            base_url,
            "ck_test".to_string(),
            "sk_test".to_string(),
        )
    }

    #[tokio::test]
    async fn approved_charge_parses_the_verdict() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/subscribe/bid_1/payments")
            .match_header("authorization", mockito::Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_body(r#"{"resultCode":"0000","resultMsg":"success","tid":"tid_123"}"#)
            .create_async()
            .await;

        let verdict = client(server.url())
            .charge_subscription("bid_1", 9900, "SchedAI Premium")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(verdict.is_paid());
        assert_eq!(verdict.tid.as_deref(), Some("tid_123"));
    }

    #[tokio::test]
    async fn declined_charge_is_a_verdict_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/subscribe/bid_2/payments")
            .with_status(200)
            .with_body(r#"{"resultCode":"3021","resultMsg":"card limit exceeded","tid":null}"#)
            .create_async()
            .await;

        let verdict = client(server.url())
            .charge_subscription("bid_2", 9900, "SchedAI Premium")
            .await
            .unwrap();

        assert!(!verdict.is_paid());
        assert_eq!(verdict.result_code, "3021");
    }

    #[tokio::test]
    async fn stalled_body_read_hits_the_gateway_timeout() {
        use tokio::io::AsyncWriteExt;

        // Headers promise a body that never arrives.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n")
                .await
                .unwrap();
            // Hold the connection open without sending another byte.
            std::future::pending::<()>().await;
        });

        let err = client(format!("http://{}", addr))
            .with_timeout(Duration::from_millis(250))
            .charge_subscription("bid_slow", 9900, "SchedAI Premium")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::External(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn unparseable_body_is_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/subscribe/bid_3/payments")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client(server.url())
            .charge_subscription("bid_3", 9900, "SchedAI Premium")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::External(_)));
    }
}
