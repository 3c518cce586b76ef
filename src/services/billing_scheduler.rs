use crate::db::repositories::{
    BillingRepository, SubscriptionRepository, TransactionRepository, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::services::payment_gateway::PaymentGatewayClient;
use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

/// Outcome of a single charge attempt.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// The gateway delivered a verdict, approved or declined.
    Charged {
        result_code: String,
        result_msg: String,
        tid: Option<String>,
        status: String,
    },
    /// A charge was already attempted for this agreement today; nothing was
    /// sent to the gateway.
    Duplicate,
}

/// Counters for one daily billing run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRunSummary {
    pub processed: usize,
    pub paid: usize,
    pub declined: usize,
    pub duplicates: usize,
    pub failures: usize,
}

/// Drives the monthly subscription charges. One run per day, each due
/// agreement charged at most once.
#[derive(Clone)]
pub struct BillingScheduler {
    billing_repo: BillingRepository,
    transaction_repo: TransactionRepository,
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    gateway: PaymentGatewayClient,
    monthly_amount: i64,
    goods_name: String,
    token_grant: i32,
}

impl BillingScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        billing_repo: BillingRepository,
        transaction_repo: TransactionRepository,
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
        gateway: PaymentGatewayClient,
        monthly_amount: i64,
        goods_name: String,
        token_grant: i32,
    ) -> Self {
        Self {
            billing_repo,
            transaction_repo,
            subscription_repo,
            user_repo,
            gateway,
            monthly_amount,
            goods_name,
            token_grant,
        }
    }

    /// Charge every agreement due today. A failure on one record is logged
    /// and counted but never stops the rest of the batch.
    pub async fn handle_daily_payments(&self) -> AppResult<BillingRunSummary> {
        let today = Utc::now().date_naive();
        let due = self.billing_repo.list_due(today).await?;
        info!("Daily billing run: {} agreement(s) due", due.len());

        let mut summary = BillingRunSummary::default();
        for billing in due {
            summary.processed += 1;
            match self
                .execute_payment(&billing.bid, self.monthly_amount, &self.goods_name)
                .await
            {
                Ok(PaymentOutcome::Charged { status, .. }) if status == "paid" => {
                    summary.paid += 1;
                }
                Ok(PaymentOutcome::Charged { result_code, .. }) => {
                    warn!(
                        "Charge declined for billing key {} (resultCode {})",
                        billing.bid, result_code
                    );
                    summary.declined += 1;
                }
                Ok(PaymentOutcome::Duplicate) => {
                    summary.duplicates += 1;
                }
                Err(e) => {
                    error!("Charge failed for billing key {}: {}", billing.bid, e);
                    summary.failures += 1;
                }
            }
        }

        info!(
            "Daily billing run finished: {} paid, {} declined, {} duplicate, {} failed",
            summary.paid, summary.declined, summary.duplicates, summary.failures
        );
        Ok(summary)
    }

    /// Charge one billing agreement.
    ///
    /// A transaction row is written for every gateway verdict, approved or
    /// declined. A network failure (including the timeout) propagates
    /// without writing a row, so the agreement is retried by the next run.
    /// The duplicate guard reads the transaction table directly, which makes
    /// it hold across concurrent runs and across server instances.
    pub async fn execute_payment(
        &self,
        bid: &str,
        amount: i64,
        goods_name: &str,
    ) -> AppResult<PaymentOutcome> {
        let billing = self
            .billing_repo
            .get_by_bid(bid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No billing agreement for key {}", bid)))?;

        let today_start = day_start_utc(Utc::now().date_naive());
        if self
            .transaction_repo
            .has_transaction_since(bid, &today_start)
            .await?
        {
            info!("Skipping billing key {}: already attempted today", bid);
            return Ok(PaymentOutcome::Duplicate);
        }

        let verdict = self
            .gateway
            .charge_subscription(bid, amount, goods_name)
            .await?;

        let status = if verdict.is_paid() { "paid" } else { "failed" };
        self.transaction_repo
            .insert(
                bid,
                amount,
                status,
                verdict.tid.as_deref(),
                Some(&verdict.result_code),
            )
            .await?;

        // The schedule advances even on a decline, so one bad card cannot
        // pile up a growing backlog of due charges.
        let next = advance_one_month(Utc::now().date_naive()).ok_or_else(|| {
            AppError::Internal("Next payment date out of calendar range".to_string())
        })?;
        self.billing_repo.set_next_payment_date(bid, next).await?;

        if verdict.is_paid() {
            let start = Utc::now();
            let end = start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| AppError::Internal("Subscription end date overflow".to_string()))?;
            self.subscription_repo
                .upsert(&billing.user_id, "premium", "active", &start, &end)
                .await?;
            let balance = self
                .user_repo
                .add_tokens(&billing.user_id, self.token_grant)
                .await?;
            info!(
                "Billing key {} paid; user {} granted {} tokens (balance {})",
                bid, billing.user_id, self.token_grant, balance
            );
        }

        Ok(PaymentOutcome::Charged {
            result_code: verdict.result_code,
            result_msg: verdict.result_msg,
            tid: verdict.tid,
            status: status.to_string(),
        })
    }
}

/// Midnight UTC on the given date; the lower bound of "today" for the
/// duplicate guard.
fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// One calendar month later, clamped to the last day of the target month
/// (Jan 31 -> Feb 28/29).
fn advance_one_month(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_start_is_midnight_utc() {
        let start = day_start_utc(date(2026, 8, 31));
        assert_eq!(start.to_rfc3339(), "2026-08-31T00:00:00+00:00");
    }

    #[test]
    fn month_advance_clamps_to_shorter_months() {
        assert_eq!(advance_one_month(date(2026, 1, 31)), Some(date(2026, 2, 28)));
        assert_eq!(advance_one_month(date(2024, 1, 31)), Some(date(2024, 2, 29)));
        assert_eq!(advance_one_month(date(2026, 8, 31)), Some(date(2026, 9, 30)));
        assert_eq!(advance_one_month(date(2026, 12, 15)), Some(date(2027, 1, 15)));
    }

    proptest! {
        #[test]
        fn month_advance_lands_in_the_next_month(days in 0u32..36500) {
            let base = date(2000, 1, 1) + chrono::Duration::days(days as i64);
            let next = advance_one_month(base).unwrap();

            prop_assert!(next > base);
            // Never more than one month's worth of days ahead.
            prop_assert!((next - base).num_days() <= 31);
            // Day of month never grows: it is preserved or clamped down.
            prop_assert!(chrono::Datelike::day(&next) <= chrono::Datelike::day(&base));
        }
    }
}
