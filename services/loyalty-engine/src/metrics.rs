// Prometheus metrics for the loyalty engine
// Tracks: request throughput, ledger operation outcomes, rejected redemptions

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_with_registry, Counter, Encoder, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub http_requests_total: Counter,

    // Ledger operation metrics
    pub accounts_created_total: Counter,
    pub points_redeemed_total: Counter,
    pub referrals_applied_total: Counter,
    pub accruals_total: Counter,

    // Failure metrics
    pub insufficient_balance_total: Counter,
    pub transaction_conflicts_total: Counter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = register_counter_with_registry!(
            Opts::new("loyalty_http_requests_total", "Total HTTP requests processed"),
            registry
        )?;

        let accounts_created_total = register_counter_with_registry!(
            Opts::new("loyalty_accounts_created_total", "Loyalty accounts created"),
            registry
        )?;

        let points_redeemed_total = register_counter_with_registry!(
            Opts::new("loyalty_points_redeemed_total", "Points redeemed across all accounts"),
            registry
        )?;

        let referrals_applied_total = register_counter_with_registry!(
            Opts::new("loyalty_referrals_applied_total", "Referral bonuses applied"),
            registry
        )?;

        let accruals_total = register_counter_with_registry!(
            Opts::new("loyalty_accruals_total", "Purchase accruals committed"),
            registry
        )?;

        let insufficient_balance_total = register_counter_with_registry!(
            Opts::new(
                "loyalty_insufficient_balance_total",
                "Redemptions rejected for insufficient balance"
            ),
            registry
        )?;

        let transaction_conflicts_total = register_counter_with_registry!(
            Opts::new(
                "loyalty_transaction_conflicts_total",
                "Operations that exhausted the transaction retry budget"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            http_requests_total,
            accounts_created_total,
            points_redeemed_total,
            referrals_applied_total,
            accruals_total,
            insufficient_balance_total,
            transaction_conflicts_total,
        })
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Global metrics instance
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});
