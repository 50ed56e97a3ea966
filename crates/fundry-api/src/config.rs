/// Platform business constants, env-overridable. Collected here so the
/// funding cap and fee live in exactly one place.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Hard cap on campaign funding goals. $100,000 by default.
    pub funding_goal_cap_cents: i64,
    /// Surcharge added to every pledge, in basis points. 2% by default.
    pub platform_fee_bps: i64,
    /// Default campaign minimum investment. $25.
    pub default_minimum_investment_cents: i64,
    /// Governing-law clause inserted into generated agreements.
    pub governing_law: String,
    /// Stale unsigned pledges older than this are cancelled.
    pub pending_expiry_days: u32,
    /// Stripe secret key; USD checkout fails with a payment error when unset.
    pub stripe_secret_key: Option<String>,
    /// Budpay secret key; NGN checkout fails with a payment error when unset.
    pub budpay_secret_key: Option<String>,
    /// Where the processors send the investor after checkout.
    pub checkout_return_url: String,
}

impl PlatformConfig {
    pub fn from_env() -> Self {
        Self {
            funding_goal_cap_cents: env_i64("FUNDRY_FUNDING_GOAL_CAP_CENTS", 10_000_000),
            platform_fee_bps: env_i64("FUNDRY_PLATFORM_FEE_BPS", 200),
            default_minimum_investment_cents: env_i64("FUNDRY_MIN_INVESTMENT_CENTS", 2_500),
            governing_law: std::env::var("FUNDRY_GOVERNING_LAW")
                .unwrap_or_else(|_| "the State of Delaware".into()),
            pending_expiry_days: env_i64("FUNDRY_PENDING_EXPIRY_DAYS", 14) as u32,
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            budpay_secret_key: std::env::var("BUDPAY_SECRET_KEY").ok(),
            checkout_return_url: std::env::var("FUNDRY_CHECKOUT_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/invest/complete".into()),
        }
    }

    /// Fee on a pledge, rounded half-up at the half-cent.
    pub fn platform_fee(&self, amount_cents: i64) -> i64 {
        (amount_cents * self.platform_fee_bps + 5_000) / 10_000
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            funding_goal_cap_cents: 10_000_000,
            platform_fee_bps: 200,
            default_minimum_investment_cents: 2_500,
            governing_law: "the State of Delaware".into(),
            pending_expiry_days: 14,
            stripe_secret_key: None,
            budpay_secret_key: None,
            checkout_return_url: "http://localhost:3000/invest/complete".into(),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_two_percent_by_default() {
        let config = PlatformConfig::default();
        assert_eq!(config.platform_fee(10_000), 200); // $100 → $2.00
        assert_eq!(config.platform_fee(2_500), 50); // $25 → $0.50
        // Half-cent rounds up: $0.25 * 2% = 0.5¢ → 1¢
        assert_eq!(config.platform_fee(25), 1);
    }
}
