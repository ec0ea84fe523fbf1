//! Cost estimation from token usage.

use crate::config::PricingSettings;
use crate::session::UsageRecord;

/// Fixed per-million-token rates and the exchange rate into the display currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub input_usd_per_million: f64,
    pub output_usd_per_million: f64,
    pub exchange_rate: f64,
    pub currency: String,
}

impl Default for Pricing {
    fn default() -> Self {
        Self::from(&PricingSettings::default())
    }
}

impl From<&PricingSettings> for Pricing {
    fn from(settings: &PricingSettings) -> Self {
        Self {
            input_usd_per_million: settings.input_usd_per_million,
            output_usd_per_million: settings.output_usd_per_million,
            exchange_rate: settings.exchange_rate,
            currency: settings.currency.clone(),
        }
    }
}

impl Pricing {
    /// Estimated cost of one call in the display currency. No rounding is applied.
    pub fn estimate(&self, usage: &UsageRecord) -> f64 {
        let input = usage.input_tokens as f64 / 1_000_000.0
            * self.input_usd_per_million
            * self.exchange_rate;
        let output = usage.output_tokens as f64 / 1_000_000.0
            * self.output_usd_per_million
            * self.exchange_rate;
        input + output
    }

    /// Format a cost with four decimal places and the currency code.
    pub fn format(&self, cost: f64) -> String {
        format!("{:.4} {}", cost, self.currency)
    }
}
