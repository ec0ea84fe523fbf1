//! Pre-flight checks before talking to upstream services.
//!
//! Resolves credentials up front so a missing key stops the command at
//! startup instead of halfway through an analysis.

use crate::config::{Credentials, Settings};
use crate::error::{Result, SentinelError};

/// Check everything an analysis needs and return the resolved credentials.
pub fn require_credentials(settings: &Settings) -> Result<Credentials> {
    check_pricing(settings)?;
    settings.credentials()
}

/// Reject pricing that would make every estimate meaningless.
pub fn check_pricing(settings: &Settings) -> Result<()> {
    let pricing = &settings.pricing;
    let values = [
        ("pricing.input_usd_per_million", pricing.input_usd_per_million),
        ("pricing.output_usd_per_million", pricing.output_usd_per_million),
        ("pricing.exchange_rate", pricing.exchange_rate),
    ];
    for (name, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(SentinelError::Config(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}
