use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages as entered by a user (70 = 70%). Every rate on the input
/// record uses this convention.
pub type Percent = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Used internally for per-period
/// rates derived from a `Percent`.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computed_at: DateTime<Utc>,
    pub computation_time_us: u64,
    pub precision: String,
}

impl ComputationMetadata {
    pub fn new(elapsed_us: u64) -> Self {
        ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computed_at: Utc::now(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        }
    }
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata::new(elapsed_us),
    }
}
