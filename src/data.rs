use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Long,
    Short,
}

/// An option contract position. Required fields are typed; anything else the
/// caller sends (symbol, strike, expiry, ...) rides along in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPosition {
    pub id: String,
    pub position_type: PositionType,
    pub delta: Decimal,
    pub quantity: u32,
    pub price: Decimal,
    pub net_delta: Decimal,
    pub date_added: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingPosition {
    pub id: String,
    pub position_type: PositionType,
    pub quantity: u32,
    pub price: Decimal,
    pub net_delta: Decimal,
    pub date_added: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSettings {
    pub contracts_per_option: u32,
    pub currency: String,
    // Stored and updatable, but consulted by no computation.
    pub transaction_fee: Decimal,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            contracts_per_option: 100,
            currency: "USD".to_string(),
            transaction_fee: Decimal::new(75, 2),
        }
    }
}

impl PortfolioSettings {
    /// Apply a partial update. Recognized keys overwrite, unrecognized keys
    /// are ignored. Returns whether `contracts_per_option` was among the
    /// updated keys, so the caller knows to recompute option deltas.
    ///
    /// All values are parsed before any field is written, so a bad value
    /// leaves the settings untouched.
    pub fn apply_update(&mut self, data: &Value) -> LedgerResult<bool> {
        let fields = object_fields(data)?;

        let contracts = match fields.get("contracts_per_option") {
            Some(value) => Some(coerce_contracts(value)?),
            None => None,
        };
        let currency = match fields.get("currency") {
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| {
                        LedgerError::Validation("Field 'currency' must be a string".to_string())
                    })?
                    .to_string(),
            ),
            None => None,
        };
        let fee = match fields.get("transaction_fee") {
            Some(value) => Some(coerce_decimal(value, "transaction_fee")?),
            None => None,
        };

        let contracts_updated = contracts.is_some();
        if let Some(contracts) = contracts {
            self.contracts_per_option = contracts;
        }
        if let Some(currency) = currency {
            self.currency = currency;
        }
        if let Some(fee) = fee {
            self.transaction_fee = fee;
        }

        Ok(contracts_updated)
    }
}

/// Full persisted state: both position collections plus settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub options: Vec<OptionPosition>,
    #[serde(default)]
    pub underlying: Vec<UnderlyingPosition>,
    #[serde(default)]
    pub settings: PortfolioSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_delta: Decimal,
    pub is_delta_neutral: bool,
    pub option_value: Decimal,
    pub underlying_value: Decimal,
    pub total_value: Decimal,
    pub option_count: usize,
    pub underlying_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedgeAction {
    None,
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HedgeRecommendation {
    pub action: HedgeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    pub message: String,
    pub current_delta: Decimal,
}

/// Validated input for a new option position, parsed out of a loose JSON record.
#[derive(Debug, Clone)]
pub struct OptionDraft {
    pub position_type: PositionType,
    pub delta: Decimal,
    pub quantity: u32,
    pub price: Decimal,
    pub extra: Map<String, Value>,
}

// Keys the ledger owns or computes; callers cannot smuggle them in via
// pass-through data.
const OPTION_RESERVED: &[&str] = &[
    "position_type",
    "delta",
    "quantity",
    "price",
    "id",
    "date_added",
    "net_delta",
];

const UNDERLYING_RESERVED: &[&str] = &[
    "position_type",
    "quantity",
    "price",
    "id",
    "date_added",
    "net_delta",
];

impl OptionDraft {
    pub fn from_value(data: &Value) -> LedgerResult<Self> {
        let fields = object_fields(data)?;

        Ok(Self {
            position_type: coerce_position_type(required(fields, "position_type")?)?,
            delta: coerce_decimal(required(fields, "delta")?, "delta")?,
            quantity: coerce_quantity(required(fields, "quantity")?, "quantity")?,
            price: coerce_price(required(fields, "price")?, "price")?,
            extra: passthrough(fields, OPTION_RESERVED),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UnderlyingDraft {
    pub position_type: PositionType,
    pub quantity: u32,
    pub price: Decimal,
    pub extra: Map<String, Value>,
}

impl UnderlyingDraft {
    pub fn from_value(data: &Value) -> LedgerResult<Self> {
        let fields = object_fields(data)?;

        Ok(Self {
            position_type: coerce_position_type(required(fields, "position_type")?)?,
            quantity: coerce_quantity(required(fields, "quantity")?, "quantity")?,
            price: coerce_price(required(fields, "price")?, "price")?,
            extra: passthrough(fields, UNDERLYING_RESERVED),
        })
    }
}

/// Net delta of an option position: delta x quantity x contract multiplier,
/// sign-flipped for short positions.
pub fn option_net_delta(
    position_type: PositionType,
    delta: Decimal,
    quantity: u32,
    contracts_per_option: u32,
) -> Decimal {
    let signed = match position_type {
        PositionType::Long => delta,
        PositionType::Short => -delta,
    };
    signed * Decimal::from(quantity) * Decimal::from(contracts_per_option)
}

/// Net delta of an underlying position: one delta unit per share, negative
/// for shorts. The contract multiplier never applies here.
pub fn underlying_net_delta(position_type: PositionType, quantity: u32) -> Decimal {
    match position_type {
        PositionType::Long => Decimal::from(quantity),
        PositionType::Short => -Decimal::from(quantity),
    }
}

fn object_fields(data: &Value) -> LedgerResult<&Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| LedgerError::Validation("Expected a JSON object".to_string()))
}

fn required<'a>(fields: &'a Map<String, Value>, key: &str) -> LedgerResult<&'a Value> {
    fields
        .get(key)
        .ok_or_else(|| LedgerError::Validation(format!("Missing required field: {}", key)))
}

fn coerce_decimal(value: &Value, key: &str) -> LedgerResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| LedgerError::Validation(format!("Field '{}' must be numeric", key)))
}

fn coerce_quantity(value: &Value, key: &str) -> LedgerResult<u32> {
    // Fractional quantities are truncated, matching int() coercion on input.
    let qty = coerce_decimal(value, key)?.trunc();
    if qty < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Field '{}' must be non-negative",
            key
        )));
    }
    qty.to_u32()
        .ok_or_else(|| LedgerError::Validation(format!("Field '{}' is out of range", key)))
}

fn coerce_price(value: &Value, key: &str) -> LedgerResult<Decimal> {
    let price = coerce_decimal(value, key)?;
    if price < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Field '{}' must be non-negative",
            key
        )));
    }
    Ok(price)
}

fn coerce_position_type(value: &Value) -> LedgerResult<PositionType> {
    match value.as_str() {
        Some("long") => Ok(PositionType::Long),
        Some("short") => Ok(PositionType::Short),
        _ => Err(LedgerError::Validation(
            "Field 'position_type' must be 'long' or 'short'".to_string(),
        )),
    }
}

fn coerce_contracts(value: &Value) -> LedgerResult<u32> {
    let contracts = coerce_quantity(value, "contracts_per_option")?;
    if contracts == 0 {
        return Err(LedgerError::Validation(
            "Field 'contracts_per_option' must be a positive integer".to_string(),
        ));
    }
    Ok(contracts)
}

fn passthrough(fields: &Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
