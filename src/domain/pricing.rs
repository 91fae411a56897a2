//! Delivery-note pricing.
//!
//! Pure functions over a customer's [`RateConfig`]: no storage, no I/O.
//! Every monetary result is rounded to two decimals, half-up.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use thiserror::Error;

const MONEY_SCALE: i64 = 2;
const PRIMER_MULTIPLIER: i32 = 2;

/// `NUMERIC(12, 4)`: rates, special piece prices and measurements.
pub const RATE_PRECISION: i64 = 12;
pub const RATE_SCALE: i64 = 4;
/// `NUMERIC(14, 2)`: unit prices, line totals and note totals.
pub const AMOUNT_PRECISION: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Unknown special piece '{name}'")]
    UnknownSpecialPiece { name: String },
    #[error("Item has both linear and square meters; only one measurement is allowed")]
    AmbiguousMeasurement,
    #[error("Invalid quantity {quantity}: must be at least 1")]
    InvalidQuantity { quantity: i32 },
    #[error("Item has no measurement and no special piece name to price it by")]
    MissingPricingBasis,
    #[error(
        "Invalid measurement {value}: must be greater than zero, with at most 4 decimals and 8 integer digits"
    )]
    InvalidMeasurement { value: BigDecimal },
    #[error("Amount {amount} is too large to be stored")]
    AmountOutOfRange { amount: BigDecimal },
    #[error("Item {index}: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: Box<PricingError>,
    },
}

impl PricingError {
    /// Stable snake_case identifier for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::UnknownSpecialPiece { .. } => "unknown_special_piece",
            PricingError::AmbiguousMeasurement => "ambiguous_measurement",
            PricingError::InvalidQuantity { .. } => "invalid_quantity",
            PricingError::MissingPricingBasis => "missing_pricing_basis",
            PricingError::InvalidMeasurement { .. } => "invalid_measurement",
            PricingError::AmountOutOfRange { .. } => "amount_out_of_range",
            PricingError::ItemFailed { source, .. } => source.kind(),
        }
    }

    /// Zero-based position of the failing item when raised by [`price_note`].
    pub fn item_index(&self) -> Option<usize> {
        match self {
            PricingError::ItemFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialPiece {
    pub name: String,
    pub price: BigDecimal,
}

/// A customer's pricing rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RateConfig {
    pub price_per_linear_meter: BigDecimal,
    pub price_per_square_meter: BigDecimal,
    pub minimum_rate: BigDecimal,
    pub special_pieces: Vec<SpecialPiece>,
}

impl RateConfig {
    /// Exact, case-sensitive lookup.
    pub fn special_piece(&self, name: &str) -> Option<&SpecialPiece> {
        self.special_pieces.iter().find(|p| p.name == name)
    }
}

/// The single basis an item is priced by.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    LinearMeters(BigDecimal),
    SquareMeters(BigDecimal),
    /// No measurement: the item name is looked up in the special pieces.
    SpecialPiece,
}

impl Measurement {
    /// Builds the measurement from the two optional wire fields.
    pub fn from_parts(
        linear_meters: Option<BigDecimal>,
        square_meters: Option<BigDecimal>,
    ) -> Result<Self, PricingError> {
        match (linear_meters, square_meters) {
            (Some(_), Some(_)) => Err(PricingError::AmbiguousMeasurement),
            (Some(m), None) => Ok(Measurement::LinearMeters(m)),
            (None, Some(m)) => Ok(Measurement::SquareMeters(m)),
            (None, None) => Ok(Measurement::SpecialPiece),
        }
    }

    pub fn linear_meters(&self) -> Option<&BigDecimal> {
        match self {
            Measurement::LinearMeters(m) => Some(m),
            _ => None,
        }
    }

    pub fn square_meters(&self) -> Option<&BigDecimal> {
        match self {
            Measurement::SquareMeters(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRequest {
    pub name: String,
    pub description: String,
    pub color: String,
    pub quantity: i32,
    pub measurement: Measurement,
    pub has_primer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLineItem {
    pub name: String,
    pub description: String,
    pub color: String,
    pub quantity: i32,
    pub measurement: Measurement,
    pub has_primer: bool,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

/// How a customer's minimum rate affects the note total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MinimumRatePolicy {
    /// The minimum rate is passed through for display only.
    #[default]
    Informational,
    /// Totals below the minimum rate are raised to it.
    Clamp,
}

impl FromStr for MinimumRatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "informational" => Ok(MinimumRatePolicy::Informational),
            "clamp" => Ok(MinimumRatePolicy::Clamp),
            other => Err(format!("unknown minimum rate policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteTotals {
    /// Rounded sum of the item totals.
    pub items_total: BigDecimal,
    /// Amount charged for the note after the minimum-rate policy.
    pub total_amount: BigDecimal,
    pub minimum_rate: BigDecimal,
    pub minimum_rate_applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedNote {
    pub items: Vec<PricedLineItem>,
    pub totals: NoteTotals,
}

/// Round to two decimal places, half away from zero.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// Whether `value` fits a `NUMERIC(precision, scale)` column unchanged.
///
/// Works on the digit count and exponent only, so values such as `1e20000000`
/// are rejected without being expanded.
pub fn fits_numeric(value: &BigDecimal, precision: i64, scale: i64) -> bool {
    let normalized = value.normalized();
    let (_, exponent) = normalized.as_bigint_and_exponent();
    let integer_digits = normalized.digits() as i64 - exponent;
    exponent <= scale && integer_digits <= precision - scale
}

fn require_measurement(value: &BigDecimal) -> Result<&BigDecimal, PricingError> {
    if fits_numeric(value, RATE_PRECISION, RATE_SCALE) && *value > BigDecimal::zero() {
        Ok(value)
    } else {
        Err(PricingError::InvalidMeasurement {
            value: value.clone(),
        })
    }
}

fn require_storable(amount: BigDecimal) -> Result<BigDecimal, PricingError> {
    if fits_numeric(&amount, AMOUNT_PRECISION, MONEY_SCALE) {
        Ok(amount)
    } else {
        Err(PricingError::AmountOutOfRange { amount })
    }
}

fn base_price(item: &LineItemRequest, rates: &RateConfig) -> Result<BigDecimal, PricingError> {
    match &item.measurement {
        Measurement::LinearMeters(m) => {
            Ok(&rates.price_per_linear_meter * require_measurement(m)?)
        }
        Measurement::SquareMeters(m) => {
            Ok(&rates.price_per_square_meter * require_measurement(m)?)
        }
        Measurement::SpecialPiece => {
            if item.name.trim().is_empty() {
                return Err(PricingError::MissingPricingBasis);
            }
            rates
                .special_piece(&item.name)
                .map(|piece| piece.price.clone())
                .ok_or_else(|| PricingError::UnknownSpecialPiece {
                    name: item.name.clone(),
                })
        }
    }
}

/// Price a single line item against a customer's rates.
///
/// The base price (rate × measurement, or the special piece price) is
/// rounded first; primer then doubles it, so the unit price always
/// carries exactly two decimals.
pub fn price_item(
    item: &LineItemRequest,
    rates: &RateConfig,
) -> Result<PricedLineItem, PricingError> {
    if item.quantity <= 0 {
        return Err(PricingError::InvalidQuantity {
            quantity: item.quantity,
        });
    }

    let base = round_money(&base_price(item, rates)?);
    let unit_price = if item.has_primer {
        base * BigDecimal::from(PRIMER_MULTIPLIER)
    } else {
        base
    };
    let unit_price = require_storable(round_money(&unit_price))?;
    let total_price =
        require_storable(round_money(&(&unit_price * BigDecimal::from(item.quantity))))?;

    Ok(PricedLineItem {
        name: item.name.clone(),
        description: item.description.clone(),
        color: item.color.clone(),
        quantity: item.quantity,
        measurement: item.measurement.clone(),
        has_primer: item.has_primer,
        unit_price,
        total_price,
    })
}

/// Price every item of a note, in order, and aggregate the totals.
///
/// Fails on the first item that cannot be priced; no partial result is
/// returned.
pub fn price_note(
    items: &[LineItemRequest],
    rates: &RateConfig,
    policy: MinimumRatePolicy,
) -> Result<PricedNote, PricingError> {
    let priced = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            price_item(item, rates).map_err(|e| PricingError::ItemFailed {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let items_total = require_storable(round_money(
        &priced.iter().map(|i| &i.total_price).sum::<BigDecimal>(),
    ))?;

    let minimum_rate_applied =
        policy == MinimumRatePolicy::Clamp && items_total < rates.minimum_rate;
    let total_amount = if minimum_rate_applied {
        round_money(&rates.minimum_rate)
    } else {
        items_total.clone()
    };

    Ok(PricedNote {
        items: priced,
        totals: NoteTotals {
            items_total,
            total_amount,
            minimum_rate: rates.minimum_rate.clone(),
            minimum_rate_applied,
        },
    })
}

/// The items of a request, converted up to the first one whose measurement
/// could not be resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestedItems {
    pub items: Vec<LineItemRequest>,
    /// Position and cause of the item that stopped the conversion.
    pub rejected: Option<(usize, PricingError)>,
}

impl From<Vec<LineItemRequest>> for RequestedItems {
    fn from(items: Vec<LineItemRequest>) -> Self {
        RequestedItems {
            items,
            rejected: None,
        }
    }
}

/// [`price_note`] over a request that may end in a rejected item.
///
/// The items before the rejected one are priced first, so the error always
/// names the first item that fails.
pub fn price_requested(
    requested: &RequestedItems,
    rates: &RateConfig,
    policy: MinimumRatePolicy,
) -> Result<PricedNote, PricingError> {
    let note = price_note(&requested.items, rates, policy)?;
    match &requested.rejected {
        Some((index, cause)) => Err(PricingError::ItemFailed {
            index: *index,
            source: Box::new(cause.clone()),
        }),
        None => Ok(note),
    }
}
