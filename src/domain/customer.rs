use std::collections::HashSet;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::{fits_numeric, RateConfig, RATE_PRECISION, RATE_SCALE};

/// Column widths of `customers` and `special_pieces`.
pub const NAME_MAX_CHARS: usize = 255;
pub const TAX_ID_MAX_CHARS: usize = 32;
pub const PHONE_MAX_CHARS: usize = 32;
pub const EMAIL_MAX_CHARS: usize = 255;

/// `minimum_rate` is stored as `NUMERIC(12, 2)`.
const MINIMUM_RATE_SCALE: i64 = 2;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn check_amount(field: &str, value: &BigDecimal, scale: i64) -> Result<(), DomainError> {
    if !fits_numeric(value, RATE_PRECISION, scale) {
        return Err(DomainError::InvalidInput(format!(
            "{} must have at most {} decimals and {} integer digits",
            field,
            scale,
            RATE_PRECISION - scale
        )));
    }
    if *value < BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub rates: RateConfig,
}

impl NewCustomer {
    /// Checks the record before it reaches storage: a name, non-negative
    /// rates that fit their columns, and unique, non-blank special piece
    /// names.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name must not be empty".to_string()));
        }
        check_length("name", &self.name, NAME_MAX_CHARS)?;
        for (field, value, max) in [
            ("tax_id", &self.tax_id, TAX_ID_MAX_CHARS),
            ("phone", &self.phone, PHONE_MAX_CHARS),
            ("email", &self.email, EMAIL_MAX_CHARS),
        ] {
            if let Some(value) = value {
                check_length(field, value, max)?;
            }
        }

        let rates = &self.rates;
        check_amount(
            "price_per_linear_meter",
            &rates.price_per_linear_meter,
            RATE_SCALE,
        )?;
        check_amount(
            "price_per_square_meter",
            &rates.price_per_square_meter,
            RATE_SCALE,
        )?;
        check_amount("minimum_rate", &rates.minimum_rate, MINIMUM_RATE_SCALE)?;

        let mut seen = HashSet::new();
        for piece in &rates.special_pieces {
            if piece.name.trim().is_empty() {
                return Err(DomainError::InvalidInput(
                    "special piece name must not be empty".to_string(),
                ));
            }
            check_length("special piece name", &piece.name, NAME_MAX_CHARS)?;
            check_amount(
                &format!("special piece '{}' price", piece.name),
                &piece.price,
                RATE_SCALE,
            )?;
            if !seen.insert(piece.name.as_str()) {
                return Err(DomainError::InvalidInput(format!(
                    "duplicate special piece '{}'",
                    piece.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub rates: RateConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::pricing::SpecialPiece;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn customer() -> NewCustomer {
        NewCustomer {
            name: "Talleres Pérez".to_string(),
            tax_id: Some("B12345678".to_string()),
            address: None,
            phone: None,
            email: None,
            rates: RateConfig {
                price_per_linear_meter: dec("10"),
                price_per_square_meter: dec("20"),
                minimum_rate: dec("50"),
                special_pieces: vec![SpecialPiece {
                    name: "Corner".to_string(),
                    price: dec("15"),
                }],
            },
        }
    }

    #[test]
    fn valid_customer_passes() {
        assert!(customer().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut c = customer();
        c.name = " ".to_string();
        assert!(matches!(c.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn negative_rate_is_rejected() {
        let mut c = customer();
        c.rates.minimum_rate = dec("-1");
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("minimum_rate"));
    }

    #[test]
    fn rate_with_more_than_four_decimals_is_rejected() {
        let mut c = customer();
        c.rates.price_per_linear_meter = dec("0.123456");
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("price_per_linear_meter"));

        let mut c = customer();
        c.rates.price_per_linear_meter = dec("0.1235");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn minimum_rate_allows_two_decimals() {
        let mut c = customer();
        c.rates.minimum_rate = dec("49.999");
        assert!(c.validate().is_err());
        c.rates.minimum_rate = dec("49.99");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn huge_rate_is_rejected() {
        let mut c = customer();
        c.rates.price_per_square_meter = dec("1e20000000");
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("price_per_square_meter"));

        let mut c = customer();
        c.rates.special_pieces[0].price = dec("100000000");
        assert!(matches!(c.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let mut c = customer();
        c.name = "ñ".repeat(NAME_MAX_CHARS);
        assert!(c.validate().is_ok());
        c.name.push('x');
        assert!(c.validate().unwrap_err().to_string().contains("name"));

        let mut c = customer();
        c.tax_id = Some("B".repeat(TAX_ID_MAX_CHARS + 1));
        assert!(c.validate().unwrap_err().to_string().contains("tax_id"));

        let mut c = customer();
        c.rates.special_pieces[0].name = "p".repeat(NAME_MAX_CHARS + 1);
        assert!(c.validate().unwrap_err().to_string().contains("special piece name"));
    }

    #[test]
    fn duplicate_special_piece_is_rejected() {
        let mut c = customer();
        c.rates.special_pieces.push(SpecialPiece {
            name: "Corner".to_string(),
            price: dec("20"),
        });
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate special piece 'Corner'"));
    }

    #[test]
    fn special_piece_names_differing_in_case_are_distinct() {
        let mut c = customer();
        c.rates.special_pieces.push(SpecialPiece {
            name: "corner".to_string(),
            price: dec("20"),
        });
        assert!(c.validate().is_ok());
    }
}
