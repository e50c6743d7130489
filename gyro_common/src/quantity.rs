use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The largest number of items a single participant may order of one option.
pub const MAX_QUANTITY: u8 = 10;

//--------------------------------------     Quantity       ---------------------------------------------------------
/// The number of items of one food option a participant has asked for. Always in `0..=MAX_QUANTITY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Quantity {0} is outside the allowed range 0..=10")]
    OutOfRange(i64),
    #[error("'{0}' is not a quantity")]
    NotANumber(String),
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_QUANTITY => Ok(Self(v)),
            _ => Err(QuantityError::OutOfRange(value)),
        }
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        i64::from(value.0)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        u32::from(value.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(QuantityError::NotANumber(s.to_string()));
        }
        // Anything with more digits than an i64 can hold is out of range anyway
        let value = s.parse::<i64>().map_err(|_| QuantityError::OutOfRange(i64::MAX))?;
        Self::try_from(value)
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn range_is_enforced() {
        assert_eq!(Quantity::try_from(0i64).unwrap(), Quantity::ZERO);
        assert_eq!(Quantity::try_from(10i64).unwrap().value(), 10);
        assert_eq!(Quantity::try_from(11i64), Err(QuantityError::OutOfRange(11)));
        assert_eq!(Quantity::try_from(-2i64), Err(QuantityError::OutOfRange(-2)));
    }

    #[test]
    fn from_str() {
        assert_eq!("7".parse::<Quantity>().unwrap().value(), 7);
        assert_eq!(" 3 ".parse::<Quantity>().unwrap().value(), 3);
        assert!(matches!("-1".parse::<Quantity>(), Err(QuantityError::NotANumber(_))));
        assert!(matches!("15".parse::<Quantity>(), Err(QuantityError::OutOfRange(15))));
        assert!(matches!("99999999999999999999999".parse::<Quantity>(), Err(QuantityError::OutOfRange(_))));
    }

    #[test]
    fn serde_validates() {
        let q: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert_eq!(serde_json::to_string(&q).unwrap(), "4");
        assert!(serde_json::from_str::<Quantity>("42").is_err());
    }
}
