//! Inline keyboard payloads.
//!
//! | payload         | meaning                                          |
//! |-----------------|--------------------------------------------------|
//! | `g<idx>_<qty>`  | set the option at `idx` to `qty`                 |
//! | `g0`            | cancel the whole order                           |
//! | `noop`          | a label button; acknowledged and otherwise ignored |
use std::{fmt::Display, str::FromStr};

use gyro_common::Quantity;
use gyroskop_engine::window_objects::Selection;
use thiserror::Error;

const NOOP: &str = "noop";
const CANCEL_ALL: &str = "g0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPayload {
    Selection(Selection),
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed callback payload: '{0}'")]
pub struct PayloadError(pub String);

impl FromStr for CallbackPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            NOOP => return Ok(Self::Noop),
            CANCEL_ALL => return Ok(Self::Selection(Selection::CancelAll)),
            _ => {},
        }
        let err = || PayloadError(s.to_string());
        let (index, quantity) = s.strip_prefix('g').and_then(|rest| rest.split_once('_')).ok_or_else(err)?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let option_index = index.parse::<usize>().map_err(|_| err())?;
        let quantity = quantity.parse::<Quantity>().map_err(|_| err())?;
        Ok(Self::Selection(Selection::Quantity { option_index, quantity }))
    }
}

impl Display for CallbackPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Noop => write!(f, "{NOOP}"),
            Self::Selection(Selection::CancelAll) => write!(f, "{CANCEL_ALL}"),
            Self::Selection(Selection::Quantity { option_index, quantity }) => write!(f, "g{option_index}_{quantity}"),
        }
    }
}
