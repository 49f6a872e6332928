use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::rates::RateTable;

/// Whether a conversion used real rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateResolution {
    /// Every rate needed was in the table (or no rate was needed).
    Direct,
    /// A needed rate was missing or zero; the amount was passed through 1:1.
    Parity,
}

/// Result of converting an amount between two tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub resolution: RateResolution,
}

impl Conversion {
    fn direct(amount: Decimal) -> Self {
        Self {
            amount,
            resolution: RateResolution::Direct,
        }
    }

    fn parity(amount: Decimal) -> Self {
        Self {
            amount,
            resolution: RateResolution::Parity,
        }
    }

    pub fn is_parity(&self) -> bool {
        self.resolution == RateResolution::Parity
    }
}

/// Convert `amount` of `from` into `to` using `rates`.
///
/// The table's reporting currency is the base. With `rates[T]` = units of
/// `T` per unit of base:
/// - base → other: `amount * rates[to]`
/// - other → base: `amount / rates[from]`
/// - cross: `amount / rates[from] * rates[to]`
///
/// Identical tickers return `amount` untouched. A missing or zero rate
/// makes the conversion 1:1 and is reported as [`RateResolution::Parity`];
/// this never fails.
pub fn convert(amount: Decimal, from: &str, to: &str, rates: &RateTable) -> Conversion {
    let from = from.trim().to_uppercase();
    let to = to.trim().to_uppercase();

    if from == to {
        return Conversion::direct(amount);
    }

    let base = rates.reporting_currency();
    let usable = |ticker: &str| rates.get(ticker).filter(|rate| !rate.is_zero());

    if from == base {
        return match usable(&to).and_then(|rate| amount.checked_mul(rate)) {
            Some(converted) => Conversion::direct(converted),
            None => Conversion::parity(amount),
        };
    }

    let Some(in_base) = usable(&from).and_then(|rate| amount.checked_div(rate)) else {
        return Conversion::parity(amount);
    };

    if to == base {
        return Conversion::direct(in_base);
    }

    match usable(&to).and_then(|rate| in_base.checked_mul(rate)) {
        Some(converted) => Conversion::direct(converted),
        None => Conversion::parity(amount),
    }
}

/// Value of `amount` of `ticker` in the table's reporting currency.
pub fn to_reporting(amount: Decimal, ticker: &str, rates: &RateTable) -> Conversion {
    convert(amount, ticker, rates.reporting_currency(), rates)
}
