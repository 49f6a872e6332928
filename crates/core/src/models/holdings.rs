use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rates::{Interval, Period};

/// Parameters of a historical holdings calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsRequest {
    pub period: Period,
    pub interval: Interval,
    pub reporting_currency: String,
}

impl HoldingsRequest {
    pub fn new(period: Period, interval: Interval, reporting_currency: impl Into<String>) -> Self {
        Self {
            period,
            interval,
            reporting_currency: reporting_currency.into().to_uppercase(),
        }
    }
}

/// Which valuation strategy produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationPath {
    /// Each day valued with the nearest preceding historical sample.
    Rich,
    /// Today's rates applied to every day (historical data too sparse).
    Simple,
    /// No assets held: nothing was valued.
    Empty,
}

/// Portfolio value on one calendar day, in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsPoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    /// Keyed by `"{account name}_{ticker}"`.
    pub breakdown: BTreeMap<String, Decimal>,
}

/// Chart-ready output of the holdings calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSeries {
    pub reporting_currency: String,
    pub path: ValuationPath,
    pub points: Vec<HoldingsPoint>,
}

impl HoldingsSeries {
    pub fn empty(reporting_currency: impl Into<String>) -> Self {
        Self {
            reporting_currency: reporting_currency.into(),
            path: ValuationPath::Empty,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
