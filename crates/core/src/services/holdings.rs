use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::models::account::AccountWithBalances;
use crate::models::holdings::{HoldingsPoint, HoldingsRequest, HoldingsSeries, ValuationPath};
use crate::models::rates::{HistoricalRate, Period, RateTable};
use crate::models::transaction::Transaction;
use crate::services::conversion::to_reporting;
use crate::services::ledger::BalanceTimeline;
use crate::services::rate_gateway::RateGateway;

/// Fewer distinct sample timestamps than this and the historical series is
/// judged too sparse to chart with.
pub const MIN_DISTINCT_SAMPLES: usize = 3;

/// Longest span (days) an "all" request may cover and still be fetched
/// with the `1y` / `5y` upstream periods.
const ONE_YEAR_DAYS: i64 = 365;
const FIVE_YEAR_DAYS: i64 = 1826;

/// The calendar days to value and the upstream period that covers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub fetch_period: Period,
}

impl FetchWindow {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// First day a bounded period reaches back to.
fn period_start(period: Period, today: NaiveDate) -> NaiveDate {
    let months_back = |m: u32| today.checked_sub_months(Months::new(m)).unwrap_or(NaiveDate::MIN);
    match period {
        Period::Days30 => today - chrono::Duration::days(30),
        Period::Days180 => today - chrono::Duration::days(180),
        Period::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        Period::Year1 => months_back(12),
        Period::Year5 => months_back(60),
        Period::All => today,
    }
}

/// Work out which days to chart and which upstream period to fetch.
///
/// "all" starts at the earliest transaction and is fetched with the
/// smallest upstream period that spans it. Bounded periods never start
/// before the earliest transaction, so there is no zero-valued pre-history.
pub fn effective_window(
    period: Period,
    earliest_transaction: Option<NaiveDate>,
    today: NaiveDate,
) -> FetchWindow {
    if period == Period::All {
        let start = earliest_transaction.unwrap_or(today).min(today);
        let span = (today - start).num_days();
        let fetch_period = if span <= ONE_YEAR_DAYS {
            Period::Year1
        } else if span <= FIVE_YEAR_DAYS {
            Period::Year5
        } else {
            Period::All
        };
        return FetchWindow {
            start,
            end: today,
            fetch_period,
        };
    }

    let mut start = period_start(period, today);
    if let Some(earliest) = earliest_transaction {
        if earliest > start {
            start = earliest.min(today);
        }
    }
    FetchWindow {
        start,
        end: today,
        fetch_period: period,
    }
}

/// Historical samples grouped per timestamp, each group layered on top of
/// the current rates so tickers absent from a sample still convert.
struct SampledRates {
    tables: BTreeMap<DateTime<Utc>, RateTable>,
}

impl SampledRates {
    fn build(samples: &[HistoricalRate], current: &RateTable) -> Self {
        let mut tables: BTreeMap<DateTime<Utc>, RateTable> = BTreeMap::new();
        for sample in samples {
            tables
                .entry(sample.timestamp)
                .or_insert_with(|| current.clone())
                .insert(&sample.ticker, sample.rate);
        }
        Self { tables }
    }

    /// Latest sample taken on or before `day`; never looks forward.
    fn at_or_before(&self, day: NaiveDate) -> Option<&RateTable> {
        let end_of_day = day.succ_opt()?.and_time(NaiveTime::MIN).and_utc();
        self.tables.range(..end_of_day).next_back().map(|(_, table)| table)
    }
}

fn distinct_timestamps(samples: &[HistoricalRate]) -> usize {
    samples
        .iter()
        .map(|s| s.timestamp)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Reconstructs portfolio value per day over a requested period.
///
/// Replays each balance's ledger to every day of the window and converts
/// with the best rates available for that day:
/// - **rich path**: nearest preceding historical sample, current rates
///   before the first sample;
/// - **simple path**: today's rates for every day, used when the provider
///   returns fewer than [`MIN_DISTINCT_SAMPLES`] distinct timestamps.
///
/// Degrades accuracy rather than availability: every failure below the
/// store layer is absorbed.
pub struct HoldingsService;

impl HoldingsService {
    pub fn new() -> Self {
        Self
    }

    pub async fn calculate_historical_holdings(
        &self,
        gateway: &RateGateway,
        accounts: &[AccountWithBalances],
        transactions: &[Transaction],
        request: &HoldingsRequest,
        today: NaiveDate,
    ) -> HoldingsSeries {
        let reporting = request.reporting_currency.to_uppercase();

        let tickers: BTreeSet<String> = accounts
            .iter()
            .flat_map(|a| a.balances.iter().map(|b| b.ticker.to_uppercase()))
            .collect();
        if tickers.is_empty() {
            return HoldingsSeries::empty(reporting);
        }

        let current = gateway.get_current_rates(&tickers, &reporting).await;

        let earliest = transactions.iter().map(|tx| tx.date).min();
        let window = effective_window(request.period, earliest, today);
        tracing::debug!(
            start = %window.start,
            end = %window.end,
            fetch_period = %window.fetch_period,
            "Resolved holdings window"
        );

        let samples = gateway
            .get_historical_rates(&tickers, &reporting, window.fetch_period, request.interval)
            .await;

        let distinct = distinct_timestamps(&samples);
        let (path, sampled) = if distinct < MIN_DISTINCT_SAMPLES {
            tracing::debug!(distinct, "Historical rates too sparse; applying current rates to every day");
            (ValuationPath::Simple, None)
        } else {
            (ValuationPath::Rich, Some(SampledRates::build(&samples, &current)))
        };

        let points = value_days(accounts, transactions, &window, |day| {
            sampled
                .as_ref()
                .and_then(|s| s.at_or_before(day))
                .unwrap_or(&current)
        });

        HoldingsSeries {
            reporting_currency: reporting,
            path,
            points,
        }
    }
}

impl Default for HoldingsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Value every (account, balance) on every day of the window with the rate
/// table `rates_for(day)` picks, then drop the zero-valued lead-in.
fn value_days<'r>(
    accounts: &[AccountWithBalances],
    transactions: &[Transaction],
    window: &FetchWindow,
    rates_for: impl Fn(NaiveDate) -> &'r RateTable,
) -> Vec<HoldingsPoint> {
    let timelines: HashMap<Uuid, BalanceTimeline> = accounts
        .iter()
        .flat_map(|a| a.balances.iter())
        .map(|b| (b.id, BalanceTimeline::build(b.id, transactions)))
        .collect();

    let mut parity_tickers: BTreeSet<String> = BTreeSet::new();
    let mut points = Vec::new();

    for day in window.days() {
        let rates = rates_for(day);
        let mut total_value = Decimal::ZERO;
        let mut breakdown: BTreeMap<String, Decimal> = BTreeMap::new();

        for entry in accounts {
            for balance in &entry.balances {
                let held = timelines
                    .get(&balance.id)
                    .map(|t| t.value_at(day))
                    .unwrap_or(Decimal::ZERO);
                let converted = to_reporting(held, &balance.ticker, rates);
                if converted.is_parity() && !held.is_zero() {
                    parity_tickers.insert(balance.ticker.to_uppercase());
                }

                total_value += converted.amount;
                *breakdown
                    .entry(format!("{}_{}", entry.account.name, balance.ticker))
                    .or_insert(Decimal::ZERO) += converted.amount;
            }
        }

        points.push(HoldingsPoint {
            date: day,
            total_value,
            breakdown,
        });
    }

    for ticker in &parity_tickers {
        tracing::warn!(%ticker, "No rate available; valued 1:1 in reporting currency");
    }

    let lead_in = points.iter().take_while(|p| p.total_value.is_zero()).count();
    points.drain(..lead_in);
    points
}
