use std::{fmt, str::FromStr};

use crate::EngineError;

/// Denominator of a basis-point rate: `10_000 bps == 100%`.
pub const BPS_DENOMINATOR: i64 = 10_000;

/// A price expressed in **minor units** (cents).
///
/// Every amount the engine stores (daily rates, totals, fees, credit) is an
/// `i64` number of minor units. `Money` is the typed view used at the edges,
/// when amounts are printed in notifications and reports or parsed from admin
/// input.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let rate: Money = "45,5".parse().unwrap();
/// assert_eq!(rate.minor(), 4550);
/// assert_eq!(rate.to_string(), "45.50");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

/// Applies a basis-point rate to a non-negative amount, rounding half up.
///
/// ```rust
/// use engine::money::apply_bps;
///
/// assert_eq!(apply_bps(10_000, 1_800), 1_800);
/// assert_eq!(apply_bps(5, 1_000), 1);
/// ```
#[must_use]
pub fn apply_bps(amount_minor: i64, bps: u32) -> i64 {
    let amount = i128::from(amount_minor.max(0));
    let scaled = (amount * i128::from(bps) + i128::from(BPS_DENOMINATOR / 2))
        / i128::from(BPS_DENOMINATOR);
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a non-negative decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator, at most 2 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidInput(format!("invalid amount: {s}"));

        let trimmed = s.trim().replace(',', ".");
        if trimmed.is_empty() {
            return Err(EngineError::InvalidInput("empty amount".to_string()));
        }

        let (major_str, minor_str) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed.as_str(), ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let major: i64 = major_str.parse().map_err(|_| invalid())?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => minor_str.parse().map_err(|_| invalid())?,
            _ => {
                return Err(EngineError::InvalidInput(
                    "too many decimals".to_string(),
                ));
            }
        };

        major
            .checked_mul(100)
            .and_then(|v| v.checked_add(minor))
            .map(Money)
            .ok_or_else(|| EngineError::InvalidInput("amount too large".to_string()))
    }
}
