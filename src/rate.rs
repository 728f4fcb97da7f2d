use std::fmt;

use crate::Amount;
use crate::amount::scaled_from_float;

/// A percentage with 4 decimal places, e.g. `18.99` is stored as `189_900`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate(i64);

impl Rate {
    const SCALE: i64 = 10_000;
    const MONTHS_PER_YEAR: i128 = 12;

    pub const ZERO: Rate = Rate(0);

    pub fn from_percent(value: f64) -> Self {
        Rate((value * Self::SCALE as f64).round() as i64)
    }

    /// Convert a caller-supplied percentage; see [`Amount::try_from_float`].
    pub fn try_from_percent(value: f64) -> Option<Self> {
        scaled_from_float(value, Self::SCALE).map(Rate)
    }

    pub fn from_scaled(value: i64) -> Self {
        Rate(value)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn as_percent(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// `amount × rate / 100`, rounded half away from zero.
    ///
    /// Returns `None` if the result does not fit an [`Amount`].
    pub fn of(self, amount: Amount) -> Option<Amount> {
        let divisor = 100 * Self::SCALE as i128;
        scale_rounded(amount, self.0, divisor)
    }

    /// One month of simple interest on `balance` at this annual rate:
    /// `balance × rate / 100 / 12`, rounded half away from zero.
    ///
    /// Returns `None` if the result does not fit an [`Amount`].
    pub fn monthly_interest(self, balance: Amount) -> Option<Amount> {
        let divisor = 100 * Self::SCALE as i128 * Self::MONTHS_PER_YEAR;
        scale_rounded(balance, self.0, divisor)
    }
}

fn scale_rounded(amount: Amount, numerator: i64, divisor: i128) -> Option<Amount> {
    let product = amount.scaled() as i128 * numerator as i128;
    let half = divisor / 2;
    let rounded = if product >= 0 {
        (product + half) / divisor
    } else {
        (product - half) / divisor
    };
    i64::try_from(rounded).ok().map(Amount::from_scaled)
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:04}%")
    }
}
