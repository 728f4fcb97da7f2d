use std::fmt;
use std::iter::Sum;

/// Fixed-point currency amount with 4 decimal places, stored as a scaled integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub(crate) const SCALE: i64 = 10_000;

    pub const ZERO: Amount = Amount(0);

    /// Largest balance, minimum or extra payment accepted as input.
    ///
    /// Sums of up to 900 such amounts still fit the scaled `i64`.
    pub const MAX_INPUT: Amount = Amount(1_000_000_000_000 * Self::SCALE);

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    /// Convert a caller-supplied number without coercing it.
    ///
    /// Returns `None` for values that are not finite, do not fit the scaled
    /// `i64`, or are negative but would round to zero.
    pub fn try_from_float(value: f64) -> Option<Self> {
        scaled_from_float(value, Self::SCALE).map(Amount)
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    /// Whole cents, e.g. `from_cents(12_345)` is `12.3450`.
    pub fn from_cents(cents: i64) -> Self {
        Amount(cents * (Self::SCALE / 100))
    }

    pub fn scaled(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Round half away from zero to whole cents.
    pub fn round_to_cents(self) -> Self {
        let step = Self::SCALE / 100;
        let half = step / 2;
        let rounded = if self.0 >= 0 {
            (self.0 + half) / step
        } else {
            (self.0 - half) / step
        };
        Amount(rounded * step)
    }

    /// Lossy conversion used only at the output boundary.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

/// Scale `value` to a rounded `i64`, refusing anything that would saturate
/// or lose its sign.
pub(crate) fn scaled_from_float(value: f64, scale: i64) -> Option<i64> {
    let scaled = (value * scale as f64).round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
        return None;
    }
    if value < 0.0 && scaled == 0.0 {
        return None;
    }
    Some(scaled as i64)
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:04}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
