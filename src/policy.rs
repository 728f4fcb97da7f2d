//! Policy constants shared by every simulation run.

use crate::{Amount, Rate};

/// Tunable rules applied to every account in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPolicy {
    /// Lower bound of a derived minimum payment.
    pub minimum_floor: Amount,
    /// Share of the starting balance used to derive a minimum payment.
    pub minimum_fraction: Rate,
    /// Remaining balance at or below this is treated as paid off.
    pub payoff_epsilon: Amount,
    /// Safety ceiling on simulated months (100 years by default).
    pub max_months: u32,
}

impl PaymentPolicy {
    /// Minimum monthly payment for a balance when the caller did not supply one:
    /// `max(floor, balance × fraction)`.
    pub fn minimum_payment_for(&self, balance: Amount) -> Amount {
        // saturate on overflow
        let derived = self
            .minimum_fraction
            .of(balance)
            .unwrap_or(Amount::from_scaled(i64::MAX));
        derived.max(self.minimum_floor)
    }
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            minimum_floor: Amount::from_cents(2_500),
            minimum_fraction: Rate::from_scaled(25_000),
            payoff_epsilon: Amount::from_scaled(50),
            max_months: 1200,
        }
    }
}
