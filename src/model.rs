//! Core domain types for the payoff engine.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::engine::InputError;
use crate::{Amount, PaymentPolicy, Rate};

/// Opaque debt identifier.
pub type DebtId = String;

/// A debt as supplied by the caller, before policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtInput {
    pub id: DebtId,
    pub balance: Amount,
    pub annual_rate: Rate,
    /// Explicit minimum payment; derived from the policy when absent.
    pub minimum_payment: Option<Amount>,
}

/// A debt account ready for simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtAccount {
    pub id: DebtId,
    /// Amount owed; never negative.
    pub balance: Amount,
    /// Annual interest rate as a percentage.
    pub annual_rate: Rate,
    /// Fixed for the whole run.
    pub minimum_payment: Amount,
}

impl DebtAccount {
    pub fn new(
        id: impl Into<DebtId>,
        balance: Amount,
        annual_rate: Rate,
        minimum_payment: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            balance,
            annual_rate,
            minimum_payment,
        }
    }

    /// Build an account from caller input, deriving the minimum payment from
    /// `policy` when none was supplied.
    pub fn from_input(input: &DebtInput, policy: &PaymentPolicy) -> Result<Self, InputError> {
        if input.balance.is_negative() {
            return Err(InputError::NegativeBalance(input.id.clone(), input.balance));
        }
        if input.annual_rate.is_negative() {
            return Err(InputError::NegativeRate(input.id.clone(), input.annual_rate));
        }

        let minimum_payment = match input.minimum_payment {
            Some(explicit) if !explicit.is_positive() => {
                return Err(InputError::NonPositiveMinimum(input.id.clone(), explicit));
            }
            Some(explicit) => explicit,
            None => policy.minimum_payment_for(input.balance),
        };

        let id = &input.id;
        check_bound(id, "balance", input.balance)?;
        check_bound(id, "minimum payment", minimum_payment)?;

        Ok(Self::new(
            input.id.clone(),
            input.balance,
            input.annual_rate,
            minimum_payment,
        ))
    }
}

/// Reject an amount larger than [`Amount::MAX_INPUT`].
pub(crate) fn check_bound(
    id: &DebtId,
    field: &'static str,
    value: Amount,
) -> Result<(), InputError> {
    if value > Amount::MAX_INPUT {
        return Err(InputError::OutOfRange(id.clone(), field, value));
    }
    Ok(())
}

/// Build accounts for every input, failing on the first invalid record.
pub fn build_accounts(
    inputs: &[DebtInput],
    policy: &PaymentPolicy,
) -> Result<Vec<DebtAccount>, InputError> {
    inputs
        .iter()
        .map(|input| DebtAccount::from_input(input, policy))
        .collect()
}

/// Which account receives the extra payment pool first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Highest interest rate first.
    Avalanche,
    /// Lowest balance first.
    Snowball,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Avalanche, Strategy::Snowball];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Avalanche => "avalanche",
            Strategy::Snowball => "snowball",
        }
    }

    /// Priority order between two accounts; `Less` means `a` is paid first.
    ///
    /// Ties are broken on the remaining key and finally on the id so that the
    /// order is total.
    pub fn priority(self, a: &DebtAccount, b: &DebtAccount) -> Ordering {
        match self {
            Strategy::Avalanche => b
                .annual_rate
                .cmp(&a.annual_rate)
                .then_with(|| b.balance.cmp(&a.balance)),
            Strategy::Snowball => a
                .balance
                .cmp(&b.balance)
                .then_with(|| b.annual_rate.cmp(&a.annual_rate)),
        }
        .then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
