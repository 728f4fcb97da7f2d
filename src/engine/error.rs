//! Error types for payoff simulation.

use std::fmt;

use thiserror::Error;

use crate::model::{DebtId, Strategy};
use crate::{Amount, Rate};

/// Top-level error returned by [`Engine::simulate`](super::Engine::simulate)
/// and the strategy comparisons.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error(transparent)]
    NonConvergent(#[from] NonConvergentError),

    #[error("simulation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Input rejected before any month is simulated.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("no debts to simulate")]
    NoDebts,
    #[error("debt {0} has a negative balance {1}")]
    NegativeBalance(DebtId, Amount),
    #[error("debt {0} has a negative interest rate {1}")]
    NegativeRate(DebtId, Rate),
    #[error("debt {0} has a non-positive minimum payment {1}")]
    NonPositiveMinimum(DebtId, Amount),
    #[error("debt id {0} appears more than once")]
    DuplicateId(DebtId),
    #[error("extra payment {0} is negative")]
    NegativeExtraPayment(Amount),
    #[error("debt {0}: {1} {2} exceeds the supported maximum")]
    OutOfRange(DebtId, &'static str, Amount),
    #[error("extra payment {0} exceeds the supported maximum")]
    ExtraPaymentOutOfRange(Amount),
    #[error("{0} exceeds the supported range")]
    TotalOutOfRange(&'static str),
}

/// A plan that cannot pay off every account within the month ceiling.
#[derive(Debug, Error, PartialEq)]
#[error(
    "{strategy} plan still owes on {} after {months} months: {}",
    ids(.shortfalls),
    details(.shortfalls)
)]
pub struct NonConvergentError {
    pub strategy: Strategy,
    pub months: u32,
    /// One entry per account still open when the run stopped.
    pub shortfalls: Vec<Shortfall>,
}

impl NonConvergentError {
    pub fn account_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.shortfalls.iter().map(|s| s.id.as_str())
    }
}

/// Last observed month of an account that never paid off.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub id: DebtId,
    pub balance: Amount,
    pub monthly_interest: Amount,
    pub monthly_payment: Amount,
}

impl Shortfall {
    /// Interest accrued beyond what was paid; zero or negative when the
    /// payment covered interest but too slowly.
    pub fn gap(&self) -> Amount {
        self.monthly_interest - self.monthly_payment
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "debt {} accrues {} interest against {} paid per month",
            self.id, self.monthly_interest, self.monthly_payment
        )
    }
}

fn ids(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn details(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(Shortfall::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
