use crate::Amount;
use crate::model::{DebtAccount, DebtId, Strategy};

use super::amortization::MonthlyPayment;

/// An open account plus what it has cost so far.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    pub account: DebtAccount,
    pub interest_paid: Amount,
    /// Result of the most recent month, if any month has run.
    pub last_month: Option<MonthlyPayment>,
}

/// When an account closed and what it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPayoff {
    pub id: DebtId,
    /// Month (1-based) in which the balance reached zero; 0 if it started closed.
    pub month: u32,
    pub interest_paid: Amount,
}

/// Mutable state of one strategy run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub month: u32,
    /// Open accounts in fixed priority order; the first one receives the pool.
    pub active: Vec<OpenAccount>,
    pub extra_pool: Amount,
    pub total_interest: Amount,
    /// Closed accounts in the order they closed.
    pub payoffs: Vec<AccountPayoff>,
}

impl SimulationState {
    /// Copy `accounts` into a fresh state ordered by `strategy`.
    ///
    /// Accounts that start with a zero balance are closed immediately and do
    /// not contribute their minimum to the pool.
    pub fn new(accounts: &[DebtAccount], extra_payment: Amount, strategy: Strategy) -> Self {
        let mut ordered = accounts.to_vec();
        ordered.sort_by(|a, b| strategy.priority(a, b));

        let (open, closed): (Vec<_>, Vec<_>) =
            ordered.into_iter().partition(|a| a.balance.is_positive());

        Self {
            month: 0,
            active: open
                .into_iter()
                .map(|account| OpenAccount {
                    account,
                    interest_paid: Amount::ZERO,
                    last_month: None,
                })
                .collect(),
            extra_pool: extra_payment,
            total_interest: Amount::ZERO,
            payoffs: closed
                .into_iter()
                .map(|account| AccountPayoff {
                    id: account.id,
                    month: 0,
                    interest_paid: Amount::ZERO,
                })
                .collect(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.active.is_empty()
    }

    /// Payment offered to the account at `position` in the active list, or
    /// `None` if the pool would push it past the representable range.
    pub fn payment_for(&self, position: usize) -> Option<Amount> {
        let minimum = self.active[position].account.minimum_payment;
        if position == 0 {
            minimum.checked_add(self.extra_pool)
        } else {
            Some(minimum)
        }
    }
}
