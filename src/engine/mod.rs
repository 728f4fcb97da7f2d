//! Debt payoff simulation engine.
//!
//! The engine orders a set of debt accounts by strategy and advances them
//! month by month: every open account is charged its minimum payment and the
//! highest-priority account also receives the extra payment pool. When an
//! account closes, its minimum joins the pool from the following month.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::model::{DebtAccount, DebtId, Strategy, check_bound};
use crate::{Amount, PaymentPolicy};

mod amortization;
pub use amortization::{MonthlyPayment, apply_monthly_payment};

mod state;
pub use state::{AccountPayoff, OpenAccount, SimulationState};

mod error;
pub use error::{EngineError, InputError, NonConvergentError, Shortfall};

/// Result of running one strategy to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyResult {
    pub strategy: Strategy,
    pub extra_payment: Amount,
    pub months_to_payoff: u32,
    pub total_interest: Amount,
    /// Accounts in the order they closed.
    pub payoffs: Vec<AccountPayoff>,
}

/// Remaining balance of one account at the end of a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePoint {
    pub month: u32,
    pub id: DebtId,
    pub balance: Amount,
}

/// The payoff simulation engine.
///
/// Holds only the policy; every run works on its own copy of the accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    policy: PaymentPolicy,
}

/// Public API
impl Engine {
    pub fn new(policy: PaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PaymentPolicy {
        &self.policy
    }

    /// Run `strategy` until every account is paid off.
    pub fn simulate(
        &self,
        accounts: &[DebtAccount],
        extra_payment: Amount,
        strategy: Strategy,
    ) -> Result<StrategyResult, EngineError> {
        let mut simulation = self.start(accounts, extra_payment, strategy)?;

        while !simulation.is_done() {
            if let Err(err) = simulation.step(|_, _| {}) {
                warn!(
                    strategy = %strategy,
                    months = err.months,
                    reason = %err,
                    "simulation did not converge"
                );
                return Err(err.into());
            }
        }

        let state = simulation.state;
        info!(
            strategy = %strategy,
            extra_payment = %extra_payment,
            months = state.month,
            total_interest = %state.total_interest,
            "simulation finished"
        );

        Ok(StrategyResult {
            strategy,
            extra_payment,
            months_to_payoff: state.month,
            total_interest: state.total_interest,
            payoffs: state.payoffs,
        })
    }

    /// Month-by-month balances of every charged account under `strategy`.
    ///
    /// The trace is computed lazily and from scratch on every call. It ends
    /// when all accounts close or the plan stops converging; call
    /// [`Trace::finish`] afterwards to learn which.
    pub fn trace(
        &self,
        accounts: &[DebtAccount],
        extra_payment: Amount,
        strategy: Strategy,
    ) -> Result<Trace, InputError> {
        Ok(Trace {
            simulation: self.start(accounts, extra_payment, strategy)?,
            pending: VecDeque::new(),
            failure: None,
        })
    }
}

/// Private API
impl Engine {
    fn start(
        &self,
        accounts: &[DebtAccount],
        extra_payment: Amount,
        strategy: Strategy,
    ) -> Result<Simulation, InputError> {
        validate(accounts, extra_payment)?;
        Ok(Simulation {
            state: SimulationState::new(accounts, extra_payment, strategy),
            strategy,
            policy: self.policy,
        })
    }
}

/// Reject input the simulation cannot run on:
/// - Ensure there is at least one debt and ids are unique
/// - Ensure balances, rates and the extra payment are non-negative
/// - Ensure minimum payments are positive
/// - Ensure every amount and the monthly totals fit, so the pool and the
///   payments built from it never overflow
fn validate(accounts: &[DebtAccount], extra_payment: Amount) -> Result<(), InputError> {
    if accounts.is_empty() {
        return Err(InputError::NoDebts);
    }
    if extra_payment.is_negative() {
        return Err(InputError::NegativeExtraPayment(extra_payment));
    }
    if extra_payment > Amount::MAX_INPUT {
        return Err(InputError::ExtraPaymentOutOfRange(extra_payment));
    }

    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        if !seen.insert(account.id.as_str()) {
            return Err(InputError::DuplicateId(account.id.clone()));
        }
        if account.balance.is_negative() {
            return Err(InputError::NegativeBalance(account.id.clone(), account.balance));
        }
        if account.annual_rate.is_negative() {
            return Err(InputError::NegativeRate(account.id.clone(), account.annual_rate));
        }
        if !account.minimum_payment.is_positive() {
            return Err(InputError::NonPositiveMinimum(
                account.id.clone(),
                account.minimum_payment,
            ));
        }
        check_bound(&account.id, "balance", account.balance)?;
        check_bound(&account.id, "minimum payment", account.minimum_payment)?;
    }

    // every payment is at most the extra payment plus all minimums
    accounts
        .iter()
        .try_fold(extra_payment, |acc, a| acc.checked_add(a.minimum_payment))
        .ok_or(InputError::TotalOutOfRange("extra payment plus minimum payments"))?;
    accounts
        .iter()
        .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a.balance))
        .ok_or(InputError::TotalOutOfRange("total balance"))?;
    Ok(())
}

/// A month charged against every open account but not yet applied.
struct ChargedMonth {
    outcomes: Vec<MonthlyPayment>,
    total_interest: Amount,
    extra_pool: Amount,
}

/// One strategy run in progress.
struct Simulation {
    state: SimulationState,
    strategy: Strategy,
    policy: PaymentPolicy,
}

impl Simulation {
    fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Advance every open account by one month, calling `observe` with the
    /// updated account after each charge.
    ///
    /// The month is charged in full before any account is updated, so a
    /// failure leaves the state at the end of the previous month.
    fn step(
        &mut self,
        mut observe: impl FnMut(u32, &DebtAccount),
    ) -> Result<(), NonConvergentError> {
        if self.state.month >= self.policy.max_months {
            return Err(self.non_convergent());
        }
        let month = self.state.month + 1;

        let Some(charged) = self.charge_month() else {
            return Err(self.non_convergent());
        };

        for (open, outcome) in self.state.active.iter_mut().zip(charged.outcomes) {
            open.account.balance = outcome.new_balance;
            open.interest_paid += outcome.interest;
            open.last_month = Some(outcome);
            observe(month, &open.account);
        }
        self.state.total_interest = charged.total_interest;
        // The unused remainder of this month is dropped; only the minimums of
        // closed accounts roll over, starting next month.
        self.state.extra_pool = charged.extra_pool;
        self.state.month = month;

        // Partition keeps priority order among the accounts still open
        let (closed, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.active)
            .into_iter()
            .partition(|open| !open.account.balance.is_positive());
        self.state.active = open;

        for paid in closed {
            debug!(
                strategy = %self.strategy,
                id = %paid.account.id,
                month,
                interest = %paid.interest_paid,
                extra_pool = %self.state.extra_pool,
                "account paid off"
            );
            self.state.payoffs.push(AccountPayoff {
                id: paid.account.id,
                month,
                interest_paid: paid.interest_paid,
            });
        }

        Ok(())
    }

    /// Work out the coming month for every open account without touching
    /// the state. `None` if any figure leaves the representable range.
    fn charge_month(&self) -> Option<ChargedMonth> {
        let mut charged = ChargedMonth {
            outcomes: Vec::with_capacity(self.state.active.len()),
            total_interest: self.state.total_interest,
            extra_pool: self.state.extra_pool,
        };

        for (position, open) in self.state.active.iter().enumerate() {
            let payment = self.state.payment_for(position)?;
            let outcome =
                apply_monthly_payment(&open.account, payment, self.policy.payoff_epsilon)?;
            charged.total_interest = charged.total_interest.checked_add(outcome.interest)?;
            if outcome.paid_off {
                charged.extra_pool =
                    charged.extra_pool.checked_add(open.account.minimum_payment)?;
            }
            charged.outcomes.push(outcome);
        }

        Some(charged)
    }

    fn non_convergent(&self) -> NonConvergentError {
        let shortfalls = self
            .state
            .active
            .iter()
            .map(|open| {
                let (monthly_interest, monthly_payment) = open
                    .last_month
                    .map_or((Amount::ZERO, Amount::ZERO), |m| (m.interest, m.paid));
                Shortfall {
                    id: open.account.id.clone(),
                    balance: open.account.balance,
                    monthly_interest,
                    monthly_payment,
                }
            })
            .collect();

        NonConvergentError {
            strategy: self.strategy,
            months: self.state.month,
            shortfalls,
        }
    }
}

/// Lazy month-by-month trace of one strategy run.
pub struct Trace {
    simulation: Simulation,
    pending: VecDeque<TracePoint>,
    failure: Option<NonConvergentError>,
}

impl Trace {
    /// Drain what is left of the trace and report whether the plan paid
    /// every account off.
    pub fn finish(mut self) -> Result<(), NonConvergentError> {
        self.by_ref().for_each(drop);
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Iterator for Trace {
    type Item = TracePoint;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(point) = self.pending.pop_front() {
                return Some(point);
            }
            if self.failure.is_some() || self.simulation.is_done() {
                return None;
            }

            let pending = &mut self.pending;
            let stepped = self.simulation.step(|month, account| {
                pending.push_back(TracePoint {
                    month,
                    id: account.id.clone(),
                    balance: account.balance,
                });
            });
            if let Err(err) = stepped {
                self.failure = Some(err);
            }
        }
    }
}
