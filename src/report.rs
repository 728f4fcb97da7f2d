//! Strategy comparison and portfolio summaries.

use std::sync::Arc;

use tracing::debug;

use crate::Amount;
use crate::engine::{Engine, EngineError, InputError, StrategyResult};
use crate::model::{DebtAccount, DebtId, Strategy};

/// Avalanche and snowball runs next to the minimum-payments-only baseline.
///
/// The baseline is an avalanche run with no extra payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub avalanche: StrategyResult,
    pub snowball: StrategyResult,
    pub minimum_only: StrategyResult,
    pub interest_saved_avalanche: Amount,
    pub interest_saved_snowball: Amount,
}

impl Comparison {
    pub fn new(
        avalanche: StrategyResult,
        snowball: StrategyResult,
        minimum_only: StrategyResult,
    ) -> Self {
        Self {
            interest_saved_avalanche: minimum_only.total_interest - avalanche.total_interest,
            interest_saved_snowball: minimum_only.total_interest - snowball.total_interest,
            avalanche,
            snowball,
            minimum_only,
        }
    }

    pub fn result(&self, strategy: Strategy) -> &StrategyResult {
        match strategy {
            Strategy::Avalanche => &self.avalanche,
            Strategy::Snowball => &self.snowball,
        }
    }

    /// Months gained by `strategy` over the baseline.
    pub fn months_saved(&self, strategy: Strategy) -> i64 {
        i64::from(self.minimum_only.months_to_payoff)
            - i64::from(self.result(strategy).months_to_payoff)
    }
}

/// Run all three plans one after another.
pub fn compare_strategies(
    engine: &Engine,
    accounts: &[DebtAccount],
    extra_payment: Amount,
) -> Result<Comparison, EngineError> {
    let avalanche = engine.simulate(accounts, extra_payment, Strategy::Avalanche)?;
    let snowball = engine.simulate(accounts, extra_payment, Strategy::Snowball)?;
    let minimum_only = engine.simulate(accounts, Amount::ZERO, Strategy::Avalanche)?;
    Ok(Comparison::new(avalanche, snowball, minimum_only))
}

/// Run all three plans on tokio's blocking pool and join them.
///
/// Produces the same [`Comparison`] as [`compare_strategies`].
pub async fn compare_strategies_concurrently(
    engine: Engine,
    accounts: Vec<DebtAccount>,
    extra_payment: Amount,
) -> Result<Comparison, EngineError> {
    let accounts: Arc<[DebtAccount]> = accounts.into();

    let spawn = |extra_payment: Amount, strategy: Strategy| {
        let accounts = Arc::clone(&accounts);
        tokio::task::spawn_blocking(move || engine.simulate(&accounts, extra_payment, strategy))
    };

    let (avalanche, snowball, minimum_only) = tokio::try_join!(
        spawn(extra_payment, Strategy::Avalanche),
        spawn(extra_payment, Strategy::Snowball),
        spawn(Amount::ZERO, Strategy::Avalanche),
    )?;

    Ok(Comparison::new(avalanche?, snowball?, minimum_only?))
}

/// Portfolio totals shown before any plan is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtOverview {
    pub total_debt: Amount,
    pub total_minimum_payments: Amount,
    /// First target of the avalanche strategy.
    pub highest_interest: Option<DebtId>,
    /// First target of the snowball strategy.
    pub lowest_balance: Option<DebtId>,
}

impl DebtOverview {
    /// Fails if the totals do not fit an [`Amount`].
    pub fn new(accounts: &[DebtAccount]) -> Result<Self, InputError> {
        let open = || accounts.iter().filter(|a| a.balance.is_positive());
        let first_target = |strategy: Strategy| {
            open()
                .min_by(|a, b| strategy.priority(a, b))
                .map(|a| a.id.clone())
        };

        let total_debt = accounts
            .iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a.balance))
            .ok_or(InputError::TotalOutOfRange("total balance"))?;
        let total_minimum_payments = open()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a.minimum_payment))
            .ok_or(InputError::TotalOutOfRange("total minimum payments"))?;

        Ok(Self {
            total_debt,
            total_minimum_payments,
            highest_interest: first_target(Strategy::Avalanche),
            lowest_balance: first_target(Strategy::Snowball),
        })
    }
}

/// One debt paid on its own at its minimum payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtProjection {
    pub id: DebtId,
    pub minimum_payment: Amount,
    /// `None` when the minimum alone never pays the debt off.
    pub months_to_payoff: Option<u32>,
    pub total_interest: Option<Amount>,
}

/// Project every debt as if it were the only one, paid at its minimum.
pub fn project_each(
    engine: &Engine,
    accounts: &[DebtAccount],
) -> Result<Vec<DebtProjection>, EngineError> {
    accounts
        .iter()
        .map(|account| {
            let single = std::slice::from_ref(account);
            let (months_to_payoff, total_interest) =
                match engine.simulate(single, Amount::ZERO, Strategy::Avalanche) {
                    Ok(result) => (Some(result.months_to_payoff), Some(result.total_interest)),
                    Err(EngineError::NonConvergent(err)) => {
                        debug!(id = %account.id, reason = %err, "debt never pays off alone");
                        (None, None)
                    }
                    Err(err) => return Err(err),
                };
            Ok(DebtProjection {
                id: account.id.clone(),
                minimum_payment: account.minimum_payment,
                months_to_payoff,
                total_interest,
            })
        })
        .collect()
}

/// Everything the display layer needs for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoffReport {
    pub overview: DebtOverview,
    pub comparison: Comparison,
    pub projections: Vec<DebtProjection>,
}

impl PayoffReport {
    /// Attach the overview and per-debt projections to a finished comparison.
    pub fn assemble(
        engine: &Engine,
        accounts: &[DebtAccount],
        comparison: Comparison,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            overview: DebtOverview::new(accounts)?,
            comparison,
            projections: project_each(engine, accounts)?,
        })
    }
}
