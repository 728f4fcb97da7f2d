use crate::Amount;
use crate::model::DebtAccount;

/// Outcome of charging one account for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyPayment {
    /// Interest accrued this month.
    pub interest: Amount,
    /// Amount actually paid, capped at what was owed.
    pub paid: Amount,
    /// Part of the payment that reduced the balance; negative when the
    /// payment did not cover the interest.
    pub principal: Amount,
    pub new_balance: Amount,
    pub paid_off: bool,
}

/// Advance `account` by one month with `payment` offered against it.
///
/// Interest accrues on the opening balance first, then the payment is capped
/// at the balance after interest. A remainder at or below `epsilon` counts as
/// paid off and is cleared to exactly zero.
///
/// Returns `None` if the balance grows past the representable range, which
/// only happens when interest keeps outpacing the payment.
pub fn apply_monthly_payment(
    account: &DebtAccount,
    payment: Amount,
    epsilon: Amount,
) -> Option<MonthlyPayment> {
    debug_assert!(account.balance.is_positive(), "account {} already closed", account.id);
    debug_assert!(!payment.is_negative());

    let interest = account.annual_rate.monthly_interest(account.balance)?;
    let owed = account.balance.checked_add(interest)?;
    let paid = payment.min(owed);
    let remaining = owed - paid;

    let paid_off = remaining <= epsilon;
    let new_balance = if paid_off { Amount::ZERO } else { remaining };

    Some(MonthlyPayment {
        interest,
        paid,
        principal: paid - interest,
        new_balance,
        paid_off,
    })
}
