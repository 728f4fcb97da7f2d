//! JSON request and response documents.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::StrategyResult;
use crate::model::{DebtId, DebtInput, Strategy};
use crate::report::{DebtProjection, PayoffReport};
use crate::{Amount, Rate};

/// Errors that can occur when reading a request document
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse request: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("debt {id}: {field} {value} is not representable to 4 decimal places")]
    Unrepresentable {
        id: DebtId,
        field: &'static str,
        value: f64,
    },

    #[error("extraPayment {0} is not representable to 4 decimal places")]
    ExtraUnrepresentable(f64),
}

/// Debt ids arrive either as strings or as database integers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for DebtId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtRow {
    id: RawId,
    balance: f64,
    annual_interest_rate: f64,
    minimum_payment: Option<f64>,
}

/// A payoff request: the caller's debts and the extra monthly payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    debts: Vec<DebtRow>,
    #[serde(default)]
    extra_payment: f64,
}

impl PlanRequest {
    pub fn parse(json: &str) -> Result<Self, JsonError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn extra_payment(&self) -> Result<Amount, JsonError> {
        Amount::try_from_float(self.extra_payment)
            .ok_or(JsonError::ExtraUnrepresentable(self.extra_payment))
    }

    /// Convert rows to fixed-point debt inputs. Sign and range checks happen
    /// later, when the accounts are built.
    pub fn debts(&self) -> Result<Vec<DebtInput>, JsonError> {
        self.debts
            .iter()
            .map(|row| {
                let id = DebtId::from(row.id.clone());
                let unrepresentable = |field: &'static str, value: f64| {
                    JsonError::Unrepresentable {
                        id: id.clone(),
                        field,
                        value,
                    }
                };
                let amount = |field, value| {
                    Amount::try_from_float(value).ok_or_else(|| unrepresentable(field, value))
                };

                let balance = amount("balance", row.balance)?;
                let rate = row.annual_interest_rate;
                let annual_rate = Rate::try_from_percent(rate)
                    .ok_or_else(|| unrepresentable("annualInterestRate", rate))?;
                let minimum_payment = row
                    .minimum_payment
                    .map(|value| amount("minimumPayment", value))
                    .transpose()?;

                Ok(DebtInput {
                    id,
                    balance,
                    annual_rate,
                    minimum_payment,
                })
            })
            .collect()
    }
}

/// Read a payoff request from a json file
pub fn read_request(path: impl AsRef<Path>) -> Result<PlanRequest, JsonError> {
    let content = fs::read_to_string(path)?;
    PlanRequest::parse(&content)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayoffRow {
    id: DebtId,
    month: u32,
    interest_paid: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyRow {
    strategy_name: Strategy,
    months_to_payoff: u32,
    total_interest_paid: f64,
    payoff_order: Vec<PayoffRow>,
}

impl From<&StrategyResult> for StrategyRow {
    fn from(result: &StrategyResult) -> Self {
        Self {
            strategy_name: result.strategy,
            months_to_payoff: result.months_to_payoff,
            total_interest_paid: currency(result.total_interest),
            payoff_order: result
                .payoffs
                .iter()
                .map(|payoff| PayoffRow {
                    id: payoff.id.clone(),
                    month: payoff.month,
                    interest_paid: currency(payoff.interest_paid),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverviewRow {
    total_debt: f64,
    total_minimum_payments: f64,
    highest_interest_debt: Option<DebtId>,
    lowest_balance_debt: Option<DebtId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionRow {
    id: DebtId,
    minimum_payment: f64,
    months_to_payoff: Option<u32>,
    total_interest_paid: Option<f64>,
}

impl From<&DebtProjection> for ProjectionRow {
    fn from(projection: &DebtProjection) -> Self {
        Self {
            id: projection.id.clone(),
            minimum_payment: currency(projection.minimum_payment),
            months_to_payoff: projection.months_to_payoff,
            total_interest_paid: projection.total_interest.map(currency),
        }
    }
}

/// The response document, currency rounded to cents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    avalanche: StrategyRow,
    snowball: StrategyRow,
    minimum_only: StrategyRow,
    interest_saved_avalanche_vs_minimum: f64,
    interest_saved_snowball_vs_minimum: f64,
    months_saved_avalanche_vs_minimum: i64,
    months_saved_snowball_vs_minimum: i64,
    overview: OverviewRow,
    debts: Vec<ProjectionRow>,
}

impl From<&PayoffReport> for PlanResponse {
    fn from(report: &PayoffReport) -> Self {
        use crate::model::Strategy::{Avalanche, Snowball};

        let comparison = &report.comparison;
        let overview = &report.overview;
        Self {
            avalanche: (&comparison.avalanche).into(),
            snowball: (&comparison.snowball).into(),
            minimum_only: (&comparison.minimum_only).into(),
            interest_saved_avalanche_vs_minimum: currency(comparison.interest_saved_avalanche),
            interest_saved_snowball_vs_minimum: currency(comparison.interest_saved_snowball),
            months_saved_avalanche_vs_minimum: comparison.months_saved(Avalanche),
            months_saved_snowball_vs_minimum: comparison.months_saved(Snowball),
            overview: OverviewRow {
                total_debt: currency(overview.total_debt),
                total_minimum_payments: currency(overview.total_minimum_payments),
                highest_interest_debt: overview.highest_interest.clone(),
                lowest_balance_debt: overview.lowest_balance.clone(),
            },
            debts: report.projections.iter().map(ProjectionRow::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

/// Write `value` to `writer` as pretty json followed by a newline
pub fn write_json<T: Serialize>(mut writer: impl io::Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)
}

/// Write an `{"error": ...}` document for the calling layer
pub fn write_error(writer: impl io::Write, message: &str) -> io::Result<()> {
    write_json(writer, &ErrorResponse { error: message })
}

fn currency(amount: Amount) -> f64 {
    amount.round_to_cents().to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, InputError};
    use crate::report::{PayoffReport, compare_strategies};
    use crate::{Engine, PaymentPolicy, build_accounts};
    use serde_json::{Value, json};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn respond(request: &str) -> Value {
        let request = PlanRequest::parse(request).unwrap();
        let engine = Engine::default();
        let accounts = build_accounts(&request.debts().unwrap(), engine.policy()).unwrap();
        let extra = request.extra_payment().unwrap();
        let comparison = compare_strategies(&engine, &accounts, extra).unwrap();
        let report = PayoffReport::assemble(&engine, &accounts, comparison).unwrap();
        serde_json::to_value(PlanResponse::from(&report)).unwrap()
    }

    #[test]
    fn parses_request_with_camel_case_keys() {
        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"card","balance":3500,"annualInterestRate":18.99,"minimumPayment":105}],"extraPayment":150}"#,
        )
        .unwrap();

        let debts = request.debts().unwrap();
        assert_eq!(
            debts,
            [DebtInput {
                id: "card".to_string(),
                balance: Amount::from_float(3500.0),
                annual_rate: Rate::from_percent(18.99),
                minimum_payment: Some(Amount::from_float(105.0)),
            }]
        );
        assert_eq!(request.extra_payment().unwrap(), Amount::from_float(150.0));
    }

    #[test]
    fn numeric_ids_and_missing_fields_default() {
        let request =
            PlanRequest::parse(r#"{"debts":[{"id":7,"balance":100,"annualInterestRate":0}]}"#)
                .unwrap();
        let debts = request.debts().unwrap();
        assert_eq!(debts[0].id, "7");
        assert_eq!(debts[0].minimum_payment, None);
        assert_eq!(request.extra_payment().unwrap(), Amount::ZERO);
    }

    #[test]
    fn numbers_that_would_saturate_are_rejected() {
        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"big","balance":1e20,"annualInterestRate":5}],"extraPayment":1e15}"#,
        )
        .unwrap();
        assert!(matches!(
            request.debts(),
            Err(JsonError::Unrepresentable { id, field: "balance", .. }) if id == "big"
        ));
        assert!(matches!(
            request.extra_payment(),
            Err(JsonError::ExtraUnrepresentable(_))
        ));
    }

    #[test]
    fn tiny_negative_balance_keeps_its_sign() {
        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"dust","balance":-0.00004,"annualInterestRate":5}]}"#,
        )
        .unwrap();
        assert!(matches!(
            request.debts(),
            Err(JsonError::Unrepresentable { id, field: "balance", .. }) if id == "dust"
        ));
    }

    #[test]
    fn large_amounts_are_rejected_before_simulation() {
        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"a","balance":1000,"annualInterestRate":5,"minimumPayment":50}],"extraPayment":1e13}"#,
        )
        .unwrap();
        let engine = Engine::default();
        let accounts = build_accounts(&request.debts().unwrap(), engine.policy()).unwrap();
        let result = compare_strategies(&engine, &accounts, request.extra_payment().unwrap());
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput(InputError::ExtraPaymentOutOfRange(_)))
        ));

        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"a","balance":6e14,"annualInterestRate":5},{"id":"b","balance":6e14,"annualInterestRate":5}]}"#,
        )
        .unwrap();
        let result = build_accounts(&request.debts().unwrap(), engine.policy());
        assert!(matches!(result, Err(InputError::OutOfRange(id, "balance", _)) if id == "a"));
    }

    #[test]
    fn malformed_request_is_a_parse_error() {
        let result = PlanRequest::parse(r#"{"debts":[{"id":"x","balance":"lots"}]}"#);
        assert!(matches!(result, Err(JsonError::Parse(_))));
    }

    #[test]
    fn response_has_expected_shape() {
        let response = respond(
            r#"{"debts":[
                {"id":"A","balance":3000,"annualInterestRate":20,"minimumPayment":100},
                {"id":"B","balance":1000,"annualInterestRate":5,"minimumPayment":50}
            ],"extraPayment":200}"#,
        );

        assert_eq!(response["avalanche"]["strategyName"], json!("avalanche"));
        assert_eq!(response["snowball"]["strategyName"], json!("snowball"));
        assert_eq!(response["minimumOnly"]["strategyName"], json!("avalanche"));
        assert_eq!(response["avalanche"]["monthsToPayoff"], json!(14));
        assert_eq!(response["avalanche"]["totalInterestPaid"], json!(348.55));
        assert_eq!(response["snowball"]["totalInterestPaid"], json!(473.44));
        assert_eq!(response["minimumOnly"]["monthsToPayoff"], json!(35));
        assert_eq!(response["minimumOnly"]["totalInterestPaid"], json!(1114.97));
        assert_eq!(response["interestSavedAvalancheVsMinimum"], json!(766.42));
        assert_eq!(response["interestSavedSnowballVsMinimum"], json!(641.53));
        assert_eq!(response["monthsSavedAvalancheVsMinimum"], json!(21));
        assert_eq!(response["avalanche"]["payoffOrder"][0]["id"], json!("A"));
        assert_eq!(response["avalanche"]["payoffOrder"][0]["month"], json!(12));
        assert_eq!(response["overview"]["totalDebt"], json!(4000.0));
        assert_eq!(response["overview"]["highestInterestDebt"], json!("A"));
        assert_eq!(response["overview"]["lowestBalanceDebt"], json!("B"));
        assert_eq!(response["debts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn hopeless_debt_projects_to_null() {
        let response = respond(
            r#"{"debts":[
                {"id":"quick","balance":100,"annualInterestRate":0,"minimumPayment":100},
                {"id":"stuck","balance":1000,"annualInterestRate":12,"minimumPayment":5}
            ]}"#,
        );
        assert_eq!(response["debts"][1]["monthsToPayoff"], Value::Null);
        assert_eq!(response["debts"][1]["totalInterestPaid"], Value::Null);
        assert_eq!(response["debts"][0]["monthsToPayoff"], json!(1));
    }

    #[test]
    fn derived_minimums_follow_policy() {
        let request = PlanRequest::parse(
            r#"{"debts":[{"id":"x","balance":3000,"annualInterestRate":0},{"id":"y","balance":400,"annualInterestRate":0}]}"#,
        )
        .unwrap();
        let accounts =
            build_accounts(&request.debts().unwrap(), &PaymentPolicy::default()).unwrap();
        assert_eq!(accounts[0].minimum_payment, Amount::from_float(75.0));
        assert_eq!(accounts[1].minimum_payment, Amount::from_float(25.0));
    }

    #[test]
    fn read_request_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"debts":[{"id":"a","balance":1200,"annualInterestRate":0,"minimumPayment":100}]}"#)
            .unwrap();
        let request = read_request(file.path()).unwrap();
        assert_eq!(request.debts().unwrap().len(), 1);
    }

    #[test]
    fn read_request_missing_file_is_io_error() {
        let result = read_request("does/not/exist.json");
        assert!(matches!(result, Err(JsonError::Io(_))));
    }

    #[test]
    fn error_document() {
        let mut out = Vec::new();
        write_error(&mut out, "invalid input: no debts to simulate").unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, json!({"error": "invalid input: no debts to simulate"}));
    }
}
