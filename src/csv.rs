use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::engine::TracePoint;
use crate::model::{DebtId, DebtInput};
use crate::{Amount, Rate};

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open csv file: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {field} {value} is not representable to 4 decimal places")]
    Unrepresentable {
        line: usize,
        field: &'static str,
        value: f64,
    },

    #[error("failed to write csv row: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv writer: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    id: DebtId,
    balance: f64,
    annual_interest_rate: f64,
    minimum_payment: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TraceRow<'a> {
    month: u32,
    id: &'a str,
    balance: String,
}

/// Read debts from a csv file with an
/// `id,balance,annual_interest_rate,minimum_payment` header.
///
/// An empty `minimum_payment` cell leaves the minimum to the payment policy.
pub fn read_debts(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<DebtInput, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;

            let unrepresentable = |field, value| CsvError::Unrepresentable { line, field, value };
            let amount = |field, value| {
                Amount::try_from_float(value).ok_or_else(|| unrepresentable(field, value))
            };

            let balance = amount("balance", row.balance)?;
            let rate = row.annual_interest_rate;
            let annual_rate = Rate::try_from_percent(rate)
                .ok_or_else(|| unrepresentable("annual_interest_rate", rate))?;
            let minimum_payment = row
                .minimum_payment
                .map(|value| amount("minimum_payment", value))
                .transpose()?;

            Ok(DebtInput {
                id: row.id,
                balance,
                annual_rate,
                minimum_payment,
            })
        }))
}

/// Write trace points as `month,id,balance` csv rows, balances in cents
pub fn write_trace(
    writer: impl io::Write,
    points: impl IntoIterator<Item = TracePoint>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for point in points {
        let row = TraceRow {
            month: point.month,
            id: &point.id,
            balance: format!("{:.2}", point.balance.round_to_cents().to_f64()),
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}
