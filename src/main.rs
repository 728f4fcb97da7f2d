use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use debt_payoff::csv::{CsvError, read_debts, write_trace};
use debt_payoff::engine::InputError;
use debt_payoff::json::{JsonError, PlanResponse, read_request, write_error, write_json};
use debt_payoff::{
    Amount, DebtInput, Engine, EngineError, PaymentPolicy, PayoffReport, Rate, Strategy,
    build_accounts, compare_strategies_concurrently,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Avalanche,
    Snowball,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => Strategy::Avalanche,
            CliStrategy::Snowball => Strategy::Snowball,
        }
    }
}

/// Compare avalanche and snowball debt payoff plans.
#[derive(Debug, Parser)]
#[command(name = "debt-payoff", version)]
struct Cli {
    /// Debts as a json request or a csv file
    input: PathBuf,

    /// Extra monthly payment; overrides `extraPayment` from a json request
    #[arg(long)]
    extra_payment: Option<f64>,

    /// Print the month-by-month balances of one strategy as csv instead of the report
    #[arg(long, value_enum)]
    trace: Option<CliStrategy>,

    /// Lower bound of derived minimum payments [default: 25]
    #[arg(long)]
    minimum_floor: Option<f64>,

    /// Percentage of the balance used to derive minimum payments [default: 2.5]
    #[arg(long)]
    minimum_percent: Option<f64>,

    /// Months simulated before a plan is declared non-convergent [default: 1200]
    #[arg(long)]
    max_months: Option<u32>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("--{0} must be a non-negative number representable to 4 decimal places")]
    InvalidFlag(&'static str),

    #[error(transparent)]
    Json(#[from] JsonError),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl Cli {
    fn policy(&self) -> Result<PaymentPolicy, CliError> {
        let mut policy = PaymentPolicy::default();
        if let Some(floor) = self.minimum_floor {
            policy.minimum_floor = Amount::try_from_float(non_negative(floor, "minimum-floor")?)
                .ok_or(CliError::InvalidFlag("minimum-floor"))?;
        }
        if let Some(percent) = self.minimum_percent {
            policy.minimum_fraction =
                Rate::try_from_percent(non_negative(percent, "minimum-percent")?)
                    .ok_or(CliError::InvalidFlag("minimum-percent"))?;
        }
        if let Some(months) = self.max_months {
            policy.max_months = months;
        }
        Ok(policy)
    }
}

fn non_negative(value: f64, flag: &'static str) -> Result<f64, CliError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CliError::InvalidFlag(flag))
    }
}

/// Load debts and the request's extra payment from a json or csv file.
/// CSV files carry no extra payment.
fn load(path: &Path) -> Result<(Vec<DebtInput>, Amount), CliError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => {
            let debts = read_debts(path)?.collect::<Result<Vec<_>, _>>()?;
            Ok((debts, Amount::ZERO))
        }
        other => {
            if other != Some("json") {
                warn!(path = %path.display(), "input file seems to not be json, parsing anyway");
            }
            let request = read_request(path)?;
            Ok((request.debts()?, request.extra_payment()?))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let engine = Engine::new(cli.policy()?);

    let (debts, request_extra) = load(&cli.input)?;
    let extra_payment = match cli.extra_payment {
        Some(value) => {
            Amount::try_from_float(value).ok_or(CliError::InvalidFlag("extra-payment"))?
        }
        None => request_extra,
    };
    let accounts = build_accounts(&debts, engine.policy())?;

    if let Some(strategy) = cli.trace {
        let mut trace = engine.trace(&accounts, extra_payment, strategy.into())?;
        write_trace(io::stdout().lock(), &mut trace)?;
        trace.finish().map_err(EngineError::from)?;
        return Ok(());
    }

    let comparison =
        compare_strategies_concurrently(engine, accounts.clone(), extra_payment).await?;
    let report = PayoffReport::assemble(&engine, &accounts, comparison)?;
    write_json(io::stdout().lock(), &PlanResponse::from(&report))?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            if let Err(write_err) = write_error(io::stdout().lock(), &err.to_string()) {
                error!("failed to write error response: {write_err}");
            }
            ExitCode::FAILURE
        }
    }
}
