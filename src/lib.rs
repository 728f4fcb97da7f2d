pub mod amount;
pub mod csv;
pub mod engine;
pub mod json;
pub mod model;
pub mod policy;
pub mod rate;
pub mod report;

pub use amount::Amount;
pub use engine::{Engine, EngineError, StrategyResult, TracePoint};
pub use model::{DebtAccount, DebtId, DebtInput, Strategy, build_accounts};
pub use policy::PaymentPolicy;
pub use rate::Rate;
pub use report::{Comparison, PayoffReport, compare_strategies, compare_strategies_concurrently};
