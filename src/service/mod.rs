pub mod aggregation;
pub mod ledger;
pub mod tax;
pub mod validation;

pub use aggregation::{aggregate, sum_quantities};
pub use ledger::LedgerService;
pub use tax::compute;
pub use validation::{Rule, ValidationErrors, Validator};
