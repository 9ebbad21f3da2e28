pub mod loaders;
pub mod outcome;
pub mod property;
pub mod summary;

pub use loaders::{parse_address_list, parse_portfolio};
pub use outcome::ValuationOutcome;
pub use property::{HasAddress, PropertyQueryRecord};
pub use summary::{BatchStats, RunSummary};
