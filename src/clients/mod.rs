pub mod query;
pub mod stub_client;
pub mod valuation_client;

pub use query::{QueryParams, ValuationQuery, ValuationQueryBuilder};
pub use stub_client::StubValuationClient;
pub use valuation_client::{RentCastClient, ValuationApi};
