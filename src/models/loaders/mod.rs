pub mod address_list_loader;
pub mod portfolio_loader;

pub use address_list_loader::parse_address_list;
pub use portfolio_loader::parse_portfolio;
