//! Domain types for fundlab

pub mod record;
pub mod table;

pub use record::{net_income_ratio, TickerRecord};
pub use table::{FinancialTable, Upsert};
