pub mod catalog;
pub mod channel;
pub mod constellation;
pub mod dataset;
pub mod error;
pub mod source;
pub mod sweep;
pub mod ui;
pub mod utils;
