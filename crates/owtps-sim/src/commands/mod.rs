pub mod convert;
pub mod label;
pub mod summarize;
