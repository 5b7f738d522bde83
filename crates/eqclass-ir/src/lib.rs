pub mod expr;
pub mod parse;
pub mod types;
