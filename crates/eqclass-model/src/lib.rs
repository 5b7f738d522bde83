pub mod eval;
pub mod model;
pub mod validate;
