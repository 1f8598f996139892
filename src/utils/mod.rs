pub mod range;
pub mod validation;
