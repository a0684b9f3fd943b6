pub mod converters;
pub mod export;
pub mod validation;
