/// DSSE envelope wire models
pub mod dsse;
