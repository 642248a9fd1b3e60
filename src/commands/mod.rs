pub mod analyze;
pub mod quota;
