pub mod today;
pub mod week;
