pub mod attendance;
pub mod fiscal_year;
pub mod schedule;
pub mod section;
pub mod subject;
