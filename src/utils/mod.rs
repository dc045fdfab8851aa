pub mod csv;
pub mod logs;
