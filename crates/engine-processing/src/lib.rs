pub mod error;
pub mod full_table;
