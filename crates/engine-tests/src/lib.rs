#![allow(dead_code)]

pub mod persistence;
pub mod table;
pub mod utils;
