pub mod atomic;
pub mod batch;
pub mod config;
pub mod error;
pub mod mapping;
pub mod record;
pub mod resample;
pub mod table;
