pub mod branch_name;
pub mod config;
pub mod options;
pub mod sync;
