//! Integration test modules

mod capture_cycle;
mod detection;
mod ui;
