//! Polls for pending position selections and video jobs
//! and runs them one at a time.

pub mod config;
pub mod runner;
