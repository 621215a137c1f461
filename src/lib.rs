//! Word-to-PDF conversion service.
//!
//! Uploads go through [`pipeline::Pipeline`], which validates them, stages them
//! in a [`job::ConversionJob`] and hands them to an ordered
//! [`engine::StrategyChain`] of external converters.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod util;
