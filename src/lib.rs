//! The Operator - a daily planner for the 80/20 operator
//!
//! This crate provides the planner library and the `op` CLI.
//!
//! # Architecture
//!
//! - [`planner`] - Source-agnostic planner facade over a [`planner::PlannerStore`]
//! - [`model`] - Data types (DailyPlan, Task, TimeBlock, Goal, OperatingCode)
//! - [`storage`] - Local document persistence with debounced writes
//! - [`backend`] - Hosted backend abstraction (SQLite and REST)
//! - [`sync`] - Remote store, realtime change feeds and account lifecycle
//! - [`schedule`] - Time block activity and progress
//! - [`notify`] - Block and daily reminder notifications
//! - [`billing`] - Subscription status and payment functions
//! - [`config`] - Home directory, settings and stored session
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod billing;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod planner;
pub mod schedule;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
