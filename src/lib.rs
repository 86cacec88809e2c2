//! Aggregate Workflows Library
//!
//! Two aggregate state machines behind async command handlers:
//!
//! * the restaurant order/table lifecycle (`Order`, `Table`, `MenuItem`)
//! * the goal-set approval workflow (`GoalPeriod`, `GoalSet`, `Goal`)
//!
//! Commands load one aggregate from the [`store::DataStore`], apply a
//! transition, persist it with an optimistic version check and publish an
//! [`events::Event`]. Goal-set commands retry the whole cycle on
//! concurrency conflicts (see [`retry::with_concurrency_retry`]).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod models;
pub mod queries;
pub mod repositories;
pub mod retry;
pub mod store;

pub use commands::Command;
pub use errors::{DomainError, DomainResult, ServiceError};
pub use events::{Event, EventSender};
pub use queries::Query;
pub use store::DataStore;
