//! beacon-lib: Core types and logic for Beacon
//!
//! This crate provides the config synchronization and fact-resolution engine:
//! - `api`: the remote config repository client (wire contract + HTTP impl)
//! - `config`: the fact resolver (includes, `@GEN` secrets, hash-keyed cache)
//! - `store`: the synchronization store and checkout/update/publish workflow
//! - `tasks`: artifact generators consuming a resolved config read-only

pub mod api;
pub mod config;
pub mod store;
pub mod tasks;
pub mod util;
