//! Core access-control engine
//!
//! - `node` / `distance`: role and resource graphs, shortest-path distance
//! - `aggregate`: ordered groups of nodes used as query arguments
//! - `rule` / `store`: rule payloads, sequence-numbered records, registries
//! - `resolver`: candidate expansion and ranking
//! - `config` / `error`: ambient settings and error types

pub mod aggregate;
pub mod config;
pub mod distance;
pub mod error;
pub mod node;
pub mod resolver;
pub mod rule;
pub mod store;
