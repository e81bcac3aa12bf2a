//! ANET GraphQL client
//!
//! Thin authenticated GraphQL access shared by the draft engine and the
//! workload simulator:
//! - Credentials and endpoint configuration
//! - Per-identity bearer token cache
//! - Query execution with conflict-aware error classification

#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod token;

pub use client::GraphQlClient;
pub use config::{ClientConfig, Credential};
pub use error::{classify_graphql_errors, ClientError, GraphQlErrorEntry, CONFLICT_MESSAGE_PREFIX};
pub use token::{PasswordGrant, TokenCache, TokenSource};
