//! Integration tests for copilot-client.
//!
//! These run the client against an in-process fixture backend serving the
//! v2 and v1 schemas in various states of availability.

pub mod common;
