//! Shared fixtures for client integration tests.

pub mod mock_backend;
