//! Versioned backend client for the Intraday Co-Pilot.
//!
//! The backend serves two schema generations of the same resources. Each
//! capability (session, plan, policy) is a trait with a v2 and a v1
//! implementation; `Fallback` composes them so callers only ever see the
//! normalized shapes from `copilot-core`.
//!
//! ```text
//!   CopilotClient ──► Fallback<V2Backend, V1Backend>
//!                        │ try            │ else
//!                        ▼                ▼
//!                  /api/v2/...        /api/...
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod fallback;
pub mod http;
pub mod peripheral;
pub mod source;
pub mod v1;
pub mod v2;

pub use client::{CopilotClient, VersionedBackend};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use fallback::Fallback;
pub use http::ApiClient;
pub use peripheral::WhatIfQuery;
pub use source::{HintSource, PlanSource, PolicySource, SessionSource};
pub use v1::V1Backend;
pub use v2::V2Backend;
