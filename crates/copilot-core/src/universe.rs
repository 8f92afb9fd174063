//! Active-universe configuration (`/api/config`).

use serde::{Deserialize, Serialize};

/// Pinned symbols and the active universe size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Symbols always subscribed, `SYMBOL` or `EXCH:SYMBOL`.
    #[serde(default)]
    pub pinned: Vec<String>,
    #[serde(default)]
    pub universe_limit: u32,
}

/// Parse pinned symbols from comma-separated input.
///
/// Use `EXCH:SYMBOL` when a symbol is ambiguous across exchanges.
pub fn parse_pinned(text: &str) -> Vec<String> {
    crate::policy::parse_list(text)
}
