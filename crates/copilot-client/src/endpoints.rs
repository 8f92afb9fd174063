//! Backend paths.

pub const V2_SESSION: &str = "/api/v2/session";
pub const V1_SESSION: &str = "/api/session";

pub const CONFIG: &str = "/api/config";

pub const V2_PLAN: &str = "/api/v2/plan";
pub const V1_PLAN: &str = "/api/plan";

pub const V2_POLICY: &str = "/api/v2/policy";
pub const V1_POLICY: &str = "/api/policy";

pub const V2_HIST_BARS: &str = "/api/v2/hist/bars";
pub const V2_HIST_ANALYZE: &str = "/api/v2/hist/analyze";
pub const V2_HIST_WHATIF: &str = "/api/v2/hist/whatif";
pub const V2_ANALYZE: &str = "/api/v2/analyze";
pub const BARS: &str = "/api/bars";
pub const LIVE: &str = "/api/live";
pub const JOURNAL: &str = "/api/journal";
pub const HINT: &str = "/api/hint";
pub const CONTEXTUAL_PREFIX: &str = "/api/contextual";
pub const KITE_LOGIN_URL: &str = "/kite/login_url";
