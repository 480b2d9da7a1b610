//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers and operator tokens so they are discoverable.

/// Environment variable holding the model API key (required).
pub const ENV_MODEL_API_KEY: &str = "MODEL_API_KEY";

/// Environment variable holding the sender address for dispatch.
pub const ENV_SENDER_EMAIL: &str = "SENDER_EMAIL";

/// Environment variable holding the sender's SMTP app credential.
pub const ENV_SENDER_APP_CREDENTIAL: &str = "SENDER_APP_CREDENTIAL";

/// Environment variable overriding the triage model name.
pub const ENV_MODEL: &str = "MAILTRIAGE_MODEL";

/// Default per-request timeout for model calls in seconds.
/// Expiry surfaces as a gateway error, never a hang.
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 60;

/// Maximum characters of page text handed to the website analyzer.
pub const DEFAULT_SITE_CONTENT_LIMIT: usize = 15_000;

/// Column width used when rendering fetched HTML as plain text.
pub const HTML_RENDER_WIDTH: usize = 120;

/// Maximum characters of raw model output echoed into logs on parse failure.
pub const LOG_SNIPPET_CHARS: usize = 400;

// === Operator tokens ===

/// Approves the current draft (case-insensitive).
pub const APPROVE_TOKEN: &str = "approve";

/// Leaves the current item without approving it.
pub const BACK_TOKENS: &[&str] = &["back", "cancel"];

/// Ends the session from any prompt.
pub const EXIT_TOKENS: &[&str] = &["exit", "quit"];

/// Sends an approved reply.
pub const SEND_TOKEN: &str = "send";
