//! # Lifecycle phases driven by the controller.
//!
//! ```text
//! Initialize ─► Install ─► PreStart ─► Start ─► PostStart ─► (wait) ─► Stop
//!   (abort)      └──────────── failure ─────────────┘                 ▲
//!                                  └──────────── shutdown ────────────┘
//! ```
//!
//! Startup phases visit modules in ascending registration order, `Stop` in descending order.

use std::fmt;

/// One step of the module lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Optional; may replace the execution context. Failure aborts before anything starts.
    Initialize,
    /// Optional one-time provisioning.
    Install,
    /// Optional; runs after every `Initialize`/`Install`, before any `Start`.
    PreStart,
    /// Mandatory.
    Start,
    /// Optional; runs only when every `Start` succeeded.
    PostStart,
    /// Mandatory; only for modules whose `Start` succeeded.
    Stop,
}

impl Phase {
    /// Verb used in error messages (`failed to <verb> module ...`).
    pub fn verb(&self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Install => "install",
            Phase::PreStart => "prestart",
            Phase::Start => "start",
            Phase::PostStart => "poststart",
            Phase::Stop => "stop",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
