//! Backend connectivity probe for the AIRA recruiting console
//!
//! Checks the REST endpoints the console relies on and reports every step
//! as a transient toast through [`aira_notify::NotificationQueue`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod check;
pub mod client;
pub mod error;
pub mod render;

// Re-export commonly used types
pub use check::{ConnectivityCheck, ProbeReport, Step, StepOutcome};
pub use client::{
    ApiClient, CallList, CandidateList, CandidateStats, LoginResponse, Profile, UserSummary,
};
pub use error::{ProbeError, Result};
pub use render::{Renderer, ToastStyle, render_frame, render_toast, spawn_renderer, wait_until_empty};
