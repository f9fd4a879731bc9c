//! # Content Intelligence
//!
//! Summaries and study questions for lesson content. The remote generative
//! client is tried first; the deterministic heuristics in [`heuristics`] serve
//! the request whenever the remote path is unconfigured, slow, failing, or
//! returns something unusable.

pub mod client;
pub mod gemini;
pub mod heuristics;
pub mod prompts;
pub mod service;

pub use client::{GenerativeClient, Respondable};
pub use gemini::GeminiClient;
pub use heuristics::{local_questions_fallback, local_summary_fallback, GENERIC_QUESTION};
pub use service::ContentIntelligence;
