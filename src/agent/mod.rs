//! LLM modules for narrative synthesis.
//!
//! This module provides the language-model seam and the synthesizer that
//! turns aggregated findings into report prose.

pub mod client;
pub mod synthesizer;

pub use client::{ChatClient, ChatConfig, LanguageModel};
pub use synthesizer::{NarrativeSynthesizer, SYSTEM_PROMPT};
