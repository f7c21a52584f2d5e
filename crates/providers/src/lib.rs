//! HTTP clients for the external AI providers.
//!
//! [`chat`] talks to an OpenAI-compatible chat-completion endpoint with
//! streamed delivery; [`image`] talks to the image-generation endpoint used
//! for virtual try-on. Both expose a trait so the relays can be driven by
//! fakes in tests.

pub mod chat;
pub mod image;

/// Read an optional setting, treating blank values as unset.
pub(crate) fn env_setting(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
