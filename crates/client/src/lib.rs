//! Consumer side of the wardrobe assistant API.
//!
//! [`AssistantClient`] calls the relays, [`IncrementalDecoder`] turns a
//! chunked advice body into text without splitting characters, and
//! [`wardrobe`] builds the free-text wardrobe descriptions the advice
//! endpoints expect.

pub mod client;
pub mod decoder;
pub mod wardrobe;

pub use client::{AssistantClient, ClientError, TryOnFailure, TryOnFailureKind};
pub use decoder::IncrementalDecoder;
