//! Domain logic for the wardrobe assistant relays.
//!
//! Everything in this crate is pure: request validation, prompt
//! composition, parsing of the image provider's embedded event stream,
//! result-locator extraction and the upstream status table. The HTTP
//! transport lives in `wardrobe-providers` and `wardrobe-api`.

pub mod advice;
pub mod error;
pub mod frames;
pub mod locator;
pub mod prompt;
pub mod tryon;
pub mod upstream;
