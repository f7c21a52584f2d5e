//! Handler for the virtual try-on relay.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use wardrobe_core::tryon::{interpret_response, tryon_prompt, TryOnResult, DEFAULT_IMAGE_MIME};
use wardrobe_providers::image::{encode_data_url, DrawRequest};

use crate::error::{AppError, AppResult, MISSING_TRYON_PARAMS};
use crate::state::AppState;

/// An uploaded image with the MIME type used for its data URL.
struct UploadedImage {
    bytes: Vec<u8>,
    mime: String,
}

/// POST /virtual-tryon
///
/// Multipart form with `image` (binary) and `outfit` (text). Sends the image
/// to the provider and returns the generated image URL with the progress
/// reported along the way.
pub async fn virtual_try_on(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<TryOnResult>> {
    let Ok(mut multipart) = multipart else {
        return Err(AppError::BadRequest(MISSING_TRYON_PARAMS.into()));
    };

    let mut image: Option<UploadedImage> = None;
    let mut outfit: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let mime = field
                    .content_type()
                    .filter(|ct| ct.starts_with("image/"))
                    .unwrap_or(DEFAULT_IMAGE_MIME)
                    .to_string();
                let bytes = field.bytes().await?.to_vec();
                image = Some(UploadedImage { bytes, mime });
            }
            "outfit" => {
                outfit = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let image = image.filter(|img| !img.bytes.is_empty());
    let outfit = outfit.filter(|o| !o.trim().is_empty());
    let (Some(image), Some(outfit)) = (image, outfit) else {
        return Err(AppError::BadRequest(MISSING_TRYON_PARAMS.into()));
    };

    state.image.ensure_configured()?;

    tracing::info!(
        image_kb = image.bytes.len() / 1024,
        mime = %image.mime,
        outfit_chars = outfit.chars().count(),
        "Relaying try-on request",
    );

    let body = state
        .image
        .draw(DrawRequest {
            prompt: tryon_prompt(&outfit),
            urls: vec![encode_data_url(&image.mime, &image.bytes)],
        })
        .await?;

    let interpretation = interpret_response(&body);
    for line in &interpretation.skipped {
        tracing::warn!(
            line = line.line_number,
            payload = %line.payload,
            reason = %line.reason,
            "Skipping unparseable frame",
        );
    }

    match interpretation.result {
        Ok(result) => {
            tracing::info!(
                rule = interpretation.matched_rule.unwrap_or_default(),
                progress_updates = result.progress_updates.len(),
                "Try-on image located",
            );
            Ok(Json(result))
        }
        Err(err) => {
            tracing::error!(error = %err, response = ?err, "Try-on response could not be used");
            Err(err.into())
        }
    }
}
