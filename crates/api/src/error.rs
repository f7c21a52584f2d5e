use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use wardrobe_core::advice::AdviceKind;
use wardrobe_core::error::CoreError;
use wardrobe_core::locator::{alternative_formats, primary_format};
use wardrobe_core::tryon::TryOnError;
use wardrobe_core::upstream::{describe_network_failure, describe_status};
use wardrobe_providers::chat::{ChatApiError, API_KEY_VAR as CHAT_API_KEY_VAR};
use wardrobe_providers::image::{ImageApiError, API_KEY_VAR as IMAGE_API_KEY_VAR};

/// Body text when the try-on form lacks `image` or `outfit`.
pub const MISSING_TRYON_PARAMS: &str = "缺少必要参数";

const IMAGE_NOT_CONFIGURED: &str = "未配置 Nano Banana API";
const IMAGE_CALL_FAILED: &str = "调用 Nano Banana API 失败";
const UNPARSEABLE_RESPONSE: &str = "无法解析 API 响应";
const NO_IMAGE_URL: &str = "API 响应中未找到图像 URL";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the provider errors of each
/// relay. Implements [`IntoResponse`] to produce the JSON error bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `wardrobe_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The advice relay could not start streaming.
    #[error("{} advice failed: {source}", .kind.as_str())]
    Advice {
        kind: AdviceKind,
        source: ChatApiError,
    },

    /// The image provider call failed or was not attempted.
    #[error(transparent)]
    Image(#[from] ImageApiError),

    /// The image provider answered but no result could be extracted.
    #[error(transparent)]
    TryOn(#[from] TryOnError),

    /// The multipart body could not be read.
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            // --- CoreError variants ---
            AppError::Core(CoreError::Validation(msg)) => {
                coded(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
            }

            // --- Relay errors ---
            AppError::Advice { kind, source } => {
                tracing::error!(kind = kind.as_str(), error = %source, "Advice relay failed");
                let message = kind.failure_message().to_string();
                match source {
                    ChatApiError::MissingApiKey => {
                        let (status, mut body) =
                            coded(StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR", message);
                        body["details"] = json!(setting_hint(CHAT_API_KEY_VAR));
                        (status, body)
                    }
                    _ => coded(StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", message),
                }
            }
            AppError::Image(err) => image_error_body(err),
            AppError::TryOn(err) => tryon_error_body(err),

            // --- HTTP-specific errors ---
            AppError::Multipart(err) => coded(err.status(), "BAD_REQUEST", err.body_text()),
            AppError::BadRequest(msg) => coded(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Where to set a missing credential.
fn setting_hint(var: &str) -> String {
    format!("请在 .env 文件中设置 {var}")
}

fn coded(status: StatusCode, code: &'static str, message: String) -> (StatusCode, Value) {
    (status, json!({ "error": message, "code": code }))
}

/// Map an image provider failure to its status and body.
///
/// - Missing credential: 400 naming the setting.
/// - Upstream HTTP error: the upstream status, with an explanation.
/// - Transport failure or timeout: 500 with the cause.
fn image_error_body(err: ImageApiError) -> (StatusCode, Value) {
    match err {
        ImageApiError::MissingApiKey => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": IMAGE_NOT_CONFIGURED,
                "code": "CONFIGURATION_ERROR",
                "details": setting_hint(IMAGE_API_KEY_VAR),
            }),
        ),
        ImageApiError::ApiError {
            status,
            status_text,
            body,
        } => {
            tracing::error!(status, %status_text, details = %body, "Image provider returned an error");
            let mirrored = StatusCode::from_u16(status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                mirrored,
                json!({
                    "error": IMAGE_CALL_FAILED,
                    "message": describe_status(status, &status_text),
                    "details": {
                        "status": status,
                        "statusText": status_text,
                        "data": body,
                    },
                }),
            )
        }
        ImageApiError::Request(err) => {
            let cause = error_chain(&err);
            tracing::error!(error = %cause, timeout = err.is_timeout(), "Image provider unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": IMAGE_CALL_FAILED,
                    "message": describe_network_failure(&cause),
                    "details": cause,
                }),
            )
        }
    }
}

fn tryon_error_body(err: TryOnError) -> (StatusCode, Value) {
    let suggestion = err.suggestion();
    let body = match err {
        TryOnError::UnparseableResponse { raw } => json!({
            "error": UNPARSEABLE_RESPONSE,
            "rawResponse": raw,
        }),
        TryOnError::NoImageUrl {
            final_result,
            extracted,
            content_violation,
        } => {
            let mut body = json!({
                "error": NO_IMAGE_URL,
                "receivedData": final_result,
                "supportedFormats": {
                    "primary": primary_format(),
                    "alternatives": alternative_formats(),
                },
            });
            if let Some(extracted) = extracted {
                body["extractedUrl"] = extracted;
            }
            if content_violation {
                body["possibleContentViolation"] = json!(true);
                body["suggestion"] = json!(suggestion);
            }
            body
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, body)
}

/// Render an error and its sources as one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
