//! Human-readable explanations for upstream provider failures.

/// Explain an upstream HTTP status.
///
/// | Status | Meaning                                 |
/// |--------|-----------------------------------------|
/// | 400    | malformed request                       |
/// | 401    | invalid or expired credential           |
/// | 403    | forbidden / quota                       |
/// | 404    | wrong endpoint                          |
/// | 429    | rate limited                            |
/// | 500    | provider internal error                 |
/// | other  | `HTTP {status}: {status_text}`          |
pub fn describe_status(status: u16, status_text: &str) -> String {
    match status {
        400 => "API 请求格式错误，请检查参数".into(),
        401 => "未授权：API Key 可能无效或已过期".into(),
        403 => "禁止访问：API Key 可能没有权限或已被限制".into(),
        404 => "API 端点不存在，请检查 URL 配置".into(),
        429 => "请求过于频繁，请稍后重试".into(),
        500 => "API 服务器内部错误，请稍后重试".into(),
        _ => format!("HTTP {status}: {status_text}"),
    }
}

/// Explain a transport failure that produced no HTTP status.
pub fn describe_network_failure(cause: &str) -> String {
    format!("网络错误：{cause}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_have_fixed_text() {
        assert_eq!(describe_status(401, "Unauthorized"), "未授权：API Key 可能无效或已过期");
        assert_eq!(describe_status(429, "Too Many Requests"), "请求过于频繁，请稍后重试");
        assert_eq!(describe_status(500, "whatever"), "API 服务器内部错误，请稍后重试");
    }

    #[test]
    fn unknown_status_falls_back_to_generic_text() {
        assert_eq!(describe_status(502, "Bad Gateway"), "HTTP 502: Bad Gateway");
        assert_eq!(describe_status(418, ""), "HTTP 418: ");
    }

    #[test]
    fn network_failure_carries_cause() {
        assert!(describe_network_failure("connection reset").ends_with("connection reset"));
    }
}
