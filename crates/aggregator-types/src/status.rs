//! Failure payload carried inside watch `ERROR` frames.

use serde::{Deserialize, Serialize};

/// Structured API status object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Always `Status`.
    pub kind: String,
    /// Always `v1`.
    pub api_version: String,
    /// `Success` or `Failure`.
    pub status: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Machine readable reason, e.g. `InternalError`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// HTTP status code the failure corresponds to.
    #[serde(default)]
    pub code: u16,
}

impl Status {
    /// Builds a failure status with a reason derived from `code`.
    #[must_use]
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: "Status".to_owned(),
            api_version: "v1".to_owned(),
            status: "Failure".to_owned(),
            message: message.into(),
            reason: reason_for(code).to_owned(),
            code,
        }
    }

    /// Overrides the reason string.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

fn reason_for(code: u16) -> &'static str {
    match code {
        400 => "BadRequest",
        404 => "NotFound",
        405 => "MethodNotAllowed",
        410 => "Expired",
        500 => "InternalError",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(500, "InternalError")]
    #[case(410, "Expired")]
    #[case(418, "")]
    fn failure_derives_reason(#[case] code: u16, #[case] reason: &str) {
        let status = Status::failure(code, "boom");
        assert_eq!(status.reason, reason);
        assert_eq!(status.status, "Failure");
    }

    #[test]
    fn serializes_with_api_fields() {
        let value = serde_json::to_value(Status::failure(500, "boom")).expect("serialize");
        assert_eq!(value["kind"], "Status");
        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["code"], 500);
        assert_eq!(value["message"], "boom");
    }
}
