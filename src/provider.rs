//! 翻译提供商接口与腾讯云实现
//!
//! 所有提供商收敛为一个能力接口：`translate(文本, 语言) -> 译文或分类错误`。
//! 当前唯一的激活实现是腾讯云机器翻译（TMT），通过配置注入。
//! 提供商层只负责一次签名调用和错误分类，不做重试，也不做缓存。

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{constants, Credential};
use crate::error::{TranslationError, TranslationResult};
use crate::lang::TargetLang;
use crate::signer::RequestSigner;

// 实现 Provider 时需要同一版本的宏
pub use async_trait::async_trait;

/// 请求体的 Content-Type；注意不能含空格，否则参与签名的头部对不上
const CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// 翻译提供商能力接口
///
/// 实现必须把失败映射到 `TranslationError` 的分类，调用方据此决定
/// 日志级别和是否缓存，绝不依赖具体提供商的错误码。
#[async_trait]
pub trait Provider: Send + Sync {
    /// 翻译一段不超过提供商单次上限的文本
    async fn translate(&self, text: &str, lang: TargetLang) -> TranslationResult<String>;
}

/// 文本翻译请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TextTranslateRequest<'a> {
    source_text: &'a str,
    source: &'a str,
    target: &'a str,
    project_id: i64,
}

/// 提供商响应外层
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(rename = "Response")]
    response: ApiResponse,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "TargetText")]
    target_text: Option<String>,
    #[serde(rename = "Error")]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
}

/// 腾讯云机器翻译提供商
pub struct TencentProvider {
    client: reqwest::Client,
    signer: RequestSigner,
    region: String,
    host: String,
}

impl TencentProvider {
    /// 创建提供商实例；超时固定在 HTTP 客户端上，单次调用超时即失败
    pub fn new(credential: Credential, region: &str, timeout: Duration) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::Config(format!("构建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            signer: RequestSigner::new(credential, constants::TMT_SERVICE),
            region: region.to_string(),
            host: constants::TMT_HOST.to_string(),
        })
    }

    fn parse_envelope(&self, envelope: ApiEnvelope) -> TranslationResult<String> {
        if let Some(error) = envelope.response.error {
            return Err(TranslationError::from_provider_code(
                &error.code,
                &error.message,
            ));
        }
        match envelope.response.target_text {
            Some(target) => Ok(target),
            None => Err(TranslationError::Transient(
                "响应中既无译文也无错误信息".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Provider for TencentProvider {
    async fn translate(&self, text: &str, lang: TargetLang) -> TranslationResult<String> {
        let request = TextTranslateRequest {
            source_text: text,
            source: lang.source_code(),
            target: lang.target_code(),
            project_id: 0,
        };
        // 签名覆盖的是实际发送的字节，序列化一次后不再改动
        let payload = serde_json::to_vec(&request)
            .map_err(|e| TranslationError::Transient(format!("序列化请求失败: {e}")))?;

        let ctx = self
            .signer
            .sign("POST", "/", "", CONTENT_TYPE, &self.host, &payload, Utc::now());

        let response = self
            .client
            .post(format!("https://{}/", self.host))
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", constants::TMT_ACTION)
            .header("X-TC-Version", constants::TMT_VERSION)
            .header("X-TC-Timestamp", ctx.timestamp.to_string())
            .header("X-TC-Region", &self.region)
            .header("Authorization", &ctx.authorization)
            .body(payload)
            .send()
            .await?;

        let envelope: ApiEnvelope = response.json().await?;
        self.parse_envelope(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = TextTranslateRequest {
            source_text: "Hello",
            source: "en",
            target: "zh",
            project_id: 0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["SourceText"], "Hello");
        assert_eq!(value["Source"], "en");
        assert_eq!(value["Target"], "zh");
        assert_eq!(value["ProjectId"], 0);
    }

    #[test]
    fn test_parse_success_response() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"Response":{"TargetText":"你好","RequestId":"x"}}"#).unwrap();
        assert_eq!(envelope.response.target_text.as_deref(), Some("你好"));
        assert!(envelope.response.error.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"Response":{"Error":{"Code":"AuthFailure.SignatureFailure","Message":"sig"}}}"#,
        )
        .unwrap();
        let error = envelope.response.error.unwrap();
        assert_eq!(error.code, "AuthFailure.SignatureFailure");
    }

    #[test]
    fn test_envelope_without_text_or_error_is_transient() {
        let provider = TencentProvider::new(
            Credential {
                secret_id: "id".into(),
                secret_key: "key".into(),
            },
            constants::DEFAULT_REGION,
            Duration::from_secs(10),
        )
        .unwrap();

        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"Response":{"RequestId":"x"}}"#).unwrap();
        assert!(matches!(
            provider.parse_envelope(envelope),
            Err(TranslationError::Transient(_))
        ));
    }

    #[test]
    fn test_error_envelope_classification_flows_through() {
        let provider = TencentProvider::new(
            Credential {
                secret_id: "id".into(),
                secret_key: "key".into(),
            },
            constants::DEFAULT_REGION,
            Duration::from_secs(10),
        )
        .unwrap();

        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"Response":{"Error":{"Code":"FailedOperation.UserNotRegistered","Message":"未开通"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            provider.parse_envelope(envelope),
            Err(TranslationError::ServiceUnavailable(_))
        ));
    }
}
