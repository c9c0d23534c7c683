//! 提供商请求签名（TC3-HMAC-SHA256）
//!
//! 签名算法必须与提供商逐位一致，否则请求会被拒绝。整个过程是纯函数：
//! 相同的输入永远产生相同的签名，没有随机数，时间由调用方显式传入。
//!
//! 日期必须取 UTC 日历日。用本地时间在临近 UTC 午夜时会算出另一天，
//! 产生一个"看起来合法但被拒绝"且难以复现的签名错误。

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::Credential;

type HmacSha256 = Hmac<Sha256>;

/// 签名算法标识
pub const ALGORITHM: &str = "TC3-HMAC-SHA256";

/// 凭证范围的请求类型后缀
const SCOPE_SUFFIX: &str = "tc3_request";

/// 派生签名密钥时密钥前缀
const SECRET_PREFIX: &str = "TC3";

/// 参与签名的头部名称（小写、分号连接、按字典序）
const SIGNED_HEADERS: &str = "content-type;host";

/// 一次调用派生出的完整签名上下文
///
/// 全部字段由出站载荷推导，随调用结束丢弃，绝不持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestContext {
    /// Unix 秒级时间戳，同时作为 X-TC-Timestamp 头的值
    pub timestamp: i64,
    /// UTC 日历日，格式 YYYY-MM-DD
    pub date: String,
    /// `日期/服务/tc3_request`
    pub credential_scope: String,
    /// 规范请求串的 SHA-256 十六进制摘要
    pub canonical_request_hash: String,
    /// 最终签名（十六进制）
    pub signature: String,
    /// 完整的 Authorization 头
    pub authorization: String,
}

/// 请求签名器
///
/// 持有凭证与服务标识；`sign` 本身无副作用，可并发调用。
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credential: Credential,
    service: String,
}

impl RequestSigner {
    pub fn new(credential: Credential, service: &str) -> Self {
        Self {
            credential,
            service: service.to_string(),
        }
    }

    /// 为一次出站请求生成签名上下文
    ///
    /// `payload` 必须是实际发送的字节，签名后载荷不能再有任何改动。
    #[allow(clippy::too_many_arguments)]
    pub fn sign(
        &self,
        method: &str,
        uri_path: &str,
        query_string: &str,
        content_type: &str,
        host: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> SignedRequestContext {
        let timestamp = now.timestamp();
        let date = now.format("%Y-%m-%d").to_string();

        // 1. 规范请求串
        let canonical_headers = format!("content-type:{content_type}\nhost:{host}\n");
        let hashed_payload = sha256_hex(payload);
        let canonical_request = format!(
            "{method}\n{uri_path}\n{query_string}\n{canonical_headers}\n{SIGNED_HEADERS}\n{hashed_payload}"
        );
        let canonical_request_hash = sha256_hex(canonical_request.as_bytes());

        // 2. 待签名字符串
        let credential_scope = format!("{}/{}/{}", date, self.service, SCOPE_SUFFIX);
        let string_to_sign =
            format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}");

        // 3. HMAC 派生链：TC3+SecretKey → 日期 → 服务 → 请求类型
        let k_date = hmac_sha256(
            format!("{SECRET_PREFIX}{}", self.credential.secret_key).as_bytes(),
            date.as_bytes(),
        );
        let k_service = hmac_sha256(&k_date, self.service.as_bytes());
        let k_signing = hmac_sha256(&k_service, SCOPE_SUFFIX.as_bytes());
        let signature = hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        // 4. Authorization 头；credential_scope 必须与计算签名时完全一致
        let authorization = format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.credential.secret_id
        );

        SignedRequestContext {
            timestamp,
            date,
            credential_scope,
            canonical_request_hash,
            signature,
            authorization,
        }
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC 密钥长度不受限制");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
