//! 目标语言定义
//!
//! 站点只有两个语言环境：中文（`zh-CN`）和英文（`en`）。
//! 翻译方向由目标语言唯一确定：目标为中文时源语言是英文，反之亦然。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TranslationError;

/// 翻译目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLang {
    /// 简体中文（站点语言标签 `zh-CN`）
    #[serde(rename = "zh-CN")]
    ZhCn,
    /// 英文（站点语言标签 `en`）
    #[serde(rename = "en")]
    En,
}

impl TargetLang {
    /// 站点使用的语言标签，也是缓存键的语言后缀
    pub fn tag(&self) -> &'static str {
        match self {
            TargetLang::ZhCn => "zh-CN",
            TargetLang::En => "en",
        }
    }

    /// 提供商接口的源语言代码（腾讯云：zh-中文, en-英文）
    pub fn source_code(&self) -> &'static str {
        match self {
            TargetLang::ZhCn => "en",
            TargetLang::En => "zh",
        }
    }

    /// 提供商接口的目标语言代码
    pub fn target_code(&self) -> &'static str {
        match self {
            TargetLang::ZhCn => "zh",
            TargetLang::En => "en",
        }
    }
}

impl fmt::Display for TargetLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TargetLang {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh-CN" | "zh" | "zh-cn" => Ok(TargetLang::ZhCn),
            "en" | "en-US" => Ok(TargetLang::En),
            other => Err(TranslationError::Config(format!(
                "不支持的目标语言: {other}"
            ))),
        }
    }
}
