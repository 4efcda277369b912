//! 第三方翻译服务客户端
//!
//! 单个分块一次 GET 请求：`{base}/api/v1/{source}/{target}/{text}`。
//! 服务是尽力而为的，没有可用性保证，所以每个请求带固定超时，
//! 失败由上层的分块流水线统一降级处理。

use crate::config::Config;
use crate::error::{AppError, AppResult, TranslateError};
use futures::future::BoxFuture;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// 单分块翻译能力
///
/// 翻译流水线只依赖这一个能力，测试时可以用桩实现替换。
pub trait ChunkTranslator: Send + Sync {
    /// 翻译一个不超过长度上限的文本分块
    fn translate_chunk<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, AppResult<String>>;
}

/// 翻译服务响应体
#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translation: String,
}

/// 翻译服务客户端
#[derive(Clone)]
pub struct TranslateClient {
    http: reqwest::Client,
    base_url: String,
}

impl TranslateClient {
    /// 创建新的翻译客户端（每个请求带固定超时）
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_timeout(&config.translate_base_url, config.translate_timeout())
    }

    /// 使用自定义超时创建
    pub fn with_timeout(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Other(format!("构建翻译客户端失败: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 构建翻译请求地址（文本作为路径段，由 Url 负责转义）
    fn build_url(&self, text: &str, source: &str, target: &str) -> AppResult<Url> {
        let invalid = || {
            AppError::Translate(TranslateError::InvalidEndpoint {
                base_url: self.base_url.clone(),
            })
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .extend(["api", "v1", source, target, text]);
        Ok(url)
    }
}

impl ChunkTranslator for TranslateClient {
    fn translate_chunk<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(async move {
            let url = self.build_url(text, source, target)?;
            debug!("翻译分块: {} → {}, {} 字符", source, target, text.chars().count());

            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| AppError::translate_chunk_failed(target, e))?;

            if !response.status().is_success() {
                return Err(AppError::Translate(TranslateError::EmptyTranslation {
                    target_lang: target.to_string(),
                }));
            }

            let body: TranslationResponse = response
                .json()
                .await
                .map_err(|e| AppError::translate_chunk_failed(target, e))?;

            if body.translation.trim().is_empty() {
                return Err(AppError::Translate(TranslateError::EmptyTranslation {
                    target_lang: target.to_string(),
                }));
            }

            Ok(body.translation)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_escapes_text() {
        let client =
            TranslateClient::with_timeout("https://lingva.ml", Duration::from_secs(8)).unwrap();
        let url = client
            .build_url("hello world, 你好?", "en", "hi")
            .unwrap();
        let s = url.to_string();
        assert!(s.starts_with("https://lingva.ml/api/v1/en/hi/"));
        // 空格与问号不能原样出现在路径段里
        assert!(!s.contains(' '));
        assert!(!s.ends_with('?'));
    }

    #[test]
    fn test_build_url_invalid_base() {
        let client = TranslateClient::with_timeout("not a url", Duration::from_secs(1)).unwrap();
        assert!(client.build_url("text", "en", "es").is_err());
    }
}
