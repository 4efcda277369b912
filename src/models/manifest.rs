//! 语料清单加载
//!
//! 支持从 TOML 清单文件批量加载待摄取的 URL 列表和 PDF 路径，
//! 免去在会话中逐条输入。

use crate::error::{AppError, AppResult, FileError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 语料清单
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusManifest {
    /// 待摄取的 URL 列表
    #[serde(default)]
    pub urls: Vec<String>,
    /// 待上传的 PDF 文件路径
    #[serde(default)]
    pub pdfs: Vec<PathBuf>,
}

impl CorpusManifest {
    /// 从 TOML 文件加载清单
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::File(FileError::NotFound {
                path: path.display().to_string(),
            }));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        let mut manifest: CorpusManifest = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        // 丢弃空白条目
        manifest.urls.retain(|u| !u.trim().is_empty());

        info!(
            "✓ 已加载语料清单: {} 个 URL, {} 个 PDF",
            manifest.urls.len(),
            manifest.pdfs.len()
        );

        Ok(manifest)
    }

    /// 清单是否为空
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.pdfs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_manifest() {
        let dir = std::env::temp_dir().join("vectramind_manifest_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corpus.toml");
        std::fs::write(
            &path,
            r#"
urls = ["https://example.com/a", "  ", "https://example.com/b"]
pdfs = ["docs/report.pdf"]
"#,
        )
        .unwrap();

        let manifest = CorpusManifest::load(&path).await.unwrap();
        assert_eq!(manifest.urls.len(), 2);
        assert_eq!(manifest.pdfs.len(), 1);
        assert!(!manifest.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = CorpusManifest::load("/nonexistent/corpus.toml").await;
        assert!(result.is_err());
    }
}
