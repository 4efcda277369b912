//! QA 后端 API 客户端
//!
//! 封装所有与 QA 后端相关的调用逻辑：FAISS 初始化、任务状态查询、
//! 提问、PDF 上传与 PDF 提问（后两者需要 Bearer 令牌）。

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError};
use crate::models::{
    extract_conflict_task_id, AskPdfOutcome, AskPdfResponse, AskRequest, AskResponse, ErrorDetail,
    InitializeRequest, TaskCreated, TaskStatusResponse,
};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use std::path::Path;
use tracing::{debug, warn};

/// QA 后端能力
///
/// 流程层只依赖这三个能力，客户端的具体实现可以被替换。
pub trait QaBackend: Send + Sync {
    /// 向 URL 语料库提问
    fn ask<'a>(&'a self, question: &'a str) -> BoxFuture<'a, AppResult<String>>;

    /// 向 PDF 语料库提问（可能返回 409 冲突）
    fn ask_pdf<'a>(&'a self, question: &'a str) -> BoxFuture<'a, AppResult<AskPdfOutcome>>;

    /// 查询任务状态，返回原始状态字符串
    fn task_status<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, AppResult<String>>;
}

/// QA 后端客户端
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl BackendClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            token: config.backend_token.clone(),
        }
    }

    /// 拼接完整端点地址
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 获取 Bearer 令牌，缺失时直接报认证错误（不发请求）
    fn bearer_token(&self) -> AppResult<&str> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config(ConfigError::MissingToken));
        }
        Ok(&self.token)
    }

    /// 提交 URL 列表，启动 FAISS 索引构建
    ///
    /// # 参数
    /// - `urls`: 待摄取的 URL 列表
    ///
    /// # 返回
    /// 返回后端签发的任务ID
    pub async fn initialize_faiss(&self, urls: &[String]) -> AppResult<String> {
        let endpoint = self.endpoint("initialize_faiss");
        debug!("提交 FAISS 初始化: {} 个 URL", urls.len());

        let response = self
            .http
            .post(&endpoint)
            .json(&InitializeRequest {
                urls: urls.to_vec(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::bad_response(&endpoint, response).await);
        }

        let created: TaskCreated = response.json().await?;
        debug!("FAISS 初始化任务已创建: {}", created.task_id);
        Ok(created.task_id)
    }

    /// 查询任务状态
    ///
    /// # 返回
    /// 返回后端原始状态字符串（由调用方解析为 `TaskStatus`）
    pub async fn task_status(&self, task_id: &str) -> AppResult<String> {
        let endpoint = self.endpoint(&format!("task_status/{}", task_id));

        let response = self.http.get(&endpoint).send().await?;
        if !response.status().is_success() {
            return Err(Self::bad_response(&endpoint, response).await);
        }

        let status: TaskStatusResponse = response.json().await?;
        Ok(status.status)
    }

    /// 向 URL 语料库提问
    pub async fn ask(&self, question: &str) -> AppResult<String> {
        let endpoint = self.endpoint("ask");
        debug!("提交问题到 /ask");

        let response = self
            .http
            .post(&endpoint)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::bad_response(&endpoint, response).await);
        }

        let answer: AskResponse = response.json().await?;
        if answer.answer.trim().is_empty() {
            return Err(AppError::Api(ApiError::EmptyResponse { endpoint }));
        }
        Ok(answer.answer)
    }

    /// 上传 PDF 文件集（multipart，需要 Bearer 令牌）
    ///
    /// # 参数
    /// - `paths`: 本地 PDF 文件路径
    ///
    /// # 返回
    /// 返回后端签发的任务ID
    pub async fn upload_pdfs(&self, paths: &[impl AsRef<Path>]) -> AppResult<String> {
        let token = self.bearer_token()?.to_string();
        let endpoint = self.endpoint("upload_pdfs/");

        let mut form = reqwest::multipart::Form::new();
        for path in paths {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string());
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str("application/pdf")
                .map_err(|e| AppError::api_request_failed(endpoint.clone(), e))?;
            form = form.part("files", part);
        }

        debug!("上传 {} 个 PDF 文件", paths.len());

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::bad_response(&endpoint, response).await);
        }

        let created: TaskCreated = response.json().await?;
        debug!("PDF 处理任务已创建: {}", created.task_id);
        Ok(created.task_id)
    }

    /// 向 PDF 语料库提问（需要 Bearer 令牌）
    ///
    /// 语料库尚未就绪时后端返回 HTTP 409，此时从冲突详情中提取任务ID
    /// 并返回 `AskPdfOutcome::NotReady`，由流程层决定如何恢复。
    pub async fn ask_pdf(&self, question: &str) -> AppResult<AskPdfOutcome> {
        let token = self.bearer_token()?.to_string();
        let endpoint = self.endpoint("ask_pdf");
        debug!("提交问题到 /ask_pdf");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            let detail: ErrorDetail = response.json().await.unwrap_or(ErrorDetail { detail: None });
            let task_id = detail.detail.as_ref().and_then(extract_conflict_task_id);
            if task_id.is_none() {
                warn!("409 冲突响应中未找到任务ID: {}", detail.detail_text());
            }
            return Ok(AskPdfOutcome::NotReady { task_id });
        }

        if !response.status().is_success() {
            return Err(Self::bad_response(&endpoint, response).await);
        }

        let answer: AskPdfResponse = response.json().await?;
        Ok(AskPdfOutcome::Answered {
            answer: answer.answer,
            sources: answer.sources,
        })
    }

    /// 把非 2xx 响应转换为错误（尽量保留后端的错误详情）
    async fn bad_response(endpoint: &str, response: reqwest::Response) -> AppError {
        let status = response.status().as_u16();
        let detail = match response.json::<ErrorDetail>().await {
            Ok(d) => Some(d.detail_text()),
            Err(_) => None,
        };
        AppError::api_bad_response(endpoint, Some(status), detail)
    }
}

impl QaBackend for BackendClient {
    fn ask<'a>(&'a self, question: &'a str) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(self.ask(question))
    }

    fn ask_pdf<'a>(&'a self, question: &'a str) -> BoxFuture<'a, AppResult<AskPdfOutcome>> {
        Box::pin(self.ask_pdf(question))
    }

    fn task_status<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(self.task_status(task_id))
    }
}
