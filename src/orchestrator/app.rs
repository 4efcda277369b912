//! 应用编排 - 编排层
//!
//! 页面控制器的终端化身：持有两条摄取流（URL / PDF）的全部
//! 组件局部状态，把交互命令接到流程层，并消费轮询事件。
//! 每次新提交会丢弃上一个任务；组件销毁时轮询器随之中止。

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::clients::BackendClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::language::{self, SUPPORTED_LANGUAGES};
use crate::models::CorpusManifest;
use crate::services::{
    Concern, LogSynthesizer, Notifier, PollEvent, PollUpdate, SpeechRecognizer, SpeechService,
    SpeechSynthesizer, TaskPoller, TranslationService, UnsupportedRecognizer,
};
use crate::utils::logging::truncate_text;
use crate::workflow::{AskCtx, AskFlow, AskOutcome, CorpusKind};

/// 应用主结构
pub struct App {
    config: Config,
    backend: BackendClient,
    flow: AskFlow<BackendClient>,
    translation: Arc<TranslationService>,
    speech: SpeechService,
    notifier: Notifier,
    synthesizer: Box<dyn SpeechSynthesizer>,
    recognizer: Box<dyn SpeechRecognizer>,
    url_poller: TaskPoller,
    pdf_poller: TaskPoller,
    events_tx: UnboundedSender<PollEvent>,
    events_rx: Option<UnboundedReceiver<PollEvent>>,

    // ---- 组件局部状态 ----
    corpus: CorpusKind,
    language: String,
    urls: Vec<String>,
    pdfs: Vec<PathBuf>,
    url_status: String,
    url_busy: bool,
    pdf_status: String,
    pdf_processing: bool,
    question: String,
    answer: Option<String>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        crate::utils::logging::init_log_file(&config.output_log_file)?;
        crate::utils::logging::log_startup(&config);

        let notifier = Notifier::new();
        let backend = BackendClient::new(&config);
        let translation = Arc::new(TranslationService::new(&config, notifier.clone())?);
        let flow = AskFlow::new(
            backend.clone(),
            translation.clone(),
            notifier.clone(),
            &config,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let language = config.default_language.clone();
        Ok(Self {
            config,
            backend,
            flow,
            translation,
            speech: SpeechService::new(),
            notifier,
            synthesizer: Box::new(LogSynthesizer),
            recognizer: Box::new(UnsupportedRecognizer),
            url_poller: TaskPoller::new(Concern::UrlIngestion),
            pdf_poller: TaskPoller::new(Concern::PdfIngestion),
            events_tx,
            events_rx: Some(events_rx),
            corpus: CorpusKind::Url,
            language,
            urls: Vec::new(),
            pdfs: Vec::new(),
            url_status: String::new(),
            url_busy: false,
            pdf_status: String::new(),
            pdf_processing: false,
            question: String::new(),
            answer: None,
        })
    }

    /// 运行交互会话
    pub async fn run(mut self) -> Result<()> {
        self.print_help();

        let mut events = self
            .events_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("事件通道已被取走，run 只能调用一次"))?;
        let stdin = tokio::io::stdin();
        let mut lines = tokio::io::BufReader::new(stdin).lines();

        loop {
            tokio::select! {
                maybe_line = lines.next_line() => {
                    match maybe_line? {
                        Some(line) => {
                            if !self.handle_line(line.trim()).await? {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(event) = events.recv() => {
                    self.handle_poll_event(event);
                }
            }
        }

        info!("👋 会话结束");
        Ok(())
    }

    // ========== 命令分发 ==========

    /// 处理一行输入；返回 false 表示退出
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        if line.is_empty() {
            return Ok(true);
        }
        if !line.starts_with(':') {
            // 普通文本就是一个问题
            self.submit_question(line.to_string()).await?;
            return Ok(true);
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or("").trim();

        match command {
            ":help" => self.print_help(),
            ":quit" | ":q" => return Ok(false),
            ":lang" => self.set_language(rest),
            ":corpus" => self.set_corpus(rest),
            ":urls" => self.set_urls(rest),
            ":init" => self.submit_urls().await,
            ":add" => self.add_pdf(rest),
            ":rm" => self.remove_pdf(rest),
            ":files" => self.list_pdfs(),
            ":upload" => self.upload_pdfs().await,
            ":load" => self.load_manifest(rest).await,
            ":status" => self.show_status(),
            ":speak" => self.speak_answer(),
            ":dictate" => self.dictate_question().await,
            other => {
                self.notifier.warning(format!("Unknown command: {}", other));
            }
        }
        Ok(true)
    }

    fn print_help(&self) {
        info!("命令列表:");
        info!("  :urls <u1,u2,...>  设置待摄取的 URL 列表");
        info!("  :init              提交 URL 列表，开始构建索引");
        info!("  :add <path>        添加一个 PDF 文件");
        info!("  :rm <index>        按序号移除 PDF 文件");
        info!("  :files             列出已选择的 PDF 文件");
        info!("  :upload            上传 PDF 文件集");
        info!("  :load <manifest>   从 TOML 清单加载 URL/PDF");
        info!("  :corpus url|pdf    切换提问的语料库");
        info!("  :lang <tag>        选择回答语言 (en/hi/es/fr/de)");
        info!("  :speak             朗读当前回答");
        info!("  :dictate           语音输入问题");
        info!("  :status            显示任务状态");
        info!("  :quit              退出");
        info!("直接输入文本即可提问。");
    }

    // ========== URL 摄取 ==========

    fn set_urls(&mut self, raw: &str) {
        self.urls = raw
            .split(',')
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        info!("✓ 已设置 {} 个 URL", self.urls.len());
    }

    /// 提交 URL 列表，启动索引构建并开始轮询
    async fn submit_urls(&mut self) {
        if self.urls.is_empty() {
            self.notifier.warning("Please enter at least one URL.");
            return;
        }

        // 新提交丢弃上一轮的回答与任务
        self.answer = None;
        self.url_status = "Initializing...".to_string();
        self.url_busy = true;

        match self.backend.initialize_faiss(&self.urls).await {
            Ok(task_id) => {
                self.notifier.success("Processing your Urls.");
                self.start_poller(Concern::UrlIngestion, task_id);
            }
            Err(e) => {
                self.url_busy = false;
                self.url_status.clear();
                self.notifier.error(format!("Error: {}", e));
            }
        }
    }

    // ========== PDF 文件集 ==========

    fn add_pdf(&mut self, raw: &str) {
        if raw.is_empty() {
            self.notifier.warning("Usage: :add <path-to-pdf>");
            return;
        }
        self.pdfs.push(PathBuf::from(raw));
        info!("✓ 已添加: {} (共 {} 个)", raw, self.pdfs.len());
    }

    fn remove_pdf(&mut self, raw: &str) {
        let index: usize = match raw.parse() {
            Ok(i) => i,
            Err(_) => {
                self.notifier.warning("Usage: :rm <index>");
                return;
            }
        };
        if index >= self.pdfs.len() {
            self.notifier.warning(format!(
                "Index {} out of range (0..{})",
                index,
                self.pdfs.len()
            ));
            return;
        }
        let removed = self.pdfs.remove(index);
        info!("🗑️ 已移除: {}", removed.display());
    }

    fn list_pdfs(&self) {
        if self.pdfs.is_empty() {
            info!("（没有已选择的 PDF 文件）");
            return;
        }
        for (i, path) in self.pdfs.iter().enumerate() {
            info!("  {}. {}", i, path.display());
        }
    }

    /// 上传 PDF 文件集，启动处理并开始轮询
    async fn upload_pdfs(&mut self) {
        if self.pdfs.is_empty() {
            self.notifier.error("Please select at least one PDF file.");
            return;
        }

        self.answer = None;
        self.pdf_status = "Initializing...".to_string();
        self.pdf_processing = true;

        match self.backend.upload_pdfs(&self.pdfs).await {
            Ok(task_id) => {
                self.notifier
                    .success("PDFs uploaded successfully! Processing started.");
                self.start_poller(Concern::PdfIngestion, task_id);
            }
            Err(AppError::Config(_)) => {
                self.pdf_processing = false;
                self.pdf_status.clear();
                self.notifier
                    .error("Failed to retrieve authentication token.");
            }
            Err(e) => {
                self.pdf_processing = false;
                self.pdf_status.clear();
                warn!("上传失败: {}", e);
                self.notifier.error("Error uploading PDFs. Please try again.");
            }
        }
    }

    /// 从 TOML 清单批量加载 URL / PDF
    async fn load_manifest(&mut self, raw: &str) {
        if raw.is_empty() {
            self.notifier.warning("Usage: :load <manifest.toml>");
            return;
        }
        match CorpusManifest::load(raw).await {
            Ok(manifest) => {
                if manifest.is_empty() {
                    self.notifier.warning("Manifest contains no URLs or PDFs.");
                    return;
                }
                if !manifest.urls.is_empty() {
                    self.urls = manifest.urls;
                    info!("✓ 清单提供 {} 个 URL（:init 提交）", self.urls.len());
                }
                if !manifest.pdfs.is_empty() {
                    self.pdfs.extend(manifest.pdfs);
                    info!("✓ PDF 文件集现有 {} 个文件（:upload 上传）", self.pdfs.len());
                }
            }
            Err(e) => {
                self.notifier.error(format!("Error: {}", e));
            }
        }
    }

    // ========== 轮询 ==========

    /// 为指定关注点启动轮询（自动取消旧定时器）
    fn start_poller(&mut self, concern: Concern, task_id: String) {
        let client = self.backend.clone();
        let fetch = move |id: String| {
            let client = client.clone();
            async move { client.task_status(&id).await }
        };
        let poller = match concern {
            Concern::UrlIngestion => &mut self.url_poller,
            Concern::PdfIngestion => &mut self.pdf_poller,
        };
        poller.start(
            task_id,
            self.config.poll_interval(),
            self.events_tx.clone(),
            fetch,
        );
    }

    /// 消费一条轮询事件，更新对应关注点的状态
    fn handle_poll_event(&mut self, event: PollEvent) {
        let concern = event.concern;
        match event.update {
            PollUpdate::Progress(status) => {
                let text = status.progress_text();
                info!("📊 [{}] 状态: {}", concern, text);
                self.set_status(concern, text, true);
            }
            PollUpdate::Completed => {
                self.set_status(concern, "Completed".to_string(), false);
                match concern {
                    Concern::UrlIngestion => self
                        .notifier
                        .success("Processing Done! Start asking your Questions."),
                    Concern::PdfIngestion => {
                        self.notifier.success("Document processing completed.")
                    }
                }
            }
            PollUpdate::Failed(reason) => {
                let text = match &reason {
                    Some(r) => format!("Failed: {}", r),
                    None => "Failed".to_string(),
                };
                self.set_status(concern, text.clone(), false);
                self.notifier.error(format!("Processing failed. {}", text));
            }
            PollUpdate::Error(_) => {
                // 轮询出错：停止忙碌标记，但不宣称完成
                self.set_status(concern, String::new(), false);
                self.notifier.error("Error checking task status");
            }
        }
    }

    fn set_status(&mut self, concern: Concern, text: String, busy: bool) {
        match concern {
            Concern::UrlIngestion => {
                self.url_status = text;
                self.url_busy = busy;
            }
            Concern::PdfIngestion => {
                self.pdf_status = text;
                self.pdf_processing = busy;
            }
        }
    }

    fn show_status(&self) {
        info!(
            "URL 摄取: {} (busy: {})",
            if self.url_status.is_empty() { "-" } else { self.url_status.as_str() },
            self.url_busy
        );
        info!(
            "PDF 摄取: {} (processing: {})",
            if self.pdf_status.is_empty() { "-" } else { self.pdf_status.as_str() },
            self.pdf_processing
        );
        info!("语料库: {:?}, 语言: {}", self.corpus, self.language);
    }

    // ========== 提问 ==========

    fn set_corpus(&mut self, raw: &str) {
        match raw {
            "url" => {
                self.corpus = CorpusKind::Url;
                info!("✓ 切换到 URL 语料库");
            }
            "pdf" => {
                self.corpus = CorpusKind::Pdf;
                info!("✓ 切换到 PDF 语料库");
            }
            _ => self.notifier.warning("Usage: :corpus url|pdf"),
        }
    }

    fn set_language(&mut self, tag: &str) {
        if !language::is_supported(tag) {
            let supported: Vec<&str> = SUPPORTED_LANGUAGES.iter().map(|(t, _)| *t).collect();
            self.notifier.warning(format!(
                "Unsupported language '{}'. Supported: {}",
                tag,
                supported.join(", ")
            ));
            return;
        }
        self.language = tag.to_string();
        info!("✓ 回答语言: {}", tag);
    }

    /// 提交一个问题到当前语料库
    async fn submit_question(&mut self, question: String) -> Result<()> {
        self.question = question;
        let ctx = AskCtx::new(self.question.clone(), self.language.clone(), self.corpus);
        info!("❓ {}", truncate_text(&ctx.question, 80));

        let outcome = match self.corpus {
            CorpusKind::Url => self.flow.ask_url(&ctx).await?,
            CorpusKind::Pdf => self.flow.ask_pdf(&ctx, self.pdf_processing).await?,
        };

        if let AskOutcome::Answered { answer, sources } = outcome {
            info!("💬 Answer: {}", answer);
            if let Some(sources) = &sources {
                info!("📚 Sources: {}", sources);
            }
            // 新回答替换旧回答
            self.answer = Some(answer);
        }
        Ok(())
    }

    // ========== 语音 ==========

    /// 朗读当前回答
    fn speak_answer(&mut self) {
        let answer = match &self.answer {
            Some(answer) => answer.clone(),
            None => {
                self.notifier.warning("No answer to speak yet.");
                return;
            }
        };
        if let Err(e) = self
            .speech
            .speak(self.synthesizer.as_mut(), &answer, &self.language)
        {
            warn!("朗读失败: {}", e);
            self.notifier
                .error("Speech synthesis is not available in this environment.");
        }
    }

    /// 语音输入问题（转写经翻译流水线翻成英文后填入问题槽）
    async fn dictate_question(&mut self) {
        match self
            .speech
            .capture_question(self.recognizer.as_mut(), &self.translation, &self.language)
            .await
        {
            Ok(text) => {
                info!("🎤 问题已填入: {}", truncate_text(&text, 80));
                self.question = text;
            }
            Err(AppError::Speech(_)) => {
                self.notifier
                    .warning("Speech recognition is not supported in this environment.");
            }
            Err(e) => {
                self.notifier.error(format!("Error: {}", e));
            }
        }
    }
}
