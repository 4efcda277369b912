/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 基础地址
    pub backend_base_url: String,
    /// 后端 API 访问令牌（PDF 上传 / 提问需要）
    pub backend_token: String,
    /// 翻译服务基础地址
    pub translate_base_url: String,
    /// 任务状态轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 409 冲突重试的最大轮询次数
    pub max_polls: u32,
    /// 单次翻译请求的最大字符数
    pub max_chunk_len: usize,
    /// 单次翻译请求的超时时间（秒）
    pub translate_timeout_secs: u64,
    /// 默认目标语言
    pub default_language: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: "https://api.harshita.click".to_string(),
            backend_token: String::new(),
            translate_base_url: "https://lingva.ml".to_string(),
            poll_interval_secs: 3,
            max_polls: 60,
            max_chunk_len: 450,
            translate_timeout_secs: 8,
            default_language: "en".to_string(),
            verbose_logging: false,
            output_log_file: "session.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            backend_base_url: std::env::var("VECTRAMIND_BACKEND_URL").unwrap_or(default.backend_base_url),
            backend_token: std::env::var("VECTRAMIND_API_TOKEN").unwrap_or(default.backend_token),
            translate_base_url: std::env::var("VECTRAMIND_TRANSLATE_URL").unwrap_or(default.translate_base_url),
            poll_interval_secs: std::env::var("VECTRAMIND_POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_secs),
            max_polls: std::env::var("VECTRAMIND_MAX_POLLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_polls),
            max_chunk_len: std::env::var("VECTRAMIND_MAX_CHUNK_LEN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_chunk_len),
            translate_timeout_secs: std::env::var("VECTRAMIND_TRANSLATE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.translate_timeout_secs),
            default_language: std::env::var("VECTRAMIND_LANGUAGE").unwrap_or(default.default_language),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    /// 单次翻译请求超时
    pub fn translate_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.translate_timeout_secs)
    }
}
