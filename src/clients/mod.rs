//! 客户端层
//!
//! 封装所有出站 HTTP 调用：QA 后端与第三方翻译服务。
//! 流程层通过 trait 依赖客户端能力，便于替换与测试。

pub mod backend_client;
pub mod translate_client;

pub use backend_client::{BackendClient, QaBackend};
pub use translate_client::{ChunkTranslator, TranslateClient};
