//! 编排层
//!
//! 只负责把各层组件组装起来并驱动交互会话。

pub mod app;

pub use app::App;
