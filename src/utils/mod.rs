//! 工具层

pub mod logging;
