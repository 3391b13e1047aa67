// ==========================================
// 抓取结果导入系统 - 配置层
// ==========================================
// 职责: 导入配置（默认值 / JSON 文件 / config_kv 覆写）
// ==========================================

pub mod config_manager;
pub mod import_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{ImportConfig, SheetSkipPolicy};
