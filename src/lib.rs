// ==========================================
// 抓取结果导入系统 - 核心库
// ==========================================
// 职责: 购物搜索抓取结果（Excel / CSV）→ 格式识别 → 标准记录 → 去重入库
// 技术栈: Rust + SQLite
// 运行模型: 单次批处理，顺序执行至完成
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 格式识别 / 转换 / 去重落库
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 导入接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CanonicalRecord, CellValue, DuplicateScope, ExistingRecordSummary, IdentityKey,
    ImportContext, ImportStats, InMemoryWorkbook, Layout, OptionalField, Row, Sheet,
};

// 导入
pub use importer::{
    DuplicateAwareLoader, ImportError, ImportResult, SheetSource, WorkbookImporter,
    WorkbookImporterImpl,
};

// 仓储
pub use repository::{RecordSink, RepositoryError, SqliteRecordSink};

// 配置
pub use config::ImportConfig;

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "抓取结果导入系统";
