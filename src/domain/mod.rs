// ==========================================
// 抓取结果导入系统 - 领域模型层
// ==========================================
// 职责: 定义表格输入、标准记录、身份键与导入统计
// 红线: 不含数据访问逻辑,不含转换逻辑
// ==========================================

pub mod record;
pub mod types;
pub mod workbook;

// 重导出核心类型
pub use record::{CanonicalRecord, ExistingRecordSummary, IdentityKey, IdentityScope};
pub use types::{DuplicateScope, ImportContext, ImportStats, Layout, OptionalField};
pub use workbook::{CellValue, InMemoryWorkbook, Row, Sheet};
