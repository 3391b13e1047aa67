// ==========================================
// 抓取结果导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 工作表级 / 批次级错误在编排器内被捕获并转为 errors[] 字符串，
//       只有工作簿级枚举失败会终止整次导入
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsb/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 工作簿 / 工作表错误 =====
    #[error("无法枚举工作簿中的工作表: {0}")]
    SheetEnumerationError(String),

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("读取工作表 {sheet} 失败: {message}")]
    SheetReadError { sheet: String, message: String },

    #[error("工作表无数据: {0}")]
    EmptySheet(String),

    #[error("无法识别工作表格式: {sheet}（列: {columns}）")]
    FormatUnrecognized { sheet: String, columns: String },

    #[error("工作表无有效记录: {0}")]
    NoValidRecords(String),

    // ===== 持久化错误 =====
    #[error("工作表 {sheet} 去重查询失败: {message}")]
    DuplicateCheckError { sheet: String, message: String },

    #[error("工作表 {sheet} 第 {batch} 批插入失败: {message}")]
    BatchPersistenceError {
        sheet: String,
        batch: usize,
        message: String,
    },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
