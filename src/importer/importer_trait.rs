// ==========================================
// 抓取结果导入系统 - 导入 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 阶段: 工作表读取 → 格式识别 → 格式转换 → 去重落库
// ==========================================

use crate::domain::{CanonicalRecord, ImportContext, ImportStats, Sheet};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::NaiveDateTime;

// ==========================================
// WorkbookImporter Trait
// ==========================================
// 用途: 工作簿导入主接口
// 实现者: WorkbookImporterImpl
#[async_trait]
pub trait WorkbookImporter: Send + Sync {
    /// 处理整个工作簿
    ///
    /// # 参数
    /// - source: 工作表来源（Excel / CSV / 内存）
    /// - ctx: campaign / scrape_type / force_upload
    ///
    /// # 返回
    /// - ImportStats: 成功工作表数 / 插入行数 / 错误列表
    ///
    /// # 说明
    /// - 工作表级、批次级失败不中断整体流程，只记录到 errors
    /// - 仅当无法枚举工作表时返回单一错误 + 零计数
    async fn process_workbook(&self, source: &mut dyn SheetSource, ctx: ImportContext)
        -> ImportStats;
}

// ==========================================
// SheetSource Trait
// ==========================================
// 用途: 工作表来源（外部协作方）
// 实现者: ExcelWorkbookSource, CsvWorkbookSource, InMemoryWorkbook
pub trait SheetSource: Send {
    /// 工作表名称列表（保持工作簿内顺序）
    fn list_sheet_names(&mut self) -> ImportResult<Vec<String>>;

    /// 读取单个工作表（首行为表头）
    fn read_sheet(&mut self, name: &str) -> ImportResult<Sheet>;
}

// ==========================================
// ProductIdGenerator Trait
// ==========================================
// 用途: 购物网格格式的合成 product_id
// 实现者: UuidProductIdGenerator, SequentialProductIdGenerator
pub trait ProductIdGenerator: Send + Sync {
    /// 生成全局唯一的 product_id
    fn next_product_id(&self) -> String;
}

// ==========================================
// SheetTransformer Trait
// ==========================================
// 用途: 单一格式的工作表 → 标准记录
// 实现者: ShoppingGridTransformer, ProductStandardTransformer, ProductPositionNoLinkTransformer
// 红线: 纯转换，不做 I/O；缺失可选列必须容忍
pub trait SheetTransformer: Send + Sync {
    fn transform(&self, sheet: &Sheet, ctx: &SheetContext) -> Vec<CanonicalRecord>;
}

// ==========================================
// SheetContext - 单个工作表的转换上下文
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetContext {
    /// 默认关键词（工作表名）
    pub keyword: String,
    /// 默认抓取日期（行级 Date 不可解析时使用）
    pub default_date: NaiveDateTime,
    pub campaign_id: i64,
    pub scrape_type_id: i64,
}

impl SheetContext {
    pub fn new(
        keyword: impl Into<String>,
        default_date: NaiveDateTime,
        campaign_id: i64,
        scrape_type_id: i64,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            default_date,
            campaign_id,
            scrape_type_id,
        }
    }
}
