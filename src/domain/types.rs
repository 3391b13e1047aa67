// ==========================================
// 抓取结果导入系统 - 领域类型定义
// ==========================================
// 职责: 格式枚举 / 可选字段枚举 / 导入上下文 / 汇总统计
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工作表格式 (Layout)
// ==========================================
// 红线: 封闭枚举，每个变体对应一个转换器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    ShoppingGrid,          // Product<N>_Title / Product<N>_Link
    ProductStandard,       // id + title + link
    ProductPositionNoLink, // position + title + id，无 link（需合成占位链接）
    Unrecognized,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::ShoppingGrid => write!(f, "SHOPPING_GRID"),
            Layout::ProductStandard => write!(f, "PRODUCT_STANDARD"),
            Layout::ProductPositionNoLink => write!(f, "PRODUCT_POSITION_NO_LINK"),
            Layout::Unrecognized => write!(f, "UNRECOGNIZED"),
        }
    }
}

// ==========================================
// 可选字段 (Optional Field)
// ==========================================
// 用途: 产品类格式的可选列映射表的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalField {
    Position,
    Rating,
    Reviews,
    Price,
    PriceRaw,
    Merchant,
    IsCarousel,
    CarouselPosition,
    HasProductPage,
}

impl OptionalField {
    pub const ALL: [OptionalField; 9] = [
        OptionalField::Position,
        OptionalField::Rating,
        OptionalField::Reviews,
        OptionalField::Price,
        OptionalField::PriceRaw,
        OptionalField::Merchant,
        OptionalField::IsCarousel,
        OptionalField::CarouselPosition,
        OptionalField::HasProductPage,
    ];

    /// 默认源列名（与字段名一致）
    pub fn default_column(&self) -> &'static str {
        match self {
            OptionalField::Position => "position",
            OptionalField::Rating => "rating",
            OptionalField::Reviews => "reviews",
            OptionalField::Price => "price",
            OptionalField::PriceRaw => "price_raw",
            OptionalField::Merchant => "merchant",
            OptionalField::IsCarousel => "is_carousel",
            OptionalField::CarouselPosition => "carousel_position",
            OptionalField::HasProductPage => "has_product_page",
        }
    }
}

// ==========================================
// 去重查询范围 (Duplicate Scope)
// ==========================================
// WholeSheet: 每个工作表一次查询已存在记录（默认）
// PerBatch: 每个插入批次单独查询
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicateScope {
    #[default]
    WholeSheet,
    PerBatch,
}

impl DuplicateScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "WHOLE_SHEET" => Some(DuplicateScope::WholeSheet),
            "PER_BATCH" => Some(DuplicateScope::PerBatch),
            _ => None,
        }
    }
}

// ==========================================
// ImportContext - 单次导入上下文
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportContext {
    pub campaign_id: i64,
    pub scrape_type_id: i64,
    pub force_upload: bool,
}

impl ImportContext {
    pub fn new(campaign_id: i64, scrape_type_id: i64, force_upload: bool) -> Self {
        Self {
            campaign_id,
            scrape_type_id,
            force_upload,
        }
    }
}

// ==========================================
// ImportStats - 导入汇总统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// 至少有一个批次提交成功的工作表数
    ///
    /// 所有批次都插入失败的工作表不计入（即使已进入插入阶段）；
    /// 全部为重复记录的批次视为成功
    pub keywords_processed: usize,
    /// 实际插入的记录数（跳过的重复记录不计）
    pub rows_processed: usize,
    pub errors: Vec<String>,
}

impl ImportStats {
    /// 致命错误：唯一错误 + 零计数
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            keywords_processed: 0,
            rows_processed: 0,
            errors: vec![message.into()],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 截断后的错误列表（超出部分汇总为一行）
    pub fn error_preview(&self, cap: usize) -> Vec<String> {
        let mut preview: Vec<String> = self.errors.iter().take(cap).cloned().collect();
        if self.errors.len() > cap {
            preview.push(format!("... 另有 {} 条错误", self.errors.len() - cap));
        }
        preview
    }
}
