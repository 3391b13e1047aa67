// ==========================================
// 抓取结果导入系统 - 导入配置
// ==========================================
// 职责: 跳过工作表策略 / 可选字段映射 / 批次大小等显式配置
// 红线: 配置作为数据注入编排器与转换器，不作为模块级全局状态
// ==========================================

use crate::domain::{DuplicateScope, OptionalField};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 默认插入批次大小
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 购物网格格式每行最多商品数
pub const DEFAULT_MAX_GRID_PRODUCTS: usize = 15;

/// 结果汇总中展示的错误条数上限
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 10;

/// 占位链接模板（{product_id} 会被替换）
pub const DEFAULT_PLACEHOLDER_LINK_TEMPLATE: &str = "https://example.com/product/{product_id}";

// ==========================================
// SheetSkipPolicy - 跳过工作表策略
// ==========================================
// 规则: common 对所有抓取类型生效，by_scrape_type 为附加项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSkipPolicy {
    pub common: Vec<String>,
    pub by_scrape_type: BTreeMap<i64, Vec<String>>,
}

impl Default for SheetSkipPolicy {
    fn default() -> Self {
        let mut by_scrape_type = BTreeMap::new();
        // 2 = Shopping Tab 抓取，额外输出 Output 汇总表
        by_scrape_type.insert(2, vec!["Output".to_string()]);

        Self {
            common: vec![
                "Keywords".to_string(),
                "Aggregated Results".to_string(),
                "Error Logs".to_string(),
            ],
            by_scrape_type,
        }
    }
}

impl SheetSkipPolicy {
    /// 指定抓取类型的完整跳过列表
    pub fn skip_list(&self, scrape_type_id: i64) -> Vec<&str> {
        let extra = self
            .by_scrape_type
            .get(&scrape_type_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        self.common
            .iter()
            .chain(extra.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn should_skip(&self, scrape_type_id: i64, sheet_name: &str) -> bool {
        self.skip_list(scrape_type_id)
            .iter()
            .any(|name| *name == sheet_name)
    }
}

// ==========================================
// ImportConfig - 导入配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub max_grid_products: usize,
    pub skip_sheets: SheetSkipPolicy,
    /// 可选字段 → 源列名
    pub optional_fields: BTreeMap<OptionalField, String>,
    pub placeholder_link_template: String,
    pub duplicate_scope: DuplicateScope,
    pub max_reported_errors: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_grid_products: DEFAULT_MAX_GRID_PRODUCTS,
            skip_sheets: SheetSkipPolicy::default(),
            optional_fields: OptionalField::ALL
                .iter()
                .map(|f| (*f, f.default_column().to_string()))
                .collect(),
            placeholder_link_template: DEFAULT_PLACEHOLDER_LINK_TEMPLATE.to_string(),
            duplicate_scope: DuplicateScope::default(),
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }
}

impl ImportConfig {
    /// 从 JSON 字符串加载（缺省字段使用默认值）
    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        let config: ImportConfig =
            serde_json::from_str(raw).map_err(|e| ImportError::ConfigReadError {
                key: "<json>".to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.batch_size == 0 {
            return Err(ImportError::ConfigValueError {
                key: "batch_size".to_string(),
                value: "0".to_string(),
                message: "批次大小必须大于 0".to_string(),
            });
        }
        if self.max_grid_products == 0 {
            return Err(ImportError::ConfigValueError {
                key: "max_grid_products".to_string(),
                value: "0".to_string(),
                message: "网格商品数必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 可选字段对应的源列名（未配置则不读取该字段）
    pub fn column_for(&self, field: OptionalField) -> Option<&str> {
        self.optional_fields.get(&field).map(String::as_str)
    }

    /// 根据 product_id 生成占位链接
    pub fn placeholder_link(&self, product_id: &str) -> String {
        self.placeholder_link_template
            .replace("{product_id}", product_id)
    }
}
