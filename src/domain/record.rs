// ==========================================
// 抓取结果导入系统 - 标准记录领域模型
// ==========================================
// 职责: 标准化后的入库单元 + 双身份键定义
// 红线: 同一语料内不得存在任一身份键相同的两条记录
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// CanonicalRecord - 标准记录
// ==========================================
// 用途: 格式转换器产出，去重加载器消费
// 对齐: scrape_data 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    // ===== 必填字段 =====
    pub campaign_id: i64,
    pub scrape_type_id: i64,
    pub scrape_date: NaiveDateTime, // 仅日期部分参与身份判定
    pub keyword: String,
    pub product_id: String,
    pub title: String,
    pub link: String,

    // ===== 可选字段 =====
    pub position: Option<i64>,
    pub price: Option<f64>,
    pub price_raw: Option<String>,
    pub merchant: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub is_carousel: Option<bool>,
    pub carousel_position: Option<i64>,
    pub has_product_page: Option<bool>,
}

impl CanonicalRecord {
    /// 创建仅含必填字段的记录
    pub fn new(
        campaign_id: i64,
        scrape_type_id: i64,
        scrape_date: NaiveDateTime,
        keyword: impl Into<String>,
        product_id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id,
            scrape_type_id,
            scrape_date,
            keyword: keyword.into(),
            product_id: product_id.into(),
            title: title.into(),
            link: link.into(),
            position: None,
            price: None,
            price_raw: None,
            merchant: None,
            rating: None,
            reviews: None,
            is_carousel: None,
            carousel_position: None,
            has_product_page: None,
        }
    }

    pub fn identity_scope(&self) -> IdentityScope {
        IdentityScope {
            campaign_id: self.campaign_id,
            scrape_type_id: self.scrape_type_id,
            scrape_date: self.scrape_date.date(),
            keyword: self.keyword.clone(),
        }
    }

    /// 该记录的两个身份键
    pub fn identity_keys(&self) -> [IdentityKey; 2] {
        IdentityKey::pair(self.identity_scope(), &self.product_id, &self.title, &self.link)
    }
}

// ==========================================
// ExistingRecordSummary - 已入库记录摘要
// ==========================================
// 用途: RecordSink::fetch_existing 返回值，scrape_date 已截断到日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecordSummary {
    pub campaign_id: i64,
    pub scrape_type_id: i64,
    pub scrape_date: NaiveDate,
    pub keyword: String,
    pub product_id: String,
    pub title: String,
    pub link: String,
}

impl ExistingRecordSummary {
    pub fn identity_keys(&self) -> [IdentityKey; 2] {
        let scope = IdentityScope {
            campaign_id: self.campaign_id,
            scrape_type_id: self.scrape_type_id,
            scrape_date: self.scrape_date,
            keyword: self.keyword.clone(),
        };
        IdentityKey::pair(scope, &self.product_id, &self.title, &self.link)
    }
}

// ==========================================
// IdentityScope - 身份键公共部分
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityScope {
    pub campaign_id: i64,
    pub scrape_type_id: i64,
    pub scrape_date: NaiveDate,
    pub keyword: String,
}

// ==========================================
// IdentityKey - 身份键（析取判定）
// ==========================================
// 规则: 任一变体命中即视为重复
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    ByProductId {
        scope: IdentityScope,
        product_id: String,
    },
    ByTitleLink {
        scope: IdentityScope,
        title: String,
        link: String,
    },
}

impl IdentityKey {
    pub fn pair(scope: IdentityScope, product_id: &str, title: &str, link: &str) -> [IdentityKey; 2] {
        [
            IdentityKey::ByProductId {
                scope: scope.clone(),
                product_id: product_id.to_string(),
            },
            IdentityKey::ByTitleLink {
                scope,
                title: title.to_string(),
                link: link.to_string(),
            },
        ]
    }
}
