// ==========================================
// 抓取结果导入系统 - RecordSink Trait
// ==========================================
// 职责: 定义标准记录持久化接口（不包含去重规则）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{CanonicalRecord, ExistingRecordSummary};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RecordSink Trait
// ==========================================
// 用途: 去重加载器的持久化协作方
// 实现者: SqliteRecordSink（使用 rusqlite）
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 统计指定活动已入库记录数（用于首次导入快速路径）
    async fn count_existing(&self, campaign_id: i64) -> RepositoryResult<i64>;

    /// 查询与给定 (campaign_id, scrape_type_id, keyword) 取值集合相交的已入库记录
    ///
    /// # 返回
    /// - scrape_date 已截断到日期的记录摘要
    async fn fetch_existing(
        &self,
        campaign_ids: &[i64],
        scrape_type_ids: &[i64],
        keywords: &[String],
    ) -> RepositoryResult<Vec<ExistingRecordSummary>>;

    /// 插入单条记录
    ///
    /// # 返回
    /// - Ok(i64): 持久化后的记录 ID
    /// - Err: 约束违反或连接丢失
    async fn insert(&self, record: &CanonicalRecord) -> RepositoryResult<i64>;

    /// 在同一事务中逐条插入（全部成功或全部回滚）
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 按输入顺序的记录 ID
    /// - Err: 任一插入失败（整个事务回滚）
    async fn insert_all(&self, records: &[CanonicalRecord]) -> RepositoryResult<Vec<i64>>;
}

// 共享持有（Arc）的 RecordSink 直接委托
#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for std::sync::Arc<T> {
    async fn count_existing(&self, campaign_id: i64) -> RepositoryResult<i64> {
        (**self).count_existing(campaign_id).await
    }

    async fn fetch_existing(
        &self,
        campaign_ids: &[i64],
        scrape_type_ids: &[i64],
        keywords: &[String],
    ) -> RepositoryResult<Vec<ExistingRecordSummary>> {
        (**self)
            .fetch_existing(campaign_ids, scrape_type_ids, keywords)
            .await
    }

    async fn insert(&self, record: &CanonicalRecord) -> RepositoryResult<i64> {
        (**self).insert(record).await
    }

    async fn insert_all(&self, records: &[CanonicalRecord]) -> RepositoryResult<Vec<i64>> {
        (**self).insert_all(records).await
    }
}
