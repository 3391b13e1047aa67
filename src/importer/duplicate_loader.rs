// ==========================================
// 抓取结果导入系统 - 去重加载器
// ==========================================
// 职责: 与已入库记录按双身份键比对，只插入新记录
// 规则: 任一身份键命中即为重复（product_id 或 title+link）
// 快速路径: 非强制模式下若活动尚无任何记录，跳过去重查询
// 红线: 每批插入是一个事务，任一条失败整批回滚
// ==========================================

use crate::domain::{CanonicalRecord, ExistingRecordSummary, IdentityKey};
use crate::repository::error::RepositoryResult;
use crate::repository::record_sink::RecordSink;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

// ==========================================
// DuplicateIndex - 身份键索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    keys: HashSet<IdentityKey>,
}

impl DuplicateIndex {
    pub fn from_existing(existing: &[ExistingRecordSummary]) -> Self {
        let mut index = Self::default();
        for summary in existing {
            index.keys.extend(summary.identity_keys());
        }
        index
    }

    /// 任一身份键已存在即为重复
    pub fn is_duplicate(&self, record: &CanonicalRecord) -> bool {
        record
            .identity_keys()
            .iter()
            .any(|key| self.keys.contains(key))
    }

    /// 记录新插入的身份键
    pub fn remember(&mut self, record: &CanonicalRecord) {
        self.keys.extend(record.identity_keys());
    }

    pub fn merge(&mut self, other: DuplicateIndex) {
        self.keys.extend(other.keys);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ==========================================
// LoadOutcome - 单批加载结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub inserted_ids: Vec<i64>,
    pub duplicates_skipped: usize,
}

// ==========================================
// DuplicateAwareLoader
// ==========================================
pub struct DuplicateAwareLoader<S>
where
    S: RecordSink,
{
    sink: S,
}

impl<S> DuplicateAwareLoader<S>
where
    S: RecordSink,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 插入一批记录（独立完成存在性探测与去重）
    ///
    /// # 返回
    /// - Ok(LoadOutcome): 实际插入的记录 ID 与跳过的重复数
    /// - Err: 插入失败（整批回滚）
    pub async fn insert_batch(
        &self,
        records: &[CanonicalRecord],
        force_upload: bool,
    ) -> RepositoryResult<LoadOutcome> {
        let mut index = self.prepare_index(records, force_upload).await?;
        self.insert_with_index(records, index.as_mut()).await
    }

    /// 构建去重索引
    ///
    /// # 返回
    /// - None: 强制上传或活动尚无记录（无需去重）
    /// - Some(index): 已入库记录的身份键索引
    pub async fn prepare_index(
        &self,
        records: &[CanonicalRecord],
        force_upload: bool,
    ) -> RepositoryResult<Option<DuplicateIndex>> {
        if force_upload {
            debug!("强制上传，跳过去重");
            return Ok(None);
        }

        let Some(first) = records.first() else {
            return Ok(None);
        };

        let existing_count = self.sink.count_existing(first.campaign_id).await?;
        if existing_count == 0 {
            info!(campaign_id = first.campaign_id, "活动尚无记录，按强制上传处理");
            return Ok(None);
        }

        let campaign_ids: Vec<i64> = distinct(records.iter().map(|r| r.campaign_id));
        let scrape_type_ids: Vec<i64> = distinct(records.iter().map(|r| r.scrape_type_id));
        let keywords: Vec<String> = distinct(records.iter().map(|r| r.keyword.clone()));

        let existing = self
            .sink
            .fetch_existing(&campaign_ids, &scrape_type_ids, &keywords)
            .await?;
        let index = DuplicateIndex::from_existing(&existing);

        debug!(
            existing_records = existing.len(),
            identity_keys = index.len(),
            "去重索引构建完成"
        );
        Ok(Some(index))
    }

    /// 按索引过滤后插入；插入成功后新记录的身份键并入索引
    ///
    /// index 为 None 时不做任何去重
    pub async fn insert_with_index(
        &self,
        records: &[CanonicalRecord],
        index: Option<&mut DuplicateIndex>,
    ) -> RepositoryResult<LoadOutcome> {
        let Some(index) = index else {
            let inserted_ids = self.sink.insert_all(records).await?;
            return Ok(LoadOutcome {
                inserted_ids,
                duplicates_skipped: 0,
            });
        };

        let mut pending = DuplicateIndex::default();
        let queued: Vec<CanonicalRecord> = records
            .iter()
            .filter(|record| {
                if index.is_duplicate(record) || pending.is_duplicate(record) {
                    return false;
                }
                pending.remember(record);
                true
            })
            .cloned()
            .collect();
        let duplicates_skipped = records.len() - queued.len();

        if duplicates_skipped > 0 {
            debug!(
                total = records.len(),
                duplicates = duplicates_skipped,
                "跳过重复记录"
            );
        }

        if queued.is_empty() {
            return Ok(LoadOutcome {
                inserted_ids: Vec::new(),
                duplicates_skipped,
            });
        }

        let inserted_ids = self.sink.insert_all(&queued).await?;
        index.merge(pending);

        Ok(LoadOutcome {
            inserted_ids,
            duplicates_skipped,
        })
    }
}

/// 去重并保持稳定顺序
fn distinct<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    values.collect::<BTreeSet<T>>().into_iter().collect()
}
