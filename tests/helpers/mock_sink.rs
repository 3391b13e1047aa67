// ==========================================
// Mock RecordSink - 用于集成测试
// ==========================================
// 内存存储 + 调用计数 + 可注入的插入失败
// ==========================================

use async_trait::async_trait;
use scrape_import::domain::{CanonicalRecord, ExistingRecordSummary};
use scrape_import::repository::{RecordSink, RepositoryError, RepositoryResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockRecordSink {
    rows: Mutex<Vec<CanonicalRecord>>,
    fail_titles: HashSet<String>,
    fail_count: bool,
    pub count_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub insert_all_calls: AtomicUsize,
}

impl MockRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 批次中出现该标题时整批失败
    pub fn failing_on(titles: &[&str]) -> Self {
        Self {
            fail_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    /// 存在性探测失败（模拟连接丢失）
    pub fn unreachable() -> Self {
        Self {
            fail_count: true,
            ..Self::default()
        }
    }

    /// 预置已入库记录
    pub fn seed(&self, records: Vec<CanonicalRecord>) {
        self.rows.lock().unwrap().extend(records);
    }

    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSink for MockRecordSink {
    async fn count_existing(&self, campaign_id: i64) -> RepositoryResult<i64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count {
            return Err(RepositoryError::DatabaseConnectionError(
                "connection lost".to_string(),
            ));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.campaign_id == campaign_id).count() as i64)
    }

    async fn fetch_existing(
        &self,
        campaign_ids: &[i64],
        scrape_type_ids: &[i64],
        keywords: &[String],
    ) -> RepositoryResult<Vec<ExistingRecordSummary>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| {
                campaign_ids.contains(&r.campaign_id)
                    && scrape_type_ids.contains(&r.scrape_type_id)
                    && keywords.contains(&r.keyword)
            })
            .map(|r| ExistingRecordSummary {
                campaign_id: r.campaign_id,
                scrape_type_id: r.scrape_type_id,
                scrape_date: r.scrape_date.date(),
                keyword: r.keyword.clone(),
                product_id: r.product_id.clone(),
                title: r.title.clone(),
                link: r.link.clone(),
            })
            .collect())
    }

    async fn insert(&self, record: &CanonicalRecord) -> RepositoryResult<i64> {
        if self.fail_titles.contains(&record.title) {
            return Err(RepositoryError::PersistenceError {
                product_id: record.product_id.clone(),
                message: "simulated insert failure".to_string(),
            });
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push(record.clone());
        Ok(rows.len() as i64)
    }

    async fn insert_all(&self, records: &[CanonicalRecord]) -> RepositoryResult<Vec<i64>> {
        self.insert_all_calls.fetch_add(1, Ordering::SeqCst);

        // 全部成功或全部不写
        if let Some(bad) = records.iter().find(|r| self.fail_titles.contains(&r.title)) {
            return Err(RepositoryError::PersistenceError {
                product_id: bad.product_id.clone(),
                message: "simulated insert failure".to_string(),
            });
        }

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.insert(record).await?);
        }
        Ok(ids)
    }
}
