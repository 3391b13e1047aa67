// ==========================================
// 抓取结果导入系统 - scrape_data Repository 实现
// ==========================================
// 职责: 实现 RecordSink（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::{CanonicalRecord, ExistingRecordSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_sink::RecordSink;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const INSERT_SQL: &str = r#"
    INSERT INTO scrape_data (
        campaign_id, scrape_type_id, scrape_date, keyword, product_id,
        title, link, position, price, price_raw, merchant, rating,
        reviews, is_carousel, carousel_position, has_product_page
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
    )
"#;

/// 活动（只读，来自外部维护的 campaigns 表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignEntity {
    pub campaign_id: i64,
    pub domain_name: Option<String>,
}

/// 抓取类型（只读，来自外部维护的 scrape_types 表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTypeEntity {
    pub id: i64,
    pub name: String,
}

// ==========================================
// SqliteRecordSink
// ==========================================
pub struct SqliteRecordSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordSink {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（连接由外部持有与关闭）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_one(conn: &Connection, record: &CanonicalRecord) -> RepositoryResult<i64> {
        let mut stmt = conn.prepare_cached(INSERT_SQL)?;
        let id = stmt
            .insert(params![
                record.campaign_id,
                record.scrape_type_id,
                record.scrape_date,
                record.keyword,
                record.product_id,
                record.title,
                record.link,
                record.position,
                record.price,
                record.price_raw,
                record.merchant,
                record.rating,
                record.reviews,
                record.is_carousel,
                record.carousel_position,
                record.has_product_page,
            ])
            .map_err(|e| RepositoryError::PersistenceError {
                product_id: record.product_id.clone(),
                message: e.to_string(),
            })?;
        Ok(id)
    }

    /// 列出活动（campaigns 表不存在时返回空列表）
    pub fn list_campaigns(&self) -> RepositoryResult<Vec<CampaignEntity>> {
        let conn = self.lock()?;
        if !table_exists(&conn, "campaigns")? {
            return Ok(Vec::new());
        }

        let mut stmt =
            conn.prepare("SELECT campaign_id, domain_name FROM campaigns ORDER BY domain_name")?;
        let rows = stmt.query_map([], |row| {
            Ok(CampaignEntity {
                campaign_id: row.get(0)?,
                domain_name: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 列出抓取类型（scrape_types 表不存在时返回空列表）
    pub fn list_scrape_types(&self) -> RepositoryResult<Vec<ScrapeTypeEntity>> {
        let conn = self.lock()?;
        if !table_exists(&conn, "scrape_types")? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare("SELECT id, name FROM scrape_types ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(ScrapeTypeEntity {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl RecordSink for SqliteRecordSink {
    async fn count_existing(&self, campaign_id: i64) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scrape_data WHERE campaign_id = ?1",
            params![campaign_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn fetch_existing(
        &self,
        campaign_ids: &[i64],
        scrape_type_ids: &[i64],
        keywords: &[String],
    ) -> RepositoryResult<Vec<ExistingRecordSummary>> {
        if campaign_ids.is_empty() || scrape_type_ids.is_empty() || keywords.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT campaign_id, scrape_type_id, date(scrape_date), keyword,
                   product_id, title, link
            FROM scrape_data
            WHERE campaign_id IN ({})
              AND scrape_type_id IN ({})
              AND keyword IN ({})
            "#,
            placeholders(1, campaign_ids.len()),
            placeholders(1 + campaign_ids.len(), scrape_type_ids.len()),
            placeholders(
                1 + campaign_ids.len() + scrape_type_ids.len(),
                keywords.len()
            ),
        );

        let values: Vec<Value> = campaign_ids
            .iter()
            .map(|id| Value::Integer(*id))
            .chain(scrape_type_ids.iter().map(|id| Value::Integer(*id)))
            .chain(keywords.iter().map(|k| Value::Text(k.clone())))
            .collect();

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(ExistingRecordSummary {
                campaign_id: row.get(0)?,
                scrape_type_id: row.get(1)?,
                scrape_date: row.get::<_, NaiveDate>(2)?,
                keyword: row.get(3)?,
                product_id: row.get(4)?,
                title: row.get(5)?,
                link: row.get(6)?,
            })
        })?;

        let existing = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(count = existing.len(), "已入库记录查询完成");
        Ok(existing)
    }

    async fn insert(&self, record: &CanonicalRecord) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        Self::insert_one(&conn, record)
    }

    async fn insert_all(&self, records: &[CanonicalRecord]) -> RepositoryResult<Vec<i64>> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            // 出错时 tx 被 drop，事务自动回滚
            ids.push(Self::insert_one(&tx, record)?);
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(ids)
    }
}
