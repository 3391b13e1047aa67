// ==========================================
// 抓取结果导入 API
// ==========================================
// 职责: 打开工作簿与数据库，执行导入编排并生成结果摘要
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfig};
use crate::db::open_sqlite_connection;
use crate::domain::ImportContext;
use crate::importer::{open_workbook_source, WorkbookImporter, WorkbookImporterImpl};
use crate::repository::{CampaignEntity, ScrapeTypeEntity, SqliteRecordSink};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

/// 导入 API 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub campaign_id: i64,
    pub scrape_type_id: i64,
    pub force_upload: bool,
    /// 成功处理的工作表（关键词）数
    pub keywords_processed: usize,
    /// 实际插入的记录数
    pub rows_processed: usize,
    /// 错误总数
    pub error_count: usize,
    /// 截断后的错误列表（超出部分汇总为最后一行）
    pub errors: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入 API
pub struct ImportApi {
    db_path: String,
    config: ImportConfig,
}

impl ImportApi {
    /// 创建新的 ImportApi 实例（默认导入配置）
    pub fn new(db_path: String) -> Self {
        Self::with_config(db_path, ImportConfig::default())
    }

    /// 使用指定基础配置创建（config_kv 覆写仍然生效）
    pub fn with_config(db_path: String, config: ImportConfig) -> Self {
        Self { db_path, config }
    }

    fn open_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// 导入工作簿
    ///
    /// # 参数
    /// - file_path: 工作簿路径（.xlsx/.xls/.xlsb/.ods/.csv）
    /// - campaign_id: 活动 ID
    /// - scrape_type_id: 抓取类型 ID（决定跳过哪些工作表）
    /// - force_upload: 跳过去重检查
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（工作表级错误包含在 errors 中）
    /// - Err(ApiError): 参数 / 文件 / 数据库 / 配置错误
    pub async fn import_workbook(
        &self,
        file_path: &str,
        campaign_id: i64,
        scrape_type_id: i64,
        force_upload: bool,
    ) -> ApiResult<ImportApiResponse> {
        if campaign_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "campaign_id 必须为正整数: {}",
                campaign_id
            )));
        }
        if scrape_type_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "scrape_type_id 必须为正整数: {}",
                scrape_type_id
            )));
        }

        let start_time = Instant::now();
        let conn = self.open_connection()?;
        let config =
            ConfigManager::from_connection(Arc::clone(&conn)).load_import_config(self.config.clone())?;
        let max_reported_errors = config.max_reported_errors;

        let mut source = open_workbook_source(file_path)?;
        let importer = WorkbookImporterImpl::new(SqliteRecordSink::from_connection(conn), config);
        let ctx = ImportContext::new(campaign_id, scrape_type_id, force_upload);

        info!(file_path = %file_path, campaign_id, scrape_type_id, force_upload, "开始导入");
        let stats = importer.process_workbook(source.as_mut(), ctx).await;

        Ok(ImportApiResponse {
            campaign_id,
            scrape_type_id,
            force_upload,
            keywords_processed: stats.keywords_processed,
            rows_processed: stats.rows_processed,
            error_count: stats.errors.len(),
            errors: stats.error_preview(max_reported_errors),
            elapsed_ms: start_time.elapsed().as_millis() as i64,
        })
    }

    /// 可选活动列表（campaigns 表不存在时为空）
    pub fn list_campaigns(&self) -> ApiResult<Vec<CampaignEntity>> {
        let sink = SqliteRecordSink::from_connection(self.open_connection()?);
        Ok(sink.list_campaigns()?)
    }

    /// 可选抓取类型列表（scrape_types 表不存在时为空）
    pub fn list_scrape_types(&self) -> ApiResult<Vec<ScrapeTypeEntity>> {
        let sink = SqliteRecordSink::from_connection(self.open_connection()?);
        Ok(sink.list_scrape_types()?)
    }
}
