// ==========================================
// 抓取结果导入系统 - 工作簿导入编排器
// ==========================================
// 职责: 整合导入流程，从工作簿到数据库
// 流程: 枚举工作表 → 跳过非数据表 → 读表 → 默认日期 → 格式识别
//       → 格式转换 → 分批 → 去重落库 → 汇总
// 红线: 工作表级 / 批次级失败只记录，不中断；仅枚举失败为致命
// 红线: 严格顺序执行（一次一个工作表、一次一个批次）
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{CanonicalRecord, DuplicateScope, ImportContext, ImportStats, Layout, Sheet};
use crate::importer::duplicate_loader::{DuplicateAwareLoader, DuplicateIndex};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::id_generator::UuidProductIdGenerator;
use crate::importer::importer_trait::{
    ProductIdGenerator, SheetContext, SheetSource, WorkbookImporter,
};
use crate::importer::layout_detector::detect_layout;
use crate::importer::layout_transformer::LayoutTransformers;
use crate::importer::value_normalizer::parse_date_or;
use crate::repository::record_sink::RecordSink;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const DATE_COLUMN: &str = "Date";

/// 单个工作表的处理结果
#[derive(Debug, Default)]
struct SheetOutcome {
    inserted: usize,
    batches_succeeded: usize,
    errors: Vec<String>,
}

// ==========================================
// WorkbookImporterImpl - 工作簿导入编排器
// ==========================================
pub struct WorkbookImporterImpl<S>
where
    S: RecordSink,
{
    // 去重加载器（持有 RecordSink）
    loader: DuplicateAwareLoader<S>,

    // 导入配置
    config: Arc<ImportConfig>,

    // 格式转换器
    transformers: LayoutTransformers,
}

impl<S> WorkbookImporterImpl<S>
where
    S: RecordSink,
{
    /// 创建编排器（合成 product_id 使用 UUID v4）
    pub fn new(sink: S, config: ImportConfig) -> Self {
        Self::with_id_generator(sink, config, Arc::new(UuidProductIdGenerator))
    }

    /// 创建编排器并注入 product_id 生成器
    pub fn with_id_generator(
        sink: S,
        config: ImportConfig,
        id_generator: Arc<dyn ProductIdGenerator>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            loader: DuplicateAwareLoader::new(sink),
            transformers: LayoutTransformers::new(Arc::clone(&config), id_generator),
            config,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        self.loader.sink()
    }

    /// 处理单个工作表（错误全部收集到 SheetOutcome）
    async fn process_sheet(
        &self,
        source: &mut dyn SheetSource,
        name: &str,
        ctx: ImportContext,
    ) -> SheetOutcome {
        let mut outcome = SheetOutcome::default();

        let records = match self.prepare_sheet(source, name, ctx) {
            Ok(records) => records,
            Err(e) => {
                warn!(sheet = %name, error = %e, "工作表跳过");
                outcome.errors.push(e.to_string());
                return outcome;
            }
        };

        // 整表一次去重查询（默认）；PerBatch 模式在每批内查询
        let mut sheet_index: Option<DuplicateIndex> = None;
        if self.config.duplicate_scope == DuplicateScope::WholeSheet {
            match self.loader.prepare_index(&records, ctx.force_upload).await {
                Ok(index) => sheet_index = index,
                Err(e) => {
                    let err = ImportError::DuplicateCheckError {
                        sheet: name.to_string(),
                        message: e.to_string(),
                    };
                    error!(sheet = %name, error = %e, "去重查询失败");
                    outcome.errors.push(err.to_string());
                    return outcome;
                }
            }
        }

        for (batch_idx, batch) in records.chunks(self.config.batch_size).enumerate() {
            let batch_no = batch_idx + 1;
            match self.load_batch(batch, ctx, sheet_index.as_mut()).await {
                Ok(inserted) => {
                    outcome.inserted += inserted;
                    outcome.batches_succeeded += 1;
                    debug!(sheet = %name, batch = batch_no, inserted = inserted, "批次插入完成");
                }
                Err(e) => {
                    let err = ImportError::BatchPersistenceError {
                        sheet: name.to_string(),
                        batch: batch_no,
                        message: e.to_string(),
                    };
                    error!(sheet = %name, batch = batch_no, error = %e, "批次插入失败，已回滚");
                    outcome.errors.push(err.to_string());
                }
            }
        }

        info!(
            sheet = %name,
            records = records.len(),
            inserted = outcome.inserted,
            failed_batches = outcome.errors.len(),
            "工作表处理完成"
        );
        outcome
    }

    /// 读表 → 默认日期 → 格式识别 → 转换
    fn prepare_sheet(
        &self,
        source: &mut dyn SheetSource,
        name: &str,
        ctx: ImportContext,
    ) -> ImportResult<Vec<CanonicalRecord>> {
        let sheet = source
            .read_sheet(name)
            .map_err(|e| ImportError::SheetReadError {
                sheet: name.to_string(),
                message: e.to_string(),
            })?;

        if sheet.is_empty() {
            return Err(ImportError::EmptySheet(name.to_string()));
        }

        let default_date = sheet_default_date(&sheet);
        let layout = detect_layout(&sheet);
        info!(
            sheet = %name,
            rows = sheet.rows.len(),
            layout = %layout,
            default_date = %default_date,
            "工作表格式识别完成"
        );

        let sheet_ctx = SheetContext::new(name, default_date, ctx.campaign_id, ctx.scrape_type_id);
        let records = self.transformers.transform(layout, &sheet, &sheet_ctx);

        if layout == Layout::Unrecognized {
            return Err(ImportError::FormatUnrecognized {
                sheet: name.to_string(),
                columns: sheet.columns.join(", "),
            });
        }
        if records.is_empty() {
            return Err(ImportError::NoValidRecords(name.to_string()));
        }
        Ok(records)
    }

    async fn load_batch(
        &self,
        batch: &[CanonicalRecord],
        ctx: ImportContext,
        sheet_index: Option<&mut DuplicateIndex>,
    ) -> ImportResult<usize> {
        let outcome = match self.config.duplicate_scope {
            DuplicateScope::WholeSheet => self.loader.insert_with_index(batch, sheet_index).await?,
            DuplicateScope::PerBatch => self.loader.insert_batch(batch, ctx.force_upload).await?,
        };
        Ok(outcome.inserted_ids.len())
    }
}

/// 工作表默认日期：自上而下第一个非空 Date 值；无值或不可解析时取当前时间
fn sheet_default_date(sheet: &Sheet) -> NaiveDateTime {
    let now = Local::now().naive_local();
    sheet
        .rows
        .iter()
        .map(|row| row.get(DATE_COLUMN))
        .find(|cell| !cell.is_blank())
        .map(|cell| parse_date_or(cell, now))
        .unwrap_or(now)
}

#[async_trait]
impl<S> WorkbookImporter for WorkbookImporterImpl<S>
where
    S: RecordSink,
{
    #[instrument(
        skip(self, source),
        fields(
            campaign_id = ctx.campaign_id,
            scrape_type_id = ctx.scrape_type_id,
            force_upload = ctx.force_upload
        )
    )]
    async fn process_workbook(&self, source: &mut dyn SheetSource, ctx: ImportContext)
        -> ImportStats {
        let sheet_names = match source.list_sheet_names() {
            Ok(names) => names,
            Err(e) => {
                let err = ImportError::SheetEnumerationError(e.to_string());
                error!(error = %e, "无法枚举工作表，导入终止");
                return ImportStats::fatal(err.to_string());
            }
        };
        info!(sheets = sheet_names.len(), "开始导入工作簿");

        let mut stats = ImportStats::default();
        for name in &sheet_names {
            if self.config.skip_sheets.should_skip(ctx.scrape_type_id, name) {
                info!(sheet = %name, "跳过非数据工作表");
                continue;
            }

            let outcome = self.process_sheet(source, name, ctx).await;
            if outcome.batches_succeeded > 0 {
                stats.keywords_processed += 1;
            }
            stats.rows_processed += outcome.inserted;
            stats.errors.extend(outcome.errors);
        }

        if stats.has_errors() {
            warn!(
                keywords_processed = stats.keywords_processed,
                rows_processed = stats.rows_processed,
                errors = stats.errors.len(),
                "工作簿导入完成（存在错误）"
            );
        } else {
            info!(
                keywords_processed = stats.keywords_processed,
                rows_processed = stats.rows_processed,
                "工作簿导入完成"
            );
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, Row};
    use chrono::NaiveDate;

    #[test]
    fn test_sheet_default_date_first_non_blank() {
        let sheet = Sheet::new("s", ["Date", "id"]).with_rows(vec![
            [("Date", ""), ("id", "1")].into_iter().collect(),
            [("Date", "2024-03-05"), ("id", "2")].into_iter().collect(),
            [("Date", "2024-04-01"), ("id", "3")].into_iter().collect(),
        ]);

        assert_eq!(
            sheet_default_date(&sheet),
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_sheet_default_date_falls_back_to_now() {
        let mut row = Row::new();
        row.insert("id", CellValue::Int(1));
        let sheet = Sheet::new("s", ["id"]).with_rows(vec![row]);

        let before = Local::now().naive_local();
        let date = sheet_default_date(&sheet);
        assert!(date >= before);
    }
}
