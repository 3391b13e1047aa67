// ==========================================
// 抓取结果导入系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表读取导入配置覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::{ImportConfig, SheetSkipPolicy};
use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::DuplicateScope;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// 配置键
pub mod config_keys {
    pub const BATCH_SIZE: &str = "import/batch_size";
    pub const MAX_GRID_PRODUCTS: &str = "import/max_grid_products";
    pub const MAX_REPORTED_ERRORS: &str = "import/max_reported_errors";
    pub const DUPLICATE_SCOPE: &str = "import/duplicate_scope";
    pub const SKIP_SHEETS: &str = "import/skip_sheets";
    pub const PLACEHOLDER_LINK_TEMPLATE: &str = "import/placeholder_link_template";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ImportError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在（或 config_kv 表不存在）
    pub fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        if !table_exists(&conn, "config_kv")? {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn parse_value<T: FromStr>(&self, key: &str) -> ImportResult<Option<T>> {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ImportError::ConfigValueError {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: "无法解析配置值".to_string(),
                }),
        }
    }

    /// 在基础配置上应用 config_kv 覆写
    pub fn load_import_config(&self, base: ImportConfig) -> ImportResult<ImportConfig> {
        let mut config = base;

        if let Some(v) = self.parse_value::<usize>(config_keys::BATCH_SIZE)? {
            config.batch_size = v;
        }
        if let Some(v) = self.parse_value::<usize>(config_keys::MAX_GRID_PRODUCTS)? {
            config.max_grid_products = v;
        }
        if let Some(v) = self.parse_value::<usize>(config_keys::MAX_REPORTED_ERRORS)? {
            config.max_reported_errors = v;
        }
        if let Some(raw) = self.get_config_value(config_keys::DUPLICATE_SCOPE)? {
            config.duplicate_scope =
                DuplicateScope::parse(&raw).ok_or_else(|| ImportError::ConfigValueError {
                    key: config_keys::DUPLICATE_SCOPE.to_string(),
                    value: raw.clone(),
                    message: "仅支持 WHOLE_SHEET / PER_BATCH".to_string(),
                })?;
        }
        if let Some(raw) = self.get_config_value(config_keys::SKIP_SHEETS)? {
            config.skip_sheets = serde_json::from_str::<SheetSkipPolicy>(&raw).map_err(|e| {
                ImportError::ConfigValueError {
                    key: config_keys::SKIP_SHEETS.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = self.get_config_value(config_keys::PLACEHOLDER_LINK_TEMPLATE)? {
            config.placeholder_link_template = raw;
        }

        config.validate()?;
        debug!(?config, "导入配置覆写已应用");
        info!(
            batch_size = config.batch_size,
            duplicate_scope = ?config.duplicate_scope,
            "导入配置加载完成"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_import_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_import_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_no_overrides_keeps_base() {
        let manager = manager();
        let config = manager.load_import_config(ImportConfig::default()).unwrap();
        assert_eq!(config, ImportConfig::default());
    }

    #[test]
    fn test_missing_table_keeps_base() {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)));
        assert_eq!(manager.get_config_value(config_keys::BATCH_SIZE).unwrap(), None);
    }

    #[test]
    fn test_overrides_applied() {
        let manager = manager();
        manager.set_config_value(config_keys::BATCH_SIZE, "20").unwrap();
        manager
            .set_config_value(config_keys::DUPLICATE_SCOPE, "PER_BATCH")
            .unwrap();
        manager
            .set_config_value(
                config_keys::SKIP_SHEETS,
                r#"{"common":["Summary"],"by_scrape_type":{}}"#,
            )
            .unwrap();

        let config = manager.load_import_config(ImportConfig::default()).unwrap();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.duplicate_scope, DuplicateScope::PerBatch);
        assert!(config.skip_sheets.should_skip(2, "Summary"));
        assert!(!config.skip_sheets.should_skip(2, "Output"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let manager = manager();
        manager.set_config_value(config_keys::BATCH_SIZE, "many").unwrap();
        assert!(manager.load_import_config(ImportConfig::default()).is_err());
    }

    #[test]
    fn test_set_config_value_upsert() {
        let manager = manager();
        manager.set_config_value(config_keys::MAX_REPORTED_ERRORS, "5").unwrap();
        manager.set_config_value(config_keys::MAX_REPORTED_ERRORS, "7").unwrap();
        assert_eq!(
            manager.get_config_value(config_keys::MAX_REPORTED_ERRORS).unwrap(),
            Some("7".to_string())
        );
    }
}
