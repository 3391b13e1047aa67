// ==========================================
// 抓取结果导入系统 - 命令行入口
// ==========================================
// 用法:
//   scrape-import <file> --campaign <id> --scrape-type <id> [--force] [--db <path>] [--config <json>]
//   scrape-import --list [--db <path>]
// 输出: 导入结果 JSON 写到 stdout，日志写到 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use scrape_import::api::ImportApi;
use scrape_import::config::ImportConfig;
use scrape_import::db::{default_db_path, ensure_import_schema, open_sqlite_connection};
use scrape_import::logging;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scrape-import")]
#[command(about = "购物搜索抓取结果导入：格式识别、标准化与去重入库")]
#[command(version)]
struct Cli {
    /// 待导入的工作簿（.xlsx/.xls/.xlsb/.ods/.csv）
    #[arg(required_unless_present = "list")]
    file: Option<String>,

    /// 活动 ID
    #[arg(long = "campaign", value_name = "ID", required_unless_present = "list")]
    campaign_id: Option<i64>,

    /// 抓取类型 ID（决定跳过哪些工作表）
    #[arg(long = "scrape-type", value_name = "ID", required_unless_present = "list")]
    scrape_type_id: Option<i64>,

    /// 跳过去重检查，全部插入
    #[arg(long = "force")]
    force_upload: bool,

    /// 列出可选的活动与抓取类型
    #[arg(
        long,
        conflicts_with_all = ["file", "campaign_id", "scrape_type_id", "force_upload", "config"]
    )]
    list: bool,

    /// SQLite 数据库路径（默认读取 SCRAPE_IMPORT_DB_PATH，其次用户数据目录）
    #[arg(long = "db", value_name = "PATH")]
    db_path: Option<String>,

    /// 导入配置 JSON 文件
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Import {
        file: String,
        campaign_id: i64,
        scrape_type_id: i64,
        force_upload: bool,
        config_path: Option<PathBuf>,
    },
    List,
}

impl Cli {
    fn command(&self) -> Result<Command> {
        if self.list {
            return Ok(Command::List);
        }

        match (&self.file, self.campaign_id, self.scrape_type_id) {
            (Some(file), Some(campaign_id), Some(scrape_type_id)) => Ok(Command::Import {
                file: file.clone(),
                campaign_id,
                scrape_type_id,
                force_upload: self.force_upload,
                config_path: self.config.clone(),
            }),
            _ => bail!("导入需要 <file> --campaign <ID> --scrape-type <ID>"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let command = cli.command()?;
    let db_path = cli.db_path.unwrap_or_else(default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", scrape_import::APP_NAME, scrape_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    // 本地库首次使用时建表（已存在则跳过）
    {
        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        ensure_import_schema(&conn).context("建表失败")?;
    }

    match command {
        Command::List => {
            let api = ImportApi::new(db_path);
            let listing = serde_json::json!({
                "campaigns": api.list_campaigns()?,
                "scrape_types": api.list_scrape_types()?,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Import {
            file,
            campaign_id,
            scrape_type_id,
            force_upload,
            config_path,
        } => {
            let config = match config_path {
                Some(path) => ImportConfig::from_json_file(&path)?,
                None => ImportConfig::default(),
            };
            let api = ImportApi::with_config(db_path, config);
            let response = api
                .import_workbook(&file, campaign_id, scrape_type_id, force_upload)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
