use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use pdf_insight::config::{AppConfig, DEFAULT_CONFIG_PATH};
use pdf_insight::server::{state::AppState, InsightServer};
use pdf_insight::storage::models::Insight;
use pdf_insight::storage::Database;
use pdf_insight::utils::logger;

#[derive(Parser)]
#[command(name = "pdf-insight")]
#[command(about = "PDF 摘要与关键词提取服务", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 初始化配置和数据库
    Init,
    /// 启动HTTP服务
    Serve,
    /// 处理本地PDF并输出结果（不入库）
    Process {
        /// PDF文件路径
        path: PathBuf,
    },
    /// 查看上传历史
    History {
        /// 最多显示的条数
        #[arg(short, long)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger();
    info!("pdf-insight 启动");

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_command().await?;
        }
        Commands::Serve => {
            serve_command().await?;
        }
        Commands::Process { path } => {
            process_command(path).await?;
        }
        Commands::History { limit } => {
            history_command(limit).await?;
        }
    }

    Ok(())
}

async fn init_command() -> Result<()> {
    info!("初始化系统...");

    let app_config = AppConfig::load()?;

    tokio::fs::create_dir_all("config").await?;
    tokio::fs::create_dir_all(&app_config.storage.upload_dir).await?;
    if let Some(parent) = std::path::Path::new(&app_config.storage.database_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("配置文件已存在，跳过: {}", DEFAULT_CONFIG_PATH);
    } else {
        AppConfig::default().save(DEFAULT_CONFIG_PATH)?;
        info!("已生成配置文件: {}", DEFAULT_CONFIG_PATH);
    }

    let db_url = app_config.database_url();
    info!("正在初始化数据库: {}", db_url);
    let db = Database::new(&db_url).await?;
    db.init_schema().await?;

    info!("✅ 系统初始化完成！");
    info!("下一步:");
    info!("  1. 在 {} 或 SARVAM_API_KEY 中配置API密钥", DEFAULT_CONFIG_PATH);
    info!("  2. 运行 'pdf-insight serve' 启动服务");

    Ok(())
}

async fn serve_command() -> Result<()> {
    let app_config = AppConfig::load()?;

    info!("配置已加载");
    info!("  - 摘要服务: {}", app_config.summarizer.api_url);
    info!("  - 模型: {}", app_config.summarizer.model);
    info!("  - 数据库: {}", app_config.storage.database_path);
    info!("  - 上传目录: {}", app_config.storage.upload_dir);

    let state = AppState::from_config(&app_config).await?;
    let server = InsightServer::new(app_config.server.clone(), state);

    info!("  API: http://{}", server.address());
    server.start().await?;
    Ok(())
}

async fn process_command(path: PathBuf) -> Result<()> {
    info!("处理本地文件: {}", path.display());

    let app_config = AppConfig::load()?;
    let state = AppState::from_config(&app_config).await?;

    let insight = state.pipeline().process_file(&path).await?;
    let output = match &insight {
        Insight::Ai { summary } => serde_json::json!({
            "insight_type": insight.insight_type(),
            "summary": summary,
            "top_words": null,
        }),
        Insight::Fallback { top_words } => serde_json::json!({
            "insight_type": insight.insight_type(),
            "summary": null,
            "top_words": top_words,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn history_command(limit: Option<i64>) -> Result<()> {
    let app_config = AppConfig::load()?;
    let db = Database::new(&app_config.database_url()).await?;
    db.init_schema().await?;

    let docs = db.list_recent(limit).await?;
    if docs.is_empty() {
        info!("暂无上传记录");
        return Ok(());
    }

    for doc in &docs {
        println!(
            "{:>6}  {}  {:<8}  {}",
            doc.id, doc.created_at, doc.insight_type, doc.filename
        );
    }
    info!("共 {} 条记录", docs.len());
    Ok(())
}
