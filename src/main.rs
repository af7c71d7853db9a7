use pengadaan_ledger::db::{LedgerStore, MemoryStore, PgStore};
use pengadaan_ledger::{api, create_pool, AppConfig, LedgerService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = AppConfig::load()?;

    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(config.log_level())
        .init();

    info!("Starting server with config: {:?}", config);

    // 选择存储: 配置了数据库则用 Postgres，否则用内存
    let store: Arc<dyn LedgerStore> = match config.database.url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, &config.database).await?;
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            info!("Database pool created");
            Arc::new(store)
        }
        None => {
            warn!("No database configured, orders are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let service = Arc::new(LedgerService::new(store));
    let app = api::routes(service).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/pengadaan          - submit (create or merge)");
    info!("  PUT  /api/pengadaan/:id      - update");
    info!("  GET  /api/pengadaan/export   - CSV ledger");
    info!("  PUT  /api/pengaturan/:id     - update pricing and recompute");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
