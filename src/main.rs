use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finreport::config::{Config, DatabaseConfig};
use finreport::configure_routes;
use finreport::middleware::{json_config, query_config, RequestId};
use finreport::modules::insights::{
    GeminiClient, GeminiInsightGenerator, GeminiReceiptScanner, InsightGenerator,
    NoopInsightGenerator, ReceiptScanner, UnavailableReceiptScanner,
};
use finreport::modules::notifications::{EmailDispatch, ReportMailer, SmtpMailer};
use finreport::modules::reports::{
    MySqlReportHistoryRepository, MySqlReportSettingRepository, ReportAggregator,
    ReportHistoryRepository, ReportJobRunner, ReportService, ReportSettingRepository,
};
use finreport::modules::transactions::{
    MySqlTransactionRepository, RecurringTransactionJob, TransactionRepository,
    TransactionService,
};
use finreport::modules::users::{MySqlUserDirectory, UserDirectory};
use finreport::scheduler::JobScheduler;

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("finreport={},actix_web=info", config.app.log_level).into());

    if config.app.env == "production" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!("Starting finreport");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool initialized ({}..{} connections)",
        config.database.min_connections,
        config.database.max_connections
    );

    if config.database.run_migrations {
        DatabaseConfig::migrate(&db_pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Repositories
    let transactions: Arc<dyn TransactionRepository> =
        Arc::new(MySqlTransactionRepository::new(db_pool.clone()));
    let settings: Arc<dyn ReportSettingRepository> =
        Arc::new(MySqlReportSettingRepository::new(db_pool.clone()));
    let history: Arc<dyn ReportHistoryRepository> =
        Arc::new(MySqlReportHistoryRepository::new(db_pool.clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(MySqlUserDirectory::new(db_pool.clone()));

    // External collaborators
    let (insights, scanner): (Arc<dyn InsightGenerator>, Arc<dyn ReceiptScanner>) =
        match config.insight.api_key.clone() {
            Some(api_key) => {
                let client = Arc::new(GeminiClient::new(
                    api_key,
                    config.insight.model.clone(),
                    config.insight.base_url.clone(),
                    config.insight.timeout(),
                )?);
                tracing::info!(model = %config.insight.model, "Gemini insights enabled");
                (
                    Arc::new(GeminiInsightGenerator::new(
                        client.clone(),
                        config.mail.currency_symbol.clone(),
                    )),
                    Arc::new(GeminiReceiptScanner::new(client)),
                )
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set; insights and receipt scanning disabled");
                (
                    Arc::new(NoopInsightGenerator),
                    Arc::new(UnavailableReceiptScanner),
                )
            }
        };

    let dispatch: Arc<dyn EmailDispatch> = Arc::new(SmtpMailer::new(&config.mail)?);
    let mailer = Arc::new(ReportMailer::new(
        dispatch,
        config.mail.currency_symbol.clone(),
    ));

    // Services
    let aggregator = Arc::new(ReportAggregator::new(
        transactions.clone(),
        insights,
        config.insight.timeout(),
    ));
    let report_service = Arc::new(ReportService::new(
        settings.clone(),
        history,
        users.clone(),
        aggregator.clone(),
        mailer.clone(),
    ));
    let transaction_service = Arc::new(TransactionService::new(transactions.clone(), scanner));

    // Background jobs
    let scheduler_handles = if config.jobs.scheduler_enabled {
        let report_job = Arc::new(ReportJobRunner::new(
            settings,
            users,
            aggregator,
            mailer,
            config.jobs.commit_timeout(),
            config.jobs.cursor_batch_size,
        ));
        let recurring_job = Arc::new(RecurringTransactionJob::new(
            transactions,
            config.jobs.commit_timeout(),
            config.jobs.cursor_batch_size,
        ));

        JobScheduler::new()
            .daily(recurring_job, config.jobs.recurring_run_at)
            .daily(report_job, config.jobs.report_run_at)
            .start()
    } else {
        tracing::warn!("Job scheduler disabled");
        Vec::new()
    };

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let frontend_origin = config.server.frontend_origin.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .allowed_header(finreport::middleware::USER_ID_HEADER)
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(RequestId)
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .configure(configure_routes)
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;

    for handle in scheduler_handles {
        handle.abort();
    }
    tracing::info!("Server stopped");
    Ok(())
}
