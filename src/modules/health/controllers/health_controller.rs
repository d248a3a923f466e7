use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::time::Duration;

const READINESS_DB_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Readiness check response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessChecks {
    pub database: bool,
}

/// GET /health - Liveness check, no dependency checks
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /ready - Readiness check
/// Returns 503 when the database cannot answer within a short budget
pub async fn readiness_check(pool: web::Data<MySqlPool>) -> impl Responder {
    let database = match tokio::time::timeout(
        READINESS_DB_TIMEOUT,
        sqlx::query("SELECT 1").fetch_one(pool.get_ref()),
    )
    .await
    {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::error!("Database readiness check failed: {}", e);
            false
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            false
        }
    };

    let response = ReadinessResponse {
        ready: database,
        checks: ReadinessChecks { database },
    };

    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
