use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::error::AppError;
use crate::core::PageRequest;
use crate::middleware::auth::CurrentUser;
use crate::modules::transactions::models::{
    BulkCreateRequest, BulkDeleteRequest, CreateTransactionRequest, TransactionFilter,
    UpdateTransactionRequest,
};
use crate::modules::transactions::services::TransactionService;

/// Create a transaction
/// POST /transactions
pub async fn create_transaction(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse, AppError> {
    let record = service
        .create_transaction(user.id(), request.into_inner(), chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Transaction created successfully",
        "transaction": record,
    })))
}

/// List transactions
/// GET /transactions?keyword=&type=&recurringStatus=&pageNumber=&pageSize=
pub async fn list_transactions(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    filter: web::Query<TransactionFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, AppError> {
    let page = service
        .list_transactions(user.id(), filter.into_inner(), page.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /transactions/{id}
pub async fn get_transaction(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = service.get_transaction(user.id(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Transaction fetched successfully",
        "transaction": record,
    })))
}

/// PUT /transactions/{id}
pub async fn update_transaction(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<UpdateTransactionRequest>,
) -> Result<HttpResponse, AppError> {
    let record = service
        .update_transaction(user.id(), &path, request.into_inner(), chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Transaction updated successfully",
        "transaction": record,
    })))
}

/// DELETE /transactions/{id}
pub async fn delete_transaction(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.delete_transaction(user.id(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Transaction deleted successfully",
    })))
}

/// POST /transactions/{id}/duplicate
pub async fn duplicate_transaction(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let record = service
        .duplicate_transaction(user.id(), &path, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Transaction duplicated successfully",
        "transaction": record,
    })))
}

/// DELETE /transactions/bulk-delete
pub async fn bulk_delete(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    request: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, AppError> {
    let deleted = service.bulk_delete(user.id(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Transactions deleted successfully",
        "deletedCount": deleted,
    })))
}

/// POST /transactions/bulk
pub async fn bulk_create(
    service: web::Data<Arc<TransactionService>>,
    user: CurrentUser,
    request: web::Json<BulkCreateRequest>,
) -> Result<HttpResponse, AppError> {
    let inserted = service
        .bulk_create(user.id(), request.into_inner(), chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Transactions imported successfully",
        "insertedCount": inserted,
    })))
}

/// Extract transaction fields from an uploaded receipt image
/// POST /transactions/scan-receipt (raw image body)
pub async fn scan_receipt(
    service: web::Data<Arc<TransactionService>>,
    _user: CurrentUser,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let mime_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("application/octet-stream");

    let receipt = service.scan_receipt(&body, mime_type).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Receipt scanned successfully",
        "data": receipt,
    })))
}

/// Configure transaction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::get().to(list_transactions))
            .route("", web::post().to(create_transaction))
            .route("/scan-receipt", web::post().to(scan_receipt))
            .route("/bulk", web::post().to(bulk_create))
            .route("/bulk-delete", web::delete().to(bulk_delete))
            .route("/{id}", web::get().to(get_transaction))
            .route("/{id}", web::put().to(update_transaction))
            .route("/{id}", web::delete().to(delete_transaction))
            .route("/{id}/duplicate", web::post().to(duplicate_transaction)),
    );
}
