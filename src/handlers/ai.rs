//! Chat Completion 代理接口
//!
//! POST /api/ai，需要 `Authorization: Bearer <key>`

use actix_web::{http::header, web, HttpRequest, HttpResponse};

use crate::error::ProxyError;
use crate::models::ChatRequest;
use crate::services::chat::ChatService;

/// 取出 Bearer token
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

pub async fn chat(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<ChatService>,
) -> Result<HttpResponse, ProxyError> {
    let api_key = bearer_token(&req).ok_or_else(|| ProxyError::Unauthorized("API key required".to_string()))?;

    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| ProxyError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    log::info!("[AI Proxy] 转发到上游模型接口");
    match service.forward(api_key, request).await {
        None => Err(ProxyError::BadRequest("messages required".to_string())),
        Some(result) => Ok(HttpResponse::Ok().json(result?)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ai")
            .route(web::post().to(chat))
            .default_service(web::to(super::method_not_allowed)),
    );
}
