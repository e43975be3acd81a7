//! HTTP 请求处理器
//!
//! 所有接口挂在 `/api` 下，方法不匹配时统一返回 405

pub mod ai;
pub mod health;
pub mod news;
pub mod prices;
pub mod stocks;

use actix_web::{web, HttpResponse};

use crate::error::ProxyError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::config)
            .configure(stocks::config)
            .configure(prices::config)
            .configure(news::config)
            .configure(ai::config),
    );
}

/// 405 `{"error": "Method not allowed"}`
pub async fn method_not_allowed() -> Result<HttpResponse, ProxyError> {
    Err(ProxyError::MethodNotAllowed)
}
