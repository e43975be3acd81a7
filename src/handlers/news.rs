//! 新闻搜索接口
//!
//! GET /api/news?query=...|symbol=...&type=stock|metal|gold

use actix_web::{web, HttpResponse};

use crate::error::ProxyError;
use crate::models::{NewsKind, NewsQuery};
use crate::services::news::NewsService;

pub async fn search_news(
    service: web::Data<NewsService>,
    query: web::Query<NewsQuery>,
) -> Result<HttpResponse, ProxyError> {
    let term = query
        .search_term()
        .ok_or_else(|| ProxyError::BadRequest("Query or symbol required".to_string()))?;
    let kind = NewsKind::from_param(query.kind.as_deref());

    log::info!("[News API] 搜索新闻: {} ({:?})", term, kind);
    Ok(HttpResponse::Ok().json(service.search(&term, kind).await))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/news")
            .route(web::get().to(search_news))
            .default_service(web::to(super::method_not_allowed)),
    );
}
