use actix_web::{web, HttpResponse};

use crate::models::{vietnam_timestamp, HealthResponse};

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: vietnam_timestamp(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/health")
            .route(web::get().to(health_check))
            .default_service(web::to(super::method_not_allowed)),
    );
}
