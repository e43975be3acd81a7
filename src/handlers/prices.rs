//! 加密货币与贵金属价格接口
//!
//! GET /api/crypto?type=crypto|metals|gold|all，缺省为 crypto

use actix_web::{web, HttpResponse};

use crate::error::ProxyError;
use crate::models::{PriceKind, PriceQuery};
use crate::services::prices::PriceService;

pub async fn get_prices(
    service: web::Data<PriceService>,
    query: web::Query<PriceQuery>,
) -> Result<HttpResponse, ProxyError> {
    let kind = match query.kind.as_deref() {
        None | Some("") => PriceKind::Crypto,
        Some(raw) => raw.parse().map_err(ProxyError::BadRequest)?,
    };
    log::info!("[Crypto API] type={:?}", kind);

    let response = service.by_kind(kind).await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "s-maxage=60"))
        .json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/crypto")
            .route(web::get().to(get_prices))
            .default_service(web::to(super::method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetsResponse;
    use crate::services::prices::testing::service;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_default_is_crypto() {
        let data = web::Data::new(service(true, true));
        let app = test::init_service(App::new().app_data(data).configure(config)).await;

        let res: AssetsResponse =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/crypto").to_request()).await;
        assert_eq!(res.count, 1);
        assert_eq!(res.source, "CoinGecko");
    }

    #[actix_web::test]
    async fn test_gold_falls_back() {
        let data = web::Data::new(service(false, false));
        let app = test::init_service(App::new().app_data(data).configure(config)).await;

        let res: AssetsResponse =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/crypto?type=gold").to_request()).await;
        let symbols: Vec<&str> = res.assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["XAU/USD", "XAG/USD"]);
        assert!(res.assets.iter().all(|a| !a.is_realtime && a.source == "Fallback"));
    }

    #[actix_web::test]
    async fn test_errors() {
        let data = web::Data::new(service(false, true));
        let app = test::init_service(App::new().app_data(data).configure(config)).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/crypto?type=silver").to_request()).await;
        assert_eq!(res.status(), 400);

        // CoinGecko 限流状态码透传
        let res = test::call_service(&app, test::TestRequest::get().uri("/crypto?type=all").to_request()).await;
        assert_eq!(res.status(), 429);
    }
}
