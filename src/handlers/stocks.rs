//! 越南股票代理接口
//!
//! GET /api/stocks?source=cafef|all|quote|batch|tcbs|ssi|wichart&symbols=VNM,FPT

use actix_web::{web, HttpResponse};

use crate::error::ProxyError;
use crate::models::{StockQuery, StockSource, MAX_BATCH_SYMBOLS};
use crate::services::stock::StockService;

pub async fn get_stocks(
    service: web::Data<StockService>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse, ProxyError> {
    let source: StockSource = query
        .source
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ProxyError::BadRequest)?;
    let symbols = query.symbol_list(MAX_BATCH_SYMBOLS);

    log::info!("[Stock Proxy] source={:?} symbols={:?}", source, symbols);

    let first_symbol = || {
        symbols
            .first()
            .map(String::as_str)
            .ok_or_else(|| ProxyError::BadRequest("Symbols required".to_string()))
    };

    let response = match source {
        StockSource::Board => HttpResponse::Ok().json(service.board().await?),
        StockSource::Ssi => HttpResponse::Ok().json(service.ssi().await?),
        StockSource::Quote => HttpResponse::Ok().json(service.quote(first_symbol()?).await?),
        StockSource::Tcbs => HttpResponse::Ok().json(service.tcbs(first_symbol()?).await?),
        StockSource::Wichart => HttpResponse::Ok().json(service.wichart(first_symbol()?).await?),
        StockSource::Batch => {
            first_symbol()?;
            HttpResponse::Ok().json(service.batch(&symbols).await?)
        }
    };

    Ok(response)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/stocks")
            .route(web::get().to(get_stocks))
            .default_service(web::to(super::method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::models::{Asset, AssetType, StockQuote, StocksResponse};
    use crate::services::provider::testing::quote;
    use crate::services::stock::testing::service;
    use actix_web::{test, App};
    use serde_json::Value;

    fn app_data(board_ok: bool) -> web::Data<StockService> {
        let board = if board_ok {
            Ok(vec![Asset::new("VNM", "Vinamilk", AssetType::Stock, 68.5).live("CafeF")])
        } else {
            Err(UpstreamError::Status { status: 503, body: r#"{"message":"maintenance"}"#.to_string() })
        };
        web::Data::new(service(board, vec![quote("FPT", 148.2, 146.0)], None))
    }

    #[actix_web::test]
    async fn test_board() {
        let app = test::init_service(App::new().app_data(app_data(true)).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks?source=cafef").to_request();
        let res: StocksResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.count, 1);
        assert_eq!(res.stocks[0].symbol, "VNM");
    }

    #[actix_web::test]
    async fn test_quote() {
        let app = test::init_service(App::new().app_data(app_data(true)).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks?source=quote&symbols=fpt").to_request();
        let res: StockQuote = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.symbol, "FPT");
        assert_eq!(res.price, 148.2);
    }

    #[actix_web::test]
    async fn test_invalid_requests() {
        let app = test::init_service(App::new().app_data(app_data(true)).configure(config)).await;

        for uri in ["/stocks", "/stocks?source=tcbs-list", "/stocks?source=quote", "/stocks?source=batch&symbols=,"] {
            let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), 400, "{}", uri);
            let body: Value = test::read_body_json(res).await;
            assert!(body["error"].is_string());
        }

        let res = test::call_service(&app, test::TestRequest::delete().uri("/stocks").to_request()).await;
        assert_eq!(res.status(), 405);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Method not allowed");
    }

    #[actix_web::test]
    async fn test_single_provider_relays_upstream_status() {
        let app = test::init_service(App::new().app_data(app_data(false)).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks?source=ssi").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 503);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "maintenance");
    }
}
