//! 跨域中间件
//!
//! 所有响应附加宽松的 CORS 头，OPTIONS 预检请求直接返回 200 空响应，不进入处理器

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

pub const ALLOW_METHODS: &str = "GET,OPTIONS,POST";
pub const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, \
Content-MD5, Content-Type, Date, X-Api-Version, Authorization";

/// CORS 中间件
#[derive(Default)]
pub struct CorsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // 预检请求
            if req.method() == Method::OPTIONS {
                let mut res = req.into_response(HttpResponse::Ok().finish());
                apply_headers(res.headers_mut());
                return Ok(res.map_into_right_body());
            }

            let mut res = service.call(req).await?;
            apply_headers(res.headers_mut());
            Ok(res.map_into_left_body())
        })
    }
}

fn apply_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn test_preflight_short_circuits() {
        let app = test::init_service(
            App::new()
                .wrap(CorsMiddleware)
                .route("/api/stocks", web::get().to(|| async { HttpResponse::InternalServerError().finish() })),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/stocks")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers().get("access-control-allow-origin").unwrap(), "*");
        let body = test::read_body(res).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn test_headers_on_normal_response() {
        let app = test::init_service(
            App::new()
                .wrap(CorsMiddleware)
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert!(res.status().is_success());
        assert_eq!(res.headers().get("access-control-allow-methods").unwrap(), ALLOW_METHODS);
        assert_eq!(res.headers().get("access-control-allow-credentials").unwrap(), "true");
    }
}
