//! 中间件模块

pub mod cors;

pub use cors::CorsMiddleware;
