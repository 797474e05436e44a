//! 门禁访问控制库
//! 访问模型、决策引擎、模型热重载与运维 HTTP 接口

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
