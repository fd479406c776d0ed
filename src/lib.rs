//! Campus Portal - 角色化的教学管理门户
//!
//! 基于 Actix Web 的前端后端（BFF）：身份与数据托管在外部后端，
//! 本服务维护浏览器会话、缓存查询结果，并为各角色组装仪表盘。
//!
//! # 架构
//! - `backend`: 托管后端客户端（REST / 内存演示）
//! - `cache`: 查询结果缓存（Moka）
//! - `config`: 配置管理
//! - `dashboard`: 认证闸门、外壳导航与角色仪表盘
//! - `errors`: 统一错误处理
//! - `middlewares`: 会话认证、角色与限流中间件
//! - `models`: 数据模型定义
//! - `queries`: 带缓存的数据访问钩子
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 请求处理层
//! - `session`: 会话与资料提供者
//! - `utils`: 工具函数

pub mod backend;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod queries;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod session;
pub mod utils;
