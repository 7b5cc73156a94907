//! rust-lms-next - 学习进度与作业提交后端服务
//!
//! 基于 Actix Web 构建，负责作业提交跟踪（序号、迟交、评分、统计）
//! 以及学习进度台账（按自然键合并、按权重汇总课程完成度）。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: JWT 认证与角色校验中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层（SubmissionTracker / ProgressLedger）
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
