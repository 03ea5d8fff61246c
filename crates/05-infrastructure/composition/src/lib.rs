//! # 基础设施组合层
//!
//! 应用的组合根：加载启动配置、构建容器、连接远程配置源。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use config_impl::StaticConfigSource;
//! use infrastructure_composition::{ApplicationBootstrapper, BootstrapOptions, LoggingConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = BootstrapOptions::new("config/bootstrap.yaml")
//!         .with_logging(LoggingConfig::development());
//!     let bootstrapper = ApplicationBootstrapper::new(options);
//!
//!     let source = Arc::new(StaticConfigSource::yaml("blog-dev.yaml", "mail:\n  host: smtp.local\n"));
//!     let application = bootstrapper.bootstrap(source).await?;
//!
//!     let host: String = application
//!         .container()
//!         .required_config_value("mail.host")
//!         .await?;
//!     println!("邮件服务器: {}", host);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod bootstrapper;
pub mod builder;

#[cfg(test)]
mod tests;

pub use application::Application;
pub use bootstrapper::ApplicationBootstrapper;
pub use builder::{BootstrapOptions, EnvLookup, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
