//! doclink server: webhook-triggered document lookup and mail delivery
//!
//! An automation platform POSTs a webhook naming a document and a recipient.
//! The server resolves the name against the reference table and, on a
//! confident match, mails the document link.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (503 until the table has rows)
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API key required when keys are configured)
//!
//! - `POST /api/v1/webhook` (also `/webhook`) - Resolve and mail a document
//! - `GET /api/v1/lookup?q=` - Dry-run resolution with candidate scores
//! - `GET /api/v1/table` - Table metadata
//! - `POST /api/v1/table/reload` - Reload the table from its source

pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod payload;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use mail::{Mailer, OutgoingMail};
pub use server::{build_router, start_server};
pub use state::ServerState;
