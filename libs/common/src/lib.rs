//! Common library for the Notekeeper backend
//!
//! This crate provides functionality shared by the `auth` and `api`
//! services: database connectivity, the injected clock, JWT issuing and
//! verification, the access-token guard and server bootstrap helpers.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::clock::SystemClock;
//! use common::jwt::{JwtConfig, JwtService};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = JwtConfig::from_env()?;
//!     let jwt = JwtService::new(config, Arc::new(SystemClock))?;
//!     let pair = jwt.issue_pair(uuid::Uuid::new_v4())?;
//!     let claims = jwt.verify_access(&pair.access_token)?;
//!     println!("token issued for {}", claims.sub);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod database;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod server;
