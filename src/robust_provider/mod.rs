//! Retrying, failing-over wrapper around Alloy providers.
//!
//! [`RobustProvider`] is the default node client of the indexer. Each call runs under a total
//! timeout and transport errors are retried with exponential backoff before the next fallback
//! endpoint is tried. JSON-RPC error responses are returned untouched so callers can tell a node
//! refusing a request apart from a node that cannot be reached.
//!
//! ```rust,no_run
//! use events_indexer::robust_provider::RobustProviderBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let robust = RobustProviderBuilder::<alloy::network::Ethereum, _>::new("http://localhost:8545")
//!     .fallback("http://localhost:8546")
//!     .call_timeout(Duration::from_secs(30))
//!     .build()
//!     .await?;
//! # Ok(()) }
//! ```

pub mod builder;
pub mod provider;
pub mod provider_conversion;

pub use builder::*;
pub use provider::{Error, RobustProvider};
pub use provider_conversion::{IntoRobustProvider, IntoRootProvider};
