//! # dhcpsim
//!
//! A DHCP-style IP lease allocation simulator.
//!
//! ## Features
//!
//! - Bounded address pool with allocation, release, and time-based expiry
//! - One lease per client, enforced; exhaustion reported, never fatal
//! - Periodic background sweep reclaiming expired leases
//! - Failure injection that disconnects a random active client
//! - Append-only textual audit trail of every state transition
//! - CSV export of the active lease table
//! - Pluggable address/victim selection (random or deterministic)
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dhcpsim::{Config, FileAuditSink, LeasePool, RandomSelector};
//!
//! #[tokio::main]
//! async fn main() -> dhcpsim::Result<()> {
//!     let config = Arc::new(Config::load_or_create("config.json")?);
//!     let audit = Arc::new(FileAuditSink::new(&config.audit_log));
//!     let pool = Arc::new(LeasePool::new(
//!         Arc::clone(&config),
//!         Box::new(RandomSelector::new()),
//!         audit,
//!     ));
//!
//!     let sweeper = dhcpsim::spawn_sweeper(Arc::clone(&pool), config.sweep_interval());
//!     let lease = pool.allocate("Device_1").await?;
//!     println!("{} -> {}", lease.client_id, lease.address);
//!     sweeper.abort();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`Config`] - Pool range, lease duration, sweep cadence, audit log path
//! - [`LeasePool`] - Thread-safe allocation engine and lease registry
//! - [`AuditSink`] - Append-only destination for audit events
//! - [`AddressSelector`] - Selection policy for allocation and failure injection
//! - [`report`] - CSV export of the active lease table
//! - [`spawn_sweeper`](sweep::spawn_sweeper) - Periodic expiry sweep task

pub mod audit;
pub mod config;
pub mod error;
pub mod lease;
pub mod report;
pub mod select;
pub mod sweep;

pub use audit::{AuditEvent, AuditKind, AuditSink, FileAuditSink, MemoryAuditSink};
pub use config::Config;
pub use error::{Error, Result};
pub use lease::{ActiveLease, Lease, LeasePool};
pub use select::{AddressSelector, LowestFirst, RandomSelector};
pub use sweep::spawn_sweeper;
