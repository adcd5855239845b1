//! Lease pool management.
//!
//! This module is the allocation engine: it owns the partition of the
//! configured address range into free and leased addresses, the registry of
//! active leases, and the time-based expiry transition. It implements:
//!
//! - Address allocation from the free pool via a pluggable selection policy
//! - Lease release and idempotent reclamation
//! - The expiry sweep that reclaims leases past their deadline
//! - Failure injection that disconnects a randomly chosen client
//! - Read-only queries (remaining TTL, active lease listing, pool counts)
//!
//! # Thread Safety
//!
//! All operations are thread-safe. [`LeasePool`] guards its state with a
//! single [`RwLock`]: mutations take the write lock so the free set and the
//! registry always change together, queries take the read lock and observe
//! a consistent snapshot. Audit events are emitted only after the lock is
//! dropped, so no I/O happens inside the critical section.

use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditKind, AuditSink};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::select::AddressSelector;

/// An active lease binding a client to an address until a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// The client holding this lease.
    pub client_id: String,

    /// The address assigned to the client.
    pub address: Ipv4Addr,

    /// When this lease expires (UTC). Renewal, if ever added, only has to
    /// push this deadline forward.
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    /// Creates a lease expiring `duration_seconds` from now.
    pub fn new(client_id: String, address: Ipv4Addr, duration_seconds: u32) -> Self {
        Self {
            client_id,
            address,
            expires_at: Utc::now() + TimeDelta::seconds(i64::from(duration_seconds)),
        }
    }

    /// Returns true if the lease deadline has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whole seconds remaining until expiry at `now`, clamped to zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// A snapshot row of one active lease, as consumed by reports and UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLease {
    /// The client holding the lease.
    pub client_id: String,

    /// The leased address.
    pub address: Ipv4Addr,

    /// Seconds until expiry at snapshot time, clamped to zero.
    pub remaining_seconds: i64,
}

/// Internal mutable state protected by the pool's RwLock.
///
/// Invariant: `free_ips` and the addresses held in `leases` are disjoint
/// and together cover the configured range exactly.
struct InternalState {
    /// Available addresses (sorted, so deterministic selectors see a stable
    /// candidate order).
    free_ips: BTreeSet<Ipv4Addr>,
    /// Active leases indexed by client ID.
    leases: HashMap<String, Lease>,
    /// Selection policy for allocation and failure injection.
    selector: Box<dyn AddressSelector>,
}

impl InternalState {
    /// Picks one free address using the selection policy, or `None` when
    /// the pool is exhausted. The address stays in the free set.
    fn pick_free(&mut self) -> Option<Ipv4Addr> {
        if self.free_ips.is_empty() {
            return None;
        }
        let index = self.selector.pick(self.free_ips.len());
        self.free_ips.iter().nth(index).copied()
    }

    /// Removes one lease and returns its address to the free set.
    fn reclaim(&mut self, client_id: &str) -> Option<Lease> {
        let lease = self.leases.remove(client_id)?;
        self.free_ips.insert(lease.address);
        Some(lease)
    }
}

/// Thread-safe lease allocation engine.
///
/// Hands out addresses from a bounded pool, tracks per-lease expiry, and
/// reclaims addresses on release, expiry, or injected failure. Every
/// mutation emits an [`AuditEvent`] to the injected sink.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dhcpsim::{Config, FileAuditSink, LeasePool, RandomSelector};
///
/// # async fn example() -> dhcpsim::Result<()> {
/// let config = Arc::new(Config::default());
/// let audit = Arc::new(FileAuditSink::new(&config.audit_log));
/// let pool = LeasePool::new(config, Box::new(RandomSelector::new()), audit);
///
/// let lease = pool.allocate("Device_1").await?;
/// pool.release("Device_1").await?;
/// # let _ = lease;
/// # Ok(())
/// # }
/// ```
pub struct LeasePool {
    state: Arc<RwLock<InternalState>>,
    config: Arc<Config>,
    audit: Arc<dyn AuditSink>,
}

impl LeasePool {
    /// Creates a pool covering `config.pool_start..=config.pool_end`, with
    /// every address initially free.
    pub fn new(
        config: Arc<Config>,
        selector: Box<dyn AddressSelector>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let mut free_ips = BTreeSet::new();
        let start = u32::from(config.pool_start);
        let end = u32::from(config.pool_end);
        for ip_num in start..=end {
            free_ips.insert(Ipv4Addr::from(ip_num));
        }

        let state = InternalState {
            free_ips,
            leases: HashMap::new(),
            selector,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            config,
            audit,
        }
    }

    /// Allocates an address for a client.
    ///
    /// The selection policy picks one address from the free set; the lease
    /// expires `lease_duration_seconds` from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyLeased`] if the client is still in the
    /// registry (an expired lease counts until the sweep reclaims it), and
    /// [`Error::PoolExhausted`] if no address is free. Neither failure
    /// mutates state.
    pub async fn allocate(&self, client_id: &str) -> Result<Lease> {
        let lease = {
            let mut state = self.state.write().await;

            if state.leases.contains_key(client_id) {
                return Err(Error::AlreadyLeased(client_id.to_string()));
            }

            let Some(address) = state.pick_free() else {
                return Err(Error::PoolExhausted);
            };

            let lease = Lease::new(
                client_id.to_string(),
                address,
                self.config.lease_duration_seconds,
            );
            state.free_ips.remove(&address);
            state.leases.insert(client_id.to_string(), lease.clone());
            lease
        };

        self.record(AuditEvent::new(
            AuditKind::Assigned,
            &*lease.client_id,
            lease.address,
        ));
        Ok(lease)
    }

    /// Releases a client's lease, returning the freed address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchLease`] if the client holds no lease. The
    /// call is idempotent: a second release fails with `NoSuchLease` and
    /// leaves state untouched.
    pub async fn release(&self, client_id: &str) -> Result<Ipv4Addr> {
        let address = {
            let mut state = self.state.write().await;
            let lease = state
                .reclaim(client_id)
                .ok_or_else(|| Error::NoSuchLease(client_id.to_string()))?;
            lease.address
        };

        self.record(AuditEvent::new(AuditKind::Released, client_id, address));
        Ok(address)
    }

    /// Reclaims every lease with `expires_at <= now`.
    ///
    /// Returns the reclaimed `(client, address)` pairs, sorted by client ID.
    /// Finding nothing to reclaim yields an empty list. The whole scan and
    /// reclamation happen under one write lock, so concurrent sweeps or
    /// releases can never return the same address to the pool twice.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Vec<(String, Ipv4Addr)> {
        let reclaimed = {
            let mut state = self.state.write().await;

            let mut expired: Vec<String> = state
                .leases
                .values()
                .filter(|lease| lease.is_expired(now))
                .map(|lease| lease.client_id.clone())
                .collect();
            expired.sort();

            let mut reclaimed = Vec::with_capacity(expired.len());
            for client_id in expired {
                if let Some(lease) = state.reclaim(&client_id) {
                    reclaimed.push((client_id, lease.address));
                }
            }
            reclaimed
        };

        for (client_id, address) in &reclaimed {
            self.record(AuditEvent::new(AuditKind::Expired, &**client_id, *address));
        }
        reclaimed
    }

    /// Disconnects one active client, chosen by the selection policy.
    ///
    /// The effect is the same as [`release`](Self::release) but the audit
    /// event is tagged `forced-failure`, so injected churn stays
    /// distinguishable from expiry and explicit release in the trail.
    /// Returns `None` when no lease is active.
    pub async fn force_release(&self) -> Option<(String, Ipv4Addr)> {
        let (client_id, address) = {
            let mut state = self.state.write().await;

            if state.leases.is_empty() {
                return None;
            }

            let mut candidates: Vec<String> = state.leases.keys().cloned().collect();
            candidates.sort();
            let index = state.selector.pick(candidates.len());
            let victim = candidates.swap_remove(index);

            let lease = state.reclaim(&victim)?;
            (victim, lease.address)
        };

        self.record(AuditEvent::new(
            AuditKind::ForcedFailure,
            &*client_id,
            address,
        ));
        Some((client_id, address))
    }

    /// Seconds until the client's lease expires at `now`.
    ///
    /// Clamped to zero for a lease that has expired but not yet been swept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchLease`] if the client holds no lease.
    pub async fn remaining_ttl(&self, client_id: &str, now: DateTime<Utc>) -> Result<i64> {
        let state = self.state.read().await;
        state
            .leases
            .get(client_id)
            .map(|lease| lease.remaining_seconds(now))
            .ok_or_else(|| Error::NoSuchLease(client_id.to_string()))
    }

    /// Returns the lease for a client, if one exists.
    pub async fn get_lease(&self, client_id: &str) -> Option<Lease> {
        let state = self.state.read().await;
        state.leases.get(client_id).cloned()
    }

    /// Snapshot of all active leases with their remaining TTL at `now`,
    /// sorted by client ID.
    pub async fn list_active(&self, now: DateTime<Utc>) -> Vec<ActiveLease> {
        let state = self.state.read().await;
        let mut active: Vec<ActiveLease> = state
            .leases
            .values()
            .map(|lease| ActiveLease {
                client_id: lease.client_id.clone(),
                address: lease.address,
                remaining_seconds: lease.remaining_seconds(now),
            })
            .collect();
        active.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        active
    }

    /// Number of leases currently in the registry.
    pub async fn active_lease_count(&self) -> usize {
        let state = self.state.read().await;
        state.leases.len()
    }

    /// Number of addresses currently free.
    pub async fn free_ip_count(&self) -> usize {
        let state = self.state.read().await;
        state.free_ips.len()
    }

    /// The free addresses, in ascending order.
    pub async fn free_addresses(&self) -> Vec<Ipv4Addr> {
        let state = self.state.read().await;
        state.free_ips.iter().copied().collect()
    }

    /// Mirrors the event into the log and hands it to the audit sink.
    ///
    /// Called with the state lock already dropped. A sink failure is
    /// reported but never rolls back the committed transition.
    fn record(&self, event: AuditEvent) {
        info!("{}", event.message());
        if let Err(error) = self.audit.emit(&event) {
            warn!("Failed to record audit event: {}", error);
        }
    }
}
