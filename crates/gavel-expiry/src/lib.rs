//! Auction expiry scheduling.
//!
//! Guarantees that an auction's status moves from `active` to `completed`
//! once its bidding window elapses, with no external trigger. Two
//! independent paths converge on the same conditional store update:
//!
//! * a one-shot timer armed at creation time ([`registry::TimerRegistry`]),
//!   the low-latency fast path;
//! * a periodic sweep ([`sweeper::ExpirySweeper`]) that re-derives "should
//!   be closed" from persisted state and recovers auctions whose timer was
//!   lost (process restart, registration failure, clock drift).
//!
//! Because the close is a compare-and-set on the persisted status
//! ([`executor::CloseExecutor`]), the two paths commute and double-firing
//! is harmless.

pub mod executor;
pub mod policy;
pub mod registry;
pub mod service;
pub mod sweeper;

pub use executor::{CloseExecutor, CloseOutcome};
pub use policy::auction_duration;
pub use registry::TimerRegistry;
pub use service::{AuctionService, MonitorHandle, ServiceError};
pub use sweeper::ExpirySweeper;
