//! Security checks applied during and after extraction.

pub mod filter;
pub mod quota;
pub mod sweep;

pub use filter::MemberFilter;
pub use filter::Rejection;
pub use quota::QuotaTracker;
pub use sweep::SweepOutcome;
pub use sweep::sweep_tree;
