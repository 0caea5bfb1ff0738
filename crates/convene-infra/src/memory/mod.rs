//! In-memory repositories.
//!
//! Map-backed stores behind `tokio::sync::RwLock`, cloneable via a shared
//! `Arc` so services holding separate clones see the same data. Ids are
//! assigned from per-entity monotonic counters.

mod meeting;
mod user;
mod vote;

pub use meeting::InMemoryMeetingRepository;
pub use user::InMemoryUserRepository;
pub use vote::InMemoryVoteRepository;
