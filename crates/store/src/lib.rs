//! Versioned state store, namespaced views, and the live (non-versioned)
//! store, layered on top of `agentrt-kv`'s byte-level backends.
//!
//! - [`commit::Commit`] / [`versioned::VersionedStore`] — the
//! content-addressed, copy-on-write commit graph.
//! - [`namespaced::NamespacedView`] — per-agent key-prefix isolation over a
//! fixed commit.
//! - [`session::VersionedSession`] — the mutable "current commit" cursor the
//! agent loop drives in Versioned mode.
//! - [`live::LiveStore`] — the non-versioned in-process map used when a
//! task opts out of persistence.
//! - [`mode::StateHandle`] — the mode-agnostic facade ("all three modes are
//! drop-in interchangeable at the store boundary") that the sandbox and
//! agent crates program against.

pub mod commit;
pub mod error;
pub mod live;
pub mod mode;
pub mod namespaced;
pub mod session;
pub mod versioned;

pub use commit::Commit;
pub use error::StoreError;
pub use live::LiveStore;
pub use mode::StateHandle;
pub use namespaced::NamespacedView;
pub use session::VersionedSession;
pub use versioned::VersionedStore;
