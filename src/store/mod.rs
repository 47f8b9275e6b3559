//! Document-store boundary.
//!
//! Clients share no process memory; the store is the single source of
//! truth. The trait mirrors the subset of a remote document store the game
//! needs: point reads, create, and atomic read-modify-write transactions.
//! Array appends (image submissions) happen inside those transactions, so
//! two clients submitting at once can never clobber each other's entry.
//!
//! Change notification is a broadcast of full-document snapshots;
//! subscribers recompute the phase from each snapshot rather than trusting
//! any incremental signal.

mod memory;

pub use memory::MemoryStore;

use crate::error::GameResult;
use crate::types::{Round, Session, SessionId};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// A change to a stored document, broadcast to all subscribers including
/// the writer.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    SessionChanged(Session),
    RoundChanged(SessionId, Round),
    SessionDeleted(SessionId),
}

/// Transaction body applied to a session document. Runs against a copy of
/// the current document; the copy replaces the original only on `Ok`.
pub type SessionTxn = Box<dyn FnOnce(&mut Session) -> GameResult<()> + Send>;

/// Transaction body applied to a round document.
pub type RoundTxn = Box<dyn FnOnce(&mut Round) -> GameResult<()> + Send>;

/// Storage for session and round documents.
///
/// Implementations must make `update_session`/`update_round` atomic with
/// respect to each other per document, and must deliver a snapshot event
/// for every committed write.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: Session) -> GameResult<()>;

    async fn get_session(&self, id: &str) -> GameResult<Session>;

    /// All non-expired sessions carrying this room code. More than one
    /// match is a data-integrity condition the caller must surface.
    async fn find_by_room_code(&self, code: &str) -> GameResult<Vec<Session>>;

    /// Atomically transform the session document. The closure sees the
    /// current document and either commits a full replacement or aborts
    /// with an error, leaving the document untouched.
    async fn update_session(&self, id: &str, txn: SessionTxn) -> GameResult<Session>;

    /// Create a round document if it does not already exist. A concurrent
    /// creator winning the race is not an error; the stored round stays.
    async fn insert_round(&self, session_id: &str, round: Round) -> GameResult<()>;

    async fn get_round(&self, session_id: &str, index: u32) -> GameResult<Round>;

    /// Atomically transform a round document, same contract as
    /// [`SessionStore::update_session`].
    async fn update_round(&self, session_id: &str, index: u32, txn: RoundTxn)
        -> GameResult<Round>;

    async fn delete_session(&self, id: &str) -> GameResult<()>;

    /// Subscribe to document snapshots. Dropping the receiver unsubscribes;
    /// no background work continues for an unsubscribed client.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
