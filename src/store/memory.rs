use super::{RoundTxn, SessionStore, SessionTxn, StoreEvent};
use crate::error::{GameError, GameResult};
use crate::types::{Round, Session, SessionId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// In-process store used by tests and local hot-seat play.
///
/// Documents live behind `RwLock`s; transactions run their closure while
/// holding the write lock, which is what makes concurrent image appends
/// safe. Every committed write broadcasts the fresh snapshot.
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    rounds: RwLock<HashMap<(SessionId, u32), Round>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            sessions: RwLock::new(HashMap::new()),
            rounds: RwLock::new(HashMap::new()),
            events: tx,
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No receivers connected is fine.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: Session) -> GameResult<()> {
        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        self.emit(StoreEvent::SessionChanged(snapshot));
        Ok(())
    }

    async fn get_session(&self, id: &str) -> GameResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))
    }

    async fn find_by_room_code(&self, code: &str) -> GameResult<Vec<Session>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_expired && s.room_code == code)
            .cloned()
            .collect())
    }

    async fn update_session(&self, id: &str, txn: SessionTxn) -> GameResult<Session> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let current = sessions
                .get_mut(id)
                .ok_or_else(|| GameError::UnknownSession(id.to_string()))?;

            // Transaction semantics: mutate a copy, commit only on Ok.
            let mut next = current.clone();
            txn(&mut next)?;
            *current = next.clone();
            next
        };

        self.emit(StoreEvent::SessionChanged(snapshot.clone()));
        Ok(snapshot)
    }

    async fn insert_round(&self, session_id: &str, round: Round) -> GameResult<()> {
        let snapshot = {
            let mut rounds = self.rounds.write().await;
            let entry = rounds
                .entry((session_id.to_string(), round.index))
                .or_insert(round);
            entry.clone()
        };

        self.emit(StoreEvent::RoundChanged(session_id.to_string(), snapshot));
        Ok(())
    }

    async fn get_round(&self, session_id: &str, index: u32) -> GameResult<Round> {
        self.rounds
            .read()
            .await
            .get(&(session_id.to_string(), index))
            .cloned()
            .ok_or(GameError::UnknownRound(index))
    }

    async fn update_round(
        &self,
        session_id: &str,
        index: u32,
        txn: RoundTxn,
    ) -> GameResult<Round> {
        let snapshot = {
            let mut rounds = self.rounds.write().await;
            let current = rounds
                .get_mut(&(session_id.to_string(), index))
                .ok_or(GameError::UnknownRound(index))?;

            let mut next = current.clone();
            txn(&mut next)?;
            *current = next.clone();
            next
        };

        self.emit(StoreEvent::RoundChanged(
            session_id.to_string(),
            snapshot.clone(),
        ));
        Ok(snapshot)
    }

    async fn delete_session(&self, id: &str) -> GameResult<()> {
        self.sessions.write().await.remove(id);
        self.rounds
            .write()
            .await
            .retain(|(session_id, _), _| session_id != id);
        self.emit(StoreEvent::SessionDeleted(id.to_string()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
