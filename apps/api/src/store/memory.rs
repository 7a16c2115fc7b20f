//! In-memory store used by the test suite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::person::{NewPerson, PersonRecord};
use crate::models::session::Session;
use crate::store::{
    GroupCount, GroupField, PersonStore, PlacedPerson, PlacementScope, SessionStore, StoreQuery,
};

#[derive(Default)]
pub struct MemoryStore {
    /// Records in insertion order.
    people: Mutex<Vec<PersonRecord>>,
    sessions: Mutex<BTreeMap<Uuid, Session>>,
    /// When set, every call fails as an unavailable store would.
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn unavailable() -> Self {
        MemoryStore {
            unavailable: true,
            ..MemoryStore::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            Err(anyhow!("store unavailable"))
        } else {
            Ok(())
        }
    }

    fn in_scope(record: &PersonRecord, scope: &PlacementScope) -> bool {
        record.fields.placed && scope.sector.map_or(true, |s| record.fields.sector == Some(s))
    }

    /// Newest first; equal timestamps fall back to reverse insertion order.
    fn newest_first(records: &[PersonRecord]) -> Vec<PersonRecord> {
        let mut out: Vec<PersonRecord> = records.iter().rev().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    async fn create(&self, person: NewPerson, created_at: DateTime<Utc>) -> Result<PersonRecord> {
        self.check()?;
        let record = PersonRecord::from_new(Uuid::new_v4(), person, created_at);
        self.people
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?
            .push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PersonRecord>> {
        self.check()?;
        let people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(people.iter().find(|p| p.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        person: NewPerson,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PersonRecord>> {
        self.check()?;
        let mut people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let Some(existing) = people.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let mut replaced = PersonRecord::from_new(id, person, existing.created_at);
        replaced.updated_at = updated_at;
        *existing = replaced.clone();
        Ok(Some(replaced))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.check()?;
        let mut people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let before = people.len();
        people.retain(|p| p.id != id);
        Ok(people.len() < before)
    }

    async fn list(&self, query: &StoreQuery) -> Result<Vec<PersonRecord>> {
        self.check()?;
        let people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let matching: Vec<PersonRecord> = people
            .iter()
            .filter(|p| {
                query
                    .has_disability
                    .map_or(true, |flag| p.fields.has_disability == flag)
            })
            .filter(|p| {
                query.education_level.map_or(true, |level| {
                    p.education.as_ref().map(|e| e.level) == Some(level)
                })
            })
            .cloned()
            .collect();
        Ok(Self::newest_first(&matching))
    }

    async fn list_placed(&self, scope: &PlacementScope) -> Result<Vec<PlacedPerson>> {
        self.check()?;
        let people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let placed: Vec<PersonRecord> = people
            .iter()
            .filter(|p| Self::in_scope(p, scope))
            .cloned()
            .collect();
        Ok(Self::newest_first(&placed)
            .into_iter()
            .map(|p| PlacedPerson {
                id: p.id,
                name: p.fields.name,
                surnames: p.fields.surnames,
                sector: p.fields.sector,
                company: p.fields.company,
            })
            .collect())
    }

    async fn count_placed_by(
        &self,
        field: GroupField,
        scope: &PlacementScope,
    ) -> Result<Vec<GroupCount>> {
        self.check()?;
        let people = self.people.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut counts: Vec<GroupCount> = Vec::new();
        for p in people.iter().filter(|p| Self::in_scope(p, scope)) {
            let key = match field {
                GroupField::Sector => p.fields.sector.map(|s| s.as_str().to_string()),
                GroupField::Company => p.fields.company.clone(),
            };
            match counts.iter_mut().find(|c| c.key == key) {
                Some(entry) => entry.count += 1,
                None => counts.push(GroupCount { key, count: 1 }),
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        self.check()?;
        self.sessions
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?
            .insert(session.token, session.clone());
        Ok(())
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>> {
        self.check()?;
        let sessions = self.sessions.lock().map_err(|_| anyhow!("session lock poisoned"))?;
        Ok(sessions.get(&token).cloned())
    }

    async fn delete_session(&self, token: Uuid) -> Result<bool> {
        self.check()?;
        let mut sessions = self.sessions.lock().map_err(|_| anyhow!("session lock poisoned"))?;
        Ok(sessions.remove(&token).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.check()?;
        let mut sessions = self.sessions.lock().map_err(|_| anyhow!("session lock poisoned"))?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
