//! Record store seam.
//!
//! Handlers only see the [`PersonStore`] and [`SessionStore`] traits. Production wires
//! [`postgres::PgStore`]; the test suite runs the same handlers against an in-memory store.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::person::{EducationLevel, NewPerson, PersonRecord, Sector};
use crate::models::session::Session;

/// Exact-match criteria pushed down to the store. Free-text criteria are applied afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub has_disability: Option<bool>,
    pub education_level: Option<EducationLevel>,
}

/// Restricts placement statistics to placed records, optionally of one sector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlacementScope {
    pub sector: Option<Sector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Sector,
    Company,
}

impl GroupField {
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Sector => "sector",
            GroupField::Company => "company",
        }
    }
}

/// One row of a group-by-with-count query. `key` is `None` for records without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: i64,
}

/// Projection of a placed record used by the statistics view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacedPerson {
    pub id: Uuid,
    pub name: String,
    pub surnames: String,
    pub sector: Option<Sector>,
    pub company: Option<String>,
}

#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Inserts a record with all nested sub-records in one write.
    async fn create(&self, person: NewPerson, created_at: DateTime<Utc>) -> Result<PersonRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<PersonRecord>>;

    /// Replaces every scalar field and nested block. `None` when the record does not exist.
    async fn update(
        &self,
        id: Uuid,
        person: NewPerson,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PersonRecord>>;

    /// Deletes the record and its sub-records. `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Records matching `query`, most recently created first, sub-records attached.
    async fn list(&self, query: &StoreQuery) -> Result<Vec<PersonRecord>>;

    /// Placed records within `scope`, most recently created first.
    async fn list_placed(&self, scope: &PlacementScope) -> Result<Vec<PlacedPerson>>;

    /// Counts placed records within `scope` grouped by `field`, in no particular order.
    async fn count_placed_by(
        &self,
        field: GroupField,
        scope: &PlacementScope,
    ) -> Result<Vec<GroupCount>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<()>;

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>>;

    async fn delete_session(&self, token: Uuid) -> Result<bool>;

    /// Removes sessions that expired at or before `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
