use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::person::{
    ComplementaryCourse, EducationProfile, IncomeMember, NewPerson, PersonFields, PersonRecord,
    Sector, SocioEconomicProfile,
};
use crate::models::session::Session;
use crate::store::{
    GroupCount, GroupField, PersonStore, PlacedPerson, PlacementScope, SessionStore, StoreQuery,
};

/// PostgreSQL-backed record and session store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Read-only transaction with one snapshot for a parent row and its sub-records.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct PersonRow {
    id: Uuid,
    name: String,
    surnames: String,
    birth_date: NaiveDate,
    nationality: String,
    identity_document: String,
    social_security_number: Option<String>,
    sex: String,
    address: String,
    locality: String,
    postal_code: Option<String>,
    phone1: Option<String>,
    phone2: Option<String>,
    email: Option<String>,
    driving_license: bool,
    own_vehicle: bool,
    has_disability: bool,
    disability_percentage: Option<i32>,
    disability_type: Option<String>,
    referral_entity: Option<String>,
    referral_technician: Option<String>,
    collective: Option<String>,
    placed: bool,
    sector: Option<String>,
    company: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SocioEconomicRow {
    person_id: Uuid,
    family_composition: String,
    economic_situation: String,
    other_circumstances: Option<String>,
}

#[derive(Debug, FromRow)]
struct EducationRow {
    person_id: Uuid,
    level: String,
    completion_year: Option<i32>,
    specification: Option<String>,
    prior_experience: Option<String>,
}

#[derive(Debug, FromRow)]
struct IncomeMemberRow {
    person_id: Uuid,
    number: i32,
    kind: String,
    amount: f64,
}

#[derive(Debug, FromRow)]
struct CourseRow {
    person_id: Uuid,
    name: String,
    duration_hours: i32,
    entity: String,
    completed_on: NaiveDate,
}

#[derive(Debug, FromRow)]
struct PlacedRow {
    id: Uuid,
    name: String,
    surnames: String,
    sector: Option<String>,
    company: Option<String>,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    token: Uuid,
    username: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn parse_sector(raw: Option<String>) -> Result<Option<Sector>> {
    raw.map(|s| s.parse::<Sector>())
        .transpose()
        .context("stored sector is not a known sector")
}

impl PersonRow {
    fn into_fields(self) -> Result<(Uuid, PersonFields, DateTime<Utc>, DateTime<Utc>)> {
        let fields = PersonFields {
            sex: self
                .sex
                .parse()
                .with_context(|| format!("person {} has an unknown sex value", self.id))?,
            sector: parse_sector(self.sector)?,
            name: self.name,
            surnames: self.surnames,
            birth_date: self.birth_date,
            nationality: self.nationality,
            identity_document: self.identity_document,
            social_security_number: self.social_security_number,
            address: self.address,
            locality: self.locality,
            postal_code: self.postal_code,
            phone1: self.phone1,
            phone2: self.phone2,
            email: self.email,
            driving_license: self.driving_license,
            own_vehicle: self.own_vehicle,
            has_disability: self.has_disability,
            disability_percentage: self.disability_percentage,
            disability_type: self.disability_type,
            referral_entity: self.referral_entity,
            referral_technician: self.referral_technician,
            collective: self.collective,
            placed: self.placed,
            company: self.company,
        };
        Ok((self.id, fields, self.created_at, self.updated_at))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Fetches the nested sub-records for `rows` and assembles full records, keeping row order.
async fn attach_children(conn: &mut PgConnection, rows: Vec<PersonRow>) -> Result<Vec<PersonRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let socio: Vec<SocioEconomicRow> =
        sqlx::query_as("SELECT * FROM socio_economic_profiles WHERE person_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
    let education: Vec<EducationRow> =
        sqlx::query_as("SELECT * FROM education_profiles WHERE person_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;
    let members: Vec<IncomeMemberRow> = sqlx::query_as(
        "SELECT person_id, number, kind, amount FROM income_members \
         WHERE person_id = ANY($1) ORDER BY person_id, position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let courses: Vec<CourseRow> = sqlx::query_as(
        "SELECT person_id, name, duration_hours, entity, completed_on FROM complementary_courses \
         WHERE person_id = ANY($1) ORDER BY person_id, position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut socio_by_person: HashMap<Uuid, SocioEconomicProfile> = socio
        .into_iter()
        .map(|r| {
            (
                r.person_id,
                SocioEconomicProfile {
                    family_composition: r.family_composition,
                    economic_situation: r.economic_situation,
                    other_circumstances: r.other_circumstances,
                },
            )
        })
        .collect();

    let mut education_by_person = HashMap::new();
    for r in education {
        let level = r
            .level
            .parse()
            .with_context(|| format!("person {} has an unknown education level", r.person_id))?;
        education_by_person.insert(
            r.person_id,
            EducationProfile {
                level,
                completion_year: r.completion_year,
                specification: r.specification,
                prior_experience: r.prior_experience,
            },
        );
    }

    let mut members_by_person: HashMap<Uuid, Vec<IncomeMember>> = HashMap::new();
    for r in members {
        members_by_person
            .entry(r.person_id)
            .or_default()
            .push(IncomeMember {
                number: r.number,
                kind: r.kind,
                amount: r.amount,
            });
    }

    let mut courses_by_person: HashMap<Uuid, Vec<ComplementaryCourse>> = HashMap::new();
    for r in courses {
        courses_by_person
            .entry(r.person_id)
            .or_default()
            .push(ComplementaryCourse {
                name: r.name,
                duration_hours: r.duration_hours,
                entity: r.entity,
                completed_on: r.completed_on,
            });
    }

    rows.into_iter()
        .map(|row| {
            let (id, fields, created_at, updated_at) = row.into_fields()?;
            Ok(PersonRecord {
                id,
                fields,
                socio_economic: socio_by_person.remove(&id),
                education: education_by_person.remove(&id),
                income_members: members_by_person.remove(&id).unwrap_or_default(),
                courses: courses_by_person.remove(&id).unwrap_or_default(),
                created_at,
                updated_at,
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Writing
// ────────────────────────────────────────────────────────────────────────────

/// Inserts the nested blocks and lists of `person`. Callers clear old rows first on update.
async fn insert_children(conn: &mut PgConnection, id: Uuid, person: &NewPerson) -> Result<()> {
    if let Some(socio) = &person.socio_economic {
        sqlx::query(
            r#"
            INSERT INTO socio_economic_profiles
                (person_id, family_composition, economic_situation, other_circumstances)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&socio.family_composition)
        .bind(&socio.economic_situation)
        .bind(&socio.other_circumstances)
        .execute(&mut *conn)
        .await?;
    }

    if let Some(education) = &person.education {
        sqlx::query(
            r#"
            INSERT INTO education_profiles
                (person_id, level, completion_year, specification, prior_experience)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(education.level.as_str())
        .bind(education.completion_year)
        .bind(&education.specification)
        .bind(&education.prior_experience)
        .execute(&mut *conn)
        .await?;
    }

    for (position, member) in person.income_members.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO income_members (id, person_id, position, number, kind, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(position as i32)
        .bind(member.number)
        .bind(&member.kind)
        .bind(member.amount)
        .execute(&mut *conn)
        .await?;
    }

    for (position, course) in person.courses.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO complementary_courses
                (id, person_id, position, name, duration_hours, entity, completed_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(position as i32)
        .bind(&course.name)
        .bind(course.duration_hours)
        .bind(&course.entity)
        .bind(course.completed_on)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn clear_children(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    for table in [
        "socio_economic_profiles",
        "education_profiles",
        "income_members",
        "complementary_courses",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE person_id = $1"))
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PersonStore for PgStore {
    async fn create(&self, person: NewPerson, created_at: DateTime<Utc>) -> Result<PersonRecord> {
        let id = Uuid::new_v4();
        let f = &person.fields;
        // TIMESTAMPTZ keeps microseconds; the returned record must match what a read gives back.
        let created_at = created_at.trunc_subsecs(6);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO persons
                (id, name, surnames, birth_date, nationality, identity_document,
                 social_security_number, sex, address, locality, postal_code, phone1, phone2,
                 email, driving_license, own_vehicle, has_disability, disability_percentage,
                 disability_type, referral_entity, referral_technician, collective, placed,
                 sector, company, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $26)
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(&f.surnames)
        .bind(f.birth_date)
        .bind(&f.nationality)
        .bind(&f.identity_document)
        .bind(&f.social_security_number)
        .bind(f.sex.as_str())
        .bind(&f.address)
        .bind(&f.locality)
        .bind(&f.postal_code)
        .bind(&f.phone1)
        .bind(&f.phone2)
        .bind(&f.email)
        .bind(f.driving_license)
        .bind(f.own_vehicle)
        .bind(f.has_disability)
        .bind(f.disability_percentage)
        .bind(&f.disability_type)
        .bind(&f.referral_entity)
        .bind(&f.referral_technician)
        .bind(&f.collective)
        .bind(f.placed)
        .bind(f.sector.map(|s| s.as_str()))
        .bind(&f.company)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        insert_children(&mut *tx, id, &person).await?;
        tx.commit().await?;

        info!(person_id = %id, "Created person record");
        Ok(PersonRecord::from_new(id, person, created_at))
    }

    async fn get(&self, id: Uuid) -> Result<Option<PersonRecord>> {
        let mut tx = self.begin_snapshot().await?;
        let row: Option<PersonRow> = sqlx::query_as("SELECT * FROM persons WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let record = match row {
            Some(row) => attach_children(&mut *tx, vec![row]).await?.pop(),
            None => None,
        };
        tx.commit().await?;
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        person: NewPerson,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<PersonRecord>> {
        let updated_at = updated_at.trunc_subsecs(6);
        let f = &person.fields;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE persons SET
                name = $2, surnames = $3, birth_date = $4, nationality = $5,
                identity_document = $6, social_security_number = $7, sex = $8, address = $9,
                locality = $10, postal_code = $11, phone1 = $12, phone2 = $13, email = $14,
                driving_license = $15, own_vehicle = $16, has_disability = $17,
                disability_percentage = $18, disability_type = $19, referral_entity = $20,
                referral_technician = $21, collective = $22, placed = $23, sector = $24,
                company = $25, updated_at = $26
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(&f.surnames)
        .bind(f.birth_date)
        .bind(&f.nationality)
        .bind(&f.identity_document)
        .bind(&f.social_security_number)
        .bind(f.sex.as_str())
        .bind(&f.address)
        .bind(&f.locality)
        .bind(&f.postal_code)
        .bind(&f.phone1)
        .bind(&f.phone2)
        .bind(&f.email)
        .bind(f.driving_license)
        .bind(f.own_vehicle)
        .bind(f.has_disability)
        .bind(f.disability_percentage)
        .bind(&f.disability_type)
        .bind(&f.referral_entity)
        .bind(&f.referral_technician)
        .bind(&f.collective)
        .bind(f.placed)
        .bind(f.sector.map(|s| s.as_str()))
        .bind(&f.company)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        clear_children(&mut *tx, id).await?;
        insert_children(&mut *tx, id, &person).await?;
        tx.commit().await?;

        info!(person_id = %id, "Replaced person record");
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Sub-records go through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &StoreQuery) -> Result<Vec<PersonRecord>> {
        let mut tx = self.begin_snapshot().await?;
        let rows: Vec<PersonRow> = sqlx::query_as(
            r#"
            SELECT p.*
            FROM persons p
            LEFT JOIN education_profiles e ON e.person_id = p.id
            WHERE ($1::BOOLEAN IS NULL OR p.has_disability = $1)
              AND ($2::TEXT IS NULL OR e.level = $2)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(query.has_disability)
        .bind(query.education_level.map(|l| l.as_str()))
        .fetch_all(&mut *tx)
        .await?;

        debug!(rows = rows.len(), "Loaded person rows");
        let records = attach_children(&mut *tx, rows).await?;
        tx.commit().await?;
        Ok(records)
    }

    async fn list_placed(&self, scope: &PlacementScope) -> Result<Vec<PlacedPerson>> {
        let rows: Vec<PlacedRow> = sqlx::query_as(
            r#"
            SELECT id, name, surnames, sector, company
            FROM persons
            WHERE placed = TRUE AND ($1::TEXT IS NULL OR sector = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.sector.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(PlacedPerson {
                    id: r.id,
                    name: r.name,
                    surnames: r.surnames,
                    sector: parse_sector(r.sector)?,
                    company: r.company,
                })
            })
            .collect()
    }

    async fn count_placed_by(
        &self,
        field: GroupField,
        scope: &PlacementScope,
    ) -> Result<Vec<GroupCount>> {
        let column = field.column();
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM persons \
             WHERE placed = TRUE AND ($1::TEXT IS NULL OR sector = $1) \
             GROUP BY {column}"
        );
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(&sql)
            .bind(scope.sector.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, username, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.token)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Session {
            token: r.token,
            username: r.username,
            created_at: r.created_at,
            expires_at: r.expires_at,
        }))
    }

    async fn delete_session(&self, token: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
