//! Intake payloads and their validation into a [`NewPerson`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::person::{
    ComplementaryCourse, EducationLevel, EducationProfile, IncomeMember, NewPerson, PersonFields,
    Sector, Sex, SocioEconomicProfile,
};
use crate::people::age::parse_calendar_date;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonInput {
    pub name: String,
    pub surnames: String,
    pub birth_date: String,
    pub nationality: String,
    pub identity_document: String,
    pub social_security_number: Option<String>,
    pub sex: Sex,
    pub address: String,
    pub locality: String,
    pub postal_code: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub driving_license: bool,
    #[serde(default)]
    pub own_vehicle: bool,
    #[serde(default)]
    pub has_disability: bool,
    pub disability_percentage: Option<i32>,
    pub disability_type: Option<String>,
    pub referral_entity: Option<String>,
    pub referral_technician: Option<String>,
    pub collective: Option<String>,
    #[serde(default)]
    pub placed: bool,
    pub sector: Option<Sector>,
    pub company: Option<String>,
    pub socio_economic: Option<SocioEconomicInput>,
    pub education: Option<EducationInput>,
    #[serde(default)]
    pub income_members: Vec<IncomeMemberInput>,
    #[serde(default)]
    pub courses: Vec<CourseInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocioEconomicInput {
    pub family_composition: String,
    pub economic_situation: String,
    pub other_circumstances: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EducationInput {
    pub level: EducationLevel,
    pub completion_year: Option<i32>,
    pub specification: Option<String>,
    pub prior_experience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomeMemberInput {
    pub number: i32,
    pub kind: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseInput {
    pub name: String,
    pub duration_hours: i32,
    pub entity: String,
    pub completed_on: String,
}

/// Collects every violation so the caseworker sees them all at once.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn required(&mut self, field: &str, value: String) -> String {
        let value = value.trim().to_string();
        if value.is_empty() {
            self.0.push(format!("{field} is required"));
        }
        value
    }

    fn date(&mut self, field: &str, raw: &str) -> Option<NaiveDate> {
        let parsed = parse_calendar_date(raw);
        if parsed.is_none() {
            self.0.push(format!("{field} must be a valid YYYY-MM-DD date"));
        }
        parsed
    }

    fn check(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(message());
        }
    }
}

/// Trims optional text and drops blank values.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Validates and normalises an intake payload. `today` bounds birth dates and years.
pub fn validate_person(input: PersonInput, today: NaiveDate) -> Result<NewPerson, AppError> {
    let mut v = Violations::default();

    let name = v.required("name", input.name);
    let surnames = v.required("surnames", input.surnames);
    let nationality = v.required("nationality", input.nationality);
    let identity_document = v.required("identity_document", input.identity_document);
    let address = v.required("address", input.address);
    let locality = v.required("locality", input.locality);

    let birth_date = v.date("birth_date", &input.birth_date);
    if let Some(birth) = birth_date {
        v.check(birth <= today, || "birth_date cannot be in the future".to_string());
    }

    let email = clean(input.email);
    if let Some(email) = &email {
        v.check(looks_like_email(email), || {
            format!("email '{email}' is not a valid address")
        });
    }

    let has_disability = input.has_disability;
    let disability_percentage = input.disability_percentage.filter(|_| has_disability);
    if let Some(pct) = disability_percentage {
        v.check((0..=100).contains(&pct), || {
            "disability_percentage must be between 0 and 100".to_string()
        });
    }
    let disability_detail = |value: Option<String>| clean(value).filter(|_| has_disability);

    let placed = input.placed;

    let socio_economic = input.socio_economic.map(|s| SocioEconomicProfile {
        family_composition: v.required("socio_economic.family_composition", s.family_composition),
        economic_situation: v.required("socio_economic.economic_situation", s.economic_situation),
        other_circumstances: clean(s.other_circumstances),
    });

    let education = input.education.map(|e| {
        if let Some(year) = e.completion_year {
            v.check((1900..=today.year()).contains(&year), || {
                format!("education.completion_year {year} is out of range")
            });
        }
        EducationProfile {
            level: e.level,
            completion_year: e.completion_year,
            specification: clean(e.specification).filter(|_| e.level.accepts_specification()),
            prior_experience: clean(e.prior_experience),
        }
    });

    let income_members = input
        .income_members
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            v.check(m.number >= 1, || {
                format!("income_members[{i}].number must be at least 1")
            });
            v.check(m.amount.is_finite() && m.amount >= 0.0, || {
                format!("income_members[{i}].amount must be a non-negative amount")
            });
            IncomeMember {
                number: m.number,
                kind: v.required(&format!("income_members[{i}].kind"), m.kind),
                amount: m.amount,
            }
        })
        .collect();

    let mut courses = Vec::new();
    for (i, c) in input.courses.into_iter().enumerate() {
        v.check(c.duration_hours >= 1, || {
            format!("courses[{i}].duration_hours must be at least 1")
        });
        let completed_on = v.date(&format!("courses[{i}].completed_on"), &c.completed_on);
        let course = ComplementaryCourse {
            name: v.required(&format!("courses[{i}].name"), c.name),
            duration_hours: c.duration_hours,
            entity: v.required(&format!("courses[{i}].entity"), c.entity),
            completed_on: completed_on.unwrap_or(NaiveDate::MIN),
        };
        courses.push(course);
    }

    let (Some(birth_date), true) = (birth_date, v.0.is_empty()) else {
        return Err(AppError::Validation(v.0.join("; ")));
    };

    Ok(NewPerson {
        fields: PersonFields {
            name,
            surnames,
            birth_date,
            nationality,
            identity_document,
            social_security_number: clean(input.social_security_number),
            sex: input.sex,
            address,
            locality,
            postal_code: clean(input.postal_code),
            phone1: clean(input.phone1),
            phone2: clean(input.phone2),
            email,
            driving_license: input.driving_license,
            own_vehicle: input.own_vehicle,
            has_disability,
            disability_percentage,
            disability_type: disability_detail(input.disability_type),
            referral_entity: disability_detail(input.referral_entity),
            referral_technician: disability_detail(input.referral_technician),
            collective: disability_detail(input.collective),
            placed,
            sector: input.sector.filter(|_| placed),
            company: clean(input.company).filter(|_| placed),
        },
        socio_economic,
        education,
        income_members,
        courses,
    })
}
