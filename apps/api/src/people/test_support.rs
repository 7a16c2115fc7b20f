//! Fixtures shared by the people, stats and report tests.

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::models::person::{
    ComplementaryCourse, PersonFields, PersonRecord, Sex,
};
use crate::people::validation::PersonInput;

pub fn sample_input(name: &str, surnames: &str) -> PersonInput {
    PersonInput {
        name: name.to_string(),
        surnames: surnames.to_string(),
        birth_date: "1990-05-17".to_string(),
        nationality: "Española".to_string(),
        identity_document: "12345678Z".to_string(),
        social_security_number: None,
        sex: Sex::Mujer,
        address: "C/ Real 12, 2ºB".to_string(),
        locality: "Almería".to_string(),
        postal_code: Some("04001".to_string()),
        phone1: Some("600111222".to_string()),
        phone2: None,
        email: Some("ana@example.org".to_string()),
        driving_license: true,
        own_vehicle: false,
        has_disability: false,
        disability_percentage: None,
        disability_type: None,
        referral_entity: None,
        referral_technician: None,
        collective: None,
        placed: false,
        sector: None,
        company: None,
        socio_economic: None,
        education: None,
        income_members: Vec::new(),
        courses: Vec::new(),
    }
}

pub fn person_named(name: &str, surnames: &str) -> PersonRecord {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap();
    PersonRecord {
        id: Uuid::new_v4(),
        fields: PersonFields {
            name: name.to_string(),
            surnames: surnames.to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            nationality: "Española".to_string(),
            identity_document: "12345678Z".to_string(),
            social_security_number: None,
            sex: Sex::Mujer,
            address: "C/ Real 12".to_string(),
            locality: "Granada".to_string(),
            postal_code: None,
            phone1: None,
            phone2: None,
            email: None,
            driving_license: false,
            own_vehicle: false,
            has_disability: false,
            disability_percentage: None,
            disability_type: None,
            referral_entity: None,
            referral_technician: None,
            collective: None,
            placed: false,
            sector: None,
            company: None,
        },
        socio_economic: None,
        education: None,
        income_members: Vec::new(),
        courses: Vec::new(),
        created_at,
        updated_at: created_at,
    }
}

pub fn course(name: &str) -> ComplementaryCourse {
    ComplementaryCourse {
        name: name.to_string(),
        duration_hours: 40,
        entity: "Centro de Formación".to_string(),
        completed_on: NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
    }
}
