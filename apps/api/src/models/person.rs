use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Hombre,
    Mujer,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Hombre => "HOMBRE",
            Sex::Mujer => "MUJER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Hombre => "Hombre",
            Sex::Mujer => "Mujer",
        }
    }
}

/// Highest completed education level, as offered on the intake form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EducationLevel {
    SinEstudios,
    EstudiosPrimarios,
    CertificadoEscolaridad,
    Egb,
    Eso,
    Bachiller,
    FpiCicloGradoMedio,
    FpiiCicloGradoSuperior,
    DiplomadoIngTecnico,
    LicenciadoIngSuperior,
    Otros,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 11] = [
        EducationLevel::SinEstudios,
        EducationLevel::EstudiosPrimarios,
        EducationLevel::CertificadoEscolaridad,
        EducationLevel::Egb,
        EducationLevel::Eso,
        EducationLevel::Bachiller,
        EducationLevel::FpiCicloGradoMedio,
        EducationLevel::FpiiCicloGradoSuperior,
        EducationLevel::DiplomadoIngTecnico,
        EducationLevel::LicenciadoIngSuperior,
        EducationLevel::Otros,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::SinEstudios => "SIN_ESTUDIOS",
            EducationLevel::EstudiosPrimarios => "ESTUDIOS_PRIMARIOS",
            EducationLevel::CertificadoEscolaridad => "CERTIFICADO_ESCOLARIDAD",
            EducationLevel::Egb => "EGB",
            EducationLevel::Eso => "ESO",
            EducationLevel::Bachiller => "BACHILLER",
            EducationLevel::FpiCicloGradoMedio => "FPI_CICLO_GRADO_MEDIO",
            EducationLevel::FpiiCicloGradoSuperior => "FPII_CICLO_GRADO_SUPERIOR",
            EducationLevel::DiplomadoIngTecnico => "DIPLOMADO_ING_TECNICO",
            EducationLevel::LicenciadoIngSuperior => "LICENCIADO_ING_SUPERIOR",
            EducationLevel::Otros => "OTROS",
        }
    }

    /// Human-readable label printed on the report.
    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::SinEstudios => "Sin Estudios",
            EducationLevel::EstudiosPrimarios => "Estudios Primarios",
            EducationLevel::CertificadoEscolaridad => "Certificado de Escolaridad",
            EducationLevel::Egb => "E.G.B.",
            EducationLevel::Eso => "E.S.O.",
            EducationLevel::Bachiller => "Bachiller",
            EducationLevel::FpiCicloGradoMedio => "F.P.I/Ciclo Gº Medio",
            EducationLevel::FpiiCicloGradoSuperior => "F.P.II/Ciclo Gº Superior",
            EducationLevel::DiplomadoIngTecnico => "Diplomado/Ing. Técnico",
            EducationLevel::LicenciadoIngSuperior => "Licenciado/Ing. Superior",
            EducationLevel::Otros => "Otros",
        }
    }

    /// Levels for which the free-text specification is meaningful.
    pub fn accepts_specification(&self) -> bool {
        matches!(
            self,
            EducationLevel::FpiCicloGradoMedio
                | EducationLevel::FpiiCicloGradoSuperior
                | EducationLevel::DiplomadoIngTecnico
                | EducationLevel::LicenciadoIngSuperior
                | EducationLevel::Otros
        )
    }
}

impl FromStr for EducationLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EducationLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Economic sector of a placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sector {
    Agricultura,
    Hortofruticola,
    Obra,
    Ganaderia,
    Servicios,
    Industria,
    Hosteleria,
    Comercio,
    Otro,
}

impl Sector {
    pub const ALL: [Sector; 9] = [
        Sector::Agricultura,
        Sector::Hortofruticola,
        Sector::Obra,
        Sector::Ganaderia,
        Sector::Servicios,
        Sector::Industria,
        Sector::Hosteleria,
        Sector::Comercio,
        Sector::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Agricultura => "Agricultura",
            Sector::Hortofruticola => "Hortofruticola",
            Sector::Obra => "Obra",
            Sector::Ganaderia => "Ganaderia",
            Sector::Servicios => "Servicios",
            Sector::Industria => "Industria",
            Sector::Hosteleria => "Hosteleria",
            Sector::Comercio => "Comercio",
            Sector::Otro => "Otro",
        }
    }
}

impl FromStr for Sector {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .into_iter()
            .find(|sector| sector.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for Sex {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOMBRE" => Ok(Sex::Hombre),
            "MUJER" => Ok(Sex::Mujer),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocioEconomicProfile {
    pub family_composition: String,
    pub economic_situation: String,
    pub other_circumstances: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationProfile {
    pub level: EducationLevel,
    pub completion_year: Option<i32>,
    pub specification: Option<String>,
    pub prior_experience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeMember {
    pub number: i32,
    pub kind: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplementaryCourse {
    pub name: String,
    pub duration_hours: i32,
    pub entity: String,
    pub completed_on: NaiveDate,
}

/// Scalar fields of a case file, shared by intake input and stored records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonFields {
    pub name: String,
    pub surnames: String,
    pub birth_date: NaiveDate,
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
    pub driving_license: bool,
    pub own_vehicle: bool,
    pub has_disability: bool,
    pub disability_percentage: Option<i32>,
    pub disability_type: Option<String>,
    pub referral_entity: Option<String>,
    pub referral_technician: Option<String>,
    pub collective: Option<String>,
    pub placed: bool,
    pub sector: Option<Sector>,
    pub company: Option<String>,
}

/// A validated, normalised case file ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    pub fields: PersonFields,
    pub socio_economic: Option<SocioEconomicProfile>,
    pub education: Option<EducationProfile>,
    pub income_members: Vec<IncomeMember>,
    pub courses: Vec<ComplementaryCourse>,
}

/// Root case file for one interviewed individual, with all nested sub-records attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: PersonFields,
    pub socio_economic: Option<SocioEconomicProfile>,
    pub education: Option<EducationProfile>,
    pub income_members: Vec<IncomeMember>,
    pub courses: Vec<ComplementaryCourse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonRecord {
    pub fn from_new(id: Uuid, person: NewPerson, created_at: DateTime<Utc>) -> Self {
        PersonRecord {
            id,
            fields: person.fields,
            socio_economic: person.socio_economic,
            education: person.education,
            income_members: person.income_members,
            courses: person.courses,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.name, self.fields.surnames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_level_round_trips_through_str() {
        for level in EducationLevel::ALL {
            assert_eq!(level.as_str().parse::<EducationLevel>(), Ok(level));
        }
        assert!("DOCTORADO".parse::<EducationLevel>().is_err());
    }

    #[test]
    fn test_education_level_serde_matches_as_str() {
        let json = serde_json::to_string(&EducationLevel::FpiiCicloGradoSuperior).unwrap();
        assert_eq!(json, "\"FPII_CICLO_GRADO_SUPERIOR\"");
    }

    #[test]
    fn test_specification_subset() {
        let accepting: Vec<_> = EducationLevel::ALL
            .into_iter()
            .filter(|l| l.accepts_specification())
            .collect();
        assert_eq!(
            accepting,
            vec![
                EducationLevel::FpiCicloGradoMedio,
                EducationLevel::FpiiCicloGradoSuperior,
                EducationLevel::DiplomadoIngTecnico,
                EducationLevel::LicenciadoIngSuperior,
                EducationLevel::Otros,
            ]
        );
    }

    #[test]
    fn test_sector_serde_uses_display_name() {
        let json = serde_json::to_string(&Sector::Industria).unwrap();
        assert_eq!(json, "\"Industria\"");
        assert_eq!("Hosteleria".parse::<Sector>(), Ok(Sector::Hosteleria));
        assert!("TODOS".parse::<Sector>().is_err());
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!("MUJER".parse::<Sex>(), Ok(Sex::Mujer));
        assert!("mujer".parse::<Sex>().is_err());
    }
}
