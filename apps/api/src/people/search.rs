//! Record search: exact criteria go to the store, free-text criteria are matched here
//! accent- and case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use unicode_normalization::UnicodeNormalization;

use crate::models::person::{EducationLevel, PersonRecord};
use crate::store::StoreQuery;

/// Combining diacritical marks block stripped after canonical decomposition.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Folds a string for comparison: NFD, drop combining marks, lower-case.
pub fn normalize_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Substring test on folded forms. An empty needle matches everything.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    normalize_text(haystack).contains(&normalize_text(needle))
}

/// `SI`/`NO` (as the intake form sends it) or `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YesNo(pub bool);

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SI" | "SÍ" | "TRUE" => Ok(YesNo(true)),
            "NO" | "FALSE" => Ok(YesNo(false)),
            _ => Err(format!("expected SI or NO, got '{s}'")),
        }
    }
}

/// Treats a missing or blank query parameter as absent.
pub(crate) fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Query string of `GET /api/v1/persons`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub surnames: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub locality: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub has_disability: Option<YesNo>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub education_level: Option<EducationLevel>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub prior_experience: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub languages: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub computing: Option<String>,
}

/// Sparse search criteria. A record matches iff it satisfies every criterion present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub surnames: Option<String>,
    pub locality: Option<String>,
    pub has_disability: Option<bool>,
    pub education_level: Option<EducationLevel>,
    pub prior_experience: Option<String>,
    /// Matched against complementary course names (language courses).
    pub languages: Option<String>,
    /// Matched against complementary course names (computer courses).
    pub computing: Option<String>,
}

impl From<SearchParams> for FilterCriteria {
    fn from(p: SearchParams) -> Self {
        FilterCriteria {
            name: p.name,
            surnames: p.surnames,
            locality: p.locality,
            has_disability: p.has_disability.map(|YesNo(flag)| flag),
            education_level: p.education_level,
            prior_experience: p.prior_experience,
            languages: p.languages,
            computing: p.computing,
        }
    }
}

impl FilterCriteria {
    /// The subset of criteria the store can evaluate exactly.
    pub fn store_query(&self) -> StoreQuery {
        StoreQuery {
            has_disability: self.has_disability,
            education_level: self.education_level,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Evaluates every criterion, including the ones already pushed to the store, so the
    /// result does not depend on where filtering happened.
    pub fn matches(&self, person: &PersonRecord) -> bool {
        let f = &person.fields;
        let text_ok = |criterion: &Option<String>, value: &str| {
            criterion
                .as_deref()
                .map_or(true, |needle| contains_folded(value, needle))
        };
        let course_ok = |criterion: &Option<String>| {
            criterion.as_deref().map_or(true, |needle| {
                person
                    .courses
                    .iter()
                    .any(|c| contains_folded(&c.name, needle))
            })
        };

        let experience = person
            .education
            .as_ref()
            .and_then(|e| e.prior_experience.as_deref())
            .unwrap_or("");

        text_ok(&self.name, &f.name)
            && text_ok(&self.surnames, &f.surnames)
            && text_ok(&self.locality, &f.locality)
            && self.has_disability.map_or(true, |flag| f.has_disability == flag)
            && self.education_level.map_or(true, |level| {
                person.education.as_ref().map(|e| e.level) == Some(level)
            })
            && text_ok(&self.prior_experience, experience)
            && course_ok(&self.languages)
            && course_ok(&self.computing)
    }
}

/// Applies the in-memory pass over store results, preserving their order.
pub fn apply_filters(records: Vec<PersonRecord>, criteria: &FilterCriteria) -> Vec<PersonRecord> {
    if criteria.is_empty() {
        return records;
    }
    records.into_iter().filter(|p| criteria.matches(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::people::test_support::{course, person_named};

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("José García"), "jose garcia");
        assert_eq!(normalize_text("ÑANDÚ"), "nandu");
        assert_eq!(normalize_text("Ç à ü"), "c a u");
    }

    #[test]
    fn test_contains_folded_is_accent_and_case_insensitive() {
        assert!(contains_folded("José García", "jose"));
        assert!(contains_folded("José García", "GARCIA"));
        assert!(contains_folded("jose garcia", "JOSÉ"));
        assert!(!contains_folded("José García", "maria"));
    }

    #[test]
    fn test_folded_match_agrees_with_normalized_inputs() {
        let pairs = [
            ("Médico de Atención", "ATENCION"),
            ("Camarera de pisos", "cámara"),
            ("Peón agrícola", "agricola"),
            ("Informática básica", "Básica"),
            ("Ofimática", "ofi"),
        ];
        for (s, q) in pairs {
            let raw = contains_folded(s, q);
            let pre = contains_folded(&normalize_text(s), &normalize_text(q));
            assert_eq!(raw, pre, "{s} / {q}");
        }
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        let people = vec![person_named("Ana", "López"), person_named("Luis", "Pérez")];
        assert_eq!(apply_filters(people.clone(), &criteria), people);
    }

    #[test]
    fn test_all_criteria_must_match() {
        let mut ana = person_named("Ana", "López");
        ana.fields.locality = "Almería".to_string();
        ana.courses.push(course("Inglés B1"));
        let mut luis = person_named("Luis", "López");
        luis.fields.locality = "Almería".to_string();

        let criteria = FilterCriteria {
            surnames: Some("lopez".into()),
            locality: Some("ALMERIA".into()),
            languages: Some("ingles".into()),
            ..FilterCriteria::default()
        };
        assert!(criteria.matches(&ana));
        assert!(!criteria.matches(&luis), "luis has no language course");

        let results = apply_filters(vec![ana.clone(), luis], &criteria);
        assert_eq!(results, vec![ana]);
    }

    #[test]
    fn test_each_criterion_independently() {
        let mut p = person_named("María", "Sánchez");
        p.fields.has_disability = true;
        p.education = Some(crate::models::person::EducationProfile {
            level: EducationLevel::Eso,
            completion_year: Some(2010),
            specification: None,
            prior_experience: Some("Peón de almacén".into()),
        });
        p.courses.push(course("Ofimática"));

        let yes = [
            FilterCriteria { name: Some("maria".into()), ..Default::default() },
            FilterCriteria { has_disability: Some(true), ..Default::default() },
            FilterCriteria { education_level: Some(EducationLevel::Eso), ..Default::default() },
            FilterCriteria { prior_experience: Some("almacen".into()), ..Default::default() },
            FilterCriteria { computing: Some("OFIMATICA".into()), ..Default::default() },
        ];
        for c in &yes {
            assert!(c.matches(&p), "{c:?}");
        }

        let no = [
            FilterCriteria { name: Some("mario".into()), ..Default::default() },
            FilterCriteria { has_disability: Some(false), ..Default::default() },
            FilterCriteria { education_level: Some(EducationLevel::Bachiller), ..Default::default() },
            FilterCriteria { prior_experience: Some("hosteleria".into()), ..Default::default() },
            FilterCriteria { languages: Some("frances".into()), ..Default::default() },
        ];
        for c in &no {
            assert!(!c.matches(&p), "{c:?}");
        }
    }

    #[test]
    fn test_prior_experience_without_education_block_does_not_match() {
        let p = person_named("Ana", "López");
        let c = FilterCriteria {
            prior_experience: Some("camarera".into()),
            ..Default::default()
        };
        assert!(!c.matches(&p));
    }

    #[test]
    fn test_store_query_carries_exact_criteria_only() {
        let c = FilterCriteria {
            name: Some("ana".into()),
            has_disability: Some(false),
            education_level: Some(EducationLevel::Otros),
            ..Default::default()
        };
        assert_eq!(
            c.store_query(),
            StoreQuery {
                has_disability: Some(false),
                education_level: Some(EducationLevel::Otros),
            }
        );
    }

    #[test]
    fn test_yes_no_parsing() {
        assert_eq!("SI".parse::<YesNo>(), Ok(YesNo(true)));
        assert_eq!("no".parse::<YesNo>(), Ok(YesNo(false)));
        assert_eq!("true".parse::<YesNo>(), Ok(YesNo(true)));
        assert!("maybe".parse::<YesNo>().is_err());
    }
}
