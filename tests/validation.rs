//! Property tests for record validation.
//!
//! Covers the validator's contract with random inputs: short names always
//! fail, malformed emails always fail, well-formed records always pass, and
//! validation is deterministic.

use proptest::prelude::*;
use recruit::{validate, ApplicationRecord, Catalog, Field};

fn catalog_values(field: Field) -> Vec<String> {
    Catalog::default()
        .entries(field)
        .unwrap()
        .iter()
        .map(|e| e.value.clone())
        .collect()
}

/// Records whose every field satisfies the rules.
fn valid_record() -> impl Strategy<Value = ApplicationRecord> {
    (
        "[A-Za-z][A-Za-z ]{1,30}[A-Za-z]",
        "[a-z0-9._+-]{1,12}@[a-z0-9-]{1,10}\\.[a-z]{2,6}",
        prop::sample::select(catalog_values(Field::University)),
        prop::sample::select(catalog_values(Field::Year)),
        prop::sample::select(catalog_values(Field::Position)),
        "[A-Za-z,. ]{0,5}[A-Za-z]{10,40}",
        "[ -~]{0,60}",
        "[A-Za-z]{20,80}[ .!]{0,5}",
        "[ \t]{0,3}",
    )
        .prop_map(
            |(name, email, university, year, position, skills, experience, motivation, pad)| {
                ApplicationRecord {
                    name: format!("{pad}{name}{pad}"),
                    email,
                    university,
                    year,
                    position,
                    skills: format!("{pad}{skills}"),
                    experience,
                    motivation: format!("{motivation}{pad}"),
                }
            },
        )
}

fn fixed_valid() -> ApplicationRecord {
    ApplicationRecord {
        name: "Jo Lee".into(),
        email: "jo@x.com".into(),
        university: "VIT".into(),
        year: "2nd".into(),
        position: "Technical Team".into(),
        skills: "Python, Go, systems design".into(),
        experience: String::new(),
        motivation: "I want to build real infrastructure and learn from peers".into(),
    }
}

// ============================================================================
// Name
// ============================================================================

proptest! {
    #[test]
    fn test_short_name_always_fails(core in "[A-Za-z]?", pad in "[ \t]{0,4}") {
        let mut record = fixed_valid();
        record.name = format!("{pad}{core}{pad}");
        let result = validate(&record, &Catalog::default());
        prop_assert!(!result.is_valid());
        prop_assert!(result.error(Field::Name).is_some());
    }
}

// ============================================================================
// Email
// ============================================================================

proptest! {
    #[test]
    fn test_email_without_at_fails(email in "[a-z0-9.]{1,20}") {
        let mut record = fixed_valid();
        record.email = email;
        let result = validate(&record, &Catalog::default());
        prop_assert!(result.error(Field::Email).is_some());
        prop_assert!(!result.is_valid());
    }

    #[test]
    fn test_email_without_dot_after_at_fails(
        local in "[a-z0-9.]{1,10}",
        domain in "[a-z0-9]{1,10}",
    ) {
        let mut record = fixed_valid();
        record.email = format!("{local}@{domain}");
        let result = validate(&record, &Catalog::default());
        prop_assert!(result.error(Field::Email).is_some());
    }
}

// ============================================================================
// Whole record
// ============================================================================

proptest! {
    #[test]
    fn test_well_formed_records_pass(record in valid_record()) {
        let result = validate(&record, &Catalog::default());
        prop_assert!(result.is_valid(), "unexpected errors: {:?}", result.errors());
        prop_assert!(result.errors().is_empty());
    }

    #[test]
    fn test_validation_is_deterministic(
        name in "[ -~]{0,12}",
        email in "[ -~]{0,16}",
        skills in "[ -~]{0,16}",
        motivation in "[ -~]{0,30}",
    ) {
        let record = ApplicationRecord {
            name,
            email,
            skills,
            motivation,
            ..fixed_valid()
        };
        let catalog = Catalog::default();
        prop_assert_eq!(validate(&record, &catalog), validate(&record, &catalog));
    }

    #[test]
    fn test_experience_never_errors(experience in "\\PC{0,100}") {
        let mut record = fixed_valid();
        record.experience = experience;
        let result = validate(&record, &Catalog::default());
        prop_assert!(result.error(Field::Experience).is_none());
        prop_assert!(result.is_valid());
    }
}

#[test]
fn test_reference_record_passes() {
    let result = validate(&fixed_valid(), &Catalog::default());
    assert!(result.is_valid());
}

#[test]
fn test_all_errors_reported_in_one_pass() {
    let record = ApplicationRecord {
        name: " ".into(),
        email: "nope".into(),
        university: "Elsewhere".into(),
        year: "5th".into(),
        position: "".into(),
        skills: "short".into(),
        experience: "".into(),
        motivation: "too short".into(),
    };
    let result = validate(&record, &Catalog::default());
    assert_eq!(result.errors().len(), 7);
    assert!(result.error(Field::Experience).is_none());
}
