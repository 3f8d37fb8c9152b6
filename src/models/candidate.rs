//! Candidate payloads as submitted by the form, before validation.
//!
//! Every field is optional at the serde level so that one pass of the rule
//! set can report all missing and malformed fields together. Fields of the
//! wrong JSON type are reported and dropped before deserialization, so they
//! join that same report instead of replacing it. A candidate that
//! passes converts into a [`NewApplication`]. Server-assigned fields (`id`,
//! `submissionDate`) are not part of the candidate and are dropped on
//! deserialization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::core::validation::{collect_field_errors, rule_error, FieldError, ValidationFailure, GPA_REGEX};
use crate::models::applications::{
    Gender, NewAffiliation, NewApplication, NewGuardian, ProgrammeMode, ProgrammeType, YearInSchool,
};

const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateApplication {
    #[validate(range(min = 0, max = 2147483647, message = "Amount must be a non-negative whole number"))]
    pub semester1_amount: Option<i64>,
    #[validate(range(min = 0, max = 2147483647, message = "Amount must be a non-negative whole number"))]
    pub semester2_amount: Option<i64>,

    #[validate(required)]
    pub surname: Option<String>,
    #[validate(required)]
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    #[validate(required, custom = "validate_gender")]
    pub gender: Option<String>,
    #[validate(required)]
    pub nationality: Option<String>,
    #[validate(required, custom = "validate_date_of_birth")]
    pub date_of_birth: Option<String>,
    #[validate(
        required,
        range(min = 16, message = "Applicant must be at least 16 years old"),
        range(max = 50, message = "Please enter a valid age")
    )]
    pub age: Option<i64>,

    #[validate(required)]
    pub student_id: Option<String>,
    #[validate(required)]
    pub projected_graduation_year: Option<String>,
    #[validate(required, length(min = 7, message = "Please enter a valid phone number"))]
    pub telephone: Option<String>,
    #[validate(required, email(message = "Please enter a valid email address"))]
    pub email: Option<String>,
    #[validate(required)]
    pub home_address: Option<String>,

    #[validate(required)]
    pub faculty_school: Option<String>,
    #[validate(required)]
    pub course_of_study: Option<String>,
    #[validate(required)]
    pub year_started_utech: Option<String>,
    #[validate(required, regex(path = "GPA_REGEX", message = "GPA must be between 0.00 and 4.00"))]
    pub gpa: Option<String>,
    #[validate(required, custom = "validate_programme_type")]
    pub programme_type: Option<String>,
    #[validate(required, custom = "validate_programme_mode")]
    pub programme_mode: Option<String>,
    #[validate(required, custom = "validate_year_in_school")]
    pub year_in_school: Option<String>,
    pub did_transfer: Option<bool>,
    pub transfer_programme_name: Option<String>,

    #[validate(required)]
    pub sport: Option<String>,
    #[validate(required)]
    pub event_position: Option<String>,
    pub major_accomplishments: Option<String>,
    pub national_representative: Option<bool>,
    pub national_rep_details: Option<String>,

    pub scholarship_tuition: Option<bool>,
    pub scholarship_accommodation: Option<bool>,
    pub scholarship_books: Option<bool>,

    #[validate(required, length(min = 1, message = "At least one guardian is required"))]
    pub guardians: Option<Vec<CandidateGuardian>>,
    pub affiliations: Option<Vec<CandidateAffiliation>>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateGuardian {
    #[validate(required)]
    pub surname: Option<String>,
    #[validate(required)]
    pub first_name: Option<String>,
    pub middle_initial: Option<String>,
    #[validate(required)]
    pub relation: Option<String>,
    #[validate(required, length(min = 7, message = "Please enter a valid phone number"))]
    pub telephone: Option<String>,
    #[validate(required)]
    pub address: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAffiliation {
    #[validate(required)]
    pub name: Option<String>,
}

fn validate_gender(value: &str) -> Result<(), ValidationError> {
    Gender::from_str(value)
        .map(|_| ())
        .map_err(|_| rule_error("gender", "Gender must be M or F"))
}

fn validate_programme_type(value: &str) -> Result<(), ValidationError> {
    ProgrammeType::from_str(value).map(|_| ()).map_err(|_| {
        rule_error(
            "programme_type",
            "Programme type must be Undergraduate, Graduate, Diploma or Certificate",
        )
    })
}

fn validate_programme_mode(value: &str) -> Result<(), ValidationError> {
    ProgrammeMode::from_str(value)
        .map(|_| ())
        .map_err(|_| rule_error("programme_mode", "Programme mode must be Full-time or Part-time"))
}

fn validate_year_in_school(value: &str) -> Result<(), ValidationError> {
    YearInSchool::from_str(value)
        .map(|_| ())
        .map_err(|_| rule_error("year_in_school", "Year in school must be 1st to 5th"))
}

fn validate_date_of_birth(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, DATE_OF_BIRTH_FORMAT)
        .map(|_| ())
        .map_err(|_| rule_error("date_of_birth", "Date of birth must be a YYYY-MM-DD date"))
}

/// Runs the full rule set over an untyped payload.
pub fn validate_candidate(mut payload: Value) -> Result<NewApplication, ValidationFailure> {
    if !payload.is_object() {
        return Err(ValidationFailure::root(format!(
            "Expected object, received {}",
            json_kind(&payload)
        )));
    }

    let mut type_errors = Vec::new();
    if let Some(object) = payload.as_object_mut() {
        screen_types(object, "", APPLICATION_SHAPES, &mut type_errors);
    }

    let candidate: CandidateApplication =
        serde_json::from_value(payload).map_err(ValidationFailure::root)?;

    let mut errors = match candidate.check() {
        Ok(()) => Vec::new(),
        Err(failure) => failure.errors,
    };
    // A field with the wrong type was dropped before the rules ran; only its
    // type error is reported.
    errors.retain(|error| !type_errors.iter().any(|t| covers(&t.path, &error.path)));
    errors.extend(type_errors);

    if !errors.is_empty() {
        errors.sort_by(|a, b| a.path.cmp(&b.path));
        return Err(ValidationFailure::new(errors));
    }

    candidate.into_new_application()
}

/// JSON type each wire field must have before the rules can read it.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Text,
    Whole,
    Flag,
    Records(&'static [(&'static str, Shape)]),
}

const GUARDIAN_SHAPES: &[(&str, Shape)] = &[
    ("surname", Shape::Text),
    ("firstName", Shape::Text),
    ("middleInitial", Shape::Text),
    ("relation", Shape::Text),
    ("telephone", Shape::Text),
    ("address", Shape::Text),
];

const AFFILIATION_SHAPES: &[(&str, Shape)] = &[("name", Shape::Text)];

const APPLICATION_SHAPES: &[(&str, Shape)] = &[
    ("semester1Amount", Shape::Whole),
    ("semester2Amount", Shape::Whole),
    ("surname", Shape::Text),
    ("firstName", Shape::Text),
    ("middleName", Shape::Text),
    ("gender", Shape::Text),
    ("nationality", Shape::Text),
    ("dateOfBirth", Shape::Text),
    ("age", Shape::Whole),
    ("studentId", Shape::Text),
    ("projectedGraduationYear", Shape::Text),
    ("telephone", Shape::Text),
    ("email", Shape::Text),
    ("homeAddress", Shape::Text),
    ("facultySchool", Shape::Text),
    ("courseOfStudy", Shape::Text),
    ("yearStartedUtech", Shape::Text),
    ("gpa", Shape::Text),
    ("programmeType", Shape::Text),
    ("programmeMode", Shape::Text),
    ("yearInSchool", Shape::Text),
    ("didTransfer", Shape::Flag),
    ("transferProgrammeName", Shape::Text),
    ("sport", Shape::Text),
    ("eventPosition", Shape::Text),
    ("majorAccomplishments", Shape::Text),
    ("nationalRepresentative", Shape::Flag),
    ("nationalRepDetails", Shape::Text),
    ("scholarshipTuition", Shape::Flag),
    ("scholarshipAccommodation", Shape::Flag),
    ("scholarshipBooks", Shape::Flag),
    ("guardians", Shape::Records(GUARDIAN_SHAPES)),
    ("affiliations", Shape::Records(AFFILIATION_SHAPES)),
];

impl Shape {
    fn expected(self) -> &'static str {
        match self {
            Shape::Text => "string",
            Shape::Whole => "integer",
            Shape::Flag => "boolean",
            Shape::Records(_) => "array",
        }
    }

    fn admits(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Shape::Text, Value::String(_)) => true,
            (Shape::Whole, Value::Number(n)) => n.is_i64(),
            (Shape::Flag, Value::Bool(_)) => true,
            (Shape::Records(_), Value::Array(_)) => true,
            _ => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reports and removes every field whose JSON type does not fit, recursing
/// into sub-record lists. Sub-records that are not objects become empty ones.
fn screen_types(
    object: &mut Map<String, Value>,
    prefix: &str,
    shapes: &[(&str, Shape)],
    errors: &mut Vec<FieldError>,
) {
    for (field, shape) in shapes.iter().copied() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        let value = match object.get_mut(field) {
            Some(value) => value,
            None => continue,
        };

        if !shape.admits(value) {
            errors.push(FieldError {
                message: format!("Expected {}, received {}", shape.expected(), json_kind(value)),
                path,
            });
            object.remove(field);
            continue;
        }

        if let (Shape::Records(record_shapes), Value::Array(records)) = (shape, value) {
            for (index, record) in records.iter_mut().enumerate() {
                let record_path = format!("{}[{}]", path, index);
                match record {
                    Value::Object(fields) => {
                        screen_types(fields, &record_path, record_shapes, errors)
                    }
                    other => {
                        errors.push(FieldError {
                            message: format!("Expected object, received {}", json_kind(other)),
                            path: record_path,
                        });
                        *other = Value::Object(Map::new());
                    }
                }
            }
        }
    }
}

/// Whether `path` is `parent` itself or lies beneath it.
fn covers(parent: &str, path: &str) -> bool {
    path == parent
        || path
            .strip_prefix(parent)
            .map_or(false, |rest| rest.starts_with('.') || rest.starts_with('['))
}

impl CandidateApplication {
    /// Validates the application and each of its sub-records, aggregating every failure.
    pub fn check(&self) -> Result<(), ValidationFailure> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => collect_field_errors("", &e),
        };

        for (index, guardian) in self.guardians.iter().flatten().enumerate() {
            if let Err(e) = guardian.validate() {
                errors.extend(collect_field_errors(&format!("guardians[{}]", index), &e));
            }
        }

        for (index, affiliation) in self.affiliations.iter().flatten().enumerate() {
            if let Err(e) = affiliation.validate() {
                errors.extend(collect_field_errors(&format!("affiliations[{}]", index), &e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors))
        }
    }

    pub fn into_new_application(self) -> Result<NewApplication, ValidationFailure> {
        let guardians = present(self.guardians, "guardians")?
            .into_iter()
            .enumerate()
            .map(|(index, guardian)| guardian.into_new_guardian(index))
            .collect::<Result<Vec<_>, _>>()?;

        let affiliations = self
            .affiliations
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, affiliation)| {
                Ok(NewAffiliation {
                    name: present(affiliation.name, &format!("affiliations[{}].name", index))?,
                })
            })
            .collect::<Result<Vec<_>, ValidationFailure>>()?;

        let date_of_birth = present(self.date_of_birth, "dateOfBirth")?;
        let date_of_birth = NaiveDate::parse_from_str(&date_of_birth, DATE_OF_BIRTH_FORMAT)
            .map_err(|e| field_failure("dateOfBirth", e))?;

        Ok(NewApplication {
            semester1_amount: self
                .semester1_amount
                .map(|amount| narrow(amount, "semester1Amount"))
                .transpose()?,
            semester2_amount: self
                .semester2_amount
                .map(|amount| narrow(amount, "semester2Amount"))
                .transpose()?,
            surname: present(self.surname, "surname")?,
            first_name: present(self.first_name, "firstName")?,
            middle_name: self.middle_name,
            gender: parse(self.gender, "gender")?,
            nationality: present(self.nationality, "nationality")?,
            date_of_birth,
            age: narrow(present(self.age, "age")?, "age")?,
            student_id: present(self.student_id, "studentId")?,
            projected_graduation_year: present(
                self.projected_graduation_year,
                "projectedGraduationYear",
            )?,
            telephone: present(self.telephone, "telephone")?,
            email: present(self.email, "email")?,
            home_address: present(self.home_address, "homeAddress")?,
            faculty_school: present(self.faculty_school, "facultySchool")?,
            course_of_study: present(self.course_of_study, "courseOfStudy")?,
            year_started_utech: present(self.year_started_utech, "yearStartedUtech")?,
            gpa: present(self.gpa, "gpa")?,
            programme_type: parse(self.programme_type, "programmeType")?,
            programme_mode: parse(self.programme_mode, "programmeMode")?,
            year_in_school: parse(self.year_in_school, "yearInSchool")?,
            did_transfer: self.did_transfer.unwrap_or(false),
            transfer_programme_name: self.transfer_programme_name,
            sport: present(self.sport, "sport")?,
            event_position: present(self.event_position, "eventPosition")?,
            major_accomplishments: self.major_accomplishments,
            national_representative: self.national_representative.unwrap_or(false),
            national_rep_details: self.national_rep_details,
            scholarship_tuition: self.scholarship_tuition.unwrap_or(false),
            scholarship_accommodation: self.scholarship_accommodation.unwrap_or(false),
            scholarship_books: self.scholarship_books.unwrap_or(false),
            guardians,
            affiliations,
        })
    }
}

impl CandidateGuardian {
    fn into_new_guardian(self, index: usize) -> Result<NewGuardian, ValidationFailure> {
        let at = |field: &str| format!("guardians[{}].{}", index, field);

        Ok(NewGuardian {
            surname: present(self.surname, &at("surname"))?,
            first_name: present(self.first_name, &at("firstName"))?,
            middle_initial: self.middle_initial,
            relation: present(self.relation, &at("relation"))?,
            telephone: present(self.telephone, &at("telephone"))?,
            address: present(self.address, &at("address"))?,
        })
    }
}

fn field_failure(path: &str, message: impl ToString) -> ValidationFailure {
    ValidationFailure::new(vec![FieldError {
        path: path.to_string(),
        message: message.to_string(),
    }])
}

fn present<T>(value: Option<T>, path: &str) -> Result<T, ValidationFailure> {
    value.ok_or_else(|| field_failure(path, "Required"))
}

fn parse<T: FromStr<Err = String>>(value: Option<String>, path: &str) -> Result<T, ValidationFailure> {
    present(value, path)?
        .parse()
        .map_err(|e: String| field_failure(path, e))
}

fn narrow(value: i64, path: &str) -> Result<i32, ValidationFailure> {
    i32::try_from(value).map_err(|_| field_failure(path, "Number is out of range"))
}
