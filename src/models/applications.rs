use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgrammeType {
    Undergraduate,
    Graduate,
    Diploma,
    Certificate,
}

impl ProgrammeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgrammeType::Undergraduate => "Undergraduate",
            ProgrammeType::Graduate => "Graduate",
            ProgrammeType::Diploma => "Diploma",
            ProgrammeType::Certificate => "Certificate",
        }
    }
}

impl FromStr for ProgrammeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Undergraduate" => Ok(ProgrammeType::Undergraduate),
            "Graduate" => Ok(ProgrammeType::Graduate),
            "Diploma" => Ok(ProgrammeType::Diploma),
            "Certificate" => Ok(ProgrammeType::Certificate),
            _ => Err(format!("Invalid programme type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgrammeMode {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
}

impl ProgrammeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgrammeMode::FullTime => "Full-time",
            ProgrammeMode::PartTime => "Part-time",
        }
    }
}

impl FromStr for ProgrammeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full-time" => Ok(ProgrammeMode::FullTime),
            "Part-time" => Ok(ProgrammeMode::PartTime),
            _ => Err(format!("Invalid programme mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearInSchool {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
    #[serde(rename = "4th")]
    Fourth,
    #[serde(rename = "5th")]
    Fifth,
}

impl YearInSchool {
    pub fn as_str(&self) -> &'static str {
        match self {
            YearInSchool::First => "1st",
            YearInSchool::Second => "2nd",
            YearInSchool::Third => "3rd",
            YearInSchool::Fourth => "4th",
            YearInSchool::Fifth => "5th",
        }
    }
}

impl FromStr for YearInSchool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1st" => Ok(YearInSchool::First),
            "2nd" => Ok(YearInSchool::Second),
            "3rd" => Ok(YearInSchool::Third),
            "4th" => Ok(YearInSchool::Fourth),
            "5th" => Ok(YearInSchool::Fifth),
            _ => Err(format!("Invalid year in school: {}", s)),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Gender, ProgrammeType, ProgrammeMode, YearInSchool);

/// One scholarship submission as stored, without its sub-records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipApplication {
    pub id: String,
    pub submission_date: DateTime<Utc>,
    pub semester1_amount: Option<i32>,
    pub semester2_amount: Option<i32>,

    pub surname: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub nationality: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,

    pub student_id: String,
    pub projected_graduation_year: String,
    pub telephone: String,
    pub email: String,
    pub home_address: String,

    pub faculty_school: String,
    pub course_of_study: String,
    pub year_started_utech: String,
    pub gpa: String,
    pub programme_type: ProgrammeType,
    pub programme_mode: ProgrammeMode,
    pub year_in_school: YearInSchool,
    pub did_transfer: bool,
    pub transfer_programme_name: Option<String>,

    pub sport: String,
    pub event_position: String,
    pub major_accomplishments: Option<String>,
    pub national_representative: bool,
    pub national_rep_details: Option<String>,

    pub scholarship_tuition: bool,
    pub scholarship_accommodation: bool,
    pub scholarship_books: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub id: i64,
    pub application_id: String,
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    pub relation: String,
    pub telephone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    pub id: i64,
    pub application_id: String,
    pub name: String,
}

/// An application joined with its full guardian and affiliation sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationWithRelations {
    #[serde(flatten)]
    pub application: ScholarshipApplication,
    pub guardians: Vec<Guardian>,
    pub affiliations: Vec<Affiliation>,
}

/// A validated submission, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub semester1_amount: Option<i32>,
    pub semester2_amount: Option<i32>,

    pub surname: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub gender: Gender,
    pub nationality: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,

    pub student_id: String,
    pub projected_graduation_year: String,
    pub telephone: String,
    pub email: String,
    pub home_address: String,

    pub faculty_school: String,
    pub course_of_study: String,
    pub year_started_utech: String,
    pub gpa: String,
    pub programme_type: ProgrammeType,
    pub programme_mode: ProgrammeMode,
    pub year_in_school: YearInSchool,
    pub did_transfer: bool,
    pub transfer_programme_name: Option<String>,

    pub sport: String,
    pub event_position: String,
    pub major_accomplishments: Option<String>,
    pub national_representative: bool,
    pub national_rep_details: Option<String>,

    pub scholarship_tuition: bool,
    pub scholarship_accommodation: bool,
    pub scholarship_books: bool,

    pub guardians: Vec<NewGuardian>,
    pub affiliations: Vec<NewAffiliation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuardian {
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    pub relation: String,
    pub telephone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAffiliation {
    pub name: String,
}

impl NewApplication {
    /// The stored form of this submission under a server-assigned identity.
    pub fn to_application(&self, id: String, submission_date: DateTime<Utc>) -> ScholarshipApplication {
        ScholarshipApplication {
            id,
            submission_date,
            semester1_amount: self.semester1_amount,
            semester2_amount: self.semester2_amount,
            surname: self.surname.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            gender: self.gender,
            nationality: self.nationality.clone(),
            date_of_birth: self.date_of_birth,
            age: self.age,
            student_id: self.student_id.clone(),
            projected_graduation_year: self.projected_graduation_year.clone(),
            telephone: self.telephone.clone(),
            email: self.email.clone(),
            home_address: self.home_address.clone(),
            faculty_school: self.faculty_school.clone(),
            course_of_study: self.course_of_study.clone(),
            year_started_utech: self.year_started_utech.clone(),
            gpa: self.gpa.clone(),
            programme_type: self.programme_type,
            programme_mode: self.programme_mode,
            year_in_school: self.year_in_school,
            did_transfer: self.did_transfer,
            transfer_programme_name: self.transfer_programme_name.clone(),
            sport: self.sport.clone(),
            event_position: self.event_position.clone(),
            major_accomplishments: self.major_accomplishments.clone(),
            national_representative: self.national_representative,
            national_rep_details: self.national_rep_details.clone(),
            scholarship_tuition: self.scholarship_tuition,
            scholarship_accommodation: self.scholarship_accommodation,
            scholarship_books: self.scholarship_books,
        }
    }
}

impl NewGuardian {
    pub fn to_guardian(&self, id: i64, application_id: &str) -> Guardian {
        Guardian {
            id,
            application_id: application_id.to_string(),
            surname: self.surname.clone(),
            first_name: self.first_name.clone(),
            middle_initial: self.middle_initial.clone(),
            relation: self.relation.clone(),
            telephone: self.telephone.clone(),
            address: self.address.clone(),
        }
    }
}

impl NewAffiliation {
    pub fn to_affiliation(&self, id: i64, application_id: &str) -> Affiliation {
        Affiliation {
            id,
            application_id: application_id.to_string(),
            name: self.name.clone(),
        }
    }
}
