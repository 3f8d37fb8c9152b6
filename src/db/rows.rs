use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::core::AppError;
use crate::models::applications::ScholarshipApplication;

pub const APPLICATION_COLUMNS: &str = "id, submission_date, semester1_amount, semester2_amount, \
    surname, first_name, middle_name, gender, nationality, date_of_birth, age, \
    student_id, projected_graduation_year, telephone, email, home_address, \
    faculty_school, course_of_study, year_started_utech, gpa, programme_type, programme_mode, \
    year_in_school, did_transfer, transfer_programme_name, \
    sport, event_position, major_accomplishments, national_representative, national_rep_details, \
    scholarship_tuition, scholarship_accommodation, scholarship_books";

pub const GUARDIAN_COLUMNS: &str =
    "id, application_id, surname, first_name, middle_initial, relation, telephone, address";

pub const AFFILIATION_COLUMNS: &str = "id, application_id, name";

pub const USER_COLUMNS: &str = "id, username, password";

/// `scholarship_applications` as stored; enumerations are kept as text.
#[derive(Debug, FromRow)]
pub struct ApplicationRow {
    pub id: String,
    pub submission_date: DateTime<Utc>,
    pub semester1_amount: Option<i32>,
    pub semester2_amount: Option<i32>,
    pub surname: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub gender: String,
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
    pub programme_type: String,
    pub programme_mode: String,
    pub year_in_school: String,
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

impl TryFrom<ApplicationRow> for ScholarshipApplication {
    type Error = AppError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let unreadable =
            |e: String| AppError::db_error(format!("application {} has {}", row.id, e));

        Ok(ScholarshipApplication {
            gender: row.gender.parse().map_err(unreadable)?,
            programme_type: row.programme_type.parse().map_err(unreadable)?,
            programme_mode: row.programme_mode.parse().map_err(unreadable)?,
            year_in_school: row.year_in_school.parse().map_err(unreadable)?,
            id: row.id,
            submission_date: row.submission_date,
            semester1_amount: row.semester1_amount,
            semester2_amount: row.semester2_amount,
            surname: row.surname,
            first_name: row.first_name,
            middle_name: row.middle_name,
            nationality: row.nationality,
            date_of_birth: row.date_of_birth,
            age: row.age,
            student_id: row.student_id,
            projected_graduation_year: row.projected_graduation_year,
            telephone: row.telephone,
            email: row.email,
            home_address: row.home_address,
            faculty_school: row.faculty_school,
            course_of_study: row.course_of_study,
            year_started_utech: row.year_started_utech,
            gpa: row.gpa,
            did_transfer: row.did_transfer,
            transfer_programme_name: row.transfer_programme_name,
            sport: row.sport,
            event_position: row.event_position,
            major_accomplishments: row.major_accomplishments,
            national_representative: row.national_representative,
            national_rep_details: row.national_rep_details,
            scholarship_tuition: row.scholarship_tuition,
            scholarship_accommodation: row.scholarship_accommodation,
            scholarship_books: row.scholarship_books,
        })
    }
}
