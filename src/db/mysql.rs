use async_trait::async_trait;
use futures_util::future::try_join_all;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::rows::{ApplicationRow, AFFILIATION_COLUMNS, APPLICATION_COLUMNS, GUARDIAN_COLUMNS, USER_COLUMNS};
use super::{new_record_id, search_pattern, submission_timestamp, Storage};
use crate::core::AppError;
use crate::models::applications::{
    Affiliation, ApplicationWithRelations, Guardian, NewApplication, ScholarshipApplication,
};
use crate::models::users::{NewUser, User};

/// Secondary backend. MySQL has no `RETURNING`, so inserted rows are
/// assembled from the submitted values and `LAST_INSERT_ID()`.
pub struct MySqlStorage {
    pool: MySqlPool,
}

impl MySqlStorage {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn guardians_for(&self, application_id: &str) -> Result<Vec<Guardian>, AppError> {
        let query = format!(
            "SELECT {} FROM guardians WHERE application_id = ? ORDER BY id",
            GUARDIAN_COLUMNS
        );

        sqlx::query_as::<_, Guardian>(&query)
            .bind(application_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    async fn affiliations_for(&self, application_id: &str) -> Result<Vec<Affiliation>, AppError> {
        let query = format!(
            "SELECT {} FROM affiliations WHERE application_id = ? ORDER BY id",
            AFFILIATION_COLUMNS
        );

        sqlx::query_as::<_, Affiliation>(&query)
            .bind(application_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    async fn enrich(&self, row: ApplicationRow) -> Result<ApplicationWithRelations, AppError> {
        let application = ScholarshipApplication::try_from(row)?;
        let (guardians, affiliations) = tokio::try_join!(
            self.guardians_for(&application.id),
            self.affiliations_for(&application.id)
        )?;

        Ok(ApplicationWithRelations {
            application,
            guardians,
            affiliations,
        })
    }

    async fn enrich_all(
        &self,
        rows: Vec<ApplicationRow>,
    ) -> Result<Vec<ApplicationWithRelations>, AppError> {
        try_join_all(rows.into_iter().map(|row| self.enrich(row))).await
    }
}

#[async_trait]
impl Storage for MySqlStorage {
    #[tracing::instrument(name = "Insert application (mysql)", skip(self, application))]
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ApplicationWithRelations, AppError> {
        let stored = application.to_application(new_record_id(), submission_timestamp());

        let mut tx = self.pool.begin().await.map_err(AppError::db_error)?;

        let mut insert_application: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "INSERT INTO scholarship_applications ({}) ",
            APPLICATION_COLUMNS
        ));
        insert_application.push_values(std::iter::once(&stored), |mut b, a| {
            b.push_bind(a.id.clone())
                .push_bind(a.submission_date)
                .push_bind(a.semester1_amount)
                .push_bind(a.semester2_amount)
                .push_bind(a.surname.clone())
                .push_bind(a.first_name.clone())
                .push_bind(a.middle_name.clone())
                .push_bind(a.gender.as_str())
                .push_bind(a.nationality.clone())
                .push_bind(a.date_of_birth)
                .push_bind(a.age)
                .push_bind(a.student_id.clone())
                .push_bind(a.projected_graduation_year.clone())
                .push_bind(a.telephone.clone())
                .push_bind(a.email.clone())
                .push_bind(a.home_address.clone())
                .push_bind(a.faculty_school.clone())
                .push_bind(a.course_of_study.clone())
                .push_bind(a.year_started_utech.clone())
                .push_bind(a.gpa.clone())
                .push_bind(a.programme_type.as_str())
                .push_bind(a.programme_mode.as_str())
                .push_bind(a.year_in_school.as_str())
                .push_bind(a.did_transfer)
                .push_bind(a.transfer_programme_name.clone())
                .push_bind(a.sport.clone())
                .push_bind(a.event_position.clone())
                .push_bind(a.major_accomplishments.clone())
                .push_bind(a.national_representative)
                .push_bind(a.national_rep_details.clone())
                .push_bind(a.scholarship_tuition)
                .push_bind(a.scholarship_accommodation)
                .push_bind(a.scholarship_books);
        });

        insert_application
            .build()
            .execute(&mut *tx)
            .await
            .map_err(AppError::db_error)?;

        let mut guardians = Vec::with_capacity(application.guardians.len());
        for guardian in &application.guardians {
            let result = sqlx::query(
                "INSERT INTO guardians (application_id, surname, first_name, middle_initial, relation, telephone, address) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&stored.id)
            .bind(&guardian.surname)
            .bind(&guardian.first_name)
            .bind(&guardian.middle_initial)
            .bind(&guardian.relation)
            .bind(&guardian.telephone)
            .bind(&guardian.address)
            .execute(&mut *tx)
            .await
            .map_err(AppError::db_error)?;

            guardians.push(guardian.to_guardian(result.last_insert_id() as i64, &stored.id));
        }

        let mut affiliations = Vec::with_capacity(application.affiliations.len());
        for affiliation in &application.affiliations {
            let result = sqlx::query("INSERT INTO affiliations (application_id, name) VALUES (?, ?)")
                .bind(&stored.id)
                .bind(&affiliation.name)
                .execute(&mut *tx)
                .await
                .map_err(AppError::db_error)?;

            affiliations.push(affiliation.to_affiliation(result.last_insert_id() as i64, &stored.id));
        }

        tx.commit().await.map_err(AppError::db_error)?;

        Ok(ApplicationWithRelations {
            application: stored,
            guardians,
            affiliations,
        })
    }

    #[tracing::instrument(name = "Fetch applications (mysql)", skip(self))]
    async fn get_all_applications(&self) -> Result<Vec<ApplicationWithRelations>, AppError> {
        let query = format!(
            "SELECT {} FROM scholarship_applications ORDER BY submission_date DESC",
            APPLICATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, ApplicationRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        self.enrich_all(rows).await
    }

    #[tracing::instrument(name = "Fetch application (mysql)", skip(self))]
    async fn get_application_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationWithRelations>, AppError> {
        let query = format!(
            "SELECT {} FROM scholarship_applications WHERE id = ?",
            APPLICATION_COLUMNS
        );

        let row = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        match row {
            Some(row) => self.enrich(row).await.map(Some),
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "Search applications (mysql)", skip(self))]
    async fn search_applications(
        &self,
        query: &str,
    ) -> Result<Vec<ApplicationWithRelations>, AppError> {
        if query.trim().is_empty() {
            return self.get_all_applications().await;
        }

        let sql = format!(
            "SELECT {} FROM scholarship_applications \
             WHERE LOWER(first_name) LIKE LOWER(?) OR LOWER(surname) LIKE LOWER(?) \
             OR LOWER(student_id) LIKE LOWER(?) OR LOWER(sport) LIKE LOWER(?) \
             OR LOWER(faculty_school) LIKE LOWER(?) \
             ORDER BY submission_date DESC",
            APPLICATION_COLUMNS
        );

        let pattern = search_pattern(query);
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        self.enrich_all(rows).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    #[tracing::instrument(name = "Insert user (mysql)", skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let id = new_record_id();

        sqlx::query("INSERT INTO users (id, username, password) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(user.into_user(id))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
