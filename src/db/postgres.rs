use async_trait::async_trait;
use futures_util::future::try_join_all;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::rows::{ApplicationRow, AFFILIATION_COLUMNS, APPLICATION_COLUMNS, GUARDIAN_COLUMNS, USER_COLUMNS};
use super::{new_record_id, search_pattern, submission_timestamp, Storage};
use crate::core::AppError;
use crate::models::applications::{
    Affiliation, ApplicationWithRelations, Guardian, NewApplication, ScholarshipApplication,
};
use crate::models::users::{NewUser, User};

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn guardians_for(&self, application_id: &str) -> Result<Vec<Guardian>, AppError> {
        let query = format!(
            "SELECT {} FROM guardians WHERE application_id = $1 ORDER BY id",
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
            "SELECT {} FROM affiliations WHERE application_id = $1 ORDER BY id",
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
impl Storage for PgStorage {
    #[tracing::instrument(name = "Insert application (postgres)", skip(self, application))]
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ApplicationWithRelations, AppError> {
        let id = new_record_id();
        let submitted_at = submission_timestamp();

        let mut tx = self.pool.begin().await.map_err(AppError::db_error)?;

        let mut insert_application: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO scholarship_applications ({}) ",
            APPLICATION_COLUMNS
        ));
        insert_application.push_values(std::iter::once(application), |mut b, a| {
            b.push_bind(id.clone())
                .push_bind(submitted_at)
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
        insert_application.push(format!(" RETURNING {}", APPLICATION_COLUMNS));

        let row = insert_application
            .build_query_as::<ApplicationRow>()
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::db_error)?;

        // Guardians are never empty once validated; the check keeps the builder
        // from producing an INSERT without a VALUES list.
        let guardians = if application.guardians.is_empty() {
            Vec::new()
        } else {
            let mut insert_guardians: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO guardians (application_id, surname, first_name, middle_initial, relation, telephone, address) ",
            );
            insert_guardians.push_values(&application.guardians, |mut b, g| {
                b.push_bind(id.clone())
                    .push_bind(g.surname.clone())
                    .push_bind(g.first_name.clone())
                    .push_bind(g.middle_initial.clone())
                    .push_bind(g.relation.clone())
                    .push_bind(g.telephone.clone())
                    .push_bind(g.address.clone());
            });
            insert_guardians.push(format!(" RETURNING {}", GUARDIAN_COLUMNS));

            insert_guardians
                .build_query_as::<Guardian>()
                .fetch_all(&mut *tx)
                .await
                .map_err(AppError::db_error)?
        };

        let affiliations = if application.affiliations.is_empty() {
            Vec::new()
        } else {
            let mut insert_affiliations: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO affiliations (application_id, name) ");
            insert_affiliations.push_values(&application.affiliations, |mut b, a| {
                b.push_bind(id.clone()).push_bind(a.name.clone());
            });
            insert_affiliations.push(format!(" RETURNING {}", AFFILIATION_COLUMNS));

            insert_affiliations
                .build_query_as::<Affiliation>()
                .fetch_all(&mut *tx)
                .await
                .map_err(AppError::db_error)?
        };

        tx.commit().await.map_err(AppError::db_error)?;

        Ok(ApplicationWithRelations {
            application: ScholarshipApplication::try_from(row)?,
            guardians,
            affiliations,
        })
    }

    #[tracing::instrument(name = "Fetch applications (postgres)", skip(self))]
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

    #[tracing::instrument(name = "Fetch application (postgres)", skip(self))]
    async fn get_application_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationWithRelations>, AppError> {
        let query = format!(
            "SELECT {} FROM scholarship_applications WHERE id = $1",
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

    #[tracing::instrument(name = "Search applications (postgres)", skip(self))]
    async fn search_applications(
        &self,
        query: &str,
    ) -> Result<Vec<ApplicationWithRelations>, AppError> {
        if query.trim().is_empty() {
            return self.get_all_applications().await;
        }

        let sql = format!(
            "SELECT {} FROM scholarship_applications \
             WHERE first_name ILIKE $1 OR surname ILIKE $1 OR student_id ILIKE $1 \
             OR sport ILIKE $1 OR faculty_school ILIKE $1 \
             ORDER BY submission_date DESC",
            APPLICATION_COLUMNS
        );

        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(search_pattern(query))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        self.enrich_all(rows).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    #[tracing::instrument(name = "Insert user (postgres)", skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (id, username, password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(new_record_id())
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::db_error)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
