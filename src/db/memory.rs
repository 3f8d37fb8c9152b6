use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{new_record_id, search_pattern, submission_timestamp, Storage};
use crate::core::AppError;
use crate::models::applications::{
    Affiliation, ApplicationWithRelations, Guardian, NewApplication, ScholarshipApplication,
};
use crate::models::users::{NewUser, User};

#[derive(Default)]
struct Tables {
    applications: Vec<ScholarshipApplication>,
    guardians: Vec<Guardian>,
    affiliations: Vec<Affiliation>,
    users: Vec<User>,
    last_guardian_id: i64,
    last_affiliation_id: i64,
}

impl Tables {
    fn enrich(&self, application: &ScholarshipApplication) -> ApplicationWithRelations {
        ApplicationWithRelations {
            application: application.clone(),
            guardians: self
                .guardians
                .iter()
                .filter(|g| g.application_id == application.id)
                .cloned()
                .collect(),
            affiliations: self
                .affiliations
                .iter()
                .filter(|a| a.application_id == application.id)
                .cloned()
                .collect(),
        }
    }

    /// Newest first; same-instant submissions keep reverse insertion order.
    fn newest_first<'a>(
        &self,
        applications: impl DoubleEndedIterator<Item = &'a ScholarshipApplication>,
    ) -> Vec<ApplicationWithRelations> {
        let mut selected: Vec<&ScholarshipApplication> = applications.rev().collect();
        selected.sort_by(|a, b| b.submission_date.cmp(&a.submission_date));
        selected.into_iter().map(|a| self.enrich(a)).collect()
    }
}

/// Process-local backend with the same observable behaviour as the SQL ones.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn application_count(&self) -> usize {
        self.tables.read().await.applications.len()
    }

    pub async fn guardian_count(&self) -> usize {
        self.tables.read().await.guardians.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ApplicationWithRelations, AppError> {
        let mut tables = self.tables.write().await;

        let stored = application.to_application(new_record_id(), submission_timestamp());

        let guardians: Vec<Guardian> = application
            .guardians
            .iter()
            .zip(tables.last_guardian_id + 1..)
            .map(|(guardian, id)| guardian.to_guardian(id, &stored.id))
            .collect();
        let affiliations: Vec<Affiliation> = application
            .affiliations
            .iter()
            .zip(tables.last_affiliation_id + 1..)
            .map(|(affiliation, id)| affiliation.to_affiliation(id, &stored.id))
            .collect();

        // Everything is built before the tables change, so a submission
        // is either fully visible or not at all.
        tables.last_guardian_id += guardians.len() as i64;
        tables.last_affiliation_id += affiliations.len() as i64;
        tables.applications.push(stored.clone());
        tables.guardians.extend(guardians.iter().cloned());
        tables.affiliations.extend(affiliations.iter().cloned());

        Ok(ApplicationWithRelations {
            application: stored,
            guardians,
            affiliations,
        })
    }

    async fn get_all_applications(&self) -> Result<Vec<ApplicationWithRelations>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.newest_first(tables.applications.iter()))
    }

    async fn get_application_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationWithRelations>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .iter()
            .find(|a| a.id == id)
            .map(|a| tables.enrich(a)))
    }

    async fn search_applications(
        &self,
        query: &str,
    ) -> Result<Vec<ApplicationWithRelations>, AppError> {
        if query.trim().is_empty() {
            return self.get_all_applications().await;
        }

        let pattern = search_pattern(query).to_lowercase();
        let matches = |value: &str| like_matches(&pattern, &value.to_lowercase());

        let tables = self.tables.read().await;
        let found = tables.applications.iter().filter(|a| {
            matches(&a.first_name)
                || matches(&a.surname)
                || matches(&a.student_id)
                || matches(&a.sport)
                || matches(&a.faculty_school)
        });

        Ok(tables.newest_first(found))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::db_error(format!(
                "duplicate key value violates unique constraint \"users_username_key\" ({})",
                user.username
            )));
        }

        let user = user.into_user(new_record_id());
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn close(&self) {}
}

enum LikeToken {
    AnyRun,
    AnyOne,
    Literal(char),
}

/// Consecutive `%` collapse into one token.
fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyOne,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        };
        if matches!(token, LikeToken::AnyRun) && matches!(tokens.last(), Some(LikeToken::AnyRun)) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

/// SQL `LIKE` semantics: `%` is any run, `_` any one char, `\` escapes.
///
/// Greedy match that only ever backtracks to the most recent `%`, so the
/// cost stays within pattern length times text length.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let tokens = like_tokens(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut last_run: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::AnyRun) => {
                last_run = Some((p, t));
                p += 1;
            }
            Some(LikeToken::AnyOne) => {
                p += 1;
                t += 1;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match last_run {
                Some((run_p, run_t)) => {
                    last_run = Some((run_p, run_t + 1));
                    p = run_p + 1;
                    t = run_t + 1;
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|token| matches!(token, LikeToken::AnyRun))
}
