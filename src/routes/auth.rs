use actix_web::cookie::Cookie;
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::core::config::SessionConfig;
use crate::core::session::Session;
use crate::core::AppError;

#[tracing::instrument(name = "Current Session", skip(session))]
#[get("/session")]
pub async fn current_session(session: Session) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(session.0))
}

#[tracing::instrument(name = "Sign Out", skip(config))]
#[post("/signout")]
pub async fn sign_out(config: web::Data<SessionConfig>) -> HttpResponse {
    let mut removal = Cookie::named(config.cookie_name.clone());
    removal.set_path("/");
    removal.make_removal();

    HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "ok": true }))
}
