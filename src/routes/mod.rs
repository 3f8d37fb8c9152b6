use actix_web::web::{scope, JsonConfig, ServiceConfig};
use actix_web::Scope;

use crate::core::AppError;
use applications::{create_application, get_application, list_applications};
use auth::{current_session, sign_out};
use self::health_check::health_check as health_check_route;

mod applications;
mod auth;
mod health_check;

fn applications_routes() -> Scope {
    scope("api/applications")
        .service(list_applications)
        .service(create_application)
        .service(get_application)
}

fn auth_routes() -> Scope {
    scope("auth").service(current_session).service(sign_out)
}

/// Malformed or oversized JSON bodies answer like any other validation failure.
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| {
        AppError::payload_error(format!("Validation error: {}", err)).into()
    })
}

pub fn scholarship_routes(conf: &mut ServiceConfig) {
    conf.app_data(json_config())
        .service(health_check_route)
        .service(applications_routes())
        .service(auth_routes());
}
