mod applications;
mod auth;
mod health_check;
mod helpers;
