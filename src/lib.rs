pub mod core;
pub mod db;
pub mod models;
pub mod routes;
pub mod scholarship_web_server;
