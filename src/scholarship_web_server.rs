use crate::core::config::SessionConfig;
use crate::core::{AppConfig, ScholarshipRootSpan};
use crate::db::{connect_storage, Storage};
use crate::routes::scholarship_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct ScholarshipWebServer {
    port: u16,
    server: Server,
    storage: Arc<dyn Storage>,
}

impl ScholarshipWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.scholarship_server_config.host,
            configuration.scholarship_server_config.port
        );

        let storage = connect_storage(&configuration.database).await?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, storage.clone(), configuration.session)?;

        Ok(Self {
            port,
            server,
            storage,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until shutdown, then releases the storage pool.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let outcome = self.server.await;
        self.storage.close().await;
        tracing::info!("storage closed");
        outcome
    }
}

pub fn run(
    listener: TcpListener,
    storage: Arc<dyn Storage>,
    session: SessionConfig,
) -> Result<Server, anyhow::Error> {
    let storage: Data<dyn Storage> = Data::from(storage);
    let session = Data::new(session);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::<ScholarshipRootSpan>::new())
            .configure(scholarship_routes)
            .app_data(storage.clone())
            .app_data(session.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
