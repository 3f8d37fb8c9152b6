use std::fmt::{Debug, Display};

use scholarship_portal::core::{get_subscriber, init_subscriber, AppConfig};
use scholarship_portal::scholarship_web_server::ScholarshipWebServer;
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let file_appender =
        tracing_appender::rolling::daily("/var/tmp/log/scholarship_portal", "app");

    let subscriber = get_subscriber("scholarship_portal".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new()?;
    let (host, port) = (
        config.scholarship_server_config.host.clone(),
        config.scholarship_server_config.port,
    );

    let server = ScholarshipWebServer::build(config).await?;
    let server_task = tokio::spawn(server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!("🚀 Server started on Addr: {}:{}", host, port);
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        outcome = server_task => report_exit("scholarship web server", outcome),
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
