use std::error::Error;
use std::sync::Arc;

use actix_web::web;
use tracing::error;

use crate::application::DuplicateReportUseCase;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::session_store::{InMemorySessionStore, SessionStore};
use crate::interfaces::http::{start_server, HttpState, LogBuffer, LogLevel};

/// Wire the use case, session store and log buffer from configuration.
pub fn build_state(config: &AppConfig) -> Result<web::Data<HttpState>, Box<dyn Error>> {
    let loader = config.csv.loader()?;
    let writer = config.csv.writer()?;
    let report_use_case = DuplicateReportUseCase::new(loader, writer, config.upload.max_bytes);

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(config.session.ttl()));
    let logs = Arc::new(LogBuffer::new(config.logging.buffer_capacity));

    Ok(web::Data::new(HttpState {
        report_use_case,
        sessions,
        logs,
        cookie_name: config.session.cookie_name.clone(),
    }))
}

/// Start the HTTP server and run until it is stopped.
pub async fn serve(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let state = build_state(&config)?;

    let server = start_server(state.clone(), &config.server).map_err(|err| {
        error!(
            error = %err,
            host = %config.server.host,
            port = config.server.port,
            "Failed to start HTTP server"
        );
        err
    })?;

    state.logs.add_log(
        LogLevel::Info,
        "System",
        &format!(
            "HTTP server started on http://{}:{} (max upload {} bytes)",
            config.server.host, config.server.port, config.upload.max_bytes
        ),
    );

    server.await?;

    state
        .logs
        .add_log(LogLevel::Info, "System", "HTTP server stopped");
    Ok(())
}
