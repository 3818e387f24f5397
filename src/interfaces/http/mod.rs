pub mod log_buffer;
pub mod render;
pub mod session;

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use actix_web::http::StatusCode;
use actix_web::{
    dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder,
    ResponseError,
};
use futures_util::StreamExt;

use crate::application::use_cases::duplicate_report::ensure_within_limit;
use crate::application::DuplicateReportUseCase;
use crate::domain::error::AppError;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::session_store::SessionStore;

pub use log_buffer::{LogBuffer, LogEntry, LogLevel};
use session::CallerSession;

/// Multipart field carrying the CSV file
pub const UPLOAD_FIELD: &str = "file";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub struct HttpState {
    pub report_use_case: DuplicateReportUseCase,
    pub sessions: Arc<dyn SessionStore>,
    pub logs: Arc<LogBuffer>,
    pub cookie_name: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ParseError(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotAvailable => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}

#[get("/")]
async fn index(req: HttpRequest, data: web::Data<HttpState>) -> impl Responder {
    let session = CallerSession::resolve(&req, &data.cookie_name);

    let mut response = HttpResponse::Ok();
    session.attach(&mut response, &data.cookie_name);
    response
        .content_type(HTML_CONTENT_TYPE)
        .body(render::index_page(data.report_use_case.max_upload_bytes()))
}

#[post("/upload")]
async fn upload(
    req: HttpRequest,
    data: web::Data<HttpState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let session = CallerSession::resolve(&req, &data.cookie_name);

    let file = read_upload(payload, data.report_use_case.max_upload_bytes())
        .await
        .map_err(|err| log_failure(&data.logs, "Upload", err))?;

    data.logs.add_log(
        LogLevel::Info,
        "Upload",
        &format!(
            "Received {} ({} bytes, session={})",
            file.filename,
            file.bytes.len(),
            session.id
        ),
    );

    let report = data
        .report_use_case
        .analyze(&file.bytes)
        .map_err(|err| log_failure(&data.logs, "Upload", err))?;

    data.sessions.put(&session.id, report.duplicates.clone());

    data.logs.add_log(
        LogLevel::Info,
        "Upload",
        &format!(
            "Processed {}: {} rows, {} duplicate rows in {} groups ({} ms)",
            file.filename,
            report.table.row_count(),
            report.duplicates.len(),
            report.duplicates.group_count(),
            report.processing_time_ms
        ),
    );

    let mut response = HttpResponse::Ok();
    session.attach(&mut response, &data.cookie_name);
    Ok(response
        .content_type(HTML_CONTENT_TYPE)
        .body(render::results_page(&file.filename, &report)))
}

#[get("/download_duplicates")]
async fn download_duplicates(
    req: HttpRequest,
    data: web::Data<HttpState>,
) -> Result<HttpResponse, AppError> {
    let stored = CallerSession::existing(&req, &data.cookie_name)
        .and_then(|session| data.sessions.get(&session));

    let export = data
        .report_use_case
        .export(stored.as_deref())
        .map_err(|err| log_failure(&data.logs, "Download", err))?;

    data.logs.add_log(
        LogLevel::Info,
        "Download",
        &format!("Sending {} ({} bytes)", export.filename, export.bytes.len()),
    );

    Ok(HttpResponse::Ok()
        .content_type(export.content_type)
        .insert_header(ContentDisposition::attachment(export.filename))
        .body(export.bytes))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.logs.snapshot())
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Pull the `file` part out of the multipart body, enforcing the size
/// limit while streaming.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<UploadedFile, AppError> {
    while let Some(field) = payload.next().await {
        let mut field = field
            .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?;

        let (name, filename) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().map(str::to_string),
                disposition.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        if name.as_deref() != Some(UPLOAD_FIELD) {
            // Unrelated parts are read and discarded
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| {
                    AppError::ValidationError(format!("Invalid multipart body: {}", e))
                })?;
            }
            continue;
        }

        let filename = filename.unwrap_or_default();
        if filename.is_empty() {
            return Err(AppError::ValidationError("No selected file".to_string()));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::ValidationError(format!("Failed to read uploaded file: {}", e))
            })?;
            ensure_within_limit(bytes.len() + chunk.len(), limit)?;
            bytes.extend_from_slice(&chunk);
        }

        return Ok(UploadedFile { filename, bytes });
    }

    Err(AppError::ValidationError("No file part".to_string()))
}

fn log_failure(logs: &LogBuffer, source: &str, err: AppError) -> AppError {
    let level = if err.is_client_error() {
        LogLevel::Warn
    } else {
        LogLevel::Error
    };
    logs.add_log(level, source, &err.to_string());
    err
}

/// Route table shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(upload)
        .service(download_duplicates)
        .service(web::scope("/api").service(get_logs));
}

pub fn start_server(state: web::Data<HttpState>, config: &ServerConfig) -> std::io::Result<Server> {
    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((config.host.as_str(), config.port))?
        .run();

    Ok(server)
}
