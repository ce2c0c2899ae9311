use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Extension, FromRequestParts, Multipart, Path, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use headers::{HeaderMapExt, Host};
use http::{HeaderMap, HeaderValue, StatusCode, Uri, header, request::Parts};
use std::convert::Infallible;
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::Payload;
use crate::service::FolderService;
use crate::storage::UploadedFile;

pub fn router(service: FolderService, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(list_files))
        .route("/files", get(list_files))
        .route("/files/{filename}", get(get_file))
        .route("/files/upload/single", post(upload_file))
        .route("/files/upload/multiple", post(upload_files))
        .route("/files/delete/{filename}", post(delete_file))
        .route("/files/empty", get(get_empty_file).post(delete_all_files))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(trace_requests))
        .layer(Extension(service))
}

async fn trace_requests(req: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let response = next.run(req).await;
        tracing::info!(status = %response.status(), "request handled");
        response
    }
    .instrument(span)
    .await
}

/// `<scheme>://<host>` of the incoming request, used to build download links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BaseUrl(base_url(&parts.uri, &parts.headers)))
    }
}

fn base_url(uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = uri
        .scheme_str()
        .map(str::to_owned)
        .or_else(|| {
            headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| "http".to_string());

    let authority = headers
        .typed_get::<Host>()
        .map(|host| match host.port() {
            Some(port) => format!("{}:{}", host.hostname(), port),
            None => host.hostname().to_string(),
        })
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    format!("{scheme}://{authority}")
}

enum Uploads {
    Files(Vec<UploadedFile>),
    TooLarge,
}

/// Collects every file sent under `field_name`. Parts without a usable
/// filename are dropped here so the store never sees them.
async fn bind_uploads(multipart: &mut Multipart, field_name: &str) -> Result<Uploads, ApiError> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return Ok(Uploads::TooLarge),
            Err(e) => return Err(ApiError::BadRequest(e.body_text())),
        };

        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field.file_name().and_then(clean_filename);
        let content_type = field.content_type().and_then(|m| m.parse().ok());

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return Ok(Uploads::TooLarge),
            Err(e) => return Err(ApiError::BadRequest(e.body_text())),
        };

        match filename {
            Some(original_filename) => files.push(UploadedFile {
                field_name: field_name.to_string(),
                original_filename,
                content_type,
                bytes: bytes.to_vec(),
            }),
            None => tracing::debug!(field = field_name, "skipping part without a filename"),
        }
    }

    Ok(Uploads::Files(files))
}

/// Keeps the last path segment of a client supplied filename.
fn clean_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

async fn upload_file(
    Extension(service): Extension<FolderService>,
    BaseUrl(base_url): BaseUrl,
    mut multipart: Multipart,
) -> Result<Json<Payload>, ApiError> {
    let payload = match bind_uploads(&mut multipart, "file").await? {
        Uploads::Files(files) => service.upload_file(files.into_iter().next(), &base_url).await,
        Uploads::TooLarge => service.file_too_large(&base_url).await,
    };
    Ok(Json(payload))
}

async fn upload_files(
    Extension(service): Extension<FolderService>,
    BaseUrl(base_url): BaseUrl,
    mut multipart: Multipart,
) -> Result<Json<Payload>, ApiError> {
    let payload = match bind_uploads(&mut multipart, "files").await? {
        Uploads::Files(files) => service.upload_files(files, &base_url).await,
        Uploads::TooLarge => service.file_too_large(&base_url).await,
    };
    Ok(Json(payload))
}

async fn list_files(
    Extension(service): Extension<FolderService>,
    BaseUrl(base_url): BaseUrl,
) -> Json<Payload> {
    Json(service.file_list(&base_url).await)
}

async fn get_file(
    Path(filename): Path<String>,
    Extension(service): Extension<FolderService>,
) -> Result<Response, ApiError> {
    download(&service, &filename).await
}

/// `/files/empty` is also the delete-all route; a GET there is still a download.
async fn get_empty_file(
    Extension(service): Extension<FolderService>,
) -> Result<Response, ApiError> {
    download(&service, "empty").await
}

async fn download(service: &FolderService, filename: &str) -> Result<Response, ApiError> {
    let file = service
        .file(Some(filename))
        .await
        .ok_or(ApiError::FileUnavailable)?;

    let content_type = mime_guess::from_path(&file.name).first_or_octet_stream();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response = Bytes::from(file.bytes).into_response();
    if let Ok(content_type) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

async fn delete_file(
    Path(filename): Path<String>,
    Extension(service): Extension<FolderService>,
    BaseUrl(base_url): BaseUrl,
) -> Json<Payload> {
    Json(service.delete_file(Some(&filename), &base_url).await)
}

async fn delete_all_files(
    Extension(service): Extension<FolderService>,
    BaseUrl(base_url): BaseUrl,
) -> Json<Payload> {
    Json(service.delete_all_files(&base_url).await)
}
