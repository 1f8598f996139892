use crate::AppState;
use crate::api::error::AppError;
use crate::services::storage::FileReader;
use crate::utils::range::{RangeError, parse_range};
use crate::utils::validation::{
    content_type_from_extension, resolve_content_type, validate_leaf_name,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Bytes inspected when the extension does not identify the content type
const SNIFF_LEN: u64 = 8192;

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::Internal(format!("Invalid header value: {:?}", value)))
}

async fn sniff_content_type(name: &str, reader: &mut dyn FileReader) -> Result<String, AppError> {
    if let Some(content_type) = content_type_from_extension(name) {
        return Ok(content_type.to_string());
    }

    let mut head = Vec::new();
    (&mut *reader)
        .take(SNIFF_LEN)
        .read_to_end(&mut head)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", name, e)))?;
    reader
        .seek(SeekFrom::Start(0))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to rewind {}: {}", name, e)))?;

    Ok(resolve_content_type(name, &head))
}

fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    // RFC 5987 percent-encoding for UTF-8 filename
    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

#[utoipa::path(
    get,
    path = "/stream/{name}",
    params(
        ("name" = String, Path, description = "Name of the stored file"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Full file body"),
        (status = 206, description = "Requested byte range"),
        (status = 400, description = "Invalid name or Range header", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn stream_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    validate_leaf_name(&name).map_err(|e| AppError::BadRequest(e.message))?;

    let (mut reader, entry) = state.storage.open(&name).await?;
    let file_size = entry.size;

    // Headers are fixed before the first body byte goes out
    let content_type = sniff_content_type(&name, &mut *reader).await?;

    let range = match headers.get(header::RANGE) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::BadRequest("invalid Range header".to_string()))?;
            match parse_range(value, file_size) {
                Ok(range) => range,
                Err(RangeError::Unsatisfiable) => {
                    return Err(AppError::RangeNotSatisfiable(file_size));
                }
                Err(e) => return Err(AppError::BadRequest(e.to_string())),
            }
        }
        None => None,
    };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, header_value(&content_type)?);
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&content_disposition(&name))?,
    );
    if let Some(modified) = entry.modified {
        let rfc1123 = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        response_headers.insert(header::LAST_MODIFIED, header_value(&rfc1123)?);
    }

    let (status, length) = match range {
        Some(range) => {
            reader
                .seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| AppError::Internal(format!("Failed to seek {}: {}", name, e)))?;
            response_headers.insert(
                header::CONTENT_RANGE,
                header_value(&range.content_range(file_size))?,
            );
            tracing::debug!(
                file = %name,
                start = range.start,
                end = range.end,
                "Serving byte range"
            );
            (StatusCode::PARTIAL_CONTENT, range.len())
        }
        None => (StatusCode::OK, file_size),
    };
    response_headers.insert(header::CONTENT_LENGTH, header_value(&length.to_string())?);

    // The response is already committed once streaming starts, so a failed
    // read only truncates the body
    let stream_name = name.clone();
    let stream = ReaderStream::with_capacity(reader.take(length), state.config.max_stream_buffer)
        .inspect_err(move |e| {
            tracing::warn!(file = %stream_name, error = %e, "Stream aborted mid-copy");
        });

    tracing::info!(
        file = %name,
        size = file_size,
        content_type = %content_type,
        "Streaming file"
    );

    Ok((status, response_headers, Body::from_stream(stream)).into_response())
}
