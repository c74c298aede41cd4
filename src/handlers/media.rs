//! Media relay: validate uploaded files, process them (image transcode /
//! audio duration probe), push them to object storage, and write the
//! resulting URLs back into the request body map.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config;
use crate::error::ApiError;
use crate::i18n::humanize;
use crate::media::{
    audio_duration_secs, ensure_allowed, files_for, transcode_image, MediaError, UploadedFile,
    AUDIO_MIME_TYPES, IMAGE_MIME_TYPES,
};
use crate::query::is_identifier;
use crate::state::AppState;
use crate::storage::{self, ObjectStore};

/// Drain a multipart request into memory, keeping the form field grouping.
pub async fn collect_files(multipart: &mut Multipart) -> Result<Vec<UploadedFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        files.push(UploadedFile {
            field: name,
            name: file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// Validate and upload image files for `field`, writing the resulting URL
/// (or, in `multiple` mode, an input-ordered URL array) back into `body`.
pub async fn upload_image(
    store: &ObjectStore,
    files: &[UploadedFile],
    body: &mut Map<String, Value>,
    folder: &str,
    field: &str,
    required: bool,
    multiple: bool,
    full_quality: bool,
) -> Result<(), ApiError> {
    let targets = files_for(files, field);
    if targets.is_empty() {
        if required {
            return Err(MediaError::Required {
                field: humanize(field),
            }
            .into());
        }
        return Ok(());
    }
    ensure_allowed(&targets, IMAGE_MIME_TYPES, "image")?;

    let media = &config::config().media;
    let quality = if full_quality {
        media.full_image_quality
    } else {
        media.image_quality
    };

    if multiple {
        let uploads = targets
            .iter()
            .copied()
            .map(|file| upload_one_image(store, file, folder, quality));
        let urls = try_join_all(uploads).await?;
        body.insert(
            field.to_string(),
            Value::Array(urls.into_iter().map(Value::String).collect()),
        );
    } else {
        let url = upload_one_image(store, targets[0], folder, quality).await?;
        body.insert(field.to_string(), Value::String(url));
    }
    Ok(())
}

async fn upload_one_image(
    store: &ObjectStore,
    file: &UploadedFile,
    folder: &str,
    quality: u8,
) -> Result<String, ApiError> {
    let jpeg = transcode_image(&file.bytes, quality)?;
    let key = storage::image_key(folder, folder);
    Ok(store.put(&key, jpeg, "image/jpeg").await?)
}

/// Validate and upload one audio file for `field`, writing both the URL and
/// the measured duration (whole seconds) back into `body`.
pub async fn upload_audio(
    store: &ObjectStore,
    files: &[UploadedFile],
    body: &mut Map<String, Value>,
    folder: &str,
    field: &str,
    required: bool,
) -> Result<(), ApiError> {
    let targets = files_for(files, field);
    let Some(file) = targets.first() else {
        if required {
            return Err(MediaError::Required {
                field: humanize(field),
            }
            .into());
        }
        return Ok(());
    };
    ensure_allowed(&targets, AUDIO_MIME_TYPES, "audio")?;

    let duration = audio_duration_secs(file.bytes.clone(), file.extension())?;
    let key = storage::audio_key(folder, folder, &file.name);
    let url = store.put(&key, file.bytes.clone(), &file.content_type).await?;

    body.insert(field.to_string(), Value::String(url));
    body.insert("duration".to_string(), Value::from(duration));
    Ok(())
}

/// Best-effort removal of a previously uploaded object by its public URL.
/// Failures are logged, never surfaced.
pub async fn delete_file(store: &ObjectStore, link: Option<&str>, folder: &str) {
    let Some(link) = link.filter(|l| !l.is_empty()) else {
        return;
    };
    match storage::key_from_url(link, folder, folder) {
        Some(key) => {
            if let Err(e) = store.delete(&key).await {
                tracing::warn!(url = %link, "best-effort delete failed: {}", e);
            }
        }
        None => tracing::warn!(url = %link, "could not derive storage key from url"),
    }
}

fn valid_folder(folder: &str) -> Result<&str, ApiError> {
    if is_identifier(folder) {
        Ok(folder)
    } else {
        Err(ApiError::bad_request("invalid folder name"))
    }
}

/// POST /admin/media/:folder - multipart upload of `image` (one or many)
/// and/or `audio` fields; responds with the rewritten body fragment.
/// `?fullQuality=true` re-encodes images at full quality.
pub async fn upload(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let folder = valid_folder(&folder)?.to_string();
    let full_quality = query.full_quality.unwrap_or(false);
    let files = collect_files(&mut multipart).await?;

    let mut body = Map::new();
    let images = files_for(&files, "image");
    if !images.is_empty() {
        let multiple = images.len() > 1;
        upload_image(
            &state.store,
            &files,
            &mut body,
            &folder,
            "image",
            false,
            multiple,
            full_quality,
        )
        .await?;
    }
    if !files_for(&files, "audio").is_empty() {
        upload_audio(&state.store, &files, &mut body, &folder, "audio", false).await?;
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("no supported file fields present"));
    }

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": body }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub full_quality: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub url: Option<String>,
}

/// DELETE /admin/media/:folder - best-effort object removal by URL.
pub async fn remove(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let folder = valid_folder(&folder)?.to_string();
    delete_file(&state.store, query.url.as_deref(), &folder).await;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
