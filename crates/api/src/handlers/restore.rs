//! Handlers for submitting restorations and looking up their results.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use restora_core::content_hash::ContentHash;
use restora_core::hide_faces::parse_hide_faces;
use restora_core::record::ResultRecord;
use restora_store::StoredOriginal;

use crate::background::RestoreJob;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Fields accepted by `POST /restore`.
#[derive(Debug, Default)]
struct SubmitForm {
    image: Option<Vec<u8>>,
    hash: Option<String>,
    hide_faces: Option<String>,
}

impl SubmitForm {
    /// Collect the known fields; unknown ones are ignored. Empty values
    /// count as absent.
    async fn read(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "image" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !data.is_empty() {
                        form.image = Some(data.to_vec());
                    }
                }
                "hash" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        form.hash = Some(text.to_string());
                    }
                }
                "hide_faces" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.hide_faces = Some(text);
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// POST /restore
///
/// Store an uploaded image (or re-fetch a known one by hash), schedule a
/// restoration in the background and return the current record right away.
/// An uploaded `image` takes precedence over `hash`.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ResultRecord>> {
    let form = SubmitForm::read(&mut multipart).await?;
    let hide_faces = parse_hide_faces(form.hide_faces.as_deref().unwrap_or(""))?;

    let stored = match (form.image, form.hash) {
        (Some(bytes), _) => state.store.put_original(&bytes).await?,
        (None, Some(raw)) => {
            let hash = ContentHash::parse(&raw)?;
            state.store.get_original(&hash).await?
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either upload an image or pass a hash.".into(),
            ));
        }
    };

    // The hash stays locked until the job is registered: a running task
    // for the same hash cannot write between the clear and `begin`, and a
    // failed submission never supersedes it.
    let record = state.store.describe(&stored.hash).await?;
    let generation = state.restorations.begin(&stored.guard);
    let record = record.with_tracked_status(state.restorations.status(&stored.hash));

    let StoredOriginal { hash, png, guard } = stored;
    drop(guard);

    state.restorations.spawn(RestoreJob {
        hash,
        generation,
        image: png,
        hide_faces,
    });

    Ok(Json(record))
}

/// GET /restore/{hash}
///
/// Current record for a hash. Read-only: unlike a hash submission it does
/// not clear previous results.
pub async fn lookup(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> AppResult<Json<ResultRecord>> {
    let hash = ContentHash::parse(&raw)?;
    let record = describe(&state, &hash).await?;
    tracing::debug!(%hash, status = record.status.as_str(), faces = record.faces.len(), "Lookup");
    Ok(Json(record))
}

/// Store snapshot overlaid with the tracked job status.
async fn describe(state: &AppState, hash: &ContentHash) -> AppResult<ResultRecord> {
    let record = state.store.describe(hash).await?;
    Ok(record.with_tracked_status(state.restorations.status(hash)))
}
