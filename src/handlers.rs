// src/handlers.rs
use crate::color::picker::{self, Control, Field, PointerEvent, Rect};
use crate::color::{parse_color, rgba_to_css, rgba_to_hex, rgba_to_hsl};
use crate::models::TUTORIAL_STEPS;
use crate::services::archive::{ARCHIVE_FILENAME, build_archive, mockup_filename};
use crate::session::{BUSY_MESSAGE, Batch, BatchGuard, Session};
use crate::{AppState, errors::MockitError, pipeline};
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

const FINISH_ATTEMPTS: usize = 3;

fn session_view(session: &Session) -> serde_json::Value {
    let mockups: Vec<_> = session
        .mockups
        .iter()
        .enumerate()
        .map(|(index, m)| {
            serde_json::json!({
                "index": index,
                "product": m.product.name,
                "placement": m.placement.name,
                "filename": mockup_filename(m),
                "url": format!("/api/v1/sessions/{}/mockups/{}", session.id, index),
                "generated_at": m.generated_at,
            })
        })
        .collect();

    serde_json::json!({
        "id": session.id,
        "logo": session.logo.as_ref().map(|l| serde_json::json!({
            "filename": l.filename,
            "content_type": l.content_type,
            "size": l.size,
            "preview": l.data_uri,
        })),
        "selection": session.selection,
        "selected_count": session.selection.len(),
        "loading": session.loading,
        "error": session.error,
        "mockups": mockups,
        "updated_at": session.updated_at,
    })
}

pub async fn list_products(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.catalog.products())
}

pub async fn create_session(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let session = Session::new(&data.catalog);
    data.redis_service.store_session(&session).await?;

    info!("Created session {}", session.id);
    Ok(HttpResponse::Created().json(session_view(&session)))
}

pub async fn get_session(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = data.redis_service.get_session(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(session_view(&session)))
}

pub async fn upload_logo(
    path: web::Path<Uuid>,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();

    let mut field = payload
        .try_next()
        .await?
        .ok_or_else(|| MockitError::Validation("No file provided".to_string()))?;

    let filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or("logo")
        .to_string();

    let content_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    data.image_processor.validate_upload(&content_type, 0)?;

    // Collect image data, rejecting oversized files without buffering all of them
    let mut image_data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        image_data.extend_from_slice(&chunk);
        data.image_processor
            .validate_upload(&content_type, image_data.len())?;
    }

    let mut session = data.redis_service.get_session(&session_id).await?;
    session.accept_logo_upload(
        &data.image_processor,
        &data.catalog,
        filename,
        content_type,
        &image_data,
    )?;
    if !data.batches.is_running(&session_id) && session.clear_stale_loading() {
        warn!("Cleared stale loading state for session {}", session_id);
    }
    data.redis_service.store_session(&session).await?;

    Ok(HttpResponse::Ok().json(session_view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct TogglePlacement {
    pub product_id: String,
    pub placement_id: String,
}

pub async fn toggle_placement(
    path: web::Path<Uuid>,
    body: web::Json<TogglePlacement>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if !data.catalog.contains(&body.product_id, &body.placement_id) {
        return Err(MockitError::NotFound(format!(
            "placement {} of product {}",
            body.placement_id, body.product_id
        ))
        .into());
    }

    let mut session = data.redis_service.get_session(&path.into_inner()).await?;
    let selected = session.toggle_placement(&body.product_id, &body.placement_id);
    data.redis_service.store_session(&session).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "product_id": body.product_id,
        "placement_id": body.placement_id,
        "selected": selected,
    })))
}

pub async fn start_generation(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();

    // Held until the spawned batch ends, so no second batch can start meanwhile
    let guard = data
        .batches
        .try_acquire(session_id)
        .ok_or_else(|| MockitError::Validation(BUSY_MESSAGE.to_string()))?;

    let mut session = data.redis_service.get_session(&session_id).await?;
    if session.clear_stale_loading() {
        warn!("Cleared stale loading state for session {}", session_id);
    }

    let started = session.start_generation(&data.catalog);
    data.redis_service.store_session(&session).await?;
    let batch = started?;

    let total = batch.tasks.len();
    actix_web::rt::spawn(run_batch(data.get_ref().clone(), session_id, batch, guard));

    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "session_id": session_id,
        "total": total,
        "message": session.loading.message,
    })))
}

/// Runs one batch to completion, persisting progress as it arrives and the outcome at the end.
async fn run_batch(data: AppState, session_id: Uuid, batch: Batch, guard: BatchGuard) {
    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, usize)>();

    let generation = pipeline::run(
        &batch.tasks,
        &batch.logo,
        data.generator.as_ref(),
        move |completed, total| {
            let _ = tx.send((completed, total));
        },
    );

    // Ends once the pipeline future completes and drops the sender
    let recorder = async {
        while let Some((completed, total)) = rx.recv().await {
            let recorded = async {
                let mut session = data.redis_service.get_session(&session_id).await?;
                session.record_progress(completed, total);
                data.redis_service.store_session(&session).await
            };
            if let Err(e) = recorded.await {
                warn!("Failed to record progress for session {}: {}", session_id, e);
            }
        }
    };

    let (outcome, ()) = tokio::join!(generation, recorder);

    match &outcome {
        Ok(mockups) => info!(
            "Session {} finished with {} mockup(s)",
            session_id,
            mockups.len()
        ),
        Err(MockitError::AllGenerationsFailed { attempted }) => error!(
            "All {} generation(s) failed for session {}",
            attempted, session_id
        ),
        Err(e) => error!("Generation failed for session {}: {}", session_id, e),
    }

    let finished = async {
        let mut session = data.redis_service.get_session(&session_id).await?;
        session.finish(outcome);

        let mut stored = data.redis_service.store_session(&session).await;
        for attempt in 1..FINISH_ATTEMPTS {
            let Err(e) = &stored else { break };
            warn!(
                "Failed to store results for session {} (attempt {}): {}",
                session_id, attempt, e
            );
            stored = data.redis_service.store_session(&session).await;
        }
        stored
    };
    if let Err(e) = finished.await {
        error!("Failed to store results for session {}: {}", session_id, e);
    }

    drop(guard);
}

pub async fn get_mockup(
    path: web::Path<(Uuid, usize)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (session_id, index) = path.into_inner();
    let session = data.redis_service.get_session(&session_id).await?;

    let mockup = session
        .mockups
        .get(index)
        .ok_or_else(|| MockitError::NotFound(format!("mockup {}", index)))?;

    let raw = data.image_processor.decode_data_uri(&mockup.image_url)?;
    let png = data.image_processor.to_png(&raw)?;

    Ok(HttpResponse::Ok()
        .content_type("image/png")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(mockup_filename(mockup))],
        })
        .body(png))
}

pub async fn clear_mockups(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut session = data.redis_service.get_session(&path.into_inner()).await?;
    session.clear_mockups();
    data.redis_service.store_session(&session).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub async fn download_archive(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = data.redis_service.get_session(&path.into_inner()).await?;
    if session.mockups.is_empty() {
        return Err(MockitError::Validation("There are no mockups to download.".to_string()).into());
    }

    let archive = build_archive(&data.image_processor, &session.mockups).map_err(|e| {
        error!("Failed to create zip file: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(ARCHIVE_FILENAME.to_string())],
        })
        .body(archive))
}

pub async fn get_tutorial(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let seen = data.redis_service.tutorial_seen().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "show": !seen,
        "steps": TUTORIAL_STEPS,
    })))
}

pub async fn dismiss_tutorial(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    data.redis_service.mark_tutorial_seen().await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct ColorValue {
    pub value: String,
}

pub async fn convert_color(body: web::Json<ColorValue>) -> HttpResponse {
    let rgba = parse_color(&body.value);
    HttpResponse::Ok().json(serde_json::json!({
        "rgba": rgba,
        "hex": rgba_to_hex(rgba),
        "hsl": rgba_to_hsl(rgba),
        "css": rgba_to_css(rgba),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickerInput {
    Pointer {
        control: Control,
        rect: Rect,
        pointer: PointerEvent,
    },
    Field {
        field: Field,
        amount: f64,
    },
    Hex {
        hex: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct PickerRequest {
    pub value: String,
    #[serde(flatten)]
    pub input: PickerInput,
}

/// Applies one picker interaction; `value` is null when the interaction emits nothing.
pub async fn picker_event(body: web::Json<PickerRequest>) -> HttpResponse {
    let current = &body.value;
    let emitted = match &body.input {
        PickerInput::Pointer {
            control,
            rect,
            pointer,
        } => picker::pointer_moved(current, *control, *rect, *pointer),
        PickerInput::Field { field, amount } => {
            Some(picker::field_changed(current, *field, *amount))
        }
        PickerInput::Hex { hex } => picker::hex_changed(current, hex),
    };

    let hex = rgba_to_hex(parse_color(emitted.as_deref().unwrap_or(current)));
    HttpResponse::Ok().json(serde_json::json!({
        "value": emitted,
        "hex": hex.get(..7).unwrap_or(hex.as_str()),
    }))
}
