//! Intake-facing endpoints: submission, listing, status, attachments and updates.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use claims_core::{
    ClaimIds, ClaimRecord, ClaimSubmission, ClaimUpdate, ClaimsError, CustomerDirectory,
    normalize::records,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::models::{
    AttachmentInfo, ClaimListResponse, ClaimStatusResponse, ClaimView, NEXT_STEPS,
    SubmitClaimResponse,
};
use crate::service::{ApiError, ApiResult, AppState, bad_request, internal_error, not_found};
use crate::uploads::{self, MAX_FILE_SIZE, MAX_FILES, PendingUpload};

/// Inserts attempted before a run of identifier collisions is reported.
const MAX_INSERT_ATTEMPTS: usize = 3;
const FILES_FIELD: &str = "files";

/// Submission fields and attachments, read from either a JSON object or a
/// `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<PendingUpload>,
}

impl<S> FromRequest<S> for SubmissionForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            read_multipart(multipart).await
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            Ok(Self {
                fields: json_fields(&body)?,
                files: Vec::new(),
            })
        }
    }
}

fn rejected(status: StatusCode, message: String) -> ApiError {
    (status, Json(json!({ "success": false, "message": message })))
}

async fn read_multipart(mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();
    let malformed = |e: axum::extract::multipart::MultipartError| rejected(e.status(), e.body_text());

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(malformed)?;
            form.fields.insert(name, value);
            continue;
        };

        if name != FILES_FIELD {
            return Err(bad_request(&format!("Unexpected file field: {name}")));
        }
        if form.files.len() == MAX_FILES {
            return Err(bad_request(&format!("Too many files (max {MAX_FILES})")));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > MAX_FILE_SIZE {
                return Err(bad_request(&format!(
                    "File {file_name} exceeds the 10 MB limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let upload = PendingUpload {
            original_name: file_name,
            bytes,
        };
        if !upload.is_allowed() {
            return Err(bad_request(
                "Invalid file type. Only images, PDFs, and documents are allowed.",
            ));
        }
        form.files.push(upload);
    }
    Ok(form)
}

/// Flattens a JSON object into string fields. `null`, `false` and numeric zero
/// count as absent, the same as omitting the key.
fn json_fields(body: &[u8]) -> Result<HashMap<String, String>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| bad_request(&format!("Invalid JSON body: {e}")))?;
    let Value::Object(object) = value else {
        return Err(bad_request("Request body must be a JSON object"));
    };

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null | Value::Bool(false) => return None,
                Value::Number(n) if n.as_f64() == Some(0.0) => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect())
}

pub async fn submit_claim(
    State(state): State<AppState>,
    form: SubmissionForm,
) -> Result<(StatusCode, Json<SubmitClaimResponse>), ApiError> {
    info!(files = form.files.len(), "Receiving claim submission");

    let submission = ClaimSubmission::from_fields(&form.fields).map_err(|missing| {
        warn!(?missing, "Claim submission is missing required fields");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": format!("Missing required fields: {}", missing.join(", ")),
                "required": missing
            })),
        )
    })?;

    let stored = uploads::save_all(&state.settings.upload_dir, form.files)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store attachments");
            internal_error("Failed to store attachments", &e.to_string(), state.expose_errors())
        })?;

    let now = Utc::now();
    let mut ids = ClaimIds::generate(now);
    let mut attempt = 1;
    let claim = loop {
        let claim = submission.to_new_claim(&ids, now);
        match state.store.insert(&claim).await {
            Ok(()) => break claim,
            Err(ClaimsError::DuplicateClaim(detail)) if attempt < MAX_INSERT_ATTEMPTS => {
                warn!(
                    claim_number = %ids.claim_number,
                    attempt,
                    %detail,
                    "Claim identifier collision, retrying with new identifiers"
                );
                ids = ClaimIds::generate(now);
                attempt += 1;
            }
            Err(e) => {
                error!(claim_number = %ids.claim_number, error = %e, "Failed to save claim");
                uploads::remove_all(&stored).await;
                let (status, Json(mut body)) = internal_error(
                    "Failed to save claim to database",
                    &e.to_string(),
                    state.expose_errors(),
                );
                body["claimNumber"] = json!(ids.claim_number);
                return Err((status, Json(body)));
            }
        }
    };

    let adjuster = submission.adjuster();
    info!(
        claim_number = %claim.claim_number,
        claim_id = %claim.claim_id,
        priority = %claim.priority,
        adjuster = adjuster.name,
        "Claim submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitClaimResponse {
            success: true,
            claim_number: claim.claim_number,
            claim_id: claim.claim_id,
            status: claim.status,
            priority: claim.priority.to_string(),
            assigned_adjuster: adjuster.name.to_string(),
            uploaded_files: stored.len(),
            estimated_loss: claim.estimated_loss,
            message: "Claim submitted successfully",
            estimated_processing_time: "24-48 hours",
            next_steps: NEXT_STEPS,
            attachments: stored.iter().map(AttachmentInfo::from).collect(),
        }),
    ))
}

pub async fn list_claims(State(state): State<AppState>) -> ApiResult<ClaimListResponse> {
    match state.store.list_with_customers().await {
        Ok(claims) if !claims.is_empty() => {
            info!(count = claims.len(), "Listing claims from database");
            return Ok(Json(listing(claims, "db-join")));
        }
        Ok(_) => info!("No claims in database, reading from ORDS"),
        Err(e) => warn!(error = %e, "Database join failed, falling back to ORDS"),
    }

    let (claims, customers) = tokio::join!(
        state.ords.fetch_first_page("/claims/"),
        state.ords.fetch_first_page("/customers/")
    );

    let claims = claims.map_err(|e| {
        error!(error = %e, "ORDS claims fetch failed");
        internal_error("Failed to fetch claims", &e.to_string(), state.expose_errors())
    })?;

    let directory = match customers {
        Ok(items) => {
            let directory = CustomerDirectory::from_records(records(items));
            debug!(customers = directory.len(), "Loaded customers for enrichment");
            directory
        }
        Err(e) => {
            warn!(error = %e, "Customers fetch failed, listing without enrichment");
            CustomerDirectory::default()
        }
    };

    let mut claims: Vec<ClaimRecord> = records(claims);
    for claim in &mut claims {
        directory.enrich(claim);
    }
    Ok(Json(listing(claims, "ords")))
}

fn listing(claims: Vec<ClaimRecord>, source: &'static str) -> ClaimListResponse {
    let now = Utc::now();
    let claims: Vec<ClaimView> = claims
        .into_iter()
        .map(|claim| ClaimView::from_record(claim, now))
        .collect();
    ClaimListResponse {
        success: true,
        count: claims.len(),
        claims,
        source,
    }
}

/// Fixed status document echoing the requested number; storage is not consulted.
pub async fn claim_status(Path(claim_number): Path<String>) -> Json<ClaimStatusResponse> {
    info!(claim_number = %claim_number, "Fetching claim status");
    Json(ClaimStatusResponse::placeholder(claim_number, Utc::now()))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    info!(filename = %filename, "Downloading attachment");

    let path = uploads::resolve_download(&state.settings.upload_dir, &filename).ok_or_else(|| {
        warn!(filename = %filename, "Rejected attachment name");
        not_found("File not found")
    })?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        warn!(filename = %filename, error = %e, "Attachment read failed");
        not_found("File not found")
    })?;

    let headers = [
        (header::CONTENT_TYPE, uploads::content_type_for(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

pub async fn update_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
    payload: Result<Json<ClaimUpdate>, JsonRejection>,
) -> ApiResult<Value> {
    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => {
            warn!(claim_id = %claim_id, error = %rejection, "Rejected claim update body");
            return Err(bad_request("Provide status and/or assignedAdjusterId"));
        }
    };
    if update.is_empty() {
        return Err(bad_request("Provide status and/or assignedAdjusterId"));
    }

    let rows_affected = state.store.update(&claim_id, &update).await.map_err(|e| {
        error!(claim_id = %claim_id, error = %e, "Update claim failed");
        internal_error("Failed to update claim", &e.to_string(), state.expose_errors())
    })?;

    info!(claim_id = %claim_id, rows_affected, "Claim updated");
    Ok(Json(json!({
        "success": true,
        "rowsAffected": rows_affected
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fields_stringify_scalars_and_drop_nulls() {
        let fields = json_fields(
            br#"{"claimType":"Auto","estimatedLoss":12000,"customerPhone":null}"#,
        )
        .unwrap();
        assert_eq!(fields["claimType"], "Auto");
        assert_eq!(fields["estimatedLoss"], "12000");
        assert!(!fields.contains_key("customerPhone"));
    }

    #[test]
    fn falsy_scalars_count_as_missing() {
        let fields = json_fields(
            br#"{"estimatedLoss":0,"policyNumber":false,"location":"0","claimSubtype":true}"#,
        )
        .unwrap();
        assert!(!fields.contains_key("estimatedLoss"));
        assert!(!fields.contains_key("policyNumber"));
        assert_eq!(fields["location"], "0");
        assert_eq!(fields["claimSubtype"], "true");
    }

    #[test]
    fn empty_body_is_an_empty_form() {
        assert!(json_fields(b"").unwrap().is_empty());
        assert!(json_fields(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let (status, _) = json_fields(b"[1,2]").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = json_fields(b"{oops").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
