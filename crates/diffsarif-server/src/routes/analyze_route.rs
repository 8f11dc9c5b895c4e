use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use diffsarif_core::{Credential, DiffSarifError, DiffUnit};
use tracing::{info, instrument};

use crate::error::AppResult;
use crate::routes::analyze_request::{AnalyzeRequest, AnalyzeResponse};
use crate::state::AppState;

/// HTTP endpoint analyzing up to `max_files` diffs with the caller's key.
///
/// The request is validated first, then the key is checked against the
/// completion service, and only then are the files analyzed.
#[instrument(name = "analyze_route", skip_all)]
pub async fn analyze_route(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let Json(request) = body?;
    validate_request(&request, state.max_files)?;

    let credential = Credential::new(request.key);
    let files: Vec<DiffUnit> = request.files.into_iter().map(DiffUnit::from).collect();
    info!(files = files.len(), "analysis requested");

    state.pipeline.verify_credential(&credential).await?;
    let analysis = state.pipeline.analyze(&credential, &files).await?;

    Ok(Json(AnalyzeResponse { analysis }))
}

/// Check the request shape before any upstream call.
pub(crate) fn validate_request(
    request: &AnalyzeRequest,
    max_files: usize,
) -> Result<(), DiffSarifError> {
    if request.key.trim().is_empty() || request.files.is_empty() {
        return Err(DiffSarifError::Validation(
            "Key and files are required".into(),
        ));
    }
    if request.files.len() > max_files {
        return Err(DiffSarifError::Validation(format!(
            "Maximum {max_files} files are allowed"
        )));
    }
    if request
        .files
        .iter()
        .any(|f| f.name.trim().is_empty() || f.code.is_empty())
    {
        return Err(DiffSarifError::Validation(
            "Name and code are required for each file".into(),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = request.files.iter().find(|f| !seen.insert(f.name.as_str())) {
        return Err(DiffSarifError::Validation(format!(
            "Duplicate file name: {}",
            dup.name
        )));
    }
    Ok(())
}
