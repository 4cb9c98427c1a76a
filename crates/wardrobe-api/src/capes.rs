//! Cape endpoints: `GET /capes` and `PUT /capes/{id}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use wardrobe_types::{CapeView, CapeWrite, PlayerId};

use crate::error::ApiError;
use crate::handlers::{WriteAck, decode_body};
use crate::state::AppState;

/// `GET /capes`
///
/// Returns every live cape keyed by player id. Ownership keys are never
/// part of the response.
pub async fn get_capes(State(state): State<Arc<AppState>>) -> Json<BTreeMap<PlayerId, CapeView>> {
    let capes = state
        .service
        .cape_snapshot()
        .iter()
        .map(|(id, record)| (id.clone(), CapeView::from(record)))
        .collect();
    Json(capes)
}

/// `PUT /capes/{id}`
pub async fn put_cape(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<WriteAck>, ApiError> {
    let write: CapeWrite = decode_body(&body)?;
    state.service.write_cape(&id, write)?;
    Ok(Json(WriteAck::ok()))
}
