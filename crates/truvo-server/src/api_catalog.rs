//! Static catalogs the dashboard editor renders from.

use axum::Json;
use serde::Serialize;
use truvo_types::{ToolId, Voice, VOICES};

#[derive(Debug, Serialize)]
pub struct ToolEntry {
    pub id: ToolId,
    pub description: &'static str,
}

/// Handler for `GET /api/tools`.
pub async fn list_tools_handler() -> Json<Vec<ToolEntry>> {
    Json(
        ToolId::ALL
            .iter()
            .map(|&id| ToolEntry {
                id,
                description: id.description(),
            })
            .collect(),
    )
}

/// Handler for `GET /api/voices`.
pub async fn list_voices_handler() -> Json<&'static [Voice]> {
    Json(VOICES)
}
