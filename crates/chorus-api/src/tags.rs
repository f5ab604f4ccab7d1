use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use chorus_db::DbError;
use chorus_types::api::{CreateTagRequest, TagResponse};

use crate::error::ApiError;
use crate::parse_id;
use crate::state::AppState;

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_tags()?;

    let tags: Vec<TagResponse> = rows
        .into_iter()
        .map(|row| TagResponse {
            id: parse_id(&row.id),
            name: row.name,
        })
        .collect();

    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_tag(&tag_id.to_string())?
        .ok_or_else(|| ApiError::not_found("tag"))?;

    Ok(Json(TagResponse {
        id: parse_id(&row.id),
        name: row.name,
    }))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("tag name must not be empty"));
    }

    let tag_id = Uuid::new_v4();
    state
        .db
        .insert_tag(&tag_id.to_string(), name)
        .map_err(|e| match e {
            DbError::Conflict => ApiError::conflict("tag already exists"),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(TagResponse {
            id: tag_id,
            name: name.to_string(),
        }),
    ))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .delete_tag(&tag_id.to_string())
        .map_err(|e| match e {
            DbError::NotFound => ApiError::not_found("tag"),
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "message": "tag deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStateInner;
    use chorus_db::Database;

    fn test_state() -> AppState {
        AppStateInner::new(Database::open_in_memory().unwrap(), "test-secret".into())
    }

    #[tokio::test]
    async fn duplicate_tag_name_conflicts() {
        let state = test_state();

        create_tag(
            State(state.clone()),
            Json(CreateTagRequest { name: "rock".into() }),
        )
        .await
        .unwrap();

        let result = create_tag(
            State(state),
            Json(CreateTagRequest { name: "rock".into() }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let state = test_state();
        let result = create_tag(State(state), Json(CreateTagRequest { name: "  ".into() })).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
