use crate::http::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use common::domain::{ContainerOperation, ContainerRequest, DatabaseOperation, DatabaseRequest};
use std::sync::Arc;

pub async fn list_databases(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.provisioning.list_databases().await?))
}

pub async fn create_database(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DatabaseRequest>,
) -> Result<Json<DatabaseOperation>, ApiError> {
    Ok(Json(
        state.provisioning.create_database(&request.db_name).await?,
    ))
}

pub async fn delete_database(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DatabaseRequest>,
) -> Result<Json<DatabaseOperation>, ApiError> {
    Ok(Json(
        state.provisioning.delete_database(&request.db_name).await?,
    ))
}

pub async fn list_containers(
    State(state): State<Arc<AppState>>,
    Path(database): Path<String>,
) -> Result<Json<Option<Vec<String>>>, ApiError> {
    Ok(Json(state.provisioning.list_containers(&database).await?))
}

pub async fn create_container(
    State(state): State<Arc<AppState>>,
    Path(database): Path<String>,
    Json(request): Json<ContainerRequest>,
) -> Result<Json<Option<ContainerOperation>>, ApiError> {
    Ok(Json(
        state
            .provisioning
            .create_container(&database, &request)
            .await?,
    ))
}

pub async fn delete_container(
    State(state): State<Arc<AppState>>,
    Path(database): Path<String>,
    Json(request): Json<ContainerRequest>,
) -> Result<Json<Option<ContainerOperation>>, ApiError> {
    Ok(Json(
        state
            .provisioning
            .delete_container(&database, &request.container_name)
            .await?,
    ))
}
