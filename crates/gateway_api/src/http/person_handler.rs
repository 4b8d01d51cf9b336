use crate::http::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use common::domain::Person;
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

pub async fn list_all_items(
    State(state): State<Arc<AppState>>,
    Path((database, container)): Path<(String, String)>,
) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.persons.list_all(&database, &container).await?))
}

/// Non-numeric offsets yield a null body instead of an error status.
pub async fn list_items_by_offset(
    State(state): State<Arc<AppState>>,
    Path((database, container, offset)): Path<(String, String, String)>,
) -> Result<Json<Option<Vec<Person>>>, ApiError> {
    let Ok(offset) = offset.parse::<usize>() else {
        return Ok(Json(None));
    };
    let persons = state
        .persons
        .list_by_age_offset(&database, &container, offset)
        .await?;
    Ok(Json(Some(persons)))
}

/// Server-sent events: one event per preferred-size page of persons.
pub async fn stream_item_pages(
    State(state): State<Arc<AppState>>,
    Path((database, container)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let pages = state.persons.paged(&database, &container).await?;
    let events: Vec<Event> = pages
        .iter()
        .filter_map(|page| match Event::default().json_data(page) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, "dropping unserializable page");
                None
            }
        })
        .collect();
    Ok(Sse::new(stream::iter(events.into_iter().map(Ok))).keep_alive(KeepAlive::default()))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path((database, container, id)): Path<(String, String, String)>,
) -> Result<Json<Option<Person>>, ApiError> {
    Ok(Json(
        state.persons.find_by_id(&database, &container, &id).await?,
    ))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path((database, container)): Path<(String, String)>,
    Json(person): Json<Person>,
) -> Result<Json<Option<Person>>, ApiError> {
    Ok(Json(
        state
            .persons
            .add_person(&database, &container, person)
            .await?,
    ))
}
