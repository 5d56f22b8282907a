use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;
use tracing::info;

use clinn_timetable::model::{Professor, UserId};
use clinn_timetable::{
  query_table, update_topics, Choice, DepartmentTable, DepartmentTopics, Grid, MemoryStore,
  Merged, Store, TopicTable,
};

use crate::error::AppError;

pub struct AppState {
  pub store: RwLock<MemoryStore>,
}

impl AppState {
  pub fn new(store: MemoryStore) -> Arc<Self> {
    Arc::new(Self {
      store: RwLock::new(store),
    })
  }
}

pub fn router(state: Arc<AppState>, api_token: Option<&str>) -> Router {
  let mut api = Router::new()
    .route("/users/:id/timetable", get(timetable).post(update_timetable))
    .route("/users/:id/personal", get(personal))
    .route("/users/:id/topics", get(topics))
    .route("/users/:id/professors", get(professors));

  if let Some(token) = api_token {
    api = api.route_layer(ValidateRequestHeaderLayer::bearer(token));
  }

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
    .with_state(state)
}

/// Comma separated id lists; absent or blank parameters disable a filter.
#[derive(Debug, Default, Deserialize)]
pub struct TimetableParams {
  pub topics: Option<String>,
  pub professors: Option<String>,
  pub days: Option<String>,
  pub periods: Option<String>,
}

impl TimetableParams {
  pub fn into_query(self) -> Result<clinn_timetable::Query, AppError> {
    Ok(clinn_timetable::Query {
      topics: parse_ids("topics", self.topics)?,
      professors: parse_ids("professors", self.professors)?,
      days: parse_ids("days", self.days)?,
      periods: parse_ids("periods", self.periods)?,
    })
  }
}

fn parse_ids<T: FromStr + Ord>(
  field: &'static str,
  value: Option<String>,
) -> Result<Option<BTreeSet<T>>, AppError> {
  let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
    return Ok(None);
  };

  value
    .split(',')
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .map(|part| {
      part.parse().map_err(|_| AppError::InvalidFilter {
        field,
        value: part.to_string(),
      })
    })
    .collect::<Result<BTreeSet<T>, AppError>>()
    .map(Some)
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
  #[serde(default)]
  pub choices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PersonalResponse {
  pub table: Grid,
  pub choices: Vec<Choice>,
}

async fn health() -> &'static str {
  "OK"
}

async fn timetable(
  State(state): State<Arc<AppState>>,
  Path(id): Path<UserId>,
  Query(params): Query<TimetableParams>,
) -> Result<Json<Merged>, AppError> {
  let query = params.into_query()?;
  let store = state.store.read().await;
  let user = store.user(id)?;

  Ok(Json(query_table(&*store, user, &query)))
}

async fn update_timetable(
  State(state): State<Arc<AppState>>,
  Path(id): Path<UserId>,
  Json(request): Json<UpdateRequest>,
) -> Result<Json<PersonalResponse>, AppError> {
  let mut store = state.store.write().await;
  let choices = update_topics(&mut *store, id, &request.choices)?;

  info!(
    "User {} locked in {} of {} choices",
    id,
    choices.len(),
    request.choices.len()
  );

  Ok(Json(PersonalResponse {
    table: personal_table(&*store, id),
    choices,
  }))
}

async fn personal(
  State(state): State<Arc<AppState>>,
  Path(id): Path<UserId>,
) -> Result<Json<Grid>, AppError> {
  let store = state.store.read().await;
  store.user(id)?;

  Ok(Json(personal_table(&*store, id)))
}

async fn topics(
  State(state): State<Arc<AppState>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<DepartmentTopics>>, AppError> {
  let store = state.store.read().await;
  let user = store.user(id)?;

  Ok(Json(
    DepartmentTable::new(&*store, user).topics_by_department(&*store)?,
  ))
}

async fn professors(
  State(state): State<Arc<AppState>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<Professor>>, AppError> {
  let store = state.store.read().await;
  let user = store.user(id)?;

  Ok(Json(
    DepartmentTable::new(&*store, user)
      .professors
      .into_iter()
      .cloned()
      .collect(),
  ))
}

fn personal_table(store: &MemoryStore, user: UserId) -> Grid {
  store
    .personal_table(user)
    .map(TopicTable::final_table)
    .unwrap_or_default()
}
