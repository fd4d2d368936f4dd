//! Generic CRUD routes
//!
//! One route set serves any [`CrudService`]. Every handler takes a
//! [`Dispatcher`] first, so the correlation id exists before the request body
//! or path is even parsed. Input rejections become fault envelopes (400)
//! instead of axum's default rejection responses.
//!
//! | operation | method | path | success |
//! |---|---|---|---|
//! | list | GET | `{base}` | 200 |
//! | get by id | GET | `{base}/:id` | 200 |
//! | get by identifier | POST | `{base}/GetByIdentifier` | 200 |
//! | create | POST | `{base}` | 201 |
//! | update | PUT | `{base}/:id` | 200 |
//! | delete | DELETE | `{base}?id=N` | 200 |

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use screenmusic_common::CrudService;

use crate::dispatch::{Dispatcher, ResourceState};

/// Query parameters for DELETE
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: i64,
}

/// Build the route set for one resource mounted at `base`
pub fn crud_routes<S: CrudService>(base: &str, state: ResourceState<S>) -> Router {
    Router::new()
        .route(
            base,
            get(list::<S>).post(create::<S>).delete(delete::<S>),
        )
        .route(
            &format!("{}/GetByIdentifier", base),
            post(get_by_identifier::<S>),
        )
        .route(&format!("{}/:id", base), get(get_one::<S>).put(update::<S>))
        .with_state(state)
}

/// GET {base}
async fn list<S: CrudService>(mut dispatcher: Dispatcher<S>) -> Response {
    let envelope = dispatcher.get_all().await;
    dispatcher.conclude(envelope).await
}

/// GET {base}/:id
async fn get_one<S: CrudService>(
    mut dispatcher: Dispatcher<S>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let envelope = match id {
        Ok(Path(id)) => dispatcher.get(id).await,
        Err(rejection) => dispatcher.reject(rejection),
    };
    dispatcher.conclude(envelope).await
}

/// POST {base}/GetByIdentifier
async fn get_by_identifier<S: CrudService>(
    mut dispatcher: Dispatcher<S>,
    identifier: Result<Json<S::IdentifierInput>, JsonRejection>,
) -> Response {
    let envelope = match identifier {
        Ok(Json(identifier)) => dispatcher.get_by_identifier(identifier).await,
        Err(rejection) => dispatcher.reject(rejection),
    };
    dispatcher.conclude(envelope).await
}

/// POST {base}
async fn create<S: CrudService>(
    mut dispatcher: Dispatcher<S>,
    input: Result<Json<S::CreateInput>, JsonRejection>,
) -> Response {
    let envelope = match input {
        Ok(Json(input)) => dispatcher.create(input).await,
        Err(rejection) => dispatcher.reject(rejection),
    };
    dispatcher.conclude(envelope).await
}

/// PUT {base}/:id
async fn update<S: CrudService>(
    mut dispatcher: Dispatcher<S>,
    id: Result<Path<i64>, PathRejection>,
    input: Result<Json<S::UpdateInput>, JsonRejection>,
) -> Response {
    let envelope = match (id, input) {
        (Ok(Path(id)), Ok(Json(input))) => dispatcher.update(id, input).await,
        (Err(rejection), _) => dispatcher.reject(rejection),
        (_, Err(rejection)) => dispatcher.reject(rejection),
    };
    dispatcher.conclude(envelope).await
}

/// DELETE {base}?id=N
async fn delete<S: CrudService>(
    mut dispatcher: Dispatcher<S>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Response {
    let envelope = match params {
        Ok(Query(params)) => dispatcher.delete(params.id).await,
        Err(rejection) => dispatcher.reject(rejection),
    };
    dispatcher.conclude(envelope).await
}
