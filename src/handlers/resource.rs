//! Generic CRUD handlers parameterized by a [`Resource`] descriptor.
//!
//! Each operation shapes its own envelope: reads of a single document carry
//! no `message`, deletes carry no `data`. Callers depend on field absence,
//! so the per-operation shapes are contractual.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::i18n::Lang;
use crate::query::{bind_all, is_identifier, quoted, ApiFeatures, Bind, ListQuery};
use crate::resource::{apply_select_str, localize_document, Resource};
use crate::state::AppState;

/// Structured filter attached to the request by upstream middleware
/// (request extensions). Absent means "no filtering".
#[derive(Debug, Clone)]
pub struct FilterObj(pub Value);

/// Mount the five generic operations for one resource. The descriptor rides
/// into each handler as a request extension.
pub fn routes(resource: &'static Resource) -> Router<AppState> {
    Router::new()
        .route("/", get(get_all).post(create_one))
        .route("/:id", get(get_one).put(update_one).delete(delete_one))
        .layer(Extension(resource))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("invalid id"))
}

fn with_populate(af: ApiFeatures, resource: &Resource, lang: Lang) -> ApiFeatures {
    match &resource.populate {
        Some(p) => af.populate(
            p.field,
            p.table,
            p.local_key,
            p.foreign_key,
            &p.columns(lang),
            p.many,
        ),
        None => af,
    }
}

/// GET / - filtered, searched, sorted, projected, paginated list.
pub async fn get_all(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
    filter: Option<Extension<FilterObj>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lang = Lang::resolve(&headers);
    let criteria = filter.as_ref().map(|Extension(FilterObj(v))| v);

    let af = ApiFeatures::new(resource.table, &query, lang);
    let af = with_populate(af, resource, lang)
        .filter(criteria)
        .search(resource.searchable)
        .sort(resource.lang_fields, resource.default_sort)
        .limit_fields(resource.lang_fields, resource.select_str);

    // The total must reflect filters but not page bounds, so it runs on a
    // clone taken before pagination touches the live query.
    let total = af.clone_for_count().count(&state.pool).await?;
    let af = af.paginate(total);

    let mut docs = af.fetch(&state.pool).await?;
    for doc in &mut docs {
        localize_document(doc, lang, resource);
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "pagination": af.pagination(),
            "data": docs,
        })),
    ))
}

/// GET /:id - single document; no message field in this envelope.
pub async fn get_one(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lang = Lang::resolve(&headers);
    let id = parse_id(&id)?;

    let af = ApiFeatures::new(resource.table, &query, lang).by_id(id);
    let af = with_populate(af, resource, lang)
        .limit_fields(resource.lang_fields, resource.select_str);

    let mut doc = af
        .fetch(&state.pool)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(resource.not_found_message(lang)))?;
    localize_document(&mut doc, lang, resource);

    Ok((StatusCode::OK, Json(json!({ "success": true, "data": doc }))))
}

/// POST / - persist the body as a new document.
pub async fn create_one(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lang = Lang::resolve(&headers);
    let Value::Object(fields) = body else {
        return Err(ApiError::validation("body must be a JSON object"));
    };

    let id = insert_document(&state.pool, resource.table, &fields).await?;

    let message = resource.created_message(lang);
    if !resource.return_data {
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": message })),
        ));
    }

    // Read the fresh row uncollapsed and compute the localized view here.
    let mut doc = fetch_by_id(&state.pool, resource, id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("created document vanished"))?;
    localize_document(&mut doc, lang, resource);
    let data = apply_select_str(doc, resource.select_str);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message, "data": data })),
    ))
}

/// PUT /:id - shallow-merge the body onto the stored document.
pub async fn update_one(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lang = Lang::resolve(&headers);
    let id = parse_id(&id)?;
    let Value::Object(fields) = body else {
        return Err(ApiError::validation("body must be a JSON object"));
    };

    if fetch_by_id(&state.pool, resource, id).await?.is_none() {
        return Err(ApiError::not_found(resource.not_found_message(lang)));
    }

    update_document(&state.pool, resource.table, id, &fields).await?;

    let message = resource.updated_message(lang);
    if !resource.return_data {
        return Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "message": message })),
        ));
    }

    let mut doc = fetch_by_id(&state.pool, resource, id)
        .await?
        .ok_or_else(|| ApiError::not_found(resource.not_found_message(lang)))?;
    localize_document(&mut doc, lang, resource);

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": message, "data": doc })),
    ))
}

/// DELETE /:id - remove the document; no data payload in this envelope.
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lang = Lang::resolve(&headers);
    let id = parse_id(&id)?;

    if fetch_by_id(&state.pool, resource, id).await?.is_none() {
        return Err(ApiError::not_found(resource.not_found_message(lang)));
    }

    let sql = format!("DELETE FROM {} WHERE {} = $1", quoted(resource.table), quoted("id"));
    sqlx::query(&sql).bind(id).execute(&state.pool).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": resource.deleted_message(lang) })),
    ))
}

/// Fetch one document by id with no projection or language collapsing.
async fn fetch_by_id(
    pool: &PgPool,
    resource: &Resource,
    id: Uuid,
) -> Result<Option<Value>, ApiError> {
    let af = ApiFeatures::new(resource.table, &ListQuery::default(), Lang::All).by_id(id);
    Ok(af.fetch(pool).await?.into_iter().next())
}

async fn insert_document(
    pool: &PgPool,
    table: &str,
    fields: &Map<String, Value>,
) -> Result<Uuid, ApiError> {
    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut binds = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        if !is_identifier(key) {
            return Err(ApiError::validation(format!("invalid field name: {}", key)));
        }
        binds.push(Bind::from_json(value));
        columns.push(quoted(key));
        placeholders.push(format!("${}", binds.len()));
    }
    if columns.is_empty() {
        return Err(ApiError::validation("body must not be empty"));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table),
        columns.join(", "),
        placeholders.join(", "),
        quoted("id")
    );
    tracing::debug!(sql = %sql, "insert");
    let row = bind_all(sqlx::query(&sql), &binds).fetch_one(pool).await?;
    use sqlx::Row;
    Ok(row.try_get("id")?)
}

async fn update_document(
    pool: &PgPool,
    table: &str,
    id: Uuid,
    fields: &Map<String, Value>,
) -> Result<(), ApiError> {
    let mut sets = Vec::with_capacity(fields.len());
    let mut binds = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        // id never changes and updatedAt is set below
        if key == "id" || key == "updatedAt" {
            continue;
        }
        if !is_identifier(key) {
            return Err(ApiError::validation(format!("invalid field name: {}", key)));
        }
        binds.push(Bind::from_json(value));
        sets.push(format!("{} = ${}", quoted(key), binds.len()));
    }
    if sets.is_empty() {
        return Ok(());
    }
    sets.push(format!("{} = NOW()", quoted("updatedAt")));
    binds.push(Bind::Uuid(id));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quoted(table),
        sets.join(", "),
        quoted("id"),
        binds.len()
    );
    tracing::debug!(sql = %sql, "update");
    bind_all(sqlx::query(&sql), &binds).execute(pool).await?;
    Ok(())
}
