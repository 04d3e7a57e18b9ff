//! HTTP handler functions for the violence map API.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use violence_map_query::QueryError;
use violence_map_query_models::Period;
use violence_map_server_models::{ApiError, ApiHealth, CompareRequest, ROOT_HEALTH_TEXT};

use crate::AppState;

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(ROOT_HEALTH_TEXT)
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/mapa/{ano}/{mes}`
///
/// Returns the municipal `GeoJSON` map for a year and month (`0` for the
/// whole year).
pub async fn map(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HttpResponse {
    let (year, month) = path.into_inner();
    let period = match Period::parse(&year, &month) {
        Ok(period) => period,
        Err(e) => return error_response(&e.into()),
    };

    let service = state.service.clone();
    match blocking(move || service.get_map(period)).await {
        Ok(geojson) => HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(geojson),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/municipio/{nome}/{ano}/{mes}`
pub async fn municipality(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    let (name, year, month) = path.into_inner();
    let period = match Period::parse(&year, &month) {
        Ok(period) => period,
        Err(e) => return error_response(&e.into()),
    };

    let service = state.service.clone();
    match blocking(move || service.get_municipality(&name, period)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/comparar`
pub async fn compare(
    state: web::Data<AppState>,
    body: web::Json<CompareRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let service = state.service.clone();
    match blocking(move || service.compare(&request.scenario_a, &request.scenario_b)).await {
        Ok(comparison) => HttpResponse::Ok().json(comparison),
        Err(e) => error_response(&e),
    }
}

/// Runs a synchronous query on the blocking thread pool.
async fn blocking<T, F>(f: F) -> Result<T, QueryError>
where
    F: FnOnce() -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(QueryError::internal)?
}

fn error_response(error: &QueryError) -> HttpResponse {
    let body = ApiError {
        error: error.public_message().to_string(),
    };
    match error {
        QueryError::NotFound { .. } => HttpResponse::NotFound().json(body),
        QueryError::InvalidArgument { .. } => HttpResponse::BadRequest().json(body),
        QueryError::Internal { .. } => HttpResponse::InternalServerError().json(body),
    }
}
