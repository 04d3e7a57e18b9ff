#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the violence map.
//!
//! A thin dispatch layer: each handler parses its path or body, runs the
//! matching [`ViolenceMapService`] operation on the blocking thread pool
//! and maps [`violence_map_query::QueryError`] onto an HTTP status.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use violence_map_query::{DataLayout, ViolenceMapService};

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5015;

/// Shared application state.
pub struct AppState {
    /// Query service holding the dataset cache.
    pub service: ViolenceMapService,
}

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/mapa/{ano}/{mes}", web::get().to(handlers::map))
            .route(
                "/municipio/{nome}/{ano}/{mes}",
                web::get().to(handlers::municipality),
            )
            .route("/comparar", web::post().to(handlers::compare)),
    );
}

/// Starts the violence map API server.
///
/// Reads the data layout from the environment and binds to `BIND_ADDR`
/// (default `127.0.0.1`) and `PORT` (default `5015`). Spreadsheets are
/// loaded on the first request that needs them. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the layout overrides file is
/// invalid, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let layout = DataLayout::from_env().map_err(|e| {
        log::error!("Failed to load data layout: {e}");
        std::io::Error::other(e)
    })?;
    log::info!("Reading data from {}", layout.data_dir.display());

    let state = web::Data::new(AppState {
        service: ViolenceMapService::new(layout),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use super::*;

    const VIOLENCE_CSV: &str = "\
MUNICÍPIO DO FATO,DATA DO FATO,TOTAL DE VÍTIMAS
Recife,15/03/2024,2
Olinda,20/03/2024,4
";

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NM_MUN": "Recife"},
             "geometry": {"type": "Point", "coordinates": [-34.88, -8.05]}},
            {"type": "Feature", "properties": {"NM_MUN": "Olinda"},
             "geometry": {"type": "Point", "coordinates": [-34.85, -8.01]}}
        ]
    }"#;

    fn write(root: &Path, relative: impl AsRef<Path>, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn state(root: &Path, with_boundaries: bool) -> web::Data<AppState> {
        let layout = DataLayout::with_data_dir(root);
        write(
            root,
            Path::new(&layout.violence_spreadsheet).with_extension("csv"),
            VIOLENCE_CSV,
        );
        if with_boundaries {
            write(root, &layout.boundaries.primary, BOUNDARIES);
        }
        web::Data::new(AppState {
            service: ViolenceMapService::new(layout),
        })
    }

    #[actix_web::test]
    async fn root_returns_health_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), false))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, violence_map_server_models::ROOT_HEALTH_TEXT);
    }

    #[actix_web::test]
    async fn map_returns_feature_collection() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), true))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/mapa/2024/3").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"][1]["properties"]["violence_total"], 4);
        assert_eq!(body["features"][1]["properties"]["assault_total"], 0);
    }

    #[actix_web::test]
    async fn map_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), false))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/mapa/2024/3").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/mapa/2024/13").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "invalid month 13: expected 0-12"}));

        let req = test::TestRequest::get().uri("/api/mapa/abc/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn municipality_and_compare() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path(), false))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/municipio/Olinda/2024/0")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["violenceTotal"], 4);
        assert_eq!(body["population"], 1);

        let req = test::TestRequest::post()
            .uri("/api/comparar")
            .set_json(json!({
                "scenarioA": {"municipality": "Recife", "year": 2024, "month": 3},
                "scenarioB": {"municipality": "Olinda", "year": 2024, "month": 3}
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["scenarioA"]["violenceTotal"], 2);
        assert_eq!(body["scenarioB"]["violenceTotal"], 4);
    }
}
