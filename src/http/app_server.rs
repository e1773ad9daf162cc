use crate::http::handlers::create_db_handler;
use crate::http::handlers::health_handler;
use crate::http::handlers::index_handler;
use crate::http::handlers::insert_data_handler;
use crate::http::handlers::success_handler;
use crate::http::handlers::upload_handler;
use crate::error::SheetLoaderError;
use crate::http::pages::Pages;
use crate::importer::Importer;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub importer: Arc<Importer>,
    pub pages: Arc<Pages>,
}

pub struct AppServer {
    pub router: Router,
    pub importer: Arc<Importer>,
}

pub const PATH_INDEX: &str = "/";
pub const PATH_UPLOAD: &str = "/upload";
pub const PATH_CREATE_DB: &str = "/create_db";
pub const PATH_INSERT_DATA: &str = "/insert_data";
pub const PATH_SUCCESS: &str = "/success";
pub const PATH_HEALTH: &str = "/health";

impl AppServer {
    pub fn new(importer: Importer) -> Result<Self, SheetLoaderError> {
        let body_limit = importer.config().max_upload_bytes;
        let importer = Arc::new(importer);
        let state = AppState {
            importer: importer.clone(),
            pages: Arc::new(Pages::new()?),
        };
        Ok(AppServer {
            router: Router::new()
                .route(PATH_INDEX, get(index_handler))
                .route(PATH_UPLOAD, post(upload_handler))
                .route(PATH_CREATE_DB, post(create_db_handler))
                .route(PATH_INSERT_DATA, get(insert_data_handler))
                .route(PATH_SUCCESS, get(success_handler))
                .route(PATH_HEALTH, get(health_handler))
                .layer(DefaultBodyLimit::max(body_limit))
                .with_state(state),
            importer,
        })
    }
}
