use crate::http::app_server::AppState;
use crate::http::app_server::PATH_INSERT_DATA;
use crate::http::app_server::PATH_SUCCESS;
use crate::http::error::FlashError;
use crate::http::error::PageError;
use crate::http::form::parse_confirmed_columns;
use crate::http::form::FIELD_TOKEN;
use crate::importer::ImportError;
use axum::extract::Multipart;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::Redirect;
use axum::Form;
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;
use url::form_urlencoded;

#[derive(Debug, Deserialize)]
pub struct IndexParams {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsertDataParams {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuccessParams {
    pub table_name: Option<String>,
    pub count: Option<String>,
}

/// Runs a blocking import step on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, FlashError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ImportError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(FlashError::from),
        Err(error) => {
            tracing::error!(%error, "import task panicked");
            Err(FlashError::new("Internal error, please try again"))
        }
    }
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// Handler for GET /
pub async fn index_handler(
    State(state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, PageError> {
    Ok(Html(state.pages.index(params.message.as_deref())?))
}

/// Handler for POST /upload - Save and analyze a spreadsheet
#[tracing::instrument(name = "handler_upload", skip(state, multipart), fields(file = tracing::field::Empty))]
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, PageError> {
    let mut file = None::<(String, Vec<u8>)>;
    let mut year = None::<String>;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| FlashError::new(format!("Failed to read the upload: {error}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| FlashError::new(format!("Failed to read the upload: {error}")))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("year") => {
                let text = field
                    .text()
                    .await
                    .map_err(|error| FlashError::new(format!("Failed to read the upload: {error}")))?;
                year = Some(text);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        tracing::warn!("upload without file");
        return Err(FlashError::new("No file was uploaded").into());
    };
    tracing::Span::current().record("file", file_name.as_str());

    let importer = state.importer.clone();
    let staged =
        run_blocking(move || importer.stage_upload(&file_name, &bytes, year.as_deref())).await?;
    Ok(Html(state.pages.confirm(&staged.pending, &staged.analysis)?))
}

/// Handler for POST /create_db - Create the confirmed table
#[tracing::instrument(name = "handler_create_db", skip(state, form))]
pub async fn create_db_handler(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Redirect, FlashError> {
    let token = form.get(FIELD_TOKEN).cloned().unwrap_or_default();
    let columns = parse_confirmed_columns(&form).map_err(FlashError::new)?;
    if token.is_empty() || columns.is_empty() {
        tracing::warn!("create_db without token or columns");
        return Err(FlashError::new("Required information is missing"));
    }

    let redirect = with_query(PATH_INSERT_DATA, &[("token", &token)]);
    run_blocking(move || state.importer.create_table(&token, columns)).await?;
    Ok(Redirect::to(&redirect))
}

/// Handler for GET /insert_data - Load rows into the created table
#[tracing::instrument(name = "handler_insert_data", skip(state))]
pub async fn insert_data_handler(
    State(state): State<AppState>,
    Query(params): Query<InsertDataParams>,
) -> Result<Redirect, FlashError> {
    let Some(token) = params.token.filter(|token| !token.is_empty()) else {
        return Err(FlashError::new("Missing import token"));
    };

    let outcome = run_blocking(move || state.importer.load(&token)).await?;
    let count = outcome.inserted_count.to_string();
    Ok(Redirect::to(&with_query(
        PATH_SUCCESS,
        &[("table_name", &outcome.table_name), ("count", &count)],
    )))
}

/// Handler for GET /success
pub async fn success_handler(
    State(state): State<AppState>,
    Query(params): Query<SuccessParams>,
) -> Result<Html<String>, PageError> {
    let count = parse_count(params.count.as_deref())?;
    Ok(Html(state.pages.success(
        params.table_name.as_deref().unwrap_or_default(),
        count,
    )?))
}

/// A missing count reads as zero; anything else must be a row count.
fn parse_count(count: Option<&str>) -> Result<usize, FlashError> {
    match count.map(str::trim).filter(|count| !count.is_empty()) {
        None => Ok(0),
        Some(count) => count.parse().map_err(|_| {
            tracing::warn!(count, "malformed load result");
            FlashError::new("Invalid load result")
        }),
    }
}

/// Handler for GET /health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "sheet-loader"
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_encoded_redirects() {
        assert_eq!(
            with_query(PATH_SUCCESS, &[("table_name", "internships_2024"), ("count", "3")]),
            "/success?table_name=internships_2024&count=3"
        );
        assert_eq!(with_query(PATH_INSERT_DATA, &[("token", "a b")]), "/insert_data?token=a+b");
    }

    #[test]
    fn parses_row_counts_from_the_query() {
        assert_eq!(parse_count(Some("3")).unwrap(), 3);
        assert_eq!(parse_count(Some(" 12 ")).unwrap(), 12);
        assert_eq!(parse_count(None).unwrap(), 0);
        assert_eq!(parse_count(Some("")).unwrap(), 0);
        assert_eq!(parse_count(Some("abc")).unwrap_err().message, "Invalid load result");
        assert!(parse_count(Some("-1")).is_err());
    }
}
