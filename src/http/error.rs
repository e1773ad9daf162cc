use crate::http::app_server::PATH_INDEX;
use crate::importer::ImportError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use handlebars::RenderError;
use url::form_urlencoded;

/// A failure shown to the user as a message on the index page.
#[derive(Debug)]
pub struct FlashError {
    pub message: String,
}

impl FlashError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Location of the index page carrying this message.
    pub fn location(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("message", &self.message)
            .finish();
        format!("{PATH_INDEX}?{query}")
    }
}

impl std::fmt::Display for FlashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ImportError> for FlashError {
    fn from(error: ImportError) -> Self {
        match &error {
            ImportError::Input(_) => tracing::warn!(%error, "rejected request"),
            _ => tracing::error!(%error, "import step failed"),
        }
        Self::new(error.to_string())
    }
}

impl IntoResponse for FlashError {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}

/// Failure of a handler that answers with a page.
#[derive(Debug)]
pub enum PageError {
    Flash(FlashError),
    Render(RenderError),
}

impl From<FlashError> for PageError {
    fn from(error: FlashError) -> Self {
        Self::Flash(error)
    }
}

impl From<RenderError> for PageError {
    fn from(error: RenderError) -> Self {
        Self::Render(error)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Flash(error) => error.into_response(),
            PageError::Render(error) => {
                tracing::error!(%error, "failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_message_in_location() {
        let error = FlashError::new("Choose both a year & a file");
        assert_eq!(error.location(), "/?message=Choose+both+a+year+%26+a+file");
    }

    #[test]
    fn render_failure_is_a_server_error() {
        let error = PageError::from(RenderError::from(handlebars::RenderErrorReason::TemplateNotFound(
            "missing".to_owned(),
        )));
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = PageError::from(FlashError::new("Invalid load result")).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
