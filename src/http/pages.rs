//! Server-rendered HTML pages.
//!
//! Templates live under `templates/` and are compiled into the binary. The
//! registry escapes every interpolated value.

use crate::analyzer::Analysis;
use crate::database::column::ColumnType;
use crate::http::app_server::PATH_CREATE_DB;
use crate::http::app_server::PATH_INDEX;
use crate::http::app_server::PATH_UPLOAD;
use crate::http::form::column_name_field;
use crate::http::form::column_type_field;
use crate::http::form::FIELD_TOKEN;
use crate::pending::PendingImport;
use handlebars::Handlebars;
use handlebars::RenderError;
use handlebars::TemplateError;
use serde::Serialize;

const TEMPLATE_INDEX: &str = "index";
const TEMPLATE_CONFIRM: &str = "confirm";
const TEMPLATE_SUCCESS: &str = "success";

#[derive(Serialize)]
struct IndexView<'a> {
    message: Option<&'a str>,
    action: &'a str,
}

#[derive(Serialize)]
struct ConfirmView<'a> {
    partition_key: &'a str,
    action: &'a str,
    token_field: &'a str,
    token: String,
    columns: Vec<ColumnView<'a>>,
    sample: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct ColumnView<'a> {
    original_name: &'a str,
    cleaned_name: &'a str,
    name_field: String,
    type_field: String,
    types: Vec<TypeOption>,
}

#[derive(Serialize)]
struct TypeOption {
    value: String,
    selected: bool,
}

#[derive(Serialize)]
struct SuccessView<'a> {
    table_name: &'a str,
    count: usize,
    home: &'a str,
}

/// Compiled page templates, shared by all handlers.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("header", include_str!("../../templates/header.hbs"))?;
        registry.register_partial("footer", include_str!("../../templates/footer.hbs"))?;
        registry.register_template_string(TEMPLATE_INDEX, include_str!("../../templates/index.hbs"))?;
        registry.register_template_string(TEMPLATE_CONFIRM, include_str!("../../templates/confirm.hbs"))?;
        registry.register_template_string(TEMPLATE_SUCCESS, include_str!("../../templates/success.hbs"))?;
        Ok(Self { registry })
    }

    /// Upload form, with the message of a previous failure if any.
    pub fn index(&self, message: Option<&str>) -> Result<String, RenderError> {
        let view = IndexView {
            message: message.filter(|message| !message.is_empty()),
            action: PATH_UPLOAD,
        };
        self.registry.render(TEMPLATE_INDEX, &view)
    }

    /// Proposed schema with editable names and types, followed by sample rows.
    pub fn confirm(&self, pending: &PendingImport, analysis: &Analysis) -> Result<String, RenderError> {
        let columns = analysis
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| ColumnView {
                original_name: &column.original_name,
                cleaned_name: &column.cleaned_name,
                name_field: column_name_field(index),
                type_field: column_type_field(index),
                types: ColumnType::ALL
                    .iter()
                    .map(|kind| TypeOption {
                        value: kind.to_string(),
                        selected: *kind == column.inferred_type,
                    })
                    .collect(),
            })
            .collect();
        let view = ConfirmView {
            partition_key: &pending.partition_key,
            action: PATH_CREATE_DB,
            token_field: FIELD_TOKEN,
            token: pending.token.to_string(),
            columns,
            sample: analysis
                .sample
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        };
        self.registry.render(TEMPLATE_CONFIRM, &view)
    }

    /// Load result.
    pub fn success(&self, table_name: &str, count: usize) -> Result<String, RenderError> {
        let view = SuccessView {
            table_name,
            count,
            home: PATH_INDEX,
        };
        self.registry.render(TEMPLATE_SUCCESS, &view)
    }
}
