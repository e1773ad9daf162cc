//! HTML front end for the import flow.
//!
//! `GET /` shows the upload form, `POST /upload` analyzes the file and shows
//! the proposed schema, `POST /create_db` creates the table and
//! `GET /insert_data` loads the rows and redirects to `GET /success`.
//! Every failure redirects back to `/` with a `message` query parameter.
pub mod app_server;
pub mod error;
pub mod form;
pub mod handlers;
pub mod pages;
