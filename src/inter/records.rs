/*!
Create, edit, update, and delete handlers shared by every kind of record.

Each handler is generic over a `Listed` record type and is mounted once per
type in `inter::router()`.
*/
use std::fmt::Debug;
use std::sync::Arc;

use axum::{
    extract::{
        Extension, Form, Path, Query,
        rejection::{FormRejection, PathRejection},
    },
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::auth::Session;
use crate::config::Glob;
use crate::store::{
    Assignment, AssignmentChanges, Course, NewCourse, NewStudent, Record, Student,
};
use super::*;

/// A record type that has a listing page and an edit page.
pub trait Listed: Record + Serialize + Sync {
    /// Path of the listing page.
    const LISTING: &'static str;
    /// Name of the edit page template.
    const EDIT_TEMPLATE: &'static str;
    /// What the record is called in the edit page's template data.
    const NOUN: &'static str;

    /// What an update form must supply.
    type Changes: Debug + DeserializeOwned + Send + Into<Self::Fields> + 'static;
}

impl Listed for Student {
    const LISTING: &'static str = "/students";
    const EDIT_TEMPLATE: &'static str = "edit_student";
    const NOUN: &'static str = "student";
    type Changes = NewStudent;
}

impl Listed for Course {
    const LISTING: &'static str = "/courses";
    const EDIT_TEMPLATE: &'static str = "edit_course";
    const NOUN: &'static str = "course";
    type Changes = NewCourse;
}

impl Listed for Assignment {
    const LISTING: &'static str = "/assignments";
    const EDIT_TEMPLATE: &'static str = "edit_assignment";
    const NOUN: &'static str = "assignment";
    type Changes = AssignmentChanges;
}

/// Query string of a create form's target, saying where to land afterward.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub return_to: Option<String>,
}

/**
Where to go after creating a record: back to the listing page if that's
what the form asked for, otherwise the dashboard.

Only the listing path itself is honored, so this can't be used to bounce
the client somewhere arbitrary.
*/
pub fn return_path(requested: Option<&str>, listing: &'static str) -> &'static str {
    match requested {
        Some(p) if p == listing => listing,
        _ => DASHBOARD_PATH,
    }
}

/// The `:id` path segment, or a bounce back to the listing if it isn't one.
fn record_id<R: Listed>(id: Result<Path<i64>, PathRejection>) -> Result<i64, Response> {
    match id {
        Ok(Path(id)) => Ok(id),
        Err(e) => {
            log::debug!("Bad {} id: {}", R::TABLE, &e);
            Err(redirect(R::LISTING))
        },
    }
}

pub async fn add<R: Listed>(
    Extension(glob): Extension<Arc<Glob>>,
    Query(ret): Query<ReturnTo>,
    form: Result<Form<R::Fields>, FormRejection>,
) -> Response {
    let Form(fields) = match form {
        Ok(form) => form,
        Err(e) => {
            log::debug!("Bad {} form: {}", R::TABLE, &e);
            return respond_bad_request(e.to_string());
        },
    };
    log::trace!("add::<{}>( {:?}, {:?} ) called.", R::TABLE, &fields, &ret);

    if let Err(e) = glob.store.insert::<R>(fields).await {
        log::error!("Error inserting into {}: {}", R::TABLE, &e);
        return html_500();
    }

    redirect(return_path(ret.return_to.as_deref(), R::LISTING))
}

pub async fn edit<R: Listed>(
    Extension(glob): Extension<Arc<Glob>>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match record_id::<R>(id) {
        Ok(id) => id,
        Err(r) => { return r; },
    };
    log::trace!("edit::<{}>( {} ) called.", R::TABLE, &id);

    let record = match glob.store.get::<R>(id).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            log::debug!("No {} row {}; redirecting to listing.", R::TABLE, &id);
            return redirect(R::LISTING);
        },
        Err(e) => {
            log::error!("Error reading {} row {}: {}", R::TABLE, &id, &e);
            return html_500();
        },
    };

    let mut data = serde_json::Map::new();
    data.insert("user".to_owned(), session.name.into());
    match serde_json::to_value(&record) {
        Ok(v) => { data.insert(R::NOUN.to_owned(), v); },
        Err(e) => {
            log::error!("Error serializing {:?}: {}", &record, &e);
            return html_500();
        },
    }

    serve_template(StatusCode::OK, R::EDIT_TEMPLATE, &data, vec![])
}

pub async fn update<R: Listed>(
    Extension(glob): Extension<Arc<Glob>>,
    id: Result<Path<i64>, PathRejection>,
    form: Result<Form<R::Changes>, FormRejection>,
) -> Response {
    let id = match record_id::<R>(id) {
        Ok(id) => id,
        Err(r) => { return r; },
    };
    let Form(changes) = match form {
        Ok(form) => form,
        Err(e) => {
            log::debug!("Bad {} form: {}", R::TABLE, &e);
            return respond_bad_request(e.to_string());
        },
    };
    log::trace!("update::<{}>( {}, {:?} ) called.", R::TABLE, &id, &changes);

    if let Err(e) = glob.store.update::<R>(id, changes.into()).await {
        log::error!("Error updating {} row {}: {}", R::TABLE, &id, &e);
        return html_500();
    }

    redirect(R::LISTING)
}

pub async fn delete<R: Listed>(
    Extension(glob): Extension<Arc<Glob>>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match record_id::<R>(id) {
        Ok(id) => id,
        Err(r) => { return r; },
    };
    log::trace!("delete::<{}>( {} ) called.", R::TABLE, &id);

    if let Err(e) = glob.store.delete::<R>(id).await {
        log::error!("Error deleting {} row {}: {}", R::TABLE, &id, &e);
        return html_500();
    }

    redirect(R::LISTING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_paths() {
        assert_eq!(return_path(Some("/students"), Student::LISTING), "/students");
        assert_eq!(return_path(Some("/courses"), Student::LISTING), DASHBOARD_PATH);
        assert_eq!(return_path(Some("https://evil.example/"), Course::LISTING), DASHBOARD_PATH);
        assert_eq!(return_path(None, Assignment::LISTING), DASHBOARD_PATH);
    }
}
