/*!
The dashboard and the per-entity listing pages.

Each page re-reads the store and recomputes its counts on every view.
*/
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
};
use serde_json::json;

use crate::auth::Session;
use crate::config::Glob;
use crate::stats::{AssignmentStats, CourseStats, DashboardStats, StudentStats};
use crate::store::{Assignment, Course, DbError, Record, Student};
use super::*;

async fn read_all<R: Record>(glob: &Glob) -> Result<Vec<R>, Response> {
    glob.store.list::<R>().await.map_err(|e: DbError| {
        log::error!("Error reading {}: {}", R::TABLE, &e);
        html_500()
    })
}

pub async fn dashboard(
    Extension(glob): Extension<Arc<Glob>>,
    Extension(session): Extension<Session>,
) -> Response {
    log::trace!("dashboard( {:?} ) called.", &session);

    let students = match read_all::<Student>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };
    let courses = match read_all::<Course>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };
    let assignments = match read_all::<Assignment>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };

    let stats = DashboardStats::new(&students, &courses, &assignments);
    let data = json!({
        "user": &session.name,
        "students": &students,
        "courses": &courses,
        "assignments": &assignments,
        "stats": &stats,
    });

    serve_template(StatusCode::OK, "dashboard", &data, vec![])
}

pub async fn students(
    Extension(glob): Extension<Arc<Glob>>,
    Extension(session): Extension<Session>,
) -> Response {
    log::trace!("students( {:?} ) called.", &session);

    let students = match read_all::<Student>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };

    let data = json!({
        "user": &session.name,
        "students": &students,
        "stats": StudentStats::new(&students),
    });

    serve_template(StatusCode::OK, "students", &data, vec![])
}

pub async fn courses(
    Extension(glob): Extension<Arc<Glob>>,
    Extension(session): Extension<Session>,
) -> Response {
    log::trace!("courses( {:?} ) called.", &session);

    let courses = match read_all::<Course>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };

    let data = json!({
        "user": &session.name,
        "courses": &courses,
        "stats": CourseStats::new(&courses),
    });

    serve_template(StatusCode::OK, "courses", &data, vec![])
}

pub async fn assignments(
    Extension(glob): Extension<Arc<Glob>>,
    Extension(session): Extension<Session>,
) -> Response {
    log::trace!("assignments( {:?} ) called.", &session);

    let assignments = match read_all::<Assignment>(&glob).await {
        Ok(x) => x,
        Err(r) => { return r; },
    };

    let data = json!({
        "user": &session.name,
        "assignments": &assignments,
        "stats": AssignmentStats::new(&assignments),
    });

    serve_template(StatusCode::OK, "assignments", &data, vec![])
}
