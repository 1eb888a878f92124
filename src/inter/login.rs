/*!
Logging in, logging out, and signing up.
*/
use std::sync::Arc;

use axum::{
    extract::{Extension, Form, rejection::FormRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Session;
use crate::config::Glob;
use super::*;

/// Data type to read the form data from a signup request.
#[derive(Deserialize)]
pub struct SignupData {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Debug for SignupData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupData")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Data type to read the form data from a front-page login request.
#[derive(Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

impl Debug for LoginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginData")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub async fn login_page() -> Response {
    log::trace!("login_page() called.");
    serve_template(StatusCode::OK, "login", &json!({}), vec![])
}

pub async fn signup_page() -> Response {
    log::trace!("signup_page() called.");
    serve_template(StatusCode::OK, "signup", &json!({}), vec![])
}

/**
Insert a new user and send the client to the login page.

Whether or not the insert works, the client lands on the login page; a
failure only shows up in the log.
*/
pub async fn register(
    Extension(glob): Extension<Arc<Glob>>,
    form: Result<Form<SignupData>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => {
            log::debug!("Bad signup form: {}", &e);
            return respond_bad_request(e.to_string());
        },
    };
    log::trace!("register( {:?} ) called.", &form);

    match glob.store.insert_user(&form.name, &form.email, &form.password).await {
        Ok(id) => { log::info!("Registered user {} ({:?}).", &id, &form.email); },
        Err(e) => { log::error!("Error registering {:?}: {}", &form, &e); },
    }

    redirect(LOGIN_PATH)
}

/**
Check the submitted credentials. A match gets a session cookie and the
dashboard; anything else goes quietly back to the login page.
*/
pub async fn authenticate(
    Extension(glob): Extension<Arc<Glob>>,
    form: Result<Form<LoginData>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => {
            log::debug!("Bad login form: {}", &e);
            return respond_bad_request(e.to_string());
        },
    };
    log::trace!("authenticate( {:?} ) called.", &form);

    let user = match glob.store.check_password(&form.email, &form.password).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            log::debug!("Failed login attempt for {:?}.", &form.email);
            return redirect(LOGIN_PATH);
        },
        Err(e) => {
            log::error!("Error checking credentials for {:?}: {}", &form.email, &e);
            return html_500();
        },
    };

    let session = Session { user_id: user.id, name: user.name };
    let token = glob.sessions.issue(&session);
    let cookie = match session_cookie(&glob.sessions, &token) {
        Some(c) => c,
        None => { return html_500(); },
    };

    log::info!("User {} ({:?}) logged in.", &session.user_id, &form.email);
    redirect(DASHBOARD_PATH).add_headers(vec![cookie])
}

/// Forget the session, whether or not there was one.
pub async fn logout(Extension(glob): Extension<Arc<Glob>>) -> Response {
    log::trace!("logout() called.");

    match expired_session_cookie(&glob.sessions) {
        Some(cookie) => redirect(LOGIN_PATH).add_headers(vec![cookie]),
        None => html_500(),
    }
}
