/*!
Interoperation between the client (user) and server.

(Not the application and the database; that's covered by `store`.)
*/
use std::{
    fmt::Debug,
    path::Path,
    sync::Arc,
};

use axum::{
    extract::Extension,
    http::{header, Request, StatusCode},
    http::header::{HeaderMap, HeaderName, HeaderValue},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use handlebars::Handlebars;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::auth::SessionKeys;
use crate::config::Glob;
use crate::store::{Assignment, Course, Student};

pub mod listings;
pub mod login;
pub mod records;

static TEMPLATES: OnceCell<Handlebars> = OnceCell::new();

static HTML_500: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>roster | Error</title>
<link rel="stylesheet" href="/static/roster.css">
</head>
<body>
<h1>Internal Server Error</h1>
<p>(Error 500)</p>
<p>Something went wrong on our end. No further or more
helpful information is available about the problem.</p>
</body>
</html>"#;

pub const LOGIN_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

trait AddHeaders: IntoResponse + Sized {
    fn add_headers(self, mut new_headers: Vec<(HeaderName, HeaderValue)>) -> Response {
        let mut r = self.into_response();
        let r_headers = r.headers_mut();
        for (name, value) in new_headers.drain(..) {
            r_headers.insert(name, value);
        }

        r
    }
}

impl<T: IntoResponse + Sized> AddHeaders for T {}

/**
Initializes the resources used in this module. This function should be called
before any functionality of this module or any of its submodules is used.

Currently the only thing that happens here is loading the templates used by
`serve_template()`, which will only ever serve 500s until `init()` has been
called.

The argument is the path to the directory where the templates used by
`serve_template()` can be found.
*/
pub fn init<P: AsRef<Path>>(template_dir: P) -> Result<(), String> {
    if TEMPLATES.get().is_some() {
        log::warn!("Templates directory already initialized; ignoring.");
        return Ok(())
    }

    let template_dir = template_dir.as_ref();

    // Another caller may have won the race since the check above; then
    // this closure never runs and theirs stands.
    let h = TEMPLATES.get_or_try_init(|| {
        let mut h = Handlebars::new();
        #[cfg(debug_assertions)]
        h.set_dev_mode(true);
        h.register_templates_directory(".html", template_dir)
            .map_err(|e| format!(
                "Error registering templates directory {}: {}",
                template_dir.display(), &e
            ))?;
        Ok::<_, String>(h)
    })?;

    let mut names: Vec<&String> = h.get_templates().keys().collect();
    names.sort();
    log::info!("Registered templates: {:?}", &names);

    Ok(())
}

/**
Return an HTML response in the case of an unrecoverable* error.

(*"Unrecoverable" from the perspective of fielding the current request,
not from the perspective of the program crashing.)
*/
pub fn html_500() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(HTML_500)
    ).into_response()
}

pub fn respond_bad_request(msg: String) -> Response {
    log::trace!("respond_bad_request( {:?} ) called.", &msg);

    (
        StatusCode::BAD_REQUEST,
        msg
    ).into_response()
}

pub fn serve_template<S>(
    code: StatusCode,
    template_name: &str,
    data: &S,
    addl_headers: Vec<(HeaderName, HeaderValue)>
) -> Response
where
    S: Serialize + Debug
{
    log::trace!("serve_template( {}, {:?}, ... ) called.", &code, template_name);

    let templates = match TEMPLATES.get() {
        Some(t) => t,
        None => {
            log::error!("serve_template() called before inter::init().");
            return html_500();
        },
    };

    match templates.render(template_name, data) {
        Ok(response_body) => (
            code,
            Html(response_body)
        ).add_headers(addl_headers),
        Err(e) => {
            log::error!(
                "Error rendering template {:?} with data {:?}:\n{}",
                template_name, data, &e
            );
            html_500()
        },
    }
}

/// POST-redirect-GET, or just "go over there".
pub fn redirect(path: &str) -> Response {
    Redirect::to(path).into_response()
}

/// Value of the cookie called `name`, if the request carries it.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for value in headers.get_all(header::COOKIE).iter() {
        let value = match value.to_str() {
            Ok(s) => s,
            Err(_) => { continue; },
        };
        for pair in value.split(';') {
            if let Some((k, v)) = pair.trim().split_once('=') {
                if k == name {
                    return Some(v);
                }
            }
        }
    }

    None
}

/// `Set-Cookie` header that hands the client its session token.
pub fn session_cookie(keys: &SessionKeys, token: &str) -> Option<(HeaderName, HeaderValue)> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        keys.cookie_name(), token
    );
    if let Some(n) = keys.max_age() {
        cookie.push_str(&format!("; Max-Age={}", &n));
    }

    match HeaderValue::from_str(&cookie) {
        Ok(v) => Some((header::SET_COOKIE, v)),
        Err(e) => {
            log::error!("Error converting {:?} into header value: {}", &cookie, &e);
            None
        },
    }
}

/// `Set-Cookie` header that makes the client forget its session token.
pub fn expired_session_cookie(keys: &SessionKeys) -> Option<(HeaderName, HeaderValue)> {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        keys.cookie_name()
    );

    match HeaderValue::from_str(&cookie) {
        Ok(v) => Some((header::SET_COOKIE, v)),
        Err(e) => {
            log::error!("Error converting {:?} into header value: {}", &cookie, &e);
            None
        },
    }
}

/**
Middleware that only lets requests with a valid session token through.

The verified `auth::Session` is inserted into the request's extensions for
the handlers behind this layer; anyone else gets bounced to the login page.
*/
pub async fn session_gate<B>(
    mut req: Request<B>,
    next: Next<B>,
) -> Response {
    let glob: Arc<Glob> = match req.extensions().get::<Arc<Glob>>() {
        Some(glob) => glob.clone(),
        None => {
            log::error!("session_gate(): no Glob in request extensions.");
            return html_500();
        },
    };

    let session = cookie_value(req.headers(), glob.sessions.cookie_name())
        .and_then(|token| glob.sessions.verify(token));

    match session {
        Some(session) => {
            log::trace!("{} {} by {:?}", req.method(), req.uri().path(), &session);
            req.extensions_mut().insert(session);
            next.run(req).await
        },
        None => {
            log::debug!(
                "{} {} without a valid session; redirecting to login.",
                req.method(), req.uri().path()
            );
            redirect(LOGIN_PATH)
        },
    }
}

/// The whole application: every page and form target, plus static files
/// served out of `static_dir`.
pub fn router<P: AsRef<Path>>(glob: Arc<Glob>, static_dir: P) -> Router {
    let gated = Router::new()
        .route(DASHBOARD_PATH, get(listings::dashboard))
        .route("/students", get(listings::students))
        .route("/courses", get(listings::courses))
        .route("/assignments", get(listings::assignments))
        .route("/add_student", post(records::add::<Student>))
        .route("/add_course", post(records::add::<Course>))
        .route("/add_assignment", post(records::add::<Assignment>))
        .route("/edit_student/:id", get(records::edit::<Student>))
        .route("/edit_course/:id", get(records::edit::<Course>))
        .route("/edit_assignment/:id", get(records::edit::<Assignment>))
        .route("/update_student/:id", post(records::update::<Student>))
        .route("/update_course/:id", post(records::update::<Course>))
        .route("/update_assignment/:id", post(records::update::<Assignment>))
        .route("/delete_student/:id", get(records::delete::<Student>))
        .route("/delete_course/:id", get(records::delete::<Course>))
        .route("/delete_assignment/:id", get(records::delete::<Assignment>))
        .route_layer(middleware::from_fn(session_gate));

    Router::new()
        .route(LOGIN_PATH, get(login::login_page))
        .route("/signup", get(login::signup_page))
        .route("/register", post(login::register))
        .route("/authenticate", post(login::authenticate))
        .route("/logout", get(login::logout))
        .merge(gated)
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(Extension(glob))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for c in cookies.iter() {
            h.append(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        h
    }

    #[test]
    fn find_cookies() {
        let h = headers(&["theme=dark; roster_session=abc.def", "other=1"]);
        assert_eq!(cookie_value(&h, "roster_session"), Some("abc.def"));
        assert_eq!(cookie_value(&h, "other"), Some("1"));
        assert_eq!(cookie_value(&h, "theme"), Some("dark"));
        assert_eq!(cookie_value(&h, "missing"), None);
        assert_eq!(cookie_value(&HeaderMap::new(), "roster_session"), None);
    }

    #[test]
    fn set_cookies() {
        let keys = SessionKeys::new("frogs", "sid".to_owned(), Some(60)).unwrap();
        let (name, value) = session_cookie(&keys, "tok").unwrap();
        assert_eq!(name, header::SET_COOKIE);
        assert_eq!(
            value.to_str().unwrap(),
            "sid=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );

        let (_, value) = expired_session_cookie(&keys).unwrap();
        assert!(value.to_str().unwrap().starts_with("sid=;"));
        assert!(value.to_str().unwrap().ends_with("Max-Age=0"));
    }
}
