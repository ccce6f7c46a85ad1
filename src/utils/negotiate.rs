// src/utils/negotiate.rs

use std::convert::Infallible;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use url::{Position, Url, form_urlencoded};

use crate::error::AppError;

pub const FLASH_COOKIE: &str = "flash";

/// How the caller wants mutating endpoints to answer.
///
/// JSON clients get a JSON body; browser form posts get `303 See Other`
/// back to where they came from, with any message in a `flash` cookie.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub wants_json: bool,
    pub referer: Option<String>,
}

impl Negotiated {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_has = |name: header::HeaderName, needle: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.to_ascii_lowercase().contains(needle))
        };

        let ajax = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        let wants_json = ajax
            || header_has(header::ACCEPT, "application/json")
            || header_has(header::CONTENT_TYPE, "application/json")
            || headers.contains_key(header::AUTHORIZATION);

        Self {
            wants_json,
            referer: local_referer(headers),
        }
    }

    /// Answers with `body` for JSON clients, otherwise redirects back
    /// (to the referer, or `fallback`).
    pub fn respond(&self, status: StatusCode, body: serde_json::Value, fallback: &str) -> Response {
        if self.wants_json {
            (status, Json(body)).into_response()
        } else {
            redirect(self.referer.as_deref().unwrap_or(fallback), None)
        }
    }

    /// Like `respond`, but always redirects browsers to `to`.
    pub fn respond_to(&self, status: StatusCode, body: serde_json::Value, to: &str) -> Response {
        if self.wants_json {
            (status, Json(body)).into_response()
        } else {
            redirect(to, None)
        }
    }

    /// Turns a refusal into a flash-and-redirect for browsers; JSON clients
    /// get the error itself.
    pub fn refuse(&self, err: AppError, fallback: &str) -> Response {
        if self.wants_json {
            err.into_response()
        } else {
            let target = self.referer.as_deref().unwrap_or(fallback);
            redirect(target, Some(&err.public_message()))
        }
    }
}

impl<S> FromRequestParts<S> for Negotiated
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Negotiated::from_headers(&parts.headers))
    }
}

/// The `Referer` as a path on this site, or `None`.
///
/// Relative paths must start with a single `/`. Absolute URLs count only
/// when their host (and port) equals the request's `Host`; they are reduced
/// to path and query so the redirect never leaves the site.
fn local_referer(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::REFERER)?.to_str().ok()?;

    if raw.starts_with('/') {
        let escapes = raw.starts_with("//") || raw.contains('\\');
        return (!escapes).then(|| raw.to_owned());
    }

    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = headers.get(header::HOST)?.to_str().ok()?;
    if !url[Position::BeforeHost..Position::AfterPort].eq_ignore_ascii_case(host) {
        return None;
    }
    Some(url[Position::BeforePath..Position::AfterQuery].to_owned())
}

/// `303 See Other` to `to`, optionally carrying a flash message.
pub fn redirect(to: &str, flash: Option<&str>) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    let headers = response.headers_mut();
    if let Ok(location) = HeaderValue::from_str(to) {
        headers.insert(header::LOCATION, location);
    } else {
        headers.insert(header::LOCATION, HeaderValue::from_static("/"));
    }
    if let Some(message) = flash {
        let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
        if let Ok(cookie) =
            HeaderValue::from_str(&format!("{}={}; Path=/; Max-Age=60; SameSite=Lax", FLASH_COOKIE, encoded))
        {
            headers.insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

/// Body extractor accepting either JSON or a URL-encoded form.
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(JsonOrForm(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(JsonOrForm(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_browser_post_is_not_json() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,*/*"));
        headers.insert(header::REFERER, HeaderValue::from_static("/post/1/"));
        let n = Negotiated::from_headers(&headers);
        assert!(!n.wants_json);
        assert_eq!(n.referer.as_deref(), Some("/post/1/"));
    }

    #[test]
    fn ajax_and_accept_json_are_json() {
        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(Negotiated::from_headers(&headers).wants_json);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(Negotiated::from_headers(&headers).wants_json);
    }

    #[test]
    fn refusal_redirects_with_flash_for_browsers() {
        let n = Negotiated { wants_json: false, referer: None };
        let response = n.refuse(AppError::Forbidden("Not yours".to_string()), "/post/3/");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/post/3/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=Not+yours"));
    }

    #[test]
    fn foreign_referer_falls_back() {
        for foreign in [
            "https://evil.example/phish",
            "//evil.example/phish",
            "/\\evil.example",
            "javascript:alert(1)",
            "http://quill.test.evil.example/",
        ] {
            let mut headers = HeaderMap::new();
            headers.insert(header::HOST, HeaderValue::from_static("quill.test"));
            headers.insert(header::REFERER, HeaderValue::from_str(foreign).unwrap());
            let n = Negotiated::from_headers(&headers);
            assert_eq!(n.referer, None, "{}", foreign);

            let response = n.refuse(AppError::Forbidden("Not yours".to_string()), "/post/3/");
            assert_eq!(response.headers()[header::LOCATION], "/post/3/");
        }
    }

    #[test]
    fn same_site_referer_becomes_a_path() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("127.0.0.1:8080"));
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("http://127.0.0.1:8080/post/7/?page=2#c1"),
        );
        let n = Negotiated::from_headers(&headers);
        assert_eq!(n.referer.as_deref(), Some("/post/7/?page=2"));

        let response = n.respond(StatusCode::OK, serde_json::json!({}), "/");
        assert_eq!(response.headers()[header::LOCATION], "/post/7/?page=2");
    }

    #[test]
    fn refusal_is_an_error_for_json_clients() {
        let n = Negotiated { wants_json: true, referer: None };
        let response = n.refuse(AppError::Forbidden("Not yours".to_string()), "/");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
