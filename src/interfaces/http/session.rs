use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponseBuilder};

use crate::infrastructure::session_store::SessionId;

/// Caller identity for one request, taken from the session cookie or
/// freshly issued.
pub struct CallerSession {
    pub id: SessionId,
    is_new: bool,
}

impl CallerSession {
    pub fn resolve(req: &HttpRequest, cookie_name: &str) -> Self {
        match Self::existing(req, cookie_name) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: SessionId::new(),
                is_new: true,
            },
        }
    }

    /// Session id from the cookie, if one was sent and is well formed.
    pub fn existing(req: &HttpRequest, cookie_name: &str) -> Option<SessionId> {
        req.cookie(cookie_name)
            .and_then(|cookie| SessionId::parse(cookie.value()))
    }

    /// Set the cookie on the response when the id was just issued.
    pub fn attach<'a>(
        &self,
        builder: &'a mut HttpResponseBuilder,
        cookie_name: &str,
    ) -> &'a mut HttpResponseBuilder {
        if self.is_new {
            builder.cookie(
                Cookie::build(cookie_name.to_string(), self.id.to_string())
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .finish(),
            );
        }
        builder
    }
}
