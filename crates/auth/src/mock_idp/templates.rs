//! Pages served by the mock IdP.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use signup_core::auth::OidcProvider;

/// The sign-in form shown at `/{provider}/authorize`.
#[derive(Template)]
#[template(path = "mock_idp/login.html")]
pub struct LoginPage<'a> {
    pub provider: OidcProvider,
    pub provider_name: &'a str,
    pub state: &'a str,
    pub redirect_uri: &'a str,
}

/// Auto-submitting page standing in for Apple's `response_mode=form_post`.
#[derive(Template)]
#[template(path = "mock_idp/form_post.html")]
pub struct FormPostPage<'a> {
    pub redirect_uri: &'a str,
    pub fields: &'a [(&'a str, String)],
}

pub fn render(page: impl Template) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Mock IdP page failed to render");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
