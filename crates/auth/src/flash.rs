//! Flash message utilities for server-to-client communication.
//!
//! Flash messages are short-lived messages stored in a cookie that get
//! displayed once and then cleared. Used to carry a status across a redirect.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash_message";

/// Flash message structure stored in cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    /// Message type (e.g., "error", "success")
    #[serde(rename = "type")]
    pub message_type: String,
    /// The message content to display
    pub message: String,
    /// Whether the message should auto-dismiss after a few seconds
    pub auto_dismiss: bool,
}

impl FlashMessage {
    /// Create an error flash message that requires manual dismissal.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            message: message.into(),
            auto_dismiss: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.message_type == "error"
    }

    /// Serialize to JSON for cookie storage.
    pub fn to_cookie_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Build the flash cookie.
    ///
    /// Cookie properties:
    /// - Path: / (accessible from any page)
    /// - SameSite: Lax (sent on navigation, not cross-site requests)
    /// - Max-Age: 60 (expires after 60 seconds as a safety net)
    pub fn to_cookie(&self) -> Cookie<'static> {
        let encoded = urlencoding::encode(&self.to_cookie_value()).into_owned();
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(60))
            .build()
    }

    /// Read the pending flash message, if the cookie holds a valid one.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let raw = jar.get(FLASH_COOKIE)?;
        let decoded = urlencoding::decode(raw.value()).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    /// Read the pending flash message and schedule the cookie for removal.
    pub fn take(jar: CookieJar) -> (CookieJar, Option<Self>) {
        let flash = Self::from_jar(&jar);
        if jar.get(FLASH_COOKIE).is_none() {
            return (jar, flash);
        }
        (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
    }
}

/// Create a redirect response with a flash message cookie.
pub fn redirect_with_flash(jar: CookieJar, url: &str, flash: FlashMessage) -> Response {
    (jar.add(flash.to_cookie()), Redirect::to(url)).into_response()
}
