// Header sets the vendor backend checks: it only answers requests that look like the mobile app.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT,
};

use super::ApiError;
use crate::config::{MOBILE_DEVICES, USER_AGENT as APP_USER_AGENT, VERSION_CODE};
use crate::credentials::Credentials;

const APP_USER_ID: HeaderName = HeaderName::from_static("app_user_id");
const TOKEN: HeaderName = HeaderName::from_static("token");
const TIMESTAMP: HeaderName = HeaderName::from_static("timestamp");
const VERSIONCODE: HeaderName = HeaderName::from_static("versioncode");
const MOBILEDEVICES: HeaderName = HeaderName::from_static("mobiledevices");
const UTC_OFFSET: HeaderName = HeaderName::from_static("utc_offset");
const TIMEZONE: HeaderName = HeaderName::from_static("timezone");
const APP_TYPE: HeaderName = HeaderName::from_static("app_type");

/// Headers common to every request.
fn base() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(VERSIONCODE, HeaderValue::from_static(VERSION_CODE));
    headers.insert(MOBILEDEVICES, HeaderValue::from_static(MOBILE_DEVICES));
    headers.insert(TIMESTAMP, HeaderValue::from(timestamp_ms()));
    headers
}

/// Headers for the login handshake, before a token exists.
pub fn anonymous() -> HeaderMap {
    let mut headers = base();
    headers.insert(UTC_OFFSET, HeaderValue::from_static("+0000"));
    headers.insert(TIMEZONE, HeaderValue::from_static("GMT"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
    headers.insert(APP_TYPE, HeaderValue::from_static("SOFTWARE"));
    headers
}

/// Headers for calls made on behalf of a logged-in user.
pub fn authenticated(credentials: &Credentials) -> Result<HeaderMap, ApiError> {
    let mut headers = base();
    headers.insert(APP_USER_ID, header_value("App_user_id", &credentials.user_id)?);
    headers.insert(TOKEN, header_value("Token", &credentials.token)?);
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.to_string()))
}

fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
