//! Upgrade preconditions shared by the WebSocket variants.

use axum::http::header::{CONNECTION, SEC_WEBSOCKET_VERSION, UPGRADE};
use axum::http::{HeaderMap, HeaderName};

use crate::error::HttpError;

/// Accepted values of the `Connection` header.
const CONNECTION_VALUES: [&str; 2] = ["Upgrade", "keep-alive, Upgrade"];

/// Protocol versions of RFC 6455.
const SUPPORTED_VERSIONS: [&str; 2] = ["8", "13"];

fn header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
}

/// `Upgrade: websocket` and `Connection: Upgrade` must both be present.
pub fn check_upgrade(headers: &HeaderMap) -> Result<(), HttpError> {
    if !header(headers, &UPGRADE).eq_ignore_ascii_case("websocket") {
        return Err(HttpError::UpgradeNotWebSocket);
    }

    let connection = header(headers, &CONNECTION);
    if !CONNECTION_VALUES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(connection))
    {
        return Err(HttpError::ConnectionNotUpgrade);
    }

    Ok(())
}

/// The negotiated protocol version must be RFC 6455.
pub fn check_version(headers: &HeaderMap) -> Result<(), HttpError> {
    let version = header(headers, &SEC_WEBSOCKET_VERSION);
    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(HttpError::UnsupportedVersion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn accepts_browser_upgrades() {
        assert_eq!(
            check_upgrade(&headers(&[("upgrade", "WebSocket"), ("connection", "Upgrade")])),
            Ok(())
        );
        assert_eq!(
            check_upgrade(&headers(&[
                ("upgrade", "websocket"),
                ("connection", "keep-alive, Upgrade")
            ])),
            Ok(())
        );
    }

    #[test]
    fn missing_upgrade_header() {
        assert_eq!(
            check_upgrade(&headers(&[("connection", "Upgrade")])),
            Err(HttpError::UpgradeNotWebSocket)
        );
        assert_eq!(
            check_upgrade(&headers(&[("upgrade", "h2c"), ("connection", "Upgrade")])),
            Err(HttpError::UpgradeNotWebSocket)
        );
    }

    #[test]
    fn bad_connection_header() {
        assert_eq!(
            check_upgrade(&headers(&[("upgrade", "websocket")])),
            Err(HttpError::ConnectionNotUpgrade)
        );
        assert_eq!(
            check_upgrade(&headers(&[("upgrade", "websocket"), ("connection", "close")])),
            Err(HttpError::ConnectionNotUpgrade)
        );
    }

    #[test]
    fn versions() {
        assert_eq!(check_version(&headers(&[("sec-websocket-version", "13")])), Ok(()));
        assert_eq!(check_version(&headers(&[("sec-websocket-version", "8")])), Ok(()));
        assert_eq!(
            check_version(&headers(&[("sec-websocket-version", "7")])),
            Err(HttpError::UnsupportedVersion)
        );
        assert_eq!(check_version(&HeaderMap::new()), Err(HttpError::UnsupportedVersion));
    }
}
