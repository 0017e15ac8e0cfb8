//! Path matching.
//!
//! # Responsibilities
//! - Strip the mount prefix from the request path
//! - Turn what is left into a registration key
//! - Capture server/session segments of framed endpoints
//!
//! # Accepted Shapes (relative to the mount prefix)
//! ```text
//! "" | "/"                     → ""            (welcome)
//! /<key>                       → "/<key>"      (rooted, e.g. raw websocket)
//! /<server>/<session>/<key>    → "<key>"       (session-scoped transports)
//! ```
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Server and session segments must be non-empty and contain no '.'
//! - No regex to guarantee O(n) matching

/// Server and session segments of a session-scoped URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPath {
    pub server: String,
    pub session: String,
}

/// A request path resolved to a registration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub prefix: String,
    pub session_path: Option<SessionPath>,
}

/// Match `path` against an application mounted at `mount`.
pub fn match_path(mount: &str, path: &str) -> Option<RouteMatch> {
    let rest = if mount == "/" {
        path
    } else {
        let rest = path.strip_prefix(mount)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            // "/echoes" is not under "/echo".
            return None;
        }
        rest
    };

    if rest.is_empty() || rest == "/" {
        return Some(RouteMatch {
            prefix: String::new(),
            session_path: None,
        });
    }

    let segments: Vec<&str> = rest[1..].split('/').collect();
    match segments.as_slice() {
        [key] if !key.is_empty() => Some(RouteMatch {
            prefix: format!("/{key}"),
            session_path: None,
        }),
        [server, session, key] if valid_segment(server) && valid_segment(session) && !key.is_empty() => {
            Some(RouteMatch {
                prefix: (*key).to_string(),
                session_path: Some(SessionPath {
                    server: (*server).to_string(),
                    session: (*session).to_string(),
                }),
            })
        }
        _ => None,
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_of(mount: &str, path: &str) -> Option<String> {
        match_path(mount, path).map(|m| m.prefix)
    }

    #[test]
    fn mount_point_is_welcome() {
        assert_eq!(prefix_of("/echo", "/echo"), Some(String::new()));
        assert_eq!(prefix_of("/echo", "/echo/"), Some(String::new()));
        assert_eq!(prefix_of("/", "/"), Some(String::new()));
    }

    #[test]
    fn rooted_key_is_raw() {
        assert_eq!(prefix_of("/echo", "/echo/websocket"), Some("/websocket".into()));
        assert_eq!(prefix_of("/", "/websocket"), Some("/websocket".into()));
    }

    #[test]
    fn session_scoped_key_captures_segments() {
        let m = match_path("/echo", "/echo/000/abc123/websocket").unwrap();
        assert_eq!(m.prefix, "websocket");
        assert_eq!(
            m.session_path,
            Some(SessionPath {
                server: "000".into(),
                session: "abc123".into(),
            })
        );
    }

    #[test]
    fn rejects_foreign_and_malformed_paths() {
        assert_eq!(match_path("/echo", "/other/websocket"), None);
        assert_eq!(match_path("/echo", "/echoes/websocket"), None);
        assert_eq!(match_path("/echo", "/echo/a.b/c/websocket"), None);
        assert_eq!(match_path("/echo", "/echo//c/websocket"), None);
        assert_eq!(match_path("/echo", "/echo/a/b"), None);
        assert_eq!(match_path("/echo", "/echo/a/b/c/websocket"), None);
    }
}
