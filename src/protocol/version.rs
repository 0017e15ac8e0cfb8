//! Protocol version reporting.

/// Protocol version implemented by this server.
pub const PROTOCOL_VERSION: [u32; 3] = [0, 3, 4];

/// Dotted form of [`PROTOCOL_VERSION`].
pub fn protocol_version() -> String {
    PROTOCOL_VERSION
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
