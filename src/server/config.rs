use super::RequestsLoggingLevel;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Size of the `list/last` page.
    pub recent_list_limit: usize,
    /// Body limit of the upload route, in bytes.
    pub max_upload_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3002,
            recent_list_limit: 5,
            max_upload_body_size: 11 * 1024 * 1024,
        }
    }
}
