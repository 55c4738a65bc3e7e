use super::RequestsLoggingLevel;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Broad genres dropped from every genre aggregate. Seasonal noise
    /// like "Holiday" would otherwise dominate December buckets.
    pub excluded_genres: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            excluded_genres: vec!["Holiday".to_string()],
        }
    }
}
