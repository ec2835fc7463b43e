//! Server configuration

/// HTTP session server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,

    /// Port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 7878,
        }
    }
}

impl ServerConfig {
    /// Set the bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `bind:port`, as accepted by `HttpServer::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
