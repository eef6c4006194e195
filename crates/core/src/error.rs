//! Error types for chart generation.

/// Result type for chart operations.
pub type ChartResult<T> = Result<T, ChartError>;

/// Failures surfaced by the translation, rendering and serving pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// No local translation rule exists for the chart type.
    #[error("Unsupported chart type: {0}")]
    UnsupportedType(String),

    /// A required setting is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The image server port is taken by another process.
    #[error("Image server port {port} is already in use. Set IMAGE_SERVER_PORT to a different port.")]
    PortInUse { port: u16 },

    /// The image server could not bind for another reason.
    #[error("Image server failed to start on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The rendering engine failed.
    #[error("Failed to render chart locally: {0}")]
    Render(String),

    /// The remote service reported `success: false`; the message is kept verbatim.
    #[error("{0}")]
    Remote(String),

    /// The remote service could not be reached or answered garbage.
    #[error("Remote request failed: {0}")]
    Http(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChartError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn render(message: impl std::fmt::Display) -> Self {
        Self::Render(message.to_string())
    }

    /// Whether the orchestrator should fall back to the remote service.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedType(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_in_use_names_port() {
        let err = ChartError::PortInUse { port: 18900 };
        assert!(err.to_string().contains("18900"));
    }

    #[test]
    fn test_remote_message_verbatim() {
        let err = ChartError::Remote("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_render_error_identifies_local_rendering() {
        let err = ChartError::render("boom");
        assert_eq!(err.to_string(), "Failed to render chart locally: boom");
    }
}
