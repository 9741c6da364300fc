/// Broad failure category. Each kind maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration or command-line arguments.
    Config,
    /// Local file I/O (panel file, cache, output directories).
    Io,
    /// Data is present but unusable (empty panel, duplicate days, bad panel file).
    InvalidData,
    /// A required series could not be fetched or came back empty.
    DataUnavailable,
    /// Chart or report rendering/writing failed.
    RenderFailure,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Io => 2,
            ErrorKind::InvalidData => 3,
            ErrorKind::DataUnavailable => 4,
            ErrorKind::RenderFailure => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, message)
    }

    /// A required series failed to load. The series id is always part of the message.
    pub fn data_unavailable(series_id: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::DataUnavailable,
            format!("Data unavailable for series {series_id}: {detail}"),
        )
    }

    /// Rendering failed at the named stage (e.g. "linepack chart").
    pub fn render_failure(stage: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::RenderFailure,
            format!("Render failure ({stage}): {detail}"),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
