use crate::config::ValidationIssue;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "providers.chat.baseUrl")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "file_backend", "core_client")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the runtime core.
///
/// Every failure surfaces to the caller of the operation that triggered it;
/// nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config validation failed: {}", format_issues(.issues))]
    ConfigValidation { issues: Vec<ValidationIssue> },

    #[error("Provider not found: {provider_id}")]
    ProviderNotFound { provider_id: String },

    #[error("Provider already registered: {provider_id}")]
    DuplicateProvider { provider_id: String },

    #[error("Plugin '{plugin_id}' failed during setup: {source}")]
    PluginSetup {
        plugin_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Provider '{provider_id}' reported a stream error: {error}")]
    ProviderStream {
        provider_id: String,
        error: serde_json::Value,
    },

    #[error("Request cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("Core client is not initialized; call init() first")]
    NotInitialized,

    #[error("Message channel is closed")]
    ChannelClosed,

    #[error("Processor '{name}' failed: {message}")]
    Processor { name: String, message: String },

    #[error("Config backend error: {message}{}", format_context(.context))]
    Backend {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Failure raised from inside a processor.
    pub fn processor(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Processor {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new backend error with structured context
    pub fn backend_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::Backend {
            message: message.into(),
            context,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: message.into(),
            context,
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Error::Cancelled {
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Validation issues carried by a `ConfigValidation` error.
    pub fn validation_issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Error::ConfigValidation { issues } => Some(issues),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Backend { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
