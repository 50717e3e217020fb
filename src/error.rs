use thiserror::Error;

/// Catalog fetch errors. Cloneable so a single in-flight fetch can hand the
/// same outcome to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Endpoint answered with a non-success status.
    #[error("Template catalog request failed with status {0}")]
    Status(u16),

    /// Body was missing, not a JSON object, or held no templates.
    #[error("Template catalog response was empty or malformed")]
    EmptyPayload,

    /// Request never produced a response.
    #[error("Template catalog request failed: {0}")]
    Transport(String),
}

/// Reasons a render URL cannot be built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderUrlError {
    /// Configured render base is not a URL that takes path segments.
    #[error("render URL '{0}' cannot take path segments")]
    InvalidBase(String),

    /// A segment of exactly `.` or `..` would be collapsed by URL path
    /// normalization, even when percent-encoded.
    #[error("path segment '{0}' cannot be sent")]
    DotSegment(String),
}

/// Everything that can go wrong while handling one `meme` invocation.
#[derive(Debug, Error)]
pub enum MemeError {
    /// Fewer than two logical arguments.
    #[error("Invalid arguments")]
    InvalidArguments,

    /// Template key not present in the catalog.
    #[error("Unknown template: {key}")]
    UnknownTemplate {
        key: String,
        known: Vec<String>,
        suggestion: Option<String>,
    },

    /// Render endpoint returned a non-success status or no usable body.
    #[error("Render request failed with status {status}")]
    UpstreamFetchFailure { status: u16 },

    /// Render request never produced a response.
    #[error("Render request failed: {0}")]
    Transport(String),

    /// Render URL could not be built from the request.
    #[error(transparent)]
    RenderUrl(#[from] RenderUrlError),

    /// Catalog could not be loaded.
    #[error(transparent)]
    CatalogFetch(#[from] CatalogError),
}

impl MemeError {
    /// Text of the private notice shown to the invoking user.
    pub fn notice_text(&self) -> String {
        match self {
            Self::InvalidArguments => "Invalid arguments.\n\
                 Use the following format: `/meme template top-line bottom-line`\n\
                 For a list of available templates, run `/meme --list` or `/meme-list`."
                .to_string(),
            Self::UnknownTemplate {
                key,
                known,
                suggestion,
            } => {
                let mut text = format!("Unknown template `{key}`.");
                if let Some(suggestion) = suggestion {
                    text.push_str(&format!(" Did you mean `{suggestion}`?"));
                }
                text.push_str(&format!("\nAvailable templates: `{}`", known.join("`, `")));
                text
            }
            Self::UpstreamFetchFailure { status } => format!(
                "Failed to generate meme image (status = {status}). Did you use a valid template?"
            ),
            Self::Transport(reason) => {
                format!("Failed to generate meme image ({reason}). Please try again later.")
            }
            Self::RenderUrl(RenderUrlError::DotSegment(segment)) => format!(
                "Captions and template names cannot be just `{segment}`. Add some text around it."
            ),
            Self::RenderUrl(RenderUrlError::InvalidBase(base)) => {
                format!("The meme render endpoint `{base}` is misconfigured.")
            }
            Self::CatalogFetch(_) => "Failed to retrieve the meme template list.".to_string(),
        }
    }
}

/// Message delivery errors raised by a chat host.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Host side of the channel has gone away.
    #[error("Chat host closed")]
    Closed,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Platform config directory could not be determined.
    #[error("Failed to determine config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_notice_mentions_both_forms() {
        let text = MemeError::InvalidArguments.notice_text();
        assert!(text.contains("`/meme template top-line bottom-line`"));
        assert!(text.contains("/meme-list"));
        assert!(text.contains("/meme --list"));
    }

    #[test]
    fn unknown_template_notice_lists_keys_in_backticks() {
        let err = MemeError::UnknownTemplate {
            key: "drak".to_string(),
            known: vec!["doge".to_string(), "drake".to_string()],
            suggestion: Some("drake".to_string()),
        };
        let text = err.notice_text();
        assert!(text.contains("Unknown template `drak`."));
        assert!(text.contains("Did you mean `drake`?"));
        assert!(text.ends_with("`doge`, `drake`"));
    }

    #[test]
    fn upstream_failure_notice_carries_status() {
        let text = MemeError::UpstreamFetchFailure { status: 404 }.notice_text();
        assert!(text.contains("404"));
        assert!(text.contains("valid template"));
    }

    #[test]
    fn catalog_error_wraps_into_meme_error() {
        let err: MemeError = CatalogError::Status(500).into();
        assert!(err.to_string().contains("500"));
        assert_eq!(
            err.notice_text(),
            "Failed to retrieve the meme template list."
        );
    }

    #[test]
    fn render_url_errors_get_their_own_notices() {
        let dots: MemeError = RenderUrlError::DotSegment("..".to_string()).into();
        assert!(dots.notice_text().contains("cannot be just `..`"));
        assert!(!dots.notice_text().contains("try again later"));

        let base: MemeError = RenderUrlError::InvalidBase("mailto:x".to_string()).into();
        assert!(base.notice_text().contains("misconfigured"));
    }

    #[test]
    fn displays_config_error_variant() {
        let err = ConfigError::InvalidValue {
            field: "catalog_url".to_string(),
            reason: "must be http(s)".to_string(),
        };
        assert!(err.to_string().contains("Invalid value for catalog_url"));
    }
}
