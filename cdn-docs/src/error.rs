use cdn_core::{CdnError, ErrorKind};
use thiserror::Error;

/// Result type for document operations
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur during document operations
#[derive(Error, Debug)]
pub enum DocError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Invalid document request: {message}")]
    Invalid { message: String },

    #[error("Document store error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Document decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DocError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn already_exists(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl From<DocError> for CdnError {
    fn from(err: DocError) -> Self {
        let kind = match &err {
            DocError::NotFound { .. } => ErrorKind::NotFound,
            DocError::AlreadyExists { .. } => ErrorKind::Conflict,
            DocError::Invalid { .. } => ErrorKind::Validation,
            DocError::Backend { .. } | DocError::Decode(_) => ErrorKind::Store,
        };
        CdnError::new(kind, err.to_string()).with_source(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_onto_cdn_errors() {
        let nf: CdnError = DocError::not_found("files", "abc").into();
        assert_eq!(nf.code(), 404);
        assert_eq!(nf.message, "Document not found: files/abc");

        let dup: CdnError = DocError::already_exists("folders", "x").into();
        assert_eq!(dup.code(), 409);

        let backend: CdnError =
            DocError::backend(std::io::Error::new(std::io::ErrorKind::Other, "down")).into();
        assert_eq!(backend.code(), 500);
        assert!(backend.source.is_some());
    }
}
