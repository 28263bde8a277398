//! Addressable views
//!
//! `/` is the landing view listing documents; `/<id>` is a document.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::document::DocumentId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    #[error("Unknown route '{0}': expected '/' or '/<document id>'")]
    Unknown(String),
}

/// A view the application can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Document(DocumentId),
}

impl Route {
    /// Parse a path such as `/` or `/3f2c...`
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        if trimmed == "/" {
            return Ok(Route::Landing);
        }
        trimmed
            .strip_prefix('/')
            .and_then(|rest| rest.parse::<DocumentId>().ok())
            .map(Route::Document)
            .ok_or_else(|| RouteError::Unknown(path.to_string()))
    }

    /// Path that addresses this view
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Document(id) => format!("/{}", id),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Accept either a bare document id or a `/<id>` path
pub fn parse_document_ref(input: &str) -> Result<DocumentId, RouteError> {
    if let Ok(id) = input.parse::<DocumentId>() {
        return Ok(id);
    }
    match Route::parse(input)? {
        Route::Document(id) => Ok(id),
        Route::Landing => Err(RouteError::Unknown(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing() {
        assert_eq!(Route::parse("/").unwrap(), Route::Landing);
        assert_eq!(Route::Landing.path(), "/");
    }

    #[test]
    fn test_document_route_roundtrip() {
        let id = DocumentId::new();
        let route = Route::Document(id);
        assert_eq!(route.path(), format!("/{}", id));
        assert_eq!(Route::parse(&route.path()).unwrap(), route);
    }

    #[test]
    fn test_unknown_routes() {
        assert!(Route::parse("").is_err());
        assert!(Route::parse("/settings").is_err());
        assert!(Route::parse("no-slash").is_err());
        let id = DocumentId::new();
        assert!(Route::parse(&format!("/{}/extra", id)).is_err());
    }

    #[test]
    fn test_parse_document_ref() {
        let id = DocumentId::new();
        assert_eq!(parse_document_ref(&id.to_string()).unwrap(), id);
        assert_eq!(parse_document_ref(&format!("/{}", id)).unwrap(), id);
        assert!(parse_document_ref("/").is_err());
    }
}
