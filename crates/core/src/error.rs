//! Domain errors shared by every crate in the workspace.
//!
//! Messages are written for the storefront's customers and are shown as-is
//! in API error bodies, so they are German. `Internal` is the exception: its
//! text is only logged.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `entity` is the German display name, e.g. `"Bestellung"`.
    #[error("{entity} mit ID {id} wurde nicht gefunden")]
    NotFound { entity: &'static str, id: DbId },

    /// Input the caller can fix.
    #[error("{0}")]
    Validation(String),

    /// The request clashes with the current state, e.g. a finished order or a
    /// taken slug.
    #[error("{0}")]
    Conflict(String),

    /// Missing, expired or forged credentials and signed links.
    #[error("{0}")]
    Unauthorized(String),

    /// Signed in, but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("Interner Fehler: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_shown_verbatim() {
        let err = CoreError::NotFound {
            entity: "Skript",
            id: 12,
        };
        assert_eq!(err.to_string(), "Skript mit ID 12 wurde nicht gefunden");
        assert_eq!(
            CoreError::Validation("Der Warenkorb ist leer".into()).to_string(),
            "Der Warenkorb ist leer"
        );
    }
}
