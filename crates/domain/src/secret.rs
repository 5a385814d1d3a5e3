//! A plaintext-secret wrapper that makes accidental logging a compile-time
//! non-issue and a runtime panic if it ever slips through `{:?}`/`{}`.
//!
//! Every call site that needs the raw bytes (building an auth header,
//! encrypting for storage) must call [`PlainSecret::expose`] explicitly —
//! there is no way to `format!("{}", secret)` by accident.

use std::fmt;

#[derive(Clone)]
pub struct PlainSecret(String);

impl PlainSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Explicit, named access to the raw secret. Grep-able by design.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlainSecret(***)")
    }
}

impl fmt::Display for PlainSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_plaintext() {
        let s = PlainSecret::new("sk-super-secret-value");
        let rendered = format!("{:?}", s);
        assert!(!rendered.contains("sk-super-secret-value"));
    }

    #[test]
    fn display_never_prints_plaintext() {
        let s = PlainSecret::new("sk-super-secret-value");
        let rendered = format!("{}", s);
        assert!(!rendered.contains("sk-super-secret-value"));
    }

    #[test]
    fn expose_returns_plaintext() {
        let s = PlainSecret::new("sk-super-secret-value");
        assert_eq!(s.expose(), "sk-super-secret-value");
    }
}
