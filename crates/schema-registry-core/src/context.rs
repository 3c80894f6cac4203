//! Context & subject namespace parsing (component C5).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The default context every registry instance always has.
pub const DEFAULT_CONTEXT: &str = ".";

/// A subject string as it arrives over the wire, split into its tenancy
/// context and bare subject name. Per SPEC_FULL.md §9 this is modeled as a
/// tagged sum so every Engine API accepts one type regardless of whether the
/// caller used the `:.<ctx>:<subj>` prefix form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectRef {
    Default(String),
    Qualified(String, String),
}

impl SubjectRef {
    /// Parse a raw subject path segment. `:.<ctx>:<subj>` qualifies the
    /// subject with context `.<ctx>`; anything else is a bare subject name
    /// in the default context.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(':') {
            if let Some(second_colon) = rest.find(':') {
                let ctx = &rest[..second_colon];
                let subj = &rest[second_colon + 1..];
                return SubjectRef::Qualified(ctx.to_string(), subj.to_string());
            }
        }
        SubjectRef::Default(raw.to_string())
    }

    /// The context this subject belongs to: `"."` for the default context.
    pub fn context(&self) -> &str {
        match self {
            SubjectRef::Default(_) => DEFAULT_CONTEXT,
            SubjectRef::Qualified(ctx, _) => ctx.as_str(),
        }
    }

    /// The bare subject name, without any context prefix.
    pub fn name(&self) -> &str {
        match self {
            SubjectRef::Default(name) => name.as_str(),
            SubjectRef::Qualified(_, name) => name.as_str(),
        }
    }

    pub fn context_and_name(&self) -> (String, String) {
        (self.context().to_string(), self.name().to_string())
    }

    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        let context = context.into();
        if context == DEFAULT_CONTEXT {
            SubjectRef::Default(name.into())
        } else {
            SubjectRef::Qualified(context, name.into())
        }
    }
}

/// Reconstructs the wire form consumed by `parse`: bare name in the default
/// context, `:<ctx>:<name>` otherwise. Used by the global by-id listing
/// endpoints, which span every context and must disambiguate subjects.
impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectRef::Default(name) => write!(f, "{name}"),
            SubjectRef::Qualified(ctx, name) => write!(f, ":{ctx}:{name}"),
        }
    }
}
