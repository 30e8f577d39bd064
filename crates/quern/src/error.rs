use thiserror::Error as ThisError;

///
/// RewriteError
///
/// Failures raised while splitting a caller filter into its relational,
/// include, and virtual parts. All of these abort the find before the
/// engine is called.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RewriteError {
    /// A dotted path names an association the shape does not carry.
    /// This is a configuration error, not a data condition.
    #[error("unknown association '{association}' on entity '{entity}'")]
    UnknownAssociation { entity: String, association: String },

    /// A dotted path descends more than one association deep.
    #[error("nested association path '{property}' is not supported in filters")]
    NestedPath { property: String },
}

///
/// MatchError
///
/// Failures raised while compiling the virtual-filter map into a match
/// program. Raised before any fetched row is examined.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MatchError {
    /// The test shape has no in-memory matching semantics.
    #[error("cannot filter on virtual property '{property}' with this test shape")]
    Unsupported { property: String },

    /// A like-style pattern without its wildcard wrapper characters.
    #[error("like pattern for virtual property '{property}' must be wrapped in '%': '{pattern}'")]
    MalformedPattern { property: String, pattern: String },
}

///
/// Error
///
/// Unified error surface over the non-generic pipeline errors, for
/// callers that fold both phases into one type.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Match(#[from] MatchError),
}
