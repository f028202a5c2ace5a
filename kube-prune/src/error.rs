use super::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Listing the workloads failed; the determination cannot be built.
    #[error("failed to list {resource} in namespace {namespace:?}: {source}")]
    Fetch {
        resource: &'static str,
        namespace: String,
        source: BoxError,
    },

    /// The candidate's payload is not a valid object of its declared kind.
    #[error("cannot convert {kind} {name:?}: {source}")]
    Conversion {
        kind: Kind,
        name: String,
        source: BoxError,
    },

    #[error("invalid label selector ({name}): {source}")]
    Selector { name: String, source: SelectorError },

    #[error("unsupported kind: {kind}/{name}")]
    UnsupportedKind { kind: String, name: String },
}

impl Error {
    pub(crate) fn fetch<E>(resource: &'static str, namespace: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Fetch {
            resource,
            namespace: namespace.to_string(),
            source: Box::new(source),
        }
    }
}
