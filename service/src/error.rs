use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the stores, the reconciliation service and the use cases.
///
/// Store and service code attaches the operation and the key it was working on
/// through [`Error::Context`]; use [`Error::root`] to classify an error without
/// caring how deeply it has been wrapped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("post not found")]
    PostNotFound,

    #[error("tag not found")]
    TagNotFound,

    #[error("posts_tags not found")]
    PostsTagsNotFound,

    #[error("tag has already existed")]
    TagAlreadyExisted,

    #[error("posts_tags has already existed")]
    PostsTagsAlreadyExisted,

    #[error("permalink has already existed")]
    PermalinkAlreadyExisted,

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Error {
    /// Wrap `self` with a description of the failed operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every layer of context removed.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Context { source, .. } = err {
            err = source;
        }
        err
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Error::PostNotFound | Error::TagNotFound | Error::PostsTagsNotFound
        )
    }

    pub fn is_already_existed(&self) -> bool {
        matches!(
            self.root(),
            Error::TagAlreadyExisted
                | Error::PostsTagsAlreadyExisted
                | Error::PermalinkAlreadyExisted
        )
    }
}

pub trait ResultExt<T> {
    /// Attach context lazily on the error path.
    fn with_context<F, C>(self, f: F) -> Result<T, Error>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn with_context<F, C>(self, f: F) -> Result<T, Error>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|err| err.into().context(f()))
    }
}
