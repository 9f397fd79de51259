//! Function adapters for configuration-management front ends.
//!
//! Each adapter takes the raw argument list of a template/manifest function
//! call, checks its arity and delegates to [`StorageSpec`]. Errors carry the
//! function name so they can be reported verbatim when the build aborts.

use thiserror::Error;

use crate::storage::{StorageContext, StorageSpec, StorageSpecError};

/// Error surfaced by a function adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// Wrong number of arguments.
    #[error("{function}(): expected 1 argument but found {found}.")]
    Arity {
        function: &'static str,
        found: usize,
    },

    /// The storage spec was rejected.
    #[error("{function}(): {source}")]
    Storage {
        function: &'static str,
        #[source]
        source: StorageSpecError,
    },
}

impl FunctionError {
    /// Underlying storage error, if any.
    pub fn storage_error(&self) -> Option<&StorageSpecError> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::Arity { .. } => None,
        }
    }
}

fn single_arg<'a, S: AsRef<str>>(
    function: &'static str,
    args: &'a [S],
) -> Result<&'a str, FunctionError> {
    match args {
        [spec] => Ok(spec.as_ref()),
        _ => Err(FunctionError::Arity {
            function,
            found: args.len(),
        }),
    }
}

fn parse<C: StorageContext + ?Sized>(
    function: &'static str,
    spec: &str,
    ctx: &C,
) -> Result<StorageSpec, FunctionError> {
    StorageSpec::parse(spec, ctx).map_err(|source| FunctionError::Storage { function, source })
}

/// Validate a storage spec such as `malloc,1G` or `file,/var/tmp,20G,16k`.
pub fn validate_storage_spec<S, C>(args: &[S], ctx: &C) -> Result<(), FunctionError>
where
    S: AsRef<str>,
    C: StorageContext + ?Sized,
{
    const NAME: &str = "validate_storage_spec";
    parse(NAME, single_arg(NAME, args)?, ctx).map(|_| ())
}

/// Normalize a storage spec, e.g. `malloc,10%` to `malloc,1g` on a 10 GiB host.
pub fn normalize_storage_spec<S, C>(args: &[S], ctx: &C) -> Result<String, FunctionError>
where
    S: AsRef<str>,
    C: StorageContext + ?Sized,
{
    const NAME: &str = "normalize_storage_spec";
    parse(NAME, single_arg(NAME, args)?, ctx).map(|spec| spec.to_string())
}
