use anyhow::anyhow;
use std::{error::Error, fmt::Display};

use crate::AnyResult;

/// Attaches a context message while converting into an [`AnyResult`].
pub trait AnyhowResultExt<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> AnyhowResultExt<T> for Result<T, E> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.map_err(|e| anyhow::Error::from(e).context(s.to_string()))
    }
}

impl<T> AnyhowResultExt<T> for Option<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.ok_or_else(|| anyhow!("{s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::AnyhowResultExt;
    use std::num::ParseIntError;

    #[test]
    fn result_context() {
        let parsed: Result<u32, ParseIntError> = "x".parse();
        let error = parsed.otherwise("reading the frame count").unwrap_err();
        assert_eq!(error.to_string(), "reading the frame count");
        assert!(error.root_cause().to_string().contains("invalid digit"));
    }

    #[test]
    fn option_context() {
        assert_eq!(Some(3).otherwise("missing").unwrap(), 3);
        let error = None::<u32>.otherwise("missing value").unwrap_err();
        assert_eq!(error.to_string(), "missing value");
    }
}
