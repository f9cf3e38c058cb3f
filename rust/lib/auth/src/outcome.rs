use crate::error::AuthError;

/// Uniform `{data, error}` result of a write operation.
///
/// Exactly one of the two is set. Operations return this instead of
/// `Result` so callers (forms) can read both halves without matching.
#[derive(Debug, Clone, PartialEq)]
pub struct OpResult<T> {
    pub data: Option<T>,
    pub error: Option<AuthError>,
}

impl<T> OpResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<AuthError>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> Result<Option<T>, AuthError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

impl<T> From<Result<T, AuthError>> for OpResult<T> {
    fn from(result: Result<T, AuthError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn ok_has_data_only() {
        let r = OpResult::ok(5u32);
        assert!(r.is_ok());
        assert_eq!(r.data, Some(5));
        assert_eq!(r.into_result().unwrap(), Some(5));
    }

    #[test]
    fn err_has_error_only() {
        let r: OpResult<u32> = OpResult::err(ProviderError::no_session());
        assert!(r.is_err());
        assert!(r.data.is_none());
        assert_eq!(r.into_result().unwrap_err().to_string(), "Auth session missing");
    }
}
