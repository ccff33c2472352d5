/*!
A thin monadic wrapper around [crate::error::Result], letting a chain of
fallible steps read top-to-bottom instead of nesting `match`/`?` blocks.
Nothing here is async-aware by itself; `flat_map`'s closure is free to
`.await` inside its own body before returning.
*/

use crate::error::{CrateError, Result};

/// Wraps a `Result<T, CrateError>`, adding chainable combinators.
#[derive(Debug, Clone, Copy)]
pub struct Pipe<T>(Result<T>);

impl<T> Pipe<T> {
    /// Start a pipe from a plain value.
    pub fn of(value: T) -> Self {
        Pipe(Ok(value))
    }

    /// Start a pipe from an existing result.
    pub fn from_result(result: Result<T>) -> Self {
        Pipe(result)
    }

    /// Transform the success value, leaving an existing error untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Pipe<U> {
        Pipe(self.0.map(f))
    }

    /// Chain another fallible step, short-circuiting on an existing error.
    pub fn flat_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Pipe<U> {
        Pipe(self.0.and_then(f))
    }

    /// Transform the error, leaving an existing success untouched.
    pub fn map_err(self, f: impl FnOnce(CrateError) -> CrateError) -> Pipe<T> {
        Pipe(self.0.map_err(f))
    }

    /// Run a side effect on the success value without changing it.
    pub fn tap(self, f: impl FnOnce(&T)) -> Pipe<T> {
        if let Ok(value) = &self.0 {
            f(value);
        }
        self
    }

    /// Run a side effect on an existing error without changing it.
    pub fn tap_err(self, f: impl FnOnce(&CrateError)) -> Pipe<T> {
        if let Err(err) = &self.0 {
            f(err);
        }
        self
    }

    /// Unwrap to a plain `Result`, ending the chain.
    pub fn into_result(self) -> Result<T> {
        self.0
    }

    /// Unwrap the success value, substituting `default` on error.
    pub fn unwrap_or(self, default: T) -> T {
        self.0.unwrap_or(default)
    }
}

impl<T> From<Result<T>> for Pipe<T> {
    fn from(result: Result<T>) -> Self {
        Pipe(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_transforms_success() {
        let result = Pipe::of(2).map(|x| x * 3).into_result();
        assert_eq!(result.unwrap(), 6);
    }

    #[test]
    fn test_flat_map_short_circuits_on_error() {
        let mut seen = false;
        let result = Pipe::of(1)
            .flat_map(|_| Err(CrateError::NotFound("missing".into())))
            .flat_map(|x: i32| {
                seen = true;
                Ok(x)
            })
            .into_result();
        assert!(result.is_err());
        assert!(!seen);
    }

    #[test]
    fn test_tap_runs_only_on_success() {
        let mut taps = 0;
        Pipe::of(1).tap(|_| taps += 1).into_result().unwrap();
        assert_eq!(taps, 1);

        let mut err_taps = 0;
        Pipe::<i32>::from_result(Err(CrateError::NotFound("x".into())))
            .tap(|_| err_taps += 1)
            .tap_err(|_| err_taps += 10)
            .into_result()
            .unwrap_err();
        assert_eq!(err_taps, 10);
    }

    #[test]
    fn test_unwrap_or_substitutes_default_on_error() {
        let value = Pipe::<i32>::from_result(Err(CrateError::NotFound("x".into()))).unwrap_or(42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_map_err_transforms_error_kind() {
        let result = Pipe::<i32>::from_result(Err(CrateError::NotFound("x".into())))
            .map_err(|_| CrateError::InvalidConfig("replaced".into()))
            .into_result();
        assert_eq!(result.unwrap_err().kind(), "invalid_config");
    }
}
