//! Process-wide parameters initialized from environment variables.
//!
//! An [`EnvParam`] pairs the name of an environment variable with a default
//! value, both given as static strings. The parameter is parsed on first
//! access and frozen afterwards: later changes to the environment are ignored.
//!
//! This is meant for internal tunables that influence an algorithm but are
//! too obscure to deserve a command line flag.
//!
//! ```
//! use env_param::EnvParam;
//! static CACHE_SIZE: EnvParam<usize> = EnvParam::new("MYAPP_CACHE_SIZE", "128");
//!
//! // The variable is not set: the default applies.
//! assert_eq!(CACHE_SIZE.get(), 128);
//! ```

use std::str::FromStr;

use once_cell::sync::OnceCell;

/// A lazily initialized parameter backed by an environment variable.
pub struct EnvParam<T> {
    cell: OnceCell<T>,
    var: &'static str,
    default: &'static str,
}

impl<T> EnvParam<T> {
    /// Declares a parameter read from the environment variable `var`,
    /// falling back to `default` when the variable is absent.
    pub const fn new(var: &'static str, default: &'static str) -> EnvParam<T> {
        EnvParam {
            cell: OnceCell::new(),
            var,
            default,
        }
    }

    /// Name of the backing environment variable.
    pub fn var(&self) -> &'static str {
        self.var
    }
}

impl<T: FromStr> EnvParam<T> {
    /// Returns the value of the parameter, reading and parsing the
    /// environment variable on the first call.
    ///
    /// An unparsable environment value is reported on stderr and replaced by
    /// the default.
    ///
    /// # Panics
    /// Panics if the declared default itself cannot be parsed.
    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.get_ref()
    }

    /// Reference-returning variant of [`EnvParam::get`] for non-`Copy` types.
    pub fn get_ref(&self) -> &T {
        self.cell.get_or_init(|| match std::env::var(self.var) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                eprintln!(
                    "[env_param] {}: cannot parse \"{raw}\", falling back to default \"{}\"",
                    self.var, self.default
                );
                self.parsed_default()
            }),
            Err(std::env::VarError::NotPresent) => self.parsed_default(),
            Err(err) => {
                eprintln!(
                    "[env_param] {}: {err}, falling back to default \"{}\"",
                    self.var, self.default
                );
                self.parsed_default()
            }
        })
    }

    /// Forces the parameter to `value`, bypassing the environment.
    ///
    /// # Panics
    /// Panics if the parameter was already initialized, typically because it
    /// was already read.
    pub fn set(&self, value: T) {
        if self.cell.set(value).is_err() {
            panic!("parameter {} was already initialized", self.var);
        }
    }

    fn parsed_default(&self) -> T {
        match self.default.parse() {
            Ok(v) => v,
            Err(_) => panic!("parameter {}: invalid default \"{}\"", self.var, self.default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_when_unset() {
        static P: EnvParam<u32> = EnvParam::new("ENV_PARAM_TEST_UNSET", "42");
        assert_eq!(P.get(), 42);
    }

    #[test]
    fn read_from_environment() {
        static P: EnvParam<u32> = EnvParam::new("ENV_PARAM_TEST_SET", "0");
        std::env::set_var("ENV_PARAM_TEST_SET", "7");
        assert_eq!(P.get(), 7);
    }

    #[test]
    fn frozen_after_first_access() {
        static P: EnvParam<u32> = EnvParam::new("ENV_PARAM_TEST_FROZEN", "1");
        assert_eq!(P.get(), 1);
        std::env::set_var("ENV_PARAM_TEST_FROZEN", "2");
        assert_eq!(P.get(), 1);
    }

    #[test]
    fn programmatic_set() {
        static P: EnvParam<f64> = EnvParam::new("ENV_PARAM_TEST_FORCED", "0.5");
        P.set(0.25);
        assert_eq!(P.get(), 0.25);
    }
}
