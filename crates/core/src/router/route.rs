use crate::error::RegistrationError;
use regex::Regex;

/// Marks a path segment as a parameter, e.g. `movie/:server/:ratingKey`.
pub const PARAM_SIGIL: char = ':';

/// A registered path template. Identity is the pattern string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pattern: String,
    param_count: usize,
}

impl Route {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let param_count = pattern.split('/').filter(|s| is_param(s)).count();
        Self {
            pattern,
            param_count,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }

    /// Fills the parameter slots in order to build a concrete path.
    ///
    /// Slots without a matching argument are left out; surplus arguments are ignored.
    pub fn path<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut args = args.iter();
        self.pattern
            .split('/')
            .filter_map(|segment| {
                if is_param(segment) {
                    args.next().map(|a| a.as_ref().to_string())
                } else {
                    Some(segment.to_string())
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Anchored matcher with one `[^/]+` capture group per parameter.
    pub(crate) fn compile(&self) -> Result<Regex, RegistrationError> {
        let body = self
            .pattern
            .split('/')
            .map(|segment| {
                if is_param(segment) {
                    "([^/]+)".to_string()
                } else {
                    regex::escape(segment)
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        Regex::new(&format!("^{body}$")).map_err(|source| RegistrationError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })
    }
}

fn is_param(segment: &str) -> bool {
    segment.len() > 1 && segment.starts_with(PARAM_SIGIL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_count() {
        assert_eq!(Route::new("home").param_count(), 0);
        assert_eq!(Route::new("movie/:server/:ratingKey").param_count(), 2);
        assert_eq!(Route::new("library/:server/:section/all").param_count(), 2);
    }

    #[test]
    fn test_path_fills_slots_in_order() {
        let route = Route::new("movie/:server/:ratingKey");
        assert_eq!(route.path(&["srv1", "123"]), "movie/srv1/123");
    }

    #[test]
    fn test_path_with_missing_args_drops_slots() {
        let route = Route::new("movie/:server/:ratingKey");
        assert_eq!(route.path(&["srv1"]), "movie/srv1");
        assert_eq!(route.path::<&str>(&[]), "movie");
    }

    #[test]
    fn test_path_ignores_extra_args() {
        let route = Route::new("search");
        assert_eq!(route.path(&["ignored"]), "search");
    }

    #[test]
    fn test_compiled_matcher_is_anchored() {
        let matcher = Route::new("show/:server/:ratingKey").compile().unwrap();
        assert!(matcher.is_match("show/a/1"));
        assert!(!matcher.is_match("show/a/1/extra"));
        assert!(!matcher.is_match("xshow/a/1"));
        assert!(!matcher.is_match("show/a"));
        assert!(!matcher.is_match("show//1"));
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let matcher = Route::new("a.b/:id").compile().unwrap();
        assert!(matcher.is_match("a.b/1"));
        assert!(!matcher.is_match("axb/1"));
    }

    #[test]
    fn test_captures_are_positional() {
        let matcher = Route::new("movie/:server/:ratingKey").compile().unwrap();
        let caps = matcher.captures("movie/srv1/123").unwrap();
        assert_eq!(&caps[1], "srv1");
        assert_eq!(&caps[2], "123");
    }
}
