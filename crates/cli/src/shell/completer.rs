use crate::pages::Catalog;
use scanline_core::router::{PARAM_SIGIL, Router, SCHEME_PREFIX};
use reedline::{Completer, Span, Suggestion};
use std::sync::Arc;

/// Maximum number of suggestions offered at once.
const MAX_SUGGESTIONS: usize = 30;

pub struct ScanlineCompleter {
    commands: Vec<String>,
    router: Arc<Router<Catalog>>,
}

impl ScanlineCompleter {
    pub fn new(commands: Vec<String>, router: Arc<Router<Catalog>>) -> Self {
        Self { commands, router }
    }

    /// Visited paths first, then the fixed prefix of every route pattern.
    fn candidate_paths(&self) -> Vec<(String, Option<String>)> {
        let history = self.router.history();
        let mut candidates: Vec<(String, Option<String>)> = history
            .current()
            .into_iter()
            .chain(history.entries().into_iter().rev())
            .map(|entry| (entry.path, Some(entry.page_title)))
            .collect();

        for pattern in self.router.routes().patterns() {
            let prefix = static_prefix(&pattern);
            if !candidates.iter().any(|(path, _)| *path == prefix) {
                candidates.push((prefix, Some(pattern)));
            }
        }
        candidates
    }
}

/// The part of a pattern before its first parameter, e.g. `movie/` for
/// `movie/:server/:ratingKey`.
fn static_prefix(pattern: &str) -> String {
    match pattern.find(PARAM_SIGIL) {
        Some(idx) => pattern[..idx].to_string(),
        None => pattern.to_string(),
    }
}

fn suggestion(value: String, description: Option<String>, start: usize, end: usize) -> Suggestion {
    Suggestion {
        value,
        description,
        style: None,
        extra: None,
        span: Span { start, end },
        append_whitespace: false,
        match_indices: None,
    }
}

impl Completer for ScanlineCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        // Only the text left of the cursor is being completed.
        let line = line.get(..pos).unwrap_or(line);
        let pos = line.len();
        let trimmed = line.trim_start();

        if !trimmed.contains(' ') {
            return self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(trimmed))
                .map(|cmd| {
                    let mut s = suggestion(cmd.clone(), None, pos - trimmed.len(), pos);
                    s.append_whitespace = true;
                    s
                })
                .collect();
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.first() != Some(&"go") || parts.len() > 2 {
            return vec![];
        }
        let last_word = if line.ends_with(' ') {
            ""
        } else {
            parts.last().copied().unwrap_or("")
        };
        let span_start = pos - last_word.len();
        let (scheme, typed) = match last_word.strip_prefix(SCHEME_PREFIX) {
            Some(rest) => (SCHEME_PREFIX, rest),
            None => ("", last_word),
        };

        self.candidate_paths()
            .into_iter()
            .filter(|(path, _)| path.starts_with(typed))
            .take(MAX_SUGGESTIONS)
            .map(|(path, description)| {
                suggestion(format!("{scheme}{path}"), description, span_start, pos)
            })
            .collect()
    }
}
