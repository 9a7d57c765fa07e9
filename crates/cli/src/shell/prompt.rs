use nu_ansi_term::Color;
use reedline::{Prompt, PromptEditMode, PromptHistorySearch};
use std::borrow::Cow;

/// Longest path shown in full; longer ones keep only their tail.
const MAX_PATH_WIDTH: usize = 32;

pub struct DefaultPrompt {
    current_path: Option<String>,
}

impl DefaultPrompt {
    pub fn new(current_path: Option<String>) -> Self {
        Self { current_path }
    }
}

impl Prompt for DefaultPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let prefix = Color::LightBlue.bold().paint("scanline");
        let path = match &self.current_path {
            Some(path) => Color::Yellow.paint(shorten_path(path)),
            None => Color::DarkGray.paint("-"),
        };
        Cow::Owned(format!("{} {} > ", prefix, path))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(".. ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("(search) ")
    }
}

fn shorten_path(path: &str) -> String {
    if path.chars().count() <= MAX_PATH_WIDTH {
        return path.to_string();
    }
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() <= 2 {
        return path.to_string();
    }
    let mut tail = String::new();
    for segment in segments.iter().skip(1).rev() {
        let candidate = if tail.is_empty() {
            segment.to_string()
        } else {
            format!("{segment}/{tail}")
        };
        if candidate.chars().count() + 4 > MAX_PATH_WIDTH && !tail.is_empty() {
            break;
        }
        tail = candidate;
    }
    format!("{}/../{}", segments[0], tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_paths_are_kept() {
        assert_eq!(shorten_path("movie/local/101"), "movie/local/101");
    }

    #[test]
    fn test_long_paths_keep_head_and_tail() {
        let path = "library/a-very-long-server-name/section-with-long-id/42";
        let shown = shorten_path(path);
        assert!(shown.starts_with("library/../"));
        assert!(shown.ends_with("/42"));
    }
}
