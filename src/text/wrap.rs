use crate::foundation::error::CardResult;

/// Width of a single line of text as it would be drawn.
pub trait MeasureText {
    fn measure(&mut self, text: &str) -> CardResult<f32>;
}

impl<F> MeasureText for F
where
    F: FnMut(&str) -> CardResult<f32>,
{
    fn measure(&mut self, text: &str) -> CardResult<f32> {
        self(text)
    }
}

/// Greedy word wrap on whitespace.
///
/// Words accumulate on a line while its measured width stays within `max_width`. A word wider than
/// `max_width` occupies a line of its own; words are never split. Whitespace-only input yields no
/// lines.
pub fn wrap_greedy(
    text: &str,
    max_width: f32,
    measure: &mut impl MeasureText,
) -> CardResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.measure(&candidate)? <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}
