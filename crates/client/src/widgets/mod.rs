use std::borrow::Cow;

pub mod log_view;
pub mod notices;
pub mod rule_bar;

const TAB: &str = "    ";

/// Server text is untrusted: escape sequences would reach the real terminal
/// through the cell buffer. Tabs become spaces, every other control character
/// becomes U+FFFD.
pub fn terminal_safe(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.push_str(TAB),
            c if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
