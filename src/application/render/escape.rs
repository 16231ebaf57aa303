use std::borrow::Cow;

/// Escape `&`, `<`, `>`, `"` and `'` so the text is safe both as element
/// content and inside a double-quoted attribute value.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(needs_escape) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    push_escaped(&mut out, input);
    Cow::Owned(out)
}

pub(crate) fn push_escaped(out: &mut String, input: &str) {
    let mut last = 0;
    for (index, c) in input.char_indices() {
        let replacement = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#39;",
            _ => continue,
        };
        out.push_str(&input[last..index]);
        out.push_str(replacement);
        last = index + c.len_utf8();
    }
    out.push_str(&input[last..]);
}

fn needs_escape(c: char) -> bool {
    matches!(c, '&' | '<' | '>' | '"' | '\'')
}
