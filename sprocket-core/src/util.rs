/// Writes the values into `out`, calling `f` for each one and putting `separator`
/// between the values that produced some output.
pub fn separated<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Truncates long text (like a large string cell) for logs and messages.
#[macro_export]
macro_rules! truncate_long {
    ($text:expr) => {
        format_args!(
            "{}{}",
            &$text[..$text
                .char_indices()
                .nth(197)
                .map(|(i, _)| i)
                .unwrap_or($text.len())],
            if $text.chars().count() > 197 { "..." } else { "" },
        )
    };
}
