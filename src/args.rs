//! Slash-command argument handling.

/// Splits a typed line like `/meme drake "a b" c` into the command name and
/// its raw whitespace-delimited tokens. Returns `None` for lines that are not
/// commands.
pub fn split_command_line(line: &str) -> Option<(&str, Vec<&str>)> {
    let rest = line.trim().strip_prefix('/')?;
    let mut tokens = rest.split_whitespace();
    let command = tokens.next()?;
    Some((command, tokens.collect()))
}

/// Merges double-quoted runs of raw tokens into single logical arguments.
///
/// A token opening with `"` starts a run that ends at the first token closing
/// with `"`; the run's tokens are joined by single spaces and the outer quotes
/// dropped. A run left open at the end of input is closed with whatever was
/// collected. Quotes inside a token are kept as literal text.
pub fn tokenize<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut args = Vec::with_capacity(raw.len());
    let mut tokens = raw.iter().map(AsRef::as_ref);

    while let Some(token) = tokens.next() {
        let Some(opened) = token.strip_prefix('"') else {
            args.push(token.to_string());
            continue;
        };

        if let Some(closed) = opened.strip_suffix('"') {
            args.push(closed.to_string());
            continue;
        }

        let mut merged = opened.to_string();
        for next in tokens.by_ref() {
            merged.push(' ');
            if let Some(closed) = next.strip_suffix('"') {
                merged.push_str(closed);
                break;
            }
            merged.push_str(next);
        }
        args.push(merged);
    }

    args
}
