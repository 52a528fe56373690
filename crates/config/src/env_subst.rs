/// Replace `${VAR}` and `${VAR:-fallback}` placeholders with environment values.
///
/// A variable that is unset (or set but empty, for the `:-` form) resolves to
/// its fallback; with no fallback the placeholder is left untouched.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };

        let value = if name.is_empty() {
            None
        } else {
            match (lookup(name), fallback) {
                (Some(v), Some(_)) if !v.is_empty() => Some(v),
                (Some(_), Some(fb)) | (None, Some(fb)) => Some(fb.to_string()),
                (Some(v), None) => Some(v),
                (None, None) => None,
            }
        };

        match value {
            Some(v) => out.push_str(&v),
            None => {
                out.push_str("${");
                out.push_str(expr);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
