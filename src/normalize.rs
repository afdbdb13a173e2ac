use tracing::debug;

/// Replace every literal backslash-`n` pair with a real line break.
///
/// Missing input yields an empty string.
pub fn normalize(text: Option<&str>) -> String {
    match text {
        Some(text) => text.replace("\\n", "\n"),
        None => {
            debug!("activity content is missing; rendering empty body");
            String::new()
        }
    }
}
