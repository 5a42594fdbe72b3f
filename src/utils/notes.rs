/// Fee notes are an append-only log of administrative annotations.
const SEPARATOR: &str = " | ";

pub fn append_note(existing: Option<&str>, entry: &str) -> String {
    match existing {
        Some(log) if !log.is_empty() => format!("{log}{SEPARATOR}{entry}"),
        _ => entry.to_string(),
    }
}
