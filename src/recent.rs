/// Move `path` to the front of `files`, dropping any older copy of it and
/// anything past `capacity`.
pub fn promote(mut files: Vec<String>, path: &str, capacity: usize) -> Vec<String> {
    files.retain(|p| p != path);
    files.insert(0, path.to_string());
    files.truncate(capacity);
    files
}
