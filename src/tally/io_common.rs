use std::path::Path;

use serde_json::Value as JSValue;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Ids for ballots that do not carry the id of their voter.
///
/// Built from the path of the source as written in the configuration, so that
/// files with the same name in different directories get distinct ids.
pub fn make_default_id(source_path: &str) -> impl Fn(usize) -> String {
    let source_path = source_path.to_string();
    move |lineno| format!("{}-{:08}", source_path, lineno)
}

/// A short description of a JSON value, for error messages.
pub fn describe_js(v: &JSValue) -> &'static str {
    match v {
        JSValue::Null => "null",
        JSValue::Bool(_) => "a boolean",
        JSValue::Number(_) => "a number",
        JSValue::String(_) => "a string",
        JSValue::Array(_) => "an array",
        JSValue::Object(_) => "an object",
    }
}
