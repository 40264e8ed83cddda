/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Splits a comma-separated list into its trimmed, non-empty, de-duplicated items. Order of first appearance is
/// preserved.
pub fn parse_comma_list(value: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !result.iter().any(|r| r == item) {
            result.push(item.to_string());
        }
    }
    result
}
