// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Segment extraction for Serial 3 event telegrams
//
// An event telegram carries backslash-delimited segments introduced by a
// two-character marker, e.g. `\z005"Front Door\`. None of these helpers
// fail: absent or malformed fields decode to empty strings.

/// Return the text between `marker` and the next backslash, trimmed.
///
/// Returns an empty string if the marker is absent.
pub fn extract_segment<'a>(marker: &str, text: &'a str) -> &'a str {
    let Some(start) = text.find(marker) else {
        return "";
    };
    let rest = &text[start + marker.len()..];
    let end = rest.find('\\').unwrap_or(rest.len());
    rest[..end].trim()
}

/// Split a `NNN"Name` field at the first double quote into (number, name).
///
/// Without a quote the whole field is taken as the number.
pub fn split_number_name(text: &str) -> (&str, &str) {
    match text.split_once('"') {
        Some((number, name)) => (number.trim(), name),
        None => (text.trim(), ""),
    }
}

/// The `\t` qualifier with its leading class character removed
/// (`SOP` → `OP`, `ADO` → `DO`).
pub fn type_qualifier(text: &str) -> &str {
    let segment = extract_segment(crate::constants::SEGMENT_TYPE, text);
    let mut chars = segment.chars();
    chars.next();
    chars.as_str()
}

/// Zone number and name from the `\z` segment.
pub fn zone_field(text: &str) -> (&str, &str) {
    split_number_name(extract_segment(crate::constants::SEGMENT_ZONE, text))
}

/// Area number and name from the `\a` segment.
pub fn area_field(text: &str) -> (&str, &str) {
    split_number_name(extract_segment(crate::constants::SEGMENT_AREA, text))
}
