/// Single-byte chars from `[u8; 4]`.
/// Maps 0-255 to `char`, exceeding ascii.
pub(crate) fn chars_from_bytes(bytes: [u8; 4]) -> [char; 4] {
    [
        bytes[0] as char,
        bytes[1] as char,
        bytes[2] as char,
        bytes[3] as char,
    ]
}

/// String from single-byte chars (ISO8859-1),
/// optionally ignoring null bytes.
pub(crate) fn string_from_bytes(bytes: &[u8], ignore_null: bool) -> String {
    match ignore_null {
        true => bytes.iter()
            .filter_map(|b| if b == &0 {None} else {Some(*b as char)})
            .collect(),
        false => bytes.iter()
            .map(|b| *b as char)
            .collect(),
    }
}

/// Counted string, if the first byte is a plausible count,
/// otherwise the whole slice as a (possibly null terminated) string.
/// Trailing white space is removed.
pub(crate) fn counted_string(bytes: &[u8]) -> String {
    let name = match bytes.first() {
        Some(count) if (*count as usize) < bytes.len() && *count != 0 => {
            string_from_bytes(&bytes[1 .. *count as usize + 1], true)
        },
        _ => string_from_bytes(bytes, true),
    };
    name.trim().to_owned()
}

/// Rounds `n` up to the nearest multiple of 4.
#[inline]
pub(crate) fn align4(n: usize) -> usize {
    (n + 3) & !3
}
