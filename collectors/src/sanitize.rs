//! Label hygiene for operator-controlled strings.

/// Drops invalid UTF-8 sequences from raw bytes, keeping everything that
/// decodes cleanly. Monikers are operator input and occasionally arrive
/// mangled; a bad byte must not poison the whole exposition body.
pub fn sanitize_utf8(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => break,
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::sanitize_utf8;

    #[test]
    fn passes_clean_strings_through() {
        assert_eq!(sanitize_utf8("validator âš›".as_bytes()), "validator âš›");
    }

    #[test]
    fn drops_invalid_sequences() {
        // 0xC3 starts a two-byte sequence but 0x28 cannot continue it.
        let mangled = [b'a', 0xC3, 0x28, b'b'];
        assert_eq!(sanitize_utf8(&mangled), "a(b");
    }

    #[test]
    fn drops_truncated_tail() {
        let mangled = [b'o', b'k', 0xE2, 0x82];
        assert_eq!(sanitize_utf8(&mangled), "ok");
    }
}
