//! Text encodings used by the composer: RFC 2047 encoded words,
//! quoted-printable and line-wrapped base64.

/// Maximum content column for quoted-printable before a soft line break
const QP_LINE_LIMIT: usize = 75;

/// Column at which base64 attachment bodies are wrapped
const BASE64_LINE_LIMIT: usize = 76;

/// Encodes a header value as an RFC 2047 "encoded word" when it contains
/// non-ASCII text. Pure-ASCII values pass through unchanged.
pub fn encoded_word(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", base64::encode(text))
    }
}

/// Quoted-printable encoding of a text body.
///
/// The input uses `\n` line endings (the composer strips CRs beforehand);
/// line breaks come out as CRLF. Trailing whitespace on a line and any byte
/// outside the printable ASCII range are escaped as `=XX`, and lines are
/// soft-wrapped with `=\r\n` before they exceed 76 columns.
pub fn quoted_printable(text: &str) -> String {
    let mut out = String::new();

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push_str("\r\n");
        }

        let bytes = line.as_bytes();
        let mut column = 0;

        for (pos, &byte) in bytes.iter().enumerate() {
            let is_last = pos + 1 == bytes.len();
            let literal = match byte {
                // '=' (0x3D) always gets escaped
                0x21..=0x3C | 0x3E..=0x7E => true,
                b' ' | b'\t' => !is_last,
                _ => false,
            };

            let width = if literal { 1 } else { 3 };
            if column + width > QP_LINE_LIMIT {
                out.push_str("=\r\n");
                column = 0;
            }

            if literal {
                out.push(byte as char);
            } else {
                out.push_str(&format!("={:02X}", byte));
            }
            column += width;
        }
    }

    out
}

/// Base64-encodes raw bytes and wraps the output at the standard 76-character
/// boundary, CRLF after every chunk including the last.
pub fn base64_wrapped(data: &[u8]) -> String {
    let encoded = base64::encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LIMIT * 2 + 2);

    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let cut = rest.len().min(BASE64_LINE_LIMIT);
        out.push_str(&rest[..cut]);
        out.push_str("\r\n");
        rest = &rest[cut..];
    }

    out
}

/// Removes HTML tags, producing the fallback plain-text alternative when the
/// caller did not supply one.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encoded_word() {
        assert_eq!(encoded_word("Plain subject"), "Plain subject");
        assert_eq!(encoded_word("Héllo"), "=?UTF-8?B?SMOpbGxv?=");
        assert_eq!(encoded_word(""), "");
    }

    #[test]
    fn test_quoted_printable_ascii_passthrough() {
        assert_eq!(quoted_printable("Hello world"), "Hello world");
        assert_eq!(quoted_printable("line one\nline two"), "line one\r\nline two");
    }

    #[test]
    fn test_quoted_printable_escapes() {
        assert_eq!(quoted_printable("café"), "caf=C3=A9");
        assert_eq!(quoted_printable("a=b"), "a=3Db");
        // trailing whitespace must not survive literally
        assert_eq!(quoted_printable("end "), "end=20");
        assert_eq!(quoted_printable("end\t"), "end=09");
        // interior spaces stay literal
        assert_eq!(quoted_printable("a b"), "a b");
    }

    #[test]
    fn test_quoted_printable_soft_wrap() {
        let long = "x".repeat(100);
        let encoded = quoted_printable(&long);
        assert!(encoded.contains("=\r\n"));
        for part in encoded.split("\r\n") {
            assert!(part.len() <= 76);
        }
        let decoded: String = encoded.replace("=\r\n", "");
        assert_eq!(decoded, long);
    }

    #[test]
    fn test_quoted_printable_keeps_leading_dot() {
        // transparency is the transport codec's job, not the encoder's
        assert_eq!(quoted_printable(".Hello"), ".Hello");
    }

    #[test]
    fn test_base64_wrapped() {
        let wrapped = base64_wrapped(&[0u8; 100]);
        assert!(wrapped.ends_with("\r\n"));
        let lines: Vec<&str> = wrapped.trim_end().split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(base64_wrapped(b"hi"), "aGk=\r\n");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("no markup"), "no markup");
        assert_eq!(strip_tags("a < b"), "a ");
    }
}
