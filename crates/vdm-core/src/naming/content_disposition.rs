//! Content-Disposition parsing for the client side of the HTTP binding.
//!
//! The server we talk to may send `filename="..."`, a bare token, or an
//! RFC 5987 `filename*`; any of them may be missing, in which case the
//! caller falls back to a default name.

/// Extracts the filename from a raw `Content-Disposition` header value.
///
/// `filename*=UTF-8''percent-encoded` takes precedence over `filename=`;
/// quoted values are unquoted and unescaped. Returns `None` when no usable
/// filename parameter is present.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "filename*" {
            let rest = value
                .strip_prefix("UTF-8''")
                .or_else(|| value.strip_prefix("utf-8''"));
            if let Some(rest) = rest {
                let decoded = unquote(&percent_decode(rest));
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name == "filename" {
            let decoded = unquote(value);
            if !decoded.is_empty() {
                plain = Some(decoded);
            }
        }
    }

    plain
}

/// Strip surrounding double quotes and resolve `\"` / `\\` escapes.
fn unquote(s: &str) -> String {
    let inner = if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => out.push(next),
                Some(next) => {
                    out.push(c);
                    out.push(next);
                }
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Percent-decode an RFC 5987 value. Malformed escapes pass through as-is.
fn percent_decode(input: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(decoded) = bytes.get(i + 1..i + 3).and_then(hex_pair) {
                out.push(decoded);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(pair: &[u8]) -> Option<u8> {
    let hi = (pair[0] as char).to_digit(16)?;
    let lo = (pair[1] as char).to_digit(16)?;
    Some((hi as u8) << 4 | lo as u8)
}
