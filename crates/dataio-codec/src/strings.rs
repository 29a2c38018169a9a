//! String codec: base64url framing, UTF-8 coercion and entity escaping

use crate::error::{CodecError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Encode bytes as base64url (URL-safe alphabet, no padding).
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode base64url. Padding and the standard `+`/`/` alphabet are tolerated.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD
        .decode(cleaned.as_bytes())
        .map_err(|e| CodecError::DecodingFailed(e.to_string()))
}

/// Transcode ISO-8859-1 bytes to UTF-8 unconditionally.
pub fn latin1_to_utf8(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Return `data` as UTF-8. Valid UTF-8 passes through unchanged; anything
/// else is treated as ISO-8859-1.
pub fn ensure_utf8(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => latin1_to_utf8(data),
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Replace entity references with the characters they name. Exactly one pass:
/// `&amp;lt;` becomes `&lt;`, not `<`. Unknown references are kept verbatim.
pub fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        // entity names are short; look no further than 11 bytes for the `;`
        let decoded = tail[1..]
            .bytes()
            .take(11)
            .position(|b| b == b';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&tail[1..=end]).map(|c| (c, end + 2)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape `s` the way an HTML entity encoder would (used to produce
/// entity-escaped XML in tests and diagnostics).
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(c),
        }
    }
    result
}
