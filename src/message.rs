use base64::{engine::general_purpose, Engine as _};

/// A parsed message header block.
///
/// Headers are kept as `(name, raw value)` pairs in message order so that
/// repeated headers (multiple `Received` lines etc.) stay distinct and
/// keep their relative position. Header name comparisons are ASCII
/// case-insensitive.
#[derive(Debug, Default, Clone)]
pub struct ParsedMessage {
    headers: Vec<(String, String)>,
}

impl ParsedMessage {
    /// Parse the header block of a raw message.
    ///
    /// Reads up to the first blank line, unfolding continuation lines into
    /// the preceding header. Lines without a colon are skipped. Parsing
    /// never fails; a message with no recognizable headers just has an
    /// empty header list.
    pub fn parse(raw: &str) -> Self {
        let mut headers: Vec<(String, String)> = Vec::new();

        for line in raw.lines() {
            if line.trim().is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                // Continuation of the previous header
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        ParsedMessage { headers }
    }

    /// True if a header with this name is present at all, regardless of value.
    pub fn has_raw_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Raw values for a header name, in message order.
    pub fn get_raw_header(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Decoded values for a header name, in message order.
    pub fn get_decoded_header(&self, name: &str) -> Vec<String> {
        self.get_raw_header(name)
            .into_iter()
            .map(decode_mime_header)
            .collect()
    }

    /// First email address per occurrence of a header, decoded.
    ///
    /// Occurrences with no recognizable address contribute nothing.
    pub fn get_addr_header(&self, name: &str) -> Vec<String> {
        self.get_decoded_header(name)
            .iter()
            .filter_map(|v| extract_first_address(v))
            .collect()
    }

    /// First display name per occurrence of a header, decoded.
    pub fn get_name_header(&self, name: &str) -> Vec<String> {
        self.get_decoded_header(name)
            .iter()
            .filter_map(|v| extract_first_display_name(v))
            .collect()
    }

    /// Lazy iteration over every header as a decoded `"Name: value"` unit,
    /// one per occurrence, in message order.
    pub fn iter_decoded_headers(&self) -> impl Iterator<Item = String> + '_ {
        self.headers
            .iter()
            .map(|(n, v)| format!("{}: {}", n, decode_mime_header(v)))
    }
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Handles `=?charset?B?...?=` and `=?charset?Q?...?=`; anything that does
/// not parse as an encoded-word is passed through verbatim.
pub fn decode_mime_header(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("=?") {
        let (plain, encoded) = rest.split_at(start);
        result.push_str(plain);
        match decode_encoded_word(encoded) {
            Some((decoded, consumed)) => {
                result.push_str(&decoded);
                rest = &encoded[consumed..];
            }
            None => {
                result.push_str("=?");
                rest = &encoded[2..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Decode a single encoded-word at the start of `input`.
///
/// Returns the decoded text and the number of bytes consumed, or None if
/// `input` does not start with a well-formed encoded-word.
fn decode_encoded_word(input: &str) -> Option<(String, usize)> {
    let inner = input.strip_prefix("=?")?;
    let cs_end = inner.find('?')?;
    let charset = &inner[..cs_end];
    let rest = &inner[cs_end + 1..];
    let enc_end = rest.find('?')?;
    let encoding = &rest[..enc_end];
    let payload_rest = &rest[enc_end + 1..];
    let payload_end = payload_rest.find("?=")?;
    let payload = &payload_rest[..payload_end];

    let bytes = match encoding {
        "B" | "b" => general_purpose::STANDARD.decode(payload).ok()?,
        "Q" | "q" => decode_q_encoding(payload),
        _ => return None,
    };

    // RFC 2231 language tags ("utf-8*en") ride along on the charset
    let charset = charset.split('*').next().unwrap_or(charset);
    let decoded = match charset.to_ascii_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin1" | "windows-1252" => {
            bytes.iter().map(|&b| b as char).collect()
        }
        _ => String::from_utf8_lossy(&bytes).into_owned(),
    };

    let consumed = 2 + cs_end + 1 + enc_end + 1 + payload_end + 2;
    Some((decoded, consumed))
}

/// Q-encoding: quoted-printable with `_` standing for space.
fn decode_q_encoding(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

fn hex_val(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// The first address-list entry of a header value, respecting quoting so
/// that `"Doe, John" <j@example.com>` stays one entry.
fn first_entry(value: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return &value[..i],
            _ => {}
        }
    }
    value
}

/// Extract the first email address from an address header value.
///
/// Prefers the angle-bracket form; falls back to the first token
/// containing an `@`.
pub fn extract_first_address(value: &str) -> Option<String> {
    let entry = first_entry(value);

    if let Some(start) = entry.find('<') {
        if let Some(len) = entry[start + 1..].find('>') {
            let addr = entry[start + 1..start + 1 + len].trim();
            if !addr.is_empty() {
                return Some(addr.to_string());
            }
        }
    }

    entry
        .split_whitespace()
        .find(|tok| tok.contains('@'))
        .map(|tok| tok.trim_matches(['<', '>', '(', ')', ';']).to_string())
}

/// Extract the first display name from an address header value.
///
/// The phrase before `<` wins (quotes stripped); an addr-spec with a
/// trailing `(comment)` is the fallback. A bare address has no name.
pub fn extract_first_display_name(value: &str) -> Option<String> {
    let entry = first_entry(value);

    if let Some(lt) = entry.find('<') {
        let phrase = entry[..lt].trim().trim_matches('"').trim();
        if !phrase.is_empty() {
            return Some(phrase.to_string());
        }
    } else if let Some(open) = entry.find('(') {
        if let Some(len) = entry[open + 1..].find(')') {
            let comment = entry[open + 1..open + 1 + len].trim();
            if !comment.is_empty() {
                return Some(comment.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Return-Path: <bounce@example.com>\n\
        Received: from mx1.example.com\n\
        Received: from mx2.example.com\n\
        From: \"John Doe\" <john@example.com>\n\
        To: alice@example.com\n\
        Subject: =?utf-8?B?44GU5Yip55So5piO57Sw?=\n\
        X-Folded: part one\n\
        \tpart two\n\
        \n\
        Body starts here\n\
        Not-A-Header: body text\n";

    #[test]
    fn test_parse_stops_at_blank_line() {
        let msg = ParsedMessage::parse(SAMPLE);
        assert!(!msg.has_raw_header("Not-A-Header"));
        assert!(msg.has_raw_header("Return-Path"));
    }

    #[test]
    fn test_repeated_headers_stay_distinct() {
        let msg = ParsedMessage::parse(SAMPLE);
        let received = msg.get_raw_header("Received");
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], "from mx1.example.com");
        assert_eq!(received[1], "from mx2.example.com");
    }

    #[test]
    fn test_header_names_case_insensitive() {
        let msg = ParsedMessage::parse(SAMPLE);
        assert!(msg.has_raw_header("return-path"));
        assert_eq!(msg.get_raw_header("FROM").len(), 1);
    }

    #[test]
    fn test_continuation_lines_unfold() {
        let msg = ParsedMessage::parse(SAMPLE);
        assert_eq!(msg.get_raw_header("X-Folded"), vec!["part one part two"]);
    }

    #[test]
    fn test_decode_base64_word() {
        let decoded = decode_mime_header("=?utf-8?B?44GU5Yip55So5piO57Sw?=");
        assert_eq!(decoded, "ご利用明細");
    }

    #[test]
    fn test_decode_q_word() {
        let decoded = decode_mime_header("=?iso-8859-1?Q?Caf=E9_au_lait?=");
        assert_eq!(decoded, "Café au lait");
    }

    #[test]
    fn test_decode_passes_through_plain_text() {
        assert_eq!(decode_mime_header("nothing encoded"), "nothing encoded");
        // A stray "=?" with no closing is left alone
        assert_eq!(decode_mime_header("odd =? marker"), "odd =? marker");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let decoded = decode_mime_header("Re: =?utf-8?Q?caf=C3=A9?= order");
        assert_eq!(decoded, "Re: café order");
    }

    #[test]
    fn test_extract_first_address_angle_form() {
        assert_eq!(
            extract_first_address("\"John Doe\" <john@example.com>"),
            Some("john@example.com".to_string())
        );
    }

    #[test]
    fn test_extract_first_address_bare_form() {
        assert_eq!(
            extract_first_address("john@example.com"),
            Some("john@example.com".to_string())
        );
        assert_eq!(extract_first_address("undisclosed-recipients:;"), None);
    }

    #[test]
    fn test_extract_first_address_multiple_entries() {
        assert_eq!(
            extract_first_address("a@example.com, b@example.com"),
            Some("a@example.com".to_string())
        );
        // Quoted comma does not split the first entry
        assert_eq!(
            extract_first_address("\"Doe, John\" <j@example.com>, b@example.com"),
            Some("j@example.com".to_string())
        );
    }

    #[test]
    fn test_extract_first_display_name() {
        assert_eq!(
            extract_first_display_name("\"John Doe\" <john@example.com>"),
            Some("John Doe".to_string())
        );
        assert_eq!(
            extract_first_display_name("John Doe <john@example.com>"),
            Some("John Doe".to_string())
        );
        assert_eq!(
            extract_first_display_name("john@example.com (John Doe)"),
            Some("John Doe".to_string())
        );
        assert_eq!(extract_first_display_name("john@example.com"), None);
    }

    #[test]
    fn test_first_entry_without_name_hides_later_names() {
        // The first entry is a bare address; the second entry's display
        // name must not leak through.
        assert_eq!(
            extract_first_display_name("a@example.com, \"X\" <x@example.com>"),
            None
        );
    }

    #[test]
    fn test_addr_header_per_occurrence() {
        let raw = "From: \"A\" <a@b.com>\nFrom: c@d.com\n\n";
        let msg = ParsedMessage::parse(raw);
        assert_eq!(msg.get_addr_header("From"), vec!["a@b.com", "c@d.com"]);
        assert_eq!(msg.get_name_header("From"), vec!["A"]);
    }

    #[test]
    fn test_iter_decoded_headers_includes_names() {
        let msg = ParsedMessage::parse("Subject: =?utf-8?Q?caf=C3=A9?=\n\n");
        let units: Vec<String> = msg.iter_decoded_headers().collect();
        assert_eq!(units, vec!["Subject: café"]);
    }

    #[test]
    fn test_absent_header_yields_empty() {
        let msg = ParsedMessage::parse("Subject: hi\n\n");
        assert!(msg.get_decoded_header("X-Missing").is_empty());
        assert!(msg.get_addr_header("X-Missing").is_empty());
        assert!(!msg.has_raw_header("X-Missing"));
    }
}
