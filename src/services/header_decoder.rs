//! Decoding of RFC 2047 encoded-words found in object metadata.
//!
//! S3-compatible stores only accept ASCII in user metadata, so the uploader
//! stores non-ASCII values as `=?charset?encoding?text?=` words.

use base64::{Engine as _, engine::general_purpose};
use encoding_rs::Encoding;
use thiserror::Error;

const WORD_START: &str = "=?";
const WORD_END: &str = "?=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported charset `{0}`")]
    UnknownCharset(String),
    #[error("invalid quoted-printable text `{0}`")]
    InvalidQuoted(String),
    #[error("invalid base64 text `{0}`")]
    InvalidBase64(String),
}

/// Stateless decoder for header-style encoded values.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderDecoder;

impl HeaderDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Whether `value` carries at least a candidate encoded-word.
    pub fn is_encoded(&self, value: &str) -> bool {
        value.contains(WORD_START)
    }

    /// Decode every encoded-word in `value`.
    ///
    /// Plain text around words is kept; whitespace between two adjacent words
    /// is dropped. Sequences that are not well-formed words are left as is.
    pub fn decode(&self, value: &str) -> Result<String, DecodeError> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        let mut pending_space: Option<&str> = None;
        let mut after_word = false;

        while let Some(start) = rest.find(WORD_START) {
            let (before, candidate) = rest.split_at(start);
            let Some((word, len)) = split_word(candidate) else {
                flush(&mut out, &mut pending_space);
                out.push_str(before);
                out.push_str(WORD_START);
                rest = &candidate[WORD_START.len()..];
                after_word = false;
                continue;
            };

            if after_word && before.chars().all(char::is_whitespace) {
                pending_space = None;
            } else {
                flush(&mut out, &mut pending_space);
                out.push_str(before);
            }

            out.push_str(&decode_word(word)?);
            rest = &candidate[len..];
            after_word = true;

            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                pending_space = Some(&rest[..rest.len() - trimmed.len()]);
                rest = trimmed;
            }
        }

        flush(&mut out, &mut pending_space);
        out.push_str(rest);
        Ok(out)
    }
}

fn flush(out: &mut String, pending_space: &mut Option<&str>) {
    if let Some(space) = pending_space.take() {
        out.push_str(space);
    }
}

/// The three fields of a well-formed word at the start of `candidate`, and
/// the word's byte length.
fn split_word(candidate: &str) -> Option<([&str; 3], usize)> {
    let body = &candidate[WORD_START.len()..];
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find(WORD_END)?;
    let text = &body[..end];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || !matches!(encoding, "Q" | "q" | "B" | "b")
        || text.contains(char::is_whitespace)
    {
        return None;
    }

    let len = WORD_START.len() + charset.len() + 1 + encoding.len() + 1 + end + WORD_END.len();
    Some(([charset, encoding, text], len))
}

fn decode_word([charset, encoding, text]: [&str; 3]) -> Result<String, DecodeError> {
    // RFC 2231 allows a language suffix, e.g. `UTF-8*en`.
    let label = charset.split('*').next().unwrap_or(charset);
    let encoding_impl = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DecodeError::UnknownCharset(label.to_string()))?;

    let bytes = if encoding.eq_ignore_ascii_case("q") {
        decode_q(text)?
    } else {
        general_purpose::STANDARD
            .decode(text)
            .map_err(|_| DecodeError::InvalidBase64(text.to_string()))?
    };

    let (decoded, _, _) = encoding_impl.decode(&bytes);
    Ok(decoded.into_owned())
}

fn decode_q(text: &str) -> Result<Vec<u8>, DecodeError> {
    let invalid = || DecodeError::InvalidQuoted(text.to_string());
    let raw = text.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = raw.get(i + 1..i + 3).ok_or_else(invalid)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(invalid());
                }
                let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
                out.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: &str) -> Result<String, DecodeError> {
        HeaderDecoder::new().decode(value)
    }

    #[test]
    fn decodes_quoted_utf8() {
        assert_eq!(decode("=?UTF-8?Q?Caf=C3=A9?=").unwrap(), "Café");
        assert_eq!(
            decode("=?utf-8?q?Hello_=E2=82=AC_World?=").unwrap(),
            "Hello € World"
        );
    }

    #[test]
    fn decodes_base64() {
        assert_eq!(decode("=?UTF-8?B?Q2Fmw6k=?=").unwrap(), "Café");
    }

    #[test]
    fn decodes_latin1() {
        assert_eq!(decode("=?ISO-8859-1?Q?Br=E4u?=").unwrap(), "Bräu");
    }

    #[test]
    fn keeps_text_around_words() {
        assert_eq!(
            decode("Brasserie =?UTF-8?Q?du_Mont-Blanc_=C3=A9?= (FR)").unwrap(),
            "Brasserie du Mont-Blanc é (FR)"
        );
    }

    #[test]
    fn joins_adjacent_words() {
        assert_eq!(
            decode("=?UTF-8?Q?M=C3=BCn?= =?UTF-8?Q?chen?=").unwrap(),
            "München"
        );
    }

    #[test]
    fn plain_values_pass_through() {
        let decoder = HeaderDecoder::new();
        assert!(!decoder.is_encoded("Pliny the Elder"));
        assert_eq!(decode("Pliny the Elder").unwrap(), "Pliny the Elder");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn malformed_words_are_kept_verbatim() {
        assert_eq!(decode("a =? b").unwrap(), "a =? b");
        assert_eq!(
            decode("=?UTF-8?Q?unterminated").unwrap(),
            "=?UTF-8?Q?unterminated"
        );
        assert_eq!(decode("=?UTF-8?X?abc?=").unwrap(), "=?UTF-8?X?abc?=");
    }

    #[test]
    fn reports_bad_payloads() {
        assert_eq!(
            decode("=?x-nonexistent?Q?abc?="),
            Err(DecodeError::UnknownCharset("x-nonexistent".into()))
        );
        assert!(matches!(
            decode("=?UTF-8?Q?bad=Z1?="),
            Err(DecodeError::InvalidQuoted(_))
        ));
        assert!(matches!(
            decode("=?UTF-8?Q?a=+1?="),
            Err(DecodeError::InvalidQuoted(_))
        ));
        assert!(matches!(
            decode("=?UTF-8?Q?a=-F?="),
            Err(DecodeError::InvalidQuoted(_))
        ));
        assert!(matches!(
            decode("=?UTF-8?B?!!!?="),
            Err(DecodeError::InvalidBase64(_))
        ));
    }
}
