//! Single-byte text encodings used for names stored in an archive.
//!
//! The archive format only supports encodings where every character takes exactly one byte, so
//! the length prefix of a name is both its byte count and its character count.

/// Byte written for characters that an encoding cannot represent
pub const REPLACEMENT: u8 = b'?';

/// Single-byte encoding used to turn a path into the bytes stored in the name table
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 7-bit ASCII, the only character set the engine's file system accepts
    #[default]
    Ascii,

    /// ISO-8859-1, used by third-party tools to store extended Latin characters
    Latin1,
}

impl Encoding {
    /// Encodes `value`, replacing unrepresentable characters with [`REPLACEMENT`].
    pub fn encode(&self, value: &str) -> Vec<u8> {
        value.chars().map(|c| self.encode_char(c)).collect()
    }

    /// Decodes `bytes`. Bytes outside of ASCII decode to U+FFFD for [`Encoding::Ascii`].
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        b as char
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    /// Number of bytes `value` occupies once encoded
    pub fn byte_count(&self, value: &str) -> usize {
        value.chars().count()
    }

    fn encode_char(&self, c: char) -> u8 {
        match self {
            Encoding::Ascii if c.is_ascii() => c as u8,
            Encoding::Latin1 => u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT),
            _ => REPLACEMENT,
        }
    }
}

/// Replaces every non-ASCII character of `value` with `?`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii() { c } else { REPLACEMENT as char })
        .collect()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{sanitize, Encoding};

    #[test]
    fn ascii_replaces_extended_characters() {
        assert_eq!(Encoding::Ascii.encode("DATA/ÄPFEL.TXT"), b"DATA/?PFEL.TXT");
    }

    #[test]
    fn latin1_keeps_extended_characters() {
        assert_eq!(Encoding::Latin1.encode("Ä€"), vec![0xC4, b'?']);
        assert_eq!(Encoding::Latin1.decode(&[0x41, 0xC4]), "AÄ");
    }

    #[test]
    fn ascii_decode_marks_extended_bytes() {
        assert_eq!(Encoding::Ascii.decode(&[0x41, 0xC4]), "A\u{FFFD}");
    }

    #[test]
    fn byte_count_matches_encoded_length() {
        let value = "Ünïcode/path";
        assert_eq!(
            Encoding::Latin1.byte_count(value),
            Encoding::Latin1.encode(value).len()
        );
    }

    #[test]
    fn sanitize_is_ascii_only() {
        assert_eq!(sanitize("MÜSIC/ÉTÉ.WAV"), "M?SIC/?T?.WAV");
    }
}
