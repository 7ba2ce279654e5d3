//! Hex string conversions for frames delivered or logged as text

use crate::error::FrameError;

/// Decode a hex string into bytes
///
/// Whitespace anywhere in the input is ignored and both cases are accepted.
/// Empty input, an odd number of digits or any other character is rejected
/// with [`FrameError::InvalidHexFormat`].
///
/// # Examples
///
/// ```
/// use gatelink_core::hex::decode_hex;
///
/// assert_eq!(decode_hex("48 45\n0a").unwrap(), vec![0x48, 0x45, 0x0A]);
/// assert!(decode_hex("48 4G").is_err());
/// ```
pub fn decode_hex(input: &str) -> Result<Vec<u8>, FrameError> {
    let clean: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    if clean.is_empty() {
        return Err(FrameError::InvalidHexFormat("hex data is empty".into()));
    }

    if let Some((pos, c)) = clean.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(FrameError::InvalidHexFormat(format!(
            "non-hex character {c:?} at position {pos}"
        )));
    }

    hex::decode(&clean).map_err(|e| FrameError::InvalidHexFormat(e.to_string()))
}

/// Encode bytes as upper-case hex without separators
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
