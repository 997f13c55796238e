//! Raw template decoding

use crate::config::{Encoding, RawTemplate};
use base64::Engine as _;
use pktforge_common::{ForgeError, ForgeResult, MAX_TEMPLATE_SIZE};

/// Decode one raw template to exactly `length` bytes
pub fn decode(template: &RawTemplate) -> ForgeResult<Vec<u8>> {
    if template.length > MAX_TEMPLATE_SIZE {
        return Err(ForgeError::InvalidTemplate(format!(
            "length {} exceeds {}",
            template.length, MAX_TEMPLATE_SIZE
        )));
    }

    let mut bytes = match template.encoding {
        Encoding::Zeros => return Ok(vec![0; template.length]),
        Encoding::Hex => {
            let cleaned: String = template.data.split_whitespace().collect();
            hex::decode(cleaned).map_err(|e| ForgeError::Encoding(format!("hex: {e}")))?
        }
        Encoding::Base64 => base64::engine::general_purpose::STANDARD
            .decode(template.data.trim())
            .map_err(|e| ForgeError::Encoding(format!("base64: {e}")))?,
    };

    if bytes.len() < template.length {
        return Err(ForgeError::InvalidTemplate(format!(
            "decoded {} bytes, declared length is {}",
            bytes.len(),
            template.length
        )));
    }
    bytes.truncate(template.length);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(encoding: Encoding, data: &str, length: usize) -> RawTemplate {
        RawTemplate {
            encoding,
            data: data.into(),
            length,
        }
    }

    #[test]
    fn test_hex() {
        assert_eq!(decode(&raw(Encoding::Hex, "dead beef", 4)).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode(&raw(Encoding::Hex, "deadbeef", 2)).unwrap(), vec![0xde, 0xad]);
        assert!(matches!(
            decode(&raw(Encoding::Hex, "xyz", 1)),
            Err(ForgeError::Encoding(_))
        ));
    }

    #[test]
    fn test_base64() {
        assert_eq!(decode(&raw(Encoding::Base64, "AAEC", 3)).unwrap(), vec![0, 1, 2]);
        assert!(decode(&raw(Encoding::Base64, "!!", 1)).is_err());
    }

    #[test]
    fn test_zeros_and_empty() {
        assert_eq!(decode(&raw(Encoding::Zeros, "ignored", 5)).unwrap(), vec![0; 5]);
        assert_eq!(decode(&raw(Encoding::Hex, "", 0)).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_short_data_rejected() {
        assert!(matches!(
            decode(&raw(Encoding::Hex, "0001", 3)),
            Err(ForgeError::InvalidTemplate(_))
        ));
        assert!(decode(&raw(Encoding::Zeros, "", MAX_TEMPLATE_SIZE + 1)).is_err());
    }
}
