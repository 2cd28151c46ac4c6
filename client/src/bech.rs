//! Bech32 address helpers.
//!
//! Every chain configures its own human-readable prefixes, so both
//! directions take the expected prefix explicitly.

use bech32::{Bech32, Hrp};

use crate::error::{Error, Result};

/// Decode a Bech32 address, checking that it carries the expected prefix.
pub fn decode(expected_prefix: &str, address: &str) -> Result<Vec<u8>> {
    let (hrp, data) =
        bech32::decode(address).map_err(|err| Error::Bech32(format!("{address:?}: {err}")))?;

    if hrp.as_str() != expected_prefix {
        return Err(Error::Bech32(format!(
            "{address:?}: expected prefix {expected_prefix:?}, got {:?}",
            hrp.as_str()
        )));
    }

    Ok(data)
}

/// Encode raw address bytes under the given prefix.
pub fn encode(prefix: &str, data: &[u8]) -> Result<String> {
    let hrp = Hrp::parse(prefix).map_err(|err| Error::Bech32(format!("{prefix:?}: {err}")))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|err| Error::Bech32(err.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trips_raw_bytes() {
        let raw = [0x11u8; 20];
        let encoded = encode("persistencevaloper", &raw).unwrap();
        assert!(encoded.starts_with("persistencevaloper1"));
        assert_eq!(decode("persistencevaloper", &encoded).unwrap(), raw);
    }

    #[test]
    fn rejects_wrong_prefix() {
        let encoded = encode("persistence", &[0x22u8; 20]).unwrap();
        assert!(decode("persistencevaloper", &encoded).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode("persistence", "not-bech32").is_err());
    }
}
