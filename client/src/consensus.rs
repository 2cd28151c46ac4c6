//! Consensus public keys and their derived addresses.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const ED25519_URL: &str = "/cosmos.crypto.ed25519.PubKey";
const SECP256K1_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
const BN254_URL: &str = "/cometbft.crypto.v1.bn254.PubKey";

/// A validator's consensus public key, decoded from its `Any` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusPubkey {
    Ed25519(Vec<u8>),
    Secp256k1(Vec<u8>),
    /// Tendermint-level address lookup is required for these, so only the
    /// raw key bytes are kept.
    Bn254(Vec<u8>),
}

impl ConsensusPubkey {
    /// Decodes a key from its type URL and the protobuf payload of the
    /// wrapping `Any`. The payload is the serialized `PubKey` message, a
    /// single bytes field numbered 1.
    pub fn from_any(type_url: &str, value: &[u8]) -> Result<Self> {
        let key = unwrap_pubkey_field(value)?;
        match type_url {
            ED25519_URL => Ok(ConsensusPubkey::Ed25519(key)),
            SECP256K1_URL => Ok(ConsensusPubkey::Secp256k1(key)),
            BN254_URL => Ok(ConsensusPubkey::Bn254(key)),
            other => Err(Error::MalformedResponse(format!(
                "unsupported consensus pubkey type {other:?}"
            ))),
        }
    }

    /// Raw key bytes, regardless of scheme.
    pub fn key_bytes(&self) -> &[u8] {
        match self {
            ConsensusPubkey::Ed25519(b)
            | ConsensusPubkey::Secp256k1(b)
            | ConsensusPubkey::Bn254(b) => b,
        }
    }

    /// The Tendermint consensus address for hash-derived schemes: the
    /// first 20 bytes of SHA-256 over the key bytes. BN254 addresses are
    /// not hash-derived and must come from the node's validator set.
    pub fn consensus_address(&self) -> Option<[u8; 20]> {
        match self {
            ConsensusPubkey::Ed25519(key) | ConsensusPubkey::Secp256k1(key) => {
                let digest = Sha256::digest(key);
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&digest[..20]);
                Some(addr)
            }
            ConsensusPubkey::Bn254(_) => None,
        }
    }
}

// Extracts field 1 (length-delimited bytes) from a serialized PubKey
// message. All three supported key messages share this layout.
fn unwrap_pubkey_field(value: &[u8]) -> Result<Vec<u8>> {
    let msg: RawPubkey = prost::Message::decode(value)
        .map_err(|e| Error::MalformedResponse(format!("undecodable consensus pubkey: {e}")))?;
    if msg.key.is_empty() {
        return Err(Error::MalformedResponse(
            "empty consensus pubkey".to_string(),
        ));
    }
    Ok(msg.key)
}

#[derive(Clone, PartialEq, prost::Message)]
struct RawPubkey {
    #[prost(bytes = "vec", tag = "1")]
    key: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost::Message;

    use super::*;

    fn any_payload(key: &[u8]) -> Vec<u8> {
        RawPubkey { key: key.to_vec() }.encode_to_vec()
    }

    #[test]
    fn ed25519_address_is_truncated_sha256() {
        // SHA-256 of the empty string, truncated to 20 bytes.
        let pk = ConsensusPubkey::Ed25519(Vec::new());
        // Empty keys are rejected at decode time, but the derivation
        // itself is checked against the well-known digest here.
        let addr = pk.consensus_address().unwrap();
        assert_eq!(
            hex::encode_upper(addr),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4"
        );
    }

    #[test]
    fn decodes_ed25519_any() {
        let key = vec![7u8; 32];
        let pk = ConsensusPubkey::from_any(ED25519_URL, &any_payload(&key)).unwrap();
        assert_eq!(pk, ConsensusPubkey::Ed25519(key));
    }

    #[test]
    fn bn254_has_no_derived_address() {
        let pk = ConsensusPubkey::from_any(BN254_URL, &any_payload(&[1u8; 48])).unwrap();
        assert!(pk.consensus_address().is_none());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = ConsensusPubkey::from_any("/acme.PubKey", &any_payload(&[1])).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn rejects_empty_key() {
        assert!(ConsensusPubkey::from_any(ED25519_URL, &any_payload(&[])).is_err());
    }
}
