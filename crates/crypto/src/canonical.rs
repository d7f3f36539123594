// Path: crates/crypto/src/canonical.rs
//! Canonical JSON images of commitments.
//!
//! The canonical form is minified JSON with object keys in code-point
//! order at every nesting level, integers in plain decimal, and standard
//! string escaping. The commitment's top-level keys (`id`, `payload`,
//! `signature`, `timestamp`, `type`) already sort into the required fixed
//! order, so one sorted-key encoder covers the whole image.
//!
//! Two images exist per commitment: the *unsigned* image (empty
//! `signature`) is the signing input; the *signed* image (signature hex
//! filled in) is what gets leaf-hashed into the tree.

use pact_types::error::CryptoError;
use pact_types::{CanonicalValue, Commitment, CommitmentPayload, CommitmentType};

/// Encode a canonical value to its canonical byte form.
pub fn encode(value: &CanonicalValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &CanonicalValue, out: &mut Vec<u8>) {
    match value {
        CanonicalValue::Null => out.extend_from_slice(b"null"),
        CanonicalValue::Bool(true) => out.extend_from_slice(b"true"),
        CanonicalValue::Bool(false) => out.extend_from_slice(b"false"),
        CanonicalValue::Int(n) => out.extend_from_slice(n.to_string().as_bytes()),
        CanonicalValue::Str(s) => encode_string(s, out),
        CanonicalValue::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                encode_into(item, out);
            }
            out.push(b']');
        }
        CanonicalValue::Object(map) => {
            // BTreeMap iteration order is code-point order over the keys.
            out.push(b'{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                encode_string(key, out);
                out.push(b':');
                encode_into(item, out);
            }
            out.push(b'}');
        }
    }
}

fn encode_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

fn payload_value(payload: &CommitmentPayload) -> CanonicalValue {
    let mut map = std::collections::BTreeMap::new();
    map.insert(
        "content".to_string(),
        CanonicalValue::Str(payload.content.clone()),
    );
    if let Some(counterparty) = &payload.counterparty {
        map.insert(
            "counterparty".to_string(),
            CanonicalValue::Str(counterparty.clone()),
        );
    }
    if let Some(metadata) = &payload.metadata {
        map.insert(
            "metadata".to_string(),
            CanonicalValue::Object(metadata.clone()),
        );
    }
    map.insert(
        "subject".to_string(),
        CanonicalValue::Str(payload.subject.clone()),
    );
    CanonicalValue::Object(map)
}

/// The canonical image of a commitment with `signature` forced to the
/// given value.
pub fn image_with_signature(
    id: &str,
    commitment_type: CommitmentType,
    payload: &CommitmentPayload,
    timestamp: u64,
    signature: &str,
) -> Vec<u8> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("id".to_string(), CanonicalValue::Str(id.to_string()));
    map.insert("payload".to_string(), payload_value(payload));
    map.insert(
        "signature".to_string(),
        CanonicalValue::Str(signature.to_string()),
    );
    map.insert(
        "timestamp".to_string(),
        CanonicalValue::Int(timestamp as i64),
    );
    map.insert(
        "type".to_string(),
        CanonicalValue::Str(commitment_type.as_str().to_string()),
    );
    encode(&CanonicalValue::Object(map))
}

/// The signing input: canonical image with an empty signature.
pub fn unsigned_image(c: &Commitment) -> Vec<u8> {
    image_with_signature(&c.id, c.commitment_type, &c.payload, c.timestamp, "")
}

/// The leaf-hash input: canonical image with the signature hex filled in.
pub fn signed_image(c: &Commitment) -> Vec<u8> {
    image_with_signature(
        &c.id,
        c.commitment_type,
        &c.payload,
        c.timestamp,
        &c.signature,
    )
}

/// Rebuild the unsigned image from a verbatim signed image.
///
/// Used by verifiers that receive the signed bytes inside a proof file and
/// need the exact signing input back. The parse keeps every value in the
/// canonical value tree, so re-encoding reproduces the original bytes for
/// everything except the blanked signature.
pub fn reimage_unsigned(signed: &str) -> Result<Vec<u8>, CryptoError> {
    let mut value: CanonicalValue = serde_json::from_str(signed)
        .map_err(|e| CryptoError::Encoding(format!("commitment image: {e}")))?;
    match &mut value {
        CanonicalValue::Object(map) => {
            if !map.contains_key("signature") {
                return Err(CryptoError::Encoding(
                    "commitment image has no signature field".into(),
                ));
            }
            map.insert("signature".to_string(), CanonicalValue::Str(String::new()));
        }
        _ => {
            return Err(CryptoError::Encoding(
                "commitment image is not an object".into(),
            ))
        }
    }
    Ok(encode(&value))
}
