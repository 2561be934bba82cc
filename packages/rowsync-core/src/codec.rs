//! Binary column codec.
//!
//! Binary columns hold a list of short strings. In the working set the list
//! is shown as delimiter-joined display text; at the storage boundary it is
//! an opaque byte payload produced by a [`BinaryCodec`].

/// Result of decoding a stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Payload was in the codec's format
    Decoded(Vec<String>),
    /// Payload was unreadable; values are a best-effort rendering of the bytes
    Fallback(Vec<String>),
}

impl DecodeOutcome {
    /// Returns the decoded or fallback values.
    pub fn into_values(self) -> Vec<String> {
        match self {
            DecodeOutcome::Decoded(values) | DecodeOutcome::Fallback(values) => values,
        }
    }

    /// Returns true if the payload could not be decoded cleanly.
    pub fn is_fallback(&self) -> bool {
        matches!(self, DecodeOutcome::Fallback(_))
    }
}

/// Round-trip between a list of strings and a storage payload.
///
/// Both directions are total: `decode` never fails, and an empty payload
/// decodes to an empty list.
pub trait BinaryCodec: Send + Sync {
    /// Encodes `values` into the storage payload.
    fn encode(&self, values: &[String]) -> Vec<u8>;

    /// Decodes a storage payload.
    fn decode(&self, payload: &[u8]) -> DecodeOutcome;
}

/// Stores the list as a UTF-8 JSON array of strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonListCodec;

impl BinaryCodec for JsonListCodec {
    fn encode(&self, values: &[String]) -> Vec<u8> {
        // Serializing a slice of strings cannot fail.
        serde_json::to_vec(values).unwrap_or_else(|_| b"[]".to_vec())
    }

    fn decode(&self, payload: &[u8]) -> DecodeOutcome {
        if payload.is_empty() {
            return DecodeOutcome::Decoded(Vec::new());
        }
        match serde_json::from_slice::<Option<Vec<String>>>(payload) {
            Ok(values) => DecodeOutcome::Decoded(values.unwrap_or_default()),
            Err(_) => DecodeOutcome::Fallback(payload.iter().map(|b| b.to_string()).collect()),
        }
    }
}

/// Joins decoded values into display text.
pub fn to_display(values: &[String], delimiter: char) -> String {
    values.join(&delimiter.to_string())
}

/// Splits display text into values; empty text is an empty list.
pub fn from_display(text: &str, delimiter: char) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(delimiter).map(str::to_string).collect()
}

/// Decodes a payload (or its absence) straight to display text.
///
/// # Returns
/// The display text and whether the fallback rendering was used.
pub fn payload_to_display(
    codec: &dyn BinaryCodec,
    payload: Option<&[u8]>,
    delimiter: char,
) -> (String, bool) {
    let outcome = codec.decode(payload.unwrap_or_default());
    let fallback = outcome.is_fallback();
    (to_display(&outcome.into_values(), delimiter), fallback)
}

/// Encodes display text (or its absence) straight to a payload.
pub fn display_to_payload(codec: &dyn BinaryCodec, text: Option<&str>, delimiter: char) -> Vec<u8> {
    codec.encode(&from_display(text.unwrap_or_default(), delimiter))
}
