//! Verification and issuing of platform-signed payload tokens.
//!
//! A signed request is a compact `signature.payload` string: both halves are URL-safe base64,
//! and the signature is an HMAC-SHA256 digest of the **encoded** payload half keyed by the app
//! secret. [`verify`] is pure and deterministic; the comparison runs in constant time via the
//! underlying MAC so signature checks leak no timing information.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::_prelude::*;

type HmacSha256 = Hmac<Sha256>;

/// Signed-request validation failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SignedRequestError {
	/// Input is structurally invalid (part count, encoding, payload shape).
	#[error("Signed request is malformed: {reason}.")]
	Malformed {
		/// Which structural rule the input violated.
		reason: &'static str,
	},
	/// Signature does not match the payload under the supplied secret.
	#[error("Signed request signature does not match.")]
	SignatureMismatch,
}

/// Validates `signed_request` against `secret` and returns the decoded payload object.
pub fn verify(
	signed_request: &str,
	secret: &str,
) -> Result<Map<String, Value>, SignedRequestError> {
	let mut parts = signed_request.split('.');
	let (signature, payload) = match (parts.next(), parts.next(), parts.next()) {
		(Some(signature), Some(payload), None) => (signature, payload),
		_ =>
			return Err(SignedRequestError::Malformed {
				reason: "expected exactly two dot-separated parts",
			}),
	};
	let payload_bytes = decode_part(payload)
		.map_err(|_| SignedRequestError::Malformed { reason: "payload is not URL-safe base64" })?;
	let decoded: Value = serde_json::from_slice(&payload_bytes)
		.map_err(|_| SignedRequestError::Malformed { reason: "payload is not valid JSON" })?;
	let Value::Object(data) = decoded else {
		return Err(SignedRequestError::Malformed { reason: "payload is not a JSON object" });
	};
	let signature_bytes = decode_part(signature).map_err(|_| SignedRequestError::Malformed {
		reason: "signature is not URL-safe base64",
	})?;

	// The digest covers the encoded payload half, not the decoded JSON.
	mac_over(payload, secret)?
		.verify_slice(&signature_bytes)
		.map_err(|_| SignedRequestError::SignatureMismatch)?;

	Ok(data)
}

/// Builds the compact `signature.payload` form for a payload object.
///
/// Platforms issue signed requests; the SDK only verifies them. This helper exists for
/// server-side embedders and test fixtures that need to mint well-formed inputs.
pub fn issue(payload: &Map<String, Value>, secret: &str) -> Result<String, SignedRequestError> {
	let encoded = URL_SAFE_NO_PAD.encode(
		serde_json::to_vec(payload)
			.map_err(|_| SignedRequestError::Malformed { reason: "payload failed to serialize" })?,
	);
	let digest = mac_over(&encoded, secret)?.finalize().into_bytes();
	let signature = URL_SAFE_NO_PAD.encode(digest);

	Ok(format!("{signature}.{encoded}"))
}

fn mac_over(payload: &str, secret: &str) -> Result<HmacSha256, SignedRequestError> {
	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
		.map_err(|_| SignedRequestError::Malformed { reason: "secret was rejected as a MAC key" })?;

	mac.update(payload.as_bytes());

	Ok(mac)
}

fn decode_part(part: &str) -> Result<Vec<u8>, base64::DecodeError> {
	// Platform payloads arrive unpadded, but tolerate padded input.
	URL_SAFE_NO_PAD.decode(part.trim_end_matches('='))
}
