//! Events emitted by the embedded renderer.

use serde::{Deserialize, Serialize};

/// Signal emitted by an embedded renderer session.
///
/// Serialized with a `type` tag, e.g. `{"type":"http_error","statusCode":403,"url":"..."}`.
/// The renderer provides no request identifier, so a later [`HttpError`](Self::HttpError)
/// cannot be attributed to an earlier [`CertificateRequested`](Self::CertificateRequested).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendererEvent {
	/// The server asked for a client certificate mid-handshake.
	CertificateRequested,
	/// A request completed with an HTTP error status.
	HttpError(HttpErrorEvent),
	/// A page load completed.
	LoadFinished(LoadFinishedEvent),
}

impl From<HttpErrorEvent> for RendererEvent {
	fn from(event: HttpErrorEvent) -> Self {
		Self::HttpError(event)
	}
}

impl From<LoadFinishedEvent> for RendererEvent {
	fn from(event: LoadFinishedEvent) -> Self {
		Self::LoadFinished(event)
	}
}

/// HTTP-layer failure reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorEvent {
	/// Response status code.
	pub status_code: u16,
	/// Final URL of the failed request.
	pub url: String,
}

impl HttpErrorEvent {
	pub fn new(status_code: u16, url: impl Into<String>) -> Self {
		Self {
			status_code,
			url: url.into(),
		}
	}
}

/// Completed page load reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFinishedEvent {
	pub url: String,
}

impl LoadFinishedEvent {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn http_error_uses_camel_case_status() {
		let event = RendererEvent::from(HttpErrorEvent::new(403, "https://tempusnu.se/secure"));
		let json = serde_json::to_string(&event).unwrap();
		assert!(json.contains(r#""type":"http_error""#));
		assert!(json.contains(r#""statusCode":403"#));
	}

	#[test]
	fn certificate_request_has_no_payload() {
		let event: RendererEvent = serde_json::from_str(r#"{"type":"certificate_requested"}"#).unwrap();
		assert_eq!(event, RendererEvent::CertificateRequested);
	}

	#[test]
	fn load_finished_parses_url() {
		let event: RendererEvent =
			serde_json::from_str(r#"{"type":"load_finished","url":"https://tempusnu.se/"}"#).unwrap();
		assert_eq!(event, RendererEvent::LoadFinished(LoadFinishedEvent::new("https://tempusnu.se/")));
	}

	#[test]
	fn unknown_event_type_is_rejected() {
		let result = serde_json::from_str::<RendererEvent>(r#"{"type":"navigated","url":"x"}"#);
		assert!(result.is_err());
	}
}
