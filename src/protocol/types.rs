//! Wire types for the object transfer protocol
//!
//! Every control message is a JSON document. Requests carry
//! `{id, method, params}`; responses echo the `id` and carry either a
//! `result` object or an `error` string, never both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::ProtocolError;

/// Size reported by DownloadCheck for an absent object
pub const ABSENT_SIZE: i64 = -1;

/// Request method, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Exit,
	Batch,
	UploadCheck,
	Upload,
	DownloadCheck,
	Download,
}

impl Method {
	pub const ALL: [Method; 6] = [
		Method::Exit,
		Method::Batch,
		Method::UploadCheck,
		Method::Upload,
		Method::DownloadCheck,
		Method::Download,
	];

	pub fn from_name(name: &str) -> Option<Method> {
		Method::ALL.iter().copied().find(|m| m.name() == name)
	}

	pub fn name(self) -> &'static str {
		match self {
			Method::Exit => "Exit",
			Method::Batch => "Batch",
			Method::UploadCheck => "UploadCheck",
			Method::Upload => "Upload",
			Method::DownloadCheck => "DownloadCheck",
			Method::Download => "Download",
		}
	}

	/// True when a successful reply is a raw byte stream rather than JSON,
	/// which leaves no channel for reporting errors in-band
	pub fn streams_response(self) -> bool {
		match self {
			Method::Download => true,
			Method::Exit
			| Method::Batch
			| Method::UploadCheck
			| Method::Upload
			| Method::DownloadCheck => false,
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A decoded request frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub id: i64,
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl Request {
	/// Decode `params` into the method's parameter type
	pub fn params<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
		let params = self
			.params
			.as_ref()
			.ok_or_else(|| ProtocolError::InvalidParams(format!("{} requires params", self.method)))?;
		T::deserialize(params).map_err(|e| ProtocolError::InvalidParams(e.to_string()))
	}
}

/// A response frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	pub id: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl Response {
	pub fn success<T: Serialize>(id: i64, result: &T) -> Result<Response, ProtocolError> {
		Ok(Response { id, result: Some(serde_json::to_value(result)?), error: None })
	}

	pub fn error(id: i64, message: impl Into<String>) -> Response {
		Response { id, result: None, error: Some(message.into()) }
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}
}

/// Params of Upload and UploadCheck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
	pub oid: String,
	pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
	pub ok_to_send: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteResponse {
	pub received_ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadCheckRequest {
	pub oid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadCheckResponse {
	/// Stored size, or `ABSENT_SIZE`
	pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
	pub oid: String,
	pub size: i64,
}

/// An object named in a batch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDescriptor {
	pub oid: String,
	#[serde(default)]
	pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
	pub objects: Vec<ObjectDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
	Download,
	Upload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
	pub oid: String,
	pub action: BatchAction,
	pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
	pub results: Vec<BatchResult>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_method_names_round_trip() {
		for method in Method::ALL.iter() {
			assert_eq!(Method::from_name(method.name()), Some(*method));
		}
		assert_eq!(Method::from_name("Frobnicate"), None);
		assert_eq!(Method::from_name("download"), None);
	}

	#[test]
	fn test_only_download_streams() {
		let streaming: Vec<_> = Method::ALL.iter().filter(|m| m.streams_response()).collect();
		assert_eq!(streaming, vec![&Method::Download]);
	}

	#[test]
	fn test_request_without_params() {
		let req: Request = serde_json::from_str(r#"{"id":7,"method":"Exit"}"#).unwrap();
		assert_eq!(req.id, 7);
		assert!(req.params.is_none());
		let err = req.params::<UploadRequest>().unwrap_err();
		assert!(matches!(err, ProtocolError::InvalidParams(_)));
	}

	#[test]
	fn test_request_params_decode() {
		let req: Request = serde_json::from_value(json!({
			"id": 1,
			"method": "Upload",
			"params": {"oid": "abcd", "size": 12}
		}))
		.unwrap();
		let params: UploadRequest = req.params().unwrap();
		assert_eq!(params.oid, "abcd");
		assert_eq!(params.size, 12);
	}

	#[test]
	fn test_request_params_wrong_shape() {
		let req: Request = serde_json::from_value(json!({
			"id": 1,
			"method": "Download",
			"params": {"oid": 5}
		}))
		.unwrap();
		assert!(req.params::<DownloadRequest>().is_err());
	}

	#[test]
	fn test_response_shapes() {
		let ok = Response::success(3, &UploadResponse { ok_to_send: true }).unwrap();
		assert_eq!(
			serde_json::to_value(&ok).unwrap(),
			json!({"id": 3, "result": {"okToSend": true}})
		);

		let err = Response::error(4, "nope");
		assert!(err.is_error());
		assert_eq!(serde_json::to_value(&err).unwrap(), json!({"id": 4, "error": "nope"}));
	}

	#[test]
	fn test_batch_result_shape() {
		let result = BatchResult { oid: "abcd".into(), action: BatchAction::Upload, size: 500 };
		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			json!({"oid": "abcd", "action": "upload", "size": 500})
		);
	}
}

// vim: ts=4
