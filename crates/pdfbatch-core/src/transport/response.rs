//! Decoding of the processing API's JSON bodies.

use serde::Deserialize;

use crate::job::JobResult;
use crate::naming;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody {
    file_url: String,
    #[serde(default)]
    filename: Option<String>,
    original_size: u64,
    compressed_size: u64,
    compression_ratio: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Decode a success body into a `JobResult`. The output name always comes
/// from `source_name`, the uploaded file's name; the server's `filename` is
/// its own storage id and is kept only as `stored_name`.
pub fn decode_result(body: &[u8], source_name: &str) -> Result<JobResult, serde_json::Error> {
    let parsed: SuccessBody = serde_json::from_slice(body)?;
    Ok(JobResult {
        original_size: parsed.original_size,
        output_size: parsed.compressed_size,
        reduction_ratio: parsed.compression_ratio,
        locator: parsed.file_url,
        output_name: naming::output_name_for(source_name),
        stored_name: parsed.filename.filter(|n| !n.trim().is_empty()),
    })
}

/// The `error` field of an error body, if the body is JSON and has one.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_success_body() {
        let body = br#"{
            "success": true,
            "message": "PDF compression successful with 42.10% reduction",
            "fileUrl": "/api/file?folder=compressions&filename=ab12-compressed.pdf",
            "filename": "ab12-compressed.pdf",
            "originalName": "report.pdf",
            "originalSize": 1000,
            "compressedSize": 579,
            "compressionRatio": "42.10%"
        }"#;
        let r = decode_result(body, "report.pdf").unwrap();
        assert_eq!(r.original_size, 1000);
        assert_eq!(r.output_size, 579);
        assert_eq!(r.reduction_ratio, "42.10%");
        assert_eq!(r.output_name, "report-compressed.pdf");
        assert_eq!(r.stored_name.as_deref(), Some("ab12-compressed.pdf"));
        assert!(r.locator.starts_with("/api/file"));
    }

    #[test]
    fn server_storage_name_never_becomes_output_name() {
        let body = br#"{
            "fileUrl": "/api/file?folder=compressions&filename=9f1c2e44-7b1d-4c1a-a0e2-5d3f9b7c8a10-compressed.pdf",
            "filename": "9f1c2e44-7b1d-4c1a-a0e2-5d3f9b7c8a10-compressed.pdf",
            "originalName": "other.pdf",
            "originalSize": 2048,
            "compressedSize": 1024,
            "compressionRatio": "50.00%"
        }"#;
        let r = decode_result(body, "report.pdf").unwrap();
        assert_eq!(r.output_name, "report-compressed.pdf");
    }

    #[test]
    fn output_name_from_source_without_filename_field() {
        let body = br#"{"fileUrl":"/x","originalSize":10,"compressedSize":10,"compressionRatio":"0%"}"#;
        let r = decode_result(body, "scan 01.pdf").unwrap();
        assert_eq!(r.output_name, "scan_01-compressed.pdf");
        assert_eq!(r.stored_name, None);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let body = br#"{"originalSize":10,"compressedSize":5,"compressionRatio":"50%"}"#;
        assert!(decode_result(body, "a.pdf").is_err());
        assert!(decode_result(b"<html>", "a.pdf").is_err());
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(br#"{"error":"Insufficient balance"}"#).as_deref(),
            Some("Insufficient balance")
        );
        assert_eq!(error_message(br#"{"error":"  "}"#), None);
        assert_eq!(error_message(b"Internal Server Error"), None);
    }
}
