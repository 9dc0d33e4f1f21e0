use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const UNNAMED_FILE: &str = "unnamed";
pub const UNKNOWN_CLIENT: &str = "unknown";
pub const UNSPECIFIED_SERVICE: &str = "unspecified";

/// Canonical metadata record embedded in the notarization transaction
///
/// Field order is part of the on-chain format: the serialized string is written
/// verbatim into the transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub file_name: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub service_type: String,
    pub client_info: String,
    pub timestamp: String,
}

impl Metadata {
    /// Serialize to the canonical JSON payload
    pub fn to_payload(&self) -> String {
        // Plain structs of strings and integers always serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse the server-generated timestamp
    pub fn anchored_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Builder for constructing `Metadata` with a fluent API
///
/// The anchoring time is always stamped by `build()` from the server clock;
/// there is no setter for it.
///
/// # Example
/// ```
/// use trustseal::evidence::MetadataBuilder;
///
/// let metadata = MetadataBuilder::new()
///     .file_name("contract.pdf")
///     .file_size(1024)
///     .service_type("legal")
///     .build();
///
/// assert_eq!(metadata.client_info, "unknown");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MetadataBuilder {
    file_name: Option<String>,
    file_size: Option<u64>,
    submitter_email: Option<String>,
    service_type: Option<String>,
    client_info: Option<String>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = non_blank(name.into());
        self
    }

    pub fn file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn submitter_email(mut self, email: impl Into<String>) -> Self {
        self.submitter_email = non_blank(email.into());
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = non_blank(service_type.into());
        self
    }

    pub fn client_info(mut self, client_info: impl Into<String>) -> Self {
        self.client_info = non_blank(client_info.into());
        self
    }

    /// Build the metadata record
    ///
    /// Never fails: missing fields fall back to their sentinel values.
    pub fn build(self) -> Metadata {
        Metadata {
            file_name: self.file_name.unwrap_or_else(|| UNNAMED_FILE.to_string()),
            file_size: self.file_size.unwrap_or(0),
            email: self.submitter_email,
            service_type: self
                .service_type
                .unwrap_or_else(|| UNSPECIFIED_SERVICE.to_string()),
            client_info: self.client_info.unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let metadata = MetadataBuilder::new().build();

        assert_eq!(metadata.file_name, UNNAMED_FILE);
        assert_eq!(metadata.file_size, 0);
        assert_eq!(metadata.client_info, UNKNOWN_CLIENT);
        assert_eq!(metadata.service_type, UNSPECIFIED_SERVICE);
        assert!(metadata.email.is_none());
    }

    #[test]
    fn test_builder_blank_values_use_sentinels() {
        let metadata = MetadataBuilder::new()
            .file_name("   ")
            .client_info("")
            .submitter_email("")
            .build();

        assert_eq!(metadata.file_name, UNNAMED_FILE);
        assert_eq!(metadata.client_info, UNKNOWN_CLIENT);
        assert!(metadata.email.is_none());
    }

    #[test]
    fn test_builder_full() {
        let metadata = MetadataBuilder::new()
            .file_name("contract.pdf")
            .file_size(2048)
            .submitter_email("notary@example.com")
            .service_type("legal")
            .client_info("curl/8.0")
            .build();

        assert_eq!(metadata.file_name, "contract.pdf");
        assert_eq!(metadata.file_size, 2048);
        assert_eq!(metadata.email.as_deref(), Some("notary@example.com"));
        assert_eq!(metadata.service_type, "legal");
        assert_eq!(metadata.client_info, "curl/8.0");
    }

    #[test]
    fn test_timestamp_is_server_generated() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let metadata = MetadataBuilder::new().file_name("a.txt").build();
        let after = Utc::now() + chrono::Duration::seconds(1);

        let stamped = metadata.anchored_at().unwrap();
        assert!(stamped >= before && stamped <= after);
        assert!(metadata.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_payload_field_order() {
        let metadata = MetadataBuilder::new()
            .file_name("contract.pdf")
            .file_size(10)
            .service_type("legal")
            .build();

        let payload = metadata.to_payload();
        let name_pos = payload.find("\"fileName\"").unwrap();
        let size_pos = payload.find("\"fileSize\"").unwrap();
        let ts_pos = payload.find("\"timestamp\"").unwrap();
        assert!(name_pos < size_pos && size_pos < ts_pos);
        assert!(!payload.contains("\"email\""));
    }

    #[test]
    fn test_payload_round_trips() {
        let metadata = MetadataBuilder::new()
            .file_name("contract.pdf")
            .submitter_email("a@b.c")
            .build();
        let parsed: Metadata = serde_json::from_str(&metadata.to_payload()).unwrap();
        assert_eq!(parsed, metadata);
    }
}
