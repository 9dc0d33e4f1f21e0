use crate::error::TrustSealResult;
use crate::evidence::{Digest, Metadata, MetadataBuilder};

/// What the caller wants notarized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Raw document bytes; hashed server-side
    Content(Vec<u8>),

    /// Caller-computed digest, validated before use
    Digest(String),
}

/// One notarization request
///
/// There is no timestamp field: the anchoring time is always taken from the
/// server clock when metadata is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotarizationRequest {
    pub document: DocumentSource,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub submitter_email: Option<String>,
    pub service_type: Option<String>,
    pub client_info: Option<String>,
}

impl NotarizationRequest {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            document,
            file_name: None,
            file_size: None,
            submitter_email: None,
            service_type: None,
            client_info: None,
        }
    }

    pub fn from_content(content: impl Into<Vec<u8>>) -> Self {
        Self::new(DocumentSource::Content(content.into()))
    }

    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self::new(DocumentSource::Digest(digest.into()))
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn submitter_email(mut self, email: impl Into<String>) -> Self {
        self.submitter_email = Some(email.into());
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn client_info(mut self, client_info: impl Into<String>) -> Self {
        self.client_info = Some(client_info.into());
        self
    }

    /// Hash the content, or validate the supplied digest
    pub fn resolve_digest(&self) -> TrustSealResult<Digest> {
        match &self.document {
            DocumentSource::Content(bytes) => Ok(Digest::of_bytes(bytes)),
            DocumentSource::Digest(text) => Digest::parse(text),
        }
    }

    /// Build the metadata record; file size falls back to the content length
    pub fn metadata(&self) -> Metadata {
        let mut builder = MetadataBuilder::new();

        if let Some(name) = &self.file_name {
            builder = builder.file_name(name.as_str());
        }

        let size = match (&self.file_size, &self.document) {
            (Some(size), _) => Some(*size),
            (None, DocumentSource::Content(bytes)) => Some(bytes.len() as u64),
            (None, DocumentSource::Digest(_)) => None,
        };
        if let Some(size) = size {
            builder = builder.file_size(size);
        }

        if let Some(email) = &self.submitter_email {
            builder = builder.submitter_email(email.as_str());
        }
        if let Some(service_type) = &self.service_type {
            builder = builder.service_type(service_type.as_str());
        }
        if let Some(client_info) = &self.client_info {
            builder = builder.client_info(client_info.as_str());
        }

        builder.build()
    }
}
