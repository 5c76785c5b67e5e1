use std::collections::BTreeMap;

use base64::Engine as _;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Apng,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::Webp,
        OutputFormat::Apng,
    ];

    /// Key used in the JSON response; doubles as the file extension.
    pub fn key(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Apng => "apng",
        }
    }

    pub fn extension(self) -> &'static str {
        self.key()
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Apng => "image/apng",
        }
    }
}

/// Encoded payloads for one enhanced image, one per [`OutputFormat`].
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
    payloads: BTreeMap<OutputFormat, Vec<u8>>,
}

impl OutputBundle {
    pub fn insert(&mut self, format: OutputFormat, bytes: Vec<u8>) {
        self.payloads.insert(format, bytes);
    }

    pub fn get(&self, format: OutputFormat) -> Option<&[u8]> {
        self.payloads.get(&format).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputFormat, &[u8])> {
        self.payloads.iter().map(|(f, b)| (*f, b.as_slice()))
    }

    pub fn data_url(&self, format: OutputFormat) -> Option<String> {
        self.get(format).map(|bytes| to_data_url(format.mime_type(), bytes))
    }
}

pub fn to_data_url(mime: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// JSON body of `POST /api/enhance`.
#[derive(Debug, Clone, Serialize)]
pub struct EnhanceResponse {
    pub png: String,
    pub jpg: String,
    pub webp: String,
    pub apng: String,
}

impl From<&OutputBundle> for EnhanceResponse {
    fn from(bundle: &OutputBundle) -> Self {
        let url = |f: OutputFormat| bundle.data_url(f).unwrap_or_default();
        Self {
            png: url(OutputFormat::Png),
            jpg: url(OutputFormat::Jpeg),
            webp: url(OutputFormat::Webp),
            apng: url(OutputFormat::Apng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_prefix() {
        assert_eq!(to_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_response_uses_format_mime() {
        let mut bundle = OutputBundle::default();
        for f in OutputFormat::ALL {
            bundle.insert(f, vec![1, 2, 3]);
        }
        let resp = EnhanceResponse::from(&bundle);
        assert!(resp.jpg.starts_with("data:image/jpeg;base64,"));
        assert!(resp.apng.starts_with("data:image/apng;base64,"));

        let json = serde_json::to_value(&resp).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
    }
}
