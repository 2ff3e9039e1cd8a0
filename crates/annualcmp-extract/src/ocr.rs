//! Cloud OCR provider selection for scanned reports.
//!
//! No provider API is called. With credentials configured, pages come back as
//! clearly marked simulated text so a scanned upload still flows through the
//! pipeline; without any, a placeholder explains what is missing.

/// Confidence reported for simulated provider output.
const SIMULATED_CONFIDENCE: f32 = 0.7;

const NO_PROVIDER: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrProvider {
    GoogleCloudVision,
    AzureDocumentIntelligence,
    AwsTextract,
}

impl OcrProvider {
    /// Every provider, most capable first.
    pub const ALL: [OcrProvider; 3] = [
        OcrProvider::GoogleCloudVision,
        OcrProvider::AzureDocumentIntelligence,
        OcrProvider::AwsTextract,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OcrProvider::GoogleCloudVision => "google_cloud_vision",
            OcrProvider::AzureDocumentIntelligence => "azure_document_intelligence",
            OcrProvider::AwsTextract => "aws_textract",
        }
    }

    /// Credential variables for this provider. `any_of` means one is enough,
    /// otherwise all are required.
    fn credentials(self) -> (&'static [&'static str], bool) {
        match self {
            OcrProvider::GoogleCloudVision => (
                &["GOOGLE_APPLICATION_CREDENTIALS", "GOOGLE_CLOUD_PROJECT_ID"],
                true,
            ),
            OcrProvider::AzureDocumentIntelligence => (&["AZURE_DI_ENDPOINT", "AZURE_DI_KEY"], false),
            OcrProvider::AwsTextract => (&["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"], false),
        }
    }
}

impl std::fmt::Display for OcrProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text recovered from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
    /// 1-based, matching section page numbers.
    pub page_number: u32,
    pub provider: String,
}

/// Providers whose credentials are configured, in [`OcrProvider::ALL`] order.
///
/// Blank values count as unset.
pub fn available_providers<F>(lookup: F) -> Vec<OcrProvider>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let is_set = |var: &str| lookup(var).is_ok_and(|v| !v.trim().is_empty());

    OcrProvider::ALL
        .into_iter()
        .filter(|provider| {
            let (vars, any_of) = provider.credentials();
            if any_of {
                vars.iter().any(|v| is_set(v))
            } else {
                vars.iter().all(|v| is_set(v))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct OcrService {
    providers: Vec<OcrProvider>,
}

impl OcrService {
    #[must_use]
    pub fn new(providers: Vec<OcrProvider>) -> Self {
        Self { providers }
    }

    /// Select providers from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let providers = available_providers(|var| std::env::var(var));
        tracing::debug!(
            providers = ?providers.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            "OCR providers configured"
        );
        Self::new(providers)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.providers.is_empty()
    }

    /// OCR one page with the first configured provider.
    #[must_use]
    pub fn extract_page(&self, page_number: u32) -> OcrResult {
        let Some(provider) = self.providers.first() else {
            tracing::warn!(page = page_number, "no OCR provider configured");
            return OcrResult {
                text: "No OCR provider is configured; set cloud OCR credentials to read scanned pages."
                    .to_string(),
                confidence: 0.0,
                page_number,
                provider: NO_PROVIDER.to_string(),
            };
        };

        OcrResult {
            text: format!(
                "[simulated OCR text - page {page_number}]\nThis is a simulated OCR result from {provider}."
            ),
            confidence: SIMULATED_CONFIDENCE,
            page_number,
            provider: provider.as_str().to_string(),
        }
    }
}
