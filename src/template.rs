//! Template sources: local files or downloads

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::forms::FormKind;

const USER_AGENT: &str = concat!("taxform-filler/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a template PDF comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Path(PathBuf),
    Url(String),
}

impl TemplateSource {
    /// The published IRS template for `kind`
    pub fn default_for(kind: FormKind) -> Self {
        TemplateSource::Url(kind.template_url().to_string())
    }
}

impl FromStr for TemplateSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidTemplate("empty template location".to_string()));
        }
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            Ok(TemplateSource::Url(s.to_string()))
        } else {
            Ok(TemplateSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Path(path) => write!(f, "{}", path.display()),
            TemplateSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Reject anything that does not start with a PDF header
pub fn check_pdf_header(bytes: &[u8], origin: &str) -> Result<()> {
    if bytes.starts_with(b"%PDF-") {
        Ok(())
    } else {
        Err(Error::InvalidTemplate(format!("{} is not a PDF", origin)))
    }
}

async fn download(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;

    log::info!("Downloading template from {}", url);
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    log::debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

/// Read or download a template and check it is a PDF
pub async fn load_template(source: &TemplateSource) -> Result<Vec<u8>> {
    let bytes = match source {
        TemplateSource::Path(path) => {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
            tokio::fs::read(path).await?
        }
        TemplateSource::Url(url) => download(url).await?,
    };

    check_pdf_header(&bytes, &source.to_string())?;
    Ok(bytes)
}

/// Download the published IRS template for `kind` to `output`
pub async fn fetch_template(kind: FormKind, output: &Path) -> Result<usize> {
    let bytes = load_template(&TemplateSource::default_for(kind)).await?;
    tokio::fs::write(output, &bytes).await?;
    log::info!("Saved {} template to {}", kind, output.display());
    Ok(bytes.len())
}
