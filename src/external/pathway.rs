use tracing::info;

use super::{ExternalError, http_client};

/// Fetches a pathway diagram definition (KGML) by identifier.
pub trait PathwaySource {
    fn fetch(&self, id: &str) -> Result<String, ExternalError>;
}

pub struct KeggSource {
    endpoint: String,
}

impl Default for KeggSource {
    fn default() -> Self {
        Self {
            endpoint: "https://rest.kegg.jp/get".to_owned(),
        }
    }
}

/// KEGG pathway ids look like `hsa04115` or `path:hsa04115`.
fn normalize_pathway_id(id: &str) -> Result<String, ExternalError> {
    let trimmed = id.trim();
    let bare = trimmed.strip_prefix("path:").unwrap_or(trimmed);
    let valid = !bare.is_empty()
        && bare.len() <= 16
        && bare.chars().all(|ch| ch.is_ascii_alphanumeric());
    if !valid {
        return Err(ExternalError::InvalidId(id.to_owned()));
    }
    Ok(bare.to_owned())
}

impl PathwaySource for KeggSource {
    fn fetch(&self, id: &str) -> Result<String, ExternalError> {
        let id = normalize_pathway_id(id)?;
        let url = format!("{}/{id}/kgml", self.endpoint);
        info!(%url, "fetching pathway");

        let response = http_client()?.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExternalError::Status {
                service: "kegg",
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}
