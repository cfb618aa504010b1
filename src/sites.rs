//! The static list of monitored sites.
//!
//! Sites are read once at startup from a JSON array and shared read-only
//! between requests and probe tasks.

use std::{collections::HashSet, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Site {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SitesError {
    #[error("could not read site list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("site list is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("site {id:?} is invalid: {source}")]
    Invalid {
        id: String,
        #[source]
        source: validator::ValidationErrors,
    },
    #[error("site id {0:?} is listed more than once")]
    DuplicateId(String),
}

pub fn load_sites(path: impl AsRef<Path>) -> Result<Arc<[Site]>, SitesError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| SitesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_sites(&raw)
}

pub fn parse_sites(raw: &str) -> Result<Arc<[Site]>, SitesError> {
    let sites: Vec<Site> = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    for site in &sites {
        site.validate().map_err(|source| SitesError::Invalid {
            id: site.id.clone(),
            source,
        })?;
        if !seen.insert(site.id.as_str()) {
            return Err(SitesError::DuplicateId(site.id.clone()));
        }
    }

    Ok(sites.into())
}
