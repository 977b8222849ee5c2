//! Parameters for the non-enveloped ranking endpoints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vodgate_core::{Error, RejectReason};

use crate::catalog::{CatalogError, DEFAULT_AMOUNT, Period, validate_type_id};

/// Ranked listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrendingParams {
    /// Ranking period: day (default), week, month, all.
    #[serde(default)]
    pub period: Option<String>,

    /// Content type: 1 film, 2 series, 3 variety, 4 anime (required).
    #[serde(default)]
    pub type_id: Option<u8>,

    /// Number of items (default 10).
    #[serde(default)]
    pub amount: Option<u32>,
}

/// Hot listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HotParams {
    /// Content type: 1 film, 2 series, 3 variety, 4 anime (required).
    #[serde(default)]
    pub type_id: Option<u8>,

    /// Number of items (default 10).
    #[serde(default)]
    pub amount: Option<u32>,
}

impl TrendingParams {
    pub(crate) fn resolve(&self) -> Result<(Period, u8, u32), Error> {
        let period = self.period.as_deref().unwrap_or("day").parse::<Period>().map_err(invalid)?;
        let type_id = resolve_type_id(self.type_id)?;
        Ok((period, type_id, self.amount.unwrap_or(DEFAULT_AMOUNT)))
    }
}

impl HotParams {
    pub(crate) fn resolve(&self) -> Result<(u8, u32), Error> {
        let type_id = resolve_type_id(self.type_id)?;
        Ok((type_id, self.amount.unwrap_or(DEFAULT_AMOUNT)))
    }
}

fn resolve_type_id(type_id: Option<u8>) -> Result<u8, Error> {
    let type_id = type_id.ok_or_else(|| Error::rejected(RejectReason::MissingField("type_id".into())))?;
    validate_type_id(type_id).map_err(invalid)
}

fn invalid(err: CatalogError) -> Error {
    match err {
        CatalogError::InvalidParam(msg) => Error::rejected(RejectReason::InvalidParam(msg)),
        other => Error::rejected(RejectReason::InvalidParam(other.to_string())),
    }
}
