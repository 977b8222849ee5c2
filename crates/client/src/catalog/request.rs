//! Catalog API endpoints and parameter validation.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::catalog::CatalogError;

/// Content categories accepted by the ranking endpoints:
/// 1 film, 2 series, 3 variety, 4 anime.
pub const ALLOWED_TYPE_IDS: std::ops::RangeInclusive<u8> = 1..=4;

/// Default number of ranked items.
pub const DEFAULT_AMOUNT: u32 = 10;

/// Ranking period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(CatalogError::InvalidParam(format!(
                "period must be one of: day, week, month, all (got {other:?})"
            ))),
        }
    }
}

/// Validate a content type id.
pub fn validate_type_id(type_id: u8) -> Result<u8, CatalogError> {
    if ALLOWED_TYPE_IDS.contains(&type_id) {
        Ok(type_id)
    } else {
        Err(CatalogError::InvalidParam(format!(
            "type_id must be one of: 1 (film), 2 (series), 3 (variety), 4 (anime) (got {type_id})"
        )))
    }
}

/// A catalog API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Search { keyword: String, page: u32, size: u32 },
    Keywords { keyword: String },
    Detail { id: String },
    Rank { period: Period, type_id: u8, amount: u32 },
    Hot { type_id: u8, amount: u32 },
}

impl Endpoint {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Search { .. } => "search",
            Endpoint::Keywords { .. } => "keywords",
            Endpoint::Detail { .. } => "detail",
            Endpoint::Rank { .. } => "rank",
            Endpoint::Hot { .. } => "hot",
        }
    }

    fn path_segments(&self) -> Vec<String> {
        match self {
            Endpoint::Search { keyword, page, size } => vec![
                "index".into(),
                "search".into(),
                keyword.clone(),
                "vod".into(),
                "0".into(),
                page.to_string(),
                size.to_string(),
            ],
            Endpoint::Keywords { keyword } => {
                vec!["index".into(), "search".into(), "keywords".into(), keyword.clone()]
            }
            Endpoint::Detail { id } => vec!["vod".into(), "detail".into(), id.clone(), "true".into()],
            Endpoint::Rank { period, type_id, amount } => vec![
                "index".into(),
                "vod".into(),
                "data".into(),
                "rank".into(),
                period.to_string(),
                type_id.to_string(),
                amount.to_string(),
            ],
            Endpoint::Hot { type_id, amount } => vec![
                "index".into(),
                "vod".into(),
                "hot".into(),
                type_id.to_string(),
                "0".into(),
                amount.to_string(),
            ],
        }
    }

    /// Build the signed URL under `base`.
    ///
    /// Path segments are percent-encoded, so keywords may contain any
    /// characters including `/`.
    pub fn url(&self, base: &Url, vv: &str) -> Result<Url, CatalogError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(self.path_segments());
        url.query_pairs_mut().clear().append_pair("_vv", vv);
        Ok(url)
    }
}
