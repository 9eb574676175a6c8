use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::semantic::PatchSize;

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_usize(value: i64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn to_optional_usize(value: Option<i64>, field: &str) -> Result<Option<usize>> {
    value.map(|raw| to_usize(raw, field)).transpose()
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// Patch index column materialised for a patch size.
pub fn patch_column(patch_size: PatchSize) -> &'static str {
    match patch_size {
        PatchSize::Px10 => "patch_10",
        PatchSize::Px20 => "patch_20",
        PatchSize::Px40 => "patch_40",
    }
}

/// Region label column materialised for a patch size.
pub fn region_column(patch_size: PatchSize) -> &'static str {
    match patch_size {
        PatchSize::Px10 => "region_10",
        PatchSize::Px20 => "region_20",
        PatchSize::Px40 => "region_40",
    }
}

/// Wrap a conversion failure so it can be returned from a rusqlite row closure.
pub fn conversion_error(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Integer,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())),
    )
}
