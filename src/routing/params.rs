//! Typed path parameters
//!
//! Raw captures are coerced to their declared kind here, before the gate and
//! the handler run. A failed coercion ends the request with `BadParameter`.

use super::pattern::{ParamKind, RawCapture};
use crate::error::AppError;

/// One coerced capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(u64),
    Str(String),
}

impl Param {
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Int(_) => ParamKind::Int,
            Self::Str(_) => ParamKind::Str,
        }
    }
}

/// Ordered parameters passed to a handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    /// Coerce raw captures left to right
    pub fn extract(captures: &[RawCapture<'_>]) -> Result<Self, AppError> {
        captures
            .iter()
            .map(|capture| match capture.kind {
                ParamKind::Int => parse_int(capture).map(Param::Int),
                ParamKind::Str => decode_str(capture).map(Param::Str),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub fn kinds(&self) -> Vec<ParamKind> {
        self.0.iter().map(Param::kind).collect()
    }

    /// Integer parameter at `index`
    pub fn int(&self, index: usize) -> Result<u64, AppError> {
        match self.0.get(index) {
            Some(Param::Int(v)) => Ok(*v),
            other => Err(mismatch(index, ParamKind::Int, other)),
        }
    }

    /// String parameter at `index`
    pub fn str(&self, index: usize) -> Result<&str, AppError> {
        match self.0.get(index) {
            Some(Param::Str(v)) => Ok(v.as_str()),
            other => Err(mismatch(index, ParamKind::Str, other)),
        }
    }
}

impl From<Vec<Param>> for Params {
    fn from(params: Vec<Param>) -> Self {
        Self(params)
    }
}

fn parse_int(capture: &RawCapture<'_>) -> Result<u64, AppError> {
    let bad = || AppError::BadParameter {
        segment: capture.name.to_string(),
        value: capture.value.to_string(),
        expected: ParamKind::Int.as_str(),
    };
    if capture.value.is_empty() || !capture.value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    // All digits but too large for u64
    capture.value.parse::<u64>().map_err(|_| bad())
}

fn decode_str(capture: &RawCapture<'_>) -> Result<String, AppError> {
    urlencoding::decode(capture.value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| AppError::BadParameter {
            segment: capture.name.to_string(),
            value: capture.value.to_string(),
            expected: ParamKind::Str.as_str(),
        })
}

fn mismatch(index: usize, expected: ParamKind, found: Option<&Param>) -> AppError {
    AppError::BadParameter {
        segment: format!("#{index}"),
        value: found.map_or_else(|| "<missing>".to_string(), |p| format!("{p:?}")),
        expected: expected.as_str(),
    }
}
