use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::error::eval::EvalError;
use crate::value::Value;

/// Reserved parameter name overriding the NoData sentinel used by the
/// ternary kernels.
pub const NO_DATA_PARAMETER: &str = "nodata";

/// Resolves names to values during evaluation. Names are case-sensitive.
///
/// Implementations return canonical [`Value`]s; the `From` conversions on
/// `Value` widen every numeric kind to `f32` at the boundary, so a custom
/// source built from host data is canonical by construction.
pub trait Parameters {
    fn get(&self, name: &str) -> Result<Value, EvalError>;
}

/// Map-backed parameter source.
#[derive(Debug, Clone, Default)]
pub struct MapParameters {
    values: FxHashMap<CompactString, Value>,
}

impl MapParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<CompactString>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert, convenient for literal bags.
    pub fn with(mut self, name: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }
}

impl Parameters for MapParameters {
    fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownParameter(name.into()))
    }
}

impl<K: Into<CompactString>, V: Into<Value>> FromIterator<(K, V)> for MapParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MapParameters {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Resolves the NoData sentinel: the `nodata` parameter when present, the
/// smallest positive normal `f32` otherwise. A present but non-numeric
/// `nodata` is a configuration error.
pub(crate) fn no_data(parameters: &dyn Parameters) -> Result<f32, EvalError> {
    match parameters.get(NO_DATA_PARAMETER) {
        Ok(Value::Number(value)) => Ok(value),
        Ok(other) => Err(EvalError::InvalidNoData(other.to_string())),
        Err(_) => Ok(f32::MIN_POSITIVE),
    }
}
