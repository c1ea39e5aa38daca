//! Cartesian-product expansion of a parameter grid.

use std::fmt;

/// A single candidate value for a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Bool(bool),
    Int(u64),
    Str(String),
}

impl ParamValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<usize> for ParamValue {
    fn from(n: usize) -> Self {
        Self::Int(n as u64)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// One cell of the product: every parameter bound to a single value,
/// in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination(Vec<(String, ParamValue)>);

impl Combination {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered mapping from parameter name to candidate values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamGrid {
    params: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter. Redeclaring a name replaces its values but keeps
    /// its original position.
    #[must_use]
    pub fn with<V: Into<ParamValue>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.params.push((name.to_string(), values)),
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// Number of combinations [`Self::combinations`] will produce.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.params.iter().map(|(_, values)| values.len()).product()
    }

    /// Every combination, first-declared parameter varying slowest.
    ///
    /// A parameter with no candidates empties the product.
    #[must_use]
    pub fn combinations(&self) -> Vec<Combination> {
        if let Some((name, _)) = self.params.iter().find(|(_, v)| v.is_empty()) {
            tracing::warn!(param = %name, "parameter has no candidate values, grid is empty");
        }
        expand(&self.params).into_iter().map(Combination).collect()
    }
}

fn expand(params: &[(String, Vec<ParamValue>)]) -> Vec<Vec<(String, ParamValue)>> {
    let Some(((name, values), rest)) = params.split_first() else {
        return vec![Vec::new()];
    };

    let tails = expand(rest);
    values
        .iter()
        .flat_map(|value| {
            tails.iter().map(move |tail| {
                let mut combination = Vec::with_capacity(tail.len() + 1);
                combination.push((name.clone(), value.clone()));
                combination.extend(tail.iter().cloned());
                combination
            })
        })
        .collect()
}
