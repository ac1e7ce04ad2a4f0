// projeto: mhexperiment
// file: src/mh/permute.rs
// Hyper-param variants and their cross product

use std::collections::HashSet;

use crate::MhError;
use crate::mh::experiment::HyperParam;

const RANGE: &str = "range";
const MAX_VARIANTS: usize = 100;

// A variants expression is one of:
//   - a single token:            adam
//   - a bracketed list:          [10, 15, 37]
//   - an end-exclusive range:    Range(10, 20, 5)
pub fn variants(expr: &str) -> Result<Vec<String>, MhError> {
    let s = expr.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }

    if s.starts_with('[') {
        let values: Vec<String> = s
            .split(|c: char| c == '[' || c == ']' || c == ',' || c == ' ')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        if values.len() > MAX_VARIANTS {
            return Err(MhError::TooManyVariants(s.to_string()));
        }
        return Ok(values);
    }

    let lower = s.to_lowercase();
    if lower.starts_with(RANGE) || s.starts_with('(') {
        let rest = if lower.starts_with(RANGE) {
            s[RANGE.len()..].trim_start()
        } else {
            s
        };
        if !rest.starts_with('(') || !rest.ends_with(')') {
            return Err(MhError::Variants(s.to_string()));
        }
        let inner = &rest[1..rest.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(MhError::Variants(s.to_string()));
        }
        let start: i64 = parts[0].parse().map_err(|_| MhError::Variants(s.to_string()))?;
        let end: i64 = parts[1].parse().map_err(|_| MhError::Variants(s.to_string()))?;
        let step: i64 = parts[2].parse().map_err(|_| MhError::Variants(s.to_string()))?;
        if step <= 0 {
            return Err(MhError::Variants(s.to_string()));
        }

        let mut values = Vec::new();
        let mut i = start;
        while i < end {
            values.push(i.to_string());
            if values.len() > MAX_VARIANTS {
                return Err(MhError::TooManyVariants(s.to_string()));
            }
            i += step;
        }
        return Ok(values);
    }

    Ok(vec![s.to_string()])
}

// One concrete assignment of the hyper-param space. The path string is the
// stable ",key:value" rendering used for dedup and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperAssignment {
    pub params: Vec<(String, String)>,
    pub path: String,
}

impl HyperAssignment {
    fn empty() -> Self {
        Self {
            params: Vec::new(),
            path: String::new(),
        }
    }

    fn with(&self, key: &str, value: &str) -> Self {
        let mut params = self.params.clone();
        params.push((key.to_string(), value.to_string()));
        Self {
            params,
            path: format!("{},{}:{}", self.path, key, value),
        }
    }
}

// Cross product over the ordered hyper-param space, preserving key order.
// Repeated values inside one expression collapse to a single variant.
pub fn permutations(space: &[HyperParam]) -> Result<Vec<HyperAssignment>, MhError> {
    let mut all = vec![HyperAssignment::empty()];

    for hyper in space {
        let values = variants(&hyper.values)?;
        if values.is_empty() {
            return Err(MhError::Config(format!(
                "No variants defined for hyper param '{}'",
                hyper.key
            )));
        }

        let mut seen = HashSet::new();
        let unique: Vec<&String> = values.iter().filter(|v| seen.insert(v.as_str())).collect();

        let mut next = Vec::with_capacity(all.len() * unique.len());
        for assignment in &all {
            for value in &unique {
                next.push(assignment.with(&hyper.key, value));
            }
        }
        all = next;
    }

    Ok(all)
}
