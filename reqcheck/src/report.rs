// projeto: reqcheck
// file: src/report.rs
// Requirement parsing and the three-bucket compatibility report

use log::info;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::ReqError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl VersionOp {
    fn as_str(&self) -> &'static str {
        match self {
            VersionOp::Eq => "==",
            VersionOp::Ne => "!=",
            VersionOp::Ge => ">=",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Lt => "<",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub op: Option<VersionOp>,
    pub version: Option<String>,
    pub raw: String,
}

// Distribution names compare case-insensitively with '-' and '_' collapsed
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

pub fn parse_requirements(text: &str) -> Result<Vec<Requirement>, ReqError> {
    let mut requirements = Vec::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        // environment markers are not evaluated here
        let line = line.split(';').next().unwrap_or("").trim();

        const OPS: [(&str, VersionOp); 6] = [
            ("==", VersionOp::Eq),
            ("!=", VersionOp::Ne),
            (">=", VersionOp::Ge),
            ("<=", VersionOp::Le),
            (">", VersionOp::Gt),
            ("<", VersionOp::Lt),
        ];

        let mut parsed = None;
        for (token, op) in OPS {
            if let Some(pos) = line.find(token) {
                let name = &line[..pos];
                let version = line[pos + token.len()..].trim();
                parsed = Some((name, Some(op), Some(version.to_string())));
                break;
            }
        }
        let (name, op, version) = parsed.unwrap_or((line, None, None));

        // strip extras: requests[security] -> requests
        let name = name.split('[').next().unwrap_or("").trim();
        if name.is_empty() {
            return Err(ReqError::Parse(format!("Requirement without a name: '{}'", line)));
        }
        if op.is_some() && version.as_deref().is_none_or(str::is_empty) {
            return Err(ReqError::Parse(format!("Requirement without a version: '{}'", line)));
        }

        requirements.push(Requirement {
            name: normalize_name(name),
            op,
            version,
            raw: line.to_string(),
        });
    }
    Ok(requirements)
}

// Freeze format: one name==version per line
pub fn parse_installed(text: &str) -> Result<BTreeMap<String, String>, ReqError> {
    let mut installed = BTreeMap::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (name, version) = line
            .split_once("==")
            .ok_or_else(|| ReqError::Parse(format!("Not in freeze format: '{}'", line)))?;
        installed.insert(normalize_name(name), version.trim().to_string());
    }
    Ok(installed)
}

// Numeric-segment ordering: 1.10 sorts after 1.9
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(l), None) => {
                if segment_value(l) != 0 {
                    return Ordering::Greater;
                }
            }
            (None, Some(r)) => {
                if segment_value(r) != 0 {
                    return Ordering::Less;
                }
            }
            (Some(l), Some(r)) => {
                let cmp = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    _ => l.cmp(r),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
        }
    }
}

fn segment_value(segment: &str) -> u64 {
    segment.parse().unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfied,
    Missing,
    Conflict { installed: String },
}

pub fn classify(requirement: &Requirement, installed: &BTreeMap<String, String>) -> Outcome {
    let Some(installed_version) = installed.get(&requirement.name) else {
        return Outcome::Missing;
    };
    let (Some(op), Some(required)) = (requirement.op, requirement.version.as_deref()) else {
        // a bare name is satisfied by any installed version
        return Outcome::Satisfied;
    };

    let cmp = compare_versions(installed_version, required);
    let ok = match op {
        VersionOp::Eq => cmp == Ordering::Equal,
        VersionOp::Ne => cmp != Ordering::Equal,
        VersionOp::Ge => cmp != Ordering::Less,
        VersionOp::Le => cmp != Ordering::Greater,
        VersionOp::Gt => cmp == Ordering::Greater,
        VersionOp::Lt => cmp == Ordering::Less,
    };
    if ok {
        Outcome::Satisfied
    } else {
        Outcome::Conflict {
            installed: installed_version.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub satisfied: Vec<Requirement>,
    pub missing: Vec<Requirement>,
    pub conflicts: Vec<(Requirement, String)>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.satisfied.len() + self.missing.len() + self.conflicts.len()
    }

    pub fn print(&self) {
        println!("📋 Dependency compatibility report ({} requirements)", self.total());

        println!("\n✅ Satisfied ({}):", self.satisfied.len());
        for requirement in &self.satisfied {
            println!("      {}", requirement.raw);
        }

        println!("\n❌ Distribution not found ({}):", self.missing.len());
        for requirement in &self.missing {
            println!("      {}", requirement.raw);
        }

        println!("\n⚠️ Version conflict ({}):", self.conflicts.len());
        for (requirement, installed) in &self.conflicts {
            let wanted = match (&requirement.op, &requirement.version) {
                (Some(op), Some(version)) => format!("{}{}", op.as_str(), version),
                _ => String::new(),
            };
            println!("      {} (installed: {}, wanted: {})", requirement.name, installed, wanted);
        }
    }
}

// Each requirement lands in exactly one bucket; the union of the buckets
// is the input set
pub fn build_report(requirements: &[Requirement], installed: &BTreeMap<String, String>) -> Report {
    let mut report = Report::default();
    for requirement in requirements {
        match classify(requirement, installed) {
            Outcome::Satisfied => report.satisfied.push(requirement.clone()),
            Outcome::Missing => report.missing.push(requirement.clone()),
            Outcome::Conflict { installed } => report.conflicts.push((requirement.clone(), installed)),
        }
    }
    info!(
        "Report: {} satisfied, {} missing, {} conflicted",
        report.satisfied.len(),
        report.missing.len(),
        report.conflicts.len()
    );
    report
}
