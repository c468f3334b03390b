use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

lazy_static::lazy_static! {
    static ref REGEX_FULL_NAME: Regex = Regex::new(r"^([^/\\.][^/\\]*)/([^/\\.][^/\\]*)$").unwrap();
}

/// One remote repository to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub full_name: String,
    pub clone_url: String,
    pub fork: bool,
    /// The original JSON object, persisted verbatim next to the clone.
    pub raw: Value,
}

impl Descriptor {
    fn from_value(index: usize, raw: &Value) -> Result<Self> {
        let field = |field: &'static str| {
            raw.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(Error::Descriptor { index, field })
        };

        let full_name = field("full_name")?;

        // only a literal `true` marks a fork; anything else is cloned like any other repository
        let fork = match raw.get("fork") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(fork)) => *fork,
            Some(other) => {
                warn!("Repository {full_name} has a non-boolean `fork` value {other}, treating it as not a fork");
                false
            }
        };

        Ok(Self {
            full_name,
            clone_url: field("clone_url")?,
            fork,
            raw: raw.clone(),
        })
    }

    /// Split `full_name` into `(owner, repo)`, rejecting anything that could escape the
    /// owner directory.
    pub fn owner_and_repo(&self) -> Result<(&str, &str)> {
        split_full_name(&self.full_name)
    }
}

pub fn split_full_name(full_name: &str) -> Result<(&str, &str)> {
    let captures = REGEX_FULL_NAME
        .captures(full_name)
        .ok_or_else(|| Error::InvalidName(full_name.to_string()))?;

    match (captures.get(1), captures.get(2)) {
        (Some(owner), Some(repo)) => Ok((owner.as_str(), repo.as_str())),
        _ => Err(Error::InvalidName(full_name.to_string())),
    }
}

type ShapeMatcher = fn(&Value) -> Option<Vec<&Value>>;

/// Tried in order, first match wins.
const SHAPES: &[(&str, ShapeMatcher)] = &[
    ("single repository", single_repository),
    ("repository list", repository_list),
    ("search results", search_results),
];

fn has_clone_url(value: &Value) -> bool {
    value.get("clone_url").is_some()
}

// a previously saved per-repository fragment
fn single_repository(doc: &Value) -> Option<Vec<&Value>> {
    has_clone_url(doc).then(|| vec![doc])
}

// e.g. /users/:user/repos
fn repository_list(doc: &Value) -> Option<Vec<&Value>> {
    let list = doc.as_array()?;
    has_clone_url(list.first()?).then(|| list.iter().collect())
}

// e.g. /search/repositories
fn search_results(doc: &Value) -> Option<Vec<&Value>> {
    repository_list(doc.get("items")?)
}

pub fn parse(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Normalize any of the known document shapes into descriptors, in document order.
pub fn extract(doc: &Value) -> Result<Vec<Descriptor>> {
    let (shape, items) = SHAPES
        .iter()
        .find_map(|(shape, matcher)| matcher(doc).map(|items| (shape, items)))
        .ok_or(Error::Format)?;

    debug!("Document looks like {shape} with {} entries", items.len());

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| Descriptor::from_value(index, item))
        .collect()
}
