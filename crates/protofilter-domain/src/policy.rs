//! Policy evaluation: does a node survive for the active term set?

use std::collections::BTreeSet;

/// Per-node `{include, exclude}` term lists, decoded from the node's options.
///
/// Duplicates within a list are immaterial.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Policy {
    /// Deny-list policy: drop the node when any of `terms` is active.
    pub fn exclude<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Vec::new(),
            exclude: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// Allow-list policy: keep the node only when one of `terms` is active.
    pub fn include<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: terms.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }
}

/// The terms selected for one run. Read-only for the whole pruning pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveTerms(BTreeSet<String>);

impl ActiveTerms {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(terms.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.0.contains(term)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveTerms {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Why a node was kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keep {
    NoPolicy,
    NoActiveTerms,
    /// The include list names this active term.
    AllowListed(String),
    /// Policy present, but no exclude match and no include restriction.
    Unrestricted,
}

/// Why a node was excluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exclude {
    /// The exclude list names this active term.
    DenyListed(String),
    /// The include list is non-empty and names no active term.
    NotAllowListed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Keep(Keep),
    Exclude(Exclude),
}

impl Verdict {
    pub fn is_excluded(&self) -> bool {
        matches!(self, Verdict::Exclude(_))
    }
}

/// Evaluate a node's policy against the active terms.
///
/// Rule order matters: exclude is checked before include, so a term on both
/// lists excludes the node.
pub fn evaluate(policy: Option<&Policy>, terms: &ActiveTerms) -> Verdict {
    let Some(policy) = policy else {
        return Verdict::Keep(Keep::NoPolicy);
    };
    if terms.is_empty() {
        return Verdict::Keep(Keep::NoActiveTerms);
    }

    if let Some(term) = policy.exclude.iter().find(|t| terms.contains(t)) {
        return Verdict::Exclude(Exclude::DenyListed(term.clone()));
    }

    if policy.include.is_empty() {
        return Verdict::Keep(Keep::Unrestricted);
    }

    match policy.include.iter().find(|t| terms.contains(t)) {
        Some(term) => Verdict::Keep(Keep::AllowListed(term.clone())),
        None => Verdict::Exclude(Exclude::NotAllowListed),
    }
}

/// `true` when the node (and its whole subtree) must be removed.
pub fn decide(policy: Option<&Policy>, terms: &ActiveTerms) -> bool {
    evaluate(policy, terms).is_excluded()
}
