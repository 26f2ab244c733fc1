//! The upstream chain of a list of environments.

#[cfg(test)]
use crate::constants::TRUNK_BRANCH;

/// An ordered mapping of environment names to the name of their upstream.
///
/// The first environment's upstream is the trunk branch, and every other environment's upstream is
/// the environment listed before it. Iteration follows the order the environments were listed in.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EnvironmentHierarchy {
    /// The name of the trunk branch.
    trunk: String,
    /// `(environment, upstream)` pairs, in chain order.
    entries: Vec<(String, String)>,
}

impl EnvironmentHierarchy {
    /// Builds the hierarchy for `environments`, rooted at the `main` branch.
    #[cfg(test)]
    pub fn build<S: AsRef<str>>(environments: &[S]) -> Self {
        Self::build_with_trunk(environments, TRUNK_BRANCH)
    }

    /// Builds the hierarchy for `environments`, rooted at `trunk`.
    ///
    /// A name listed twice keeps the position of its first occurrence, with the upstream of its
    /// last one. Duplicates are a caller error, but never cause a failure.
    pub fn build_with_trunk<S: AsRef<str>>(environments: &[S], trunk: &str) -> Self {
        let mut hierarchy = Self {
            trunk: trunk.to_string(),
            entries: Vec::with_capacity(environments.len()),
        };

        let mut upstream = trunk;
        for environment in environments.iter().map(|e| e.as_ref()) {
            match hierarchy
                .entries
                .iter_mut()
                .find(|(e, _)| e.as_str() == environment)
            {
                Some((_, existing)) => *existing = upstream.to_string(),
                None => hierarchy
                    .entries
                    .push((environment.to_string(), upstream.to_string())),
            }
            upstream = environment;
        }

        hierarchy
    }

    /// The name of the trunk branch the chain is rooted at.
    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    /// Returns the upstream of `environment`, or [None] if it is not part of the chain.
    pub fn upstream(&self, environment: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(e, _)| e == environment)
            .map(|(_, upstream)| upstream.as_str())
    }

    /// Iterates over `(environment, upstream)` pairs in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(environment, upstream)| (environment.as_str(), upstream.as_str()))
    }

    /// Iterates over the environments in chain order.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(environment, _)| environment.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
