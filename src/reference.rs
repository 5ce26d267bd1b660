//! Package references of the form `name/version@user/channel`.

use crate::error::RecipeError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A reference to a package in the registry.
///
/// The registry itself is opaque; the reference is only ever carried around
/// and rendered back to its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct PackageReference {
    name: String,
    version: String,
    user: String,
    channel: String,
}

impl PackageReference {
    /// Create a reference from its four components.
    ///
    /// No validation is performed; use [`str::parse`] for untrusted input.
    #[must_use]
    pub fn new(name: &str, version: &str, user: &str, channel: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
            user: user.to_owned(),
            channel: channel.to_owned(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Provenance as `user/channel`.
    #[must_use]
    pub fn provenance(&self) -> String {
        format!("{}/{}", self.user, self.channel)
    }
}

impl FromStr for PackageReference {
    type Err = RecipeError;

    /// Parse `name/version@user/channel`.
    ///
    /// # Examples
    ///
    /// ```
    /// use desa_recipe::reference::PackageReference;
    ///
    /// let r: PackageReference = "gtest/1.8.0@lasote/stable".parse().unwrap();
    /// assert_eq!(r.name(), "gtest");
    /// assert_eq!(r.provenance(), "lasote/stable");
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| RecipeError::InvalidReference {
            reference: s.to_owned(),
            reason,
        };

        let (package, provenance) = s
            .split_once('@')
            .ok_or_else(|| invalid("missing @user/channel"))?;
        let (name, version) = package
            .split_once('/')
            .ok_or_else(|| invalid("missing /version"))?;
        let (user, channel) = provenance
            .split_once('/')
            .ok_or_else(|| invalid("provenance must be user/channel"))?;

        let parts = [name, version, user, channel];
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty component"));
        }
        if parts.iter().any(|p| p.contains(['/', '@']) || p.contains(char::is_whitespace)) {
            return Err(invalid("unexpected separator or whitespace"));
        }

        Ok(Self {
            name: name.to_owned(),
            version: version.to_owned(),
            user: user.to_owned(),
            channel: channel.to_owned(),
        })
    }
}

impl TryFrom<String> for PackageReference {
    type Error = RecipeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}/{}",
            self.name, self.version, self.user, self.channel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn renders_back_to_the_parsed_text() {
        let text = "gtest/1.8.0@lasote/stable";
        let reference: PackageReference = text.parse().expect("valid reference");

        assert_eq!(reference.name(), "gtest");
        assert_eq!(reference.version(), "1.8.0");
        assert_eq!(reference.to_string(), text);
    }

    #[rstest]
    #[case::no_provenance("gtest/1.8.0")]
    #[case::no_version("gtest@lasote/stable")]
    #[case::no_channel("gtest/1.8.0@lasote")]
    #[case::empty_user("gtest/1.8.0@/stable")]
    #[case::extra_segment("gtest/1.8.0/x@lasote/stable")]
    #[case::whitespace("g test/1.8.0@lasote/stable")]
    fn malformed_references_are_rejected(#[case] text: &str) {
        let result = text.parse::<PackageReference>();
        assert!(
            matches!(result, Err(RecipeError::InvalidReference { .. })),
            "expected {text} to be rejected"
        );
    }
}
