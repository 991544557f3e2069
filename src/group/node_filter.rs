use regex::Regex;

/// A filter of hierarchy nodes by name.
///
/// A node matches if its name does not match the exclude pattern (if any) and matches the include pattern (if any).
/// The exclude pattern takes precedence if both match.
/// Patterns are searched for anywhere in the absolute node name.
#[derive(Clone, Debug, Default)]
pub struct NodeFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl NodeFilter {
    /// Create a filter that matches every node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match nodes whose name matches `pattern`.
    ///
    /// # Errors
    /// Returns a [`regex::Error`] if `pattern` is not a valid regular expression.
    pub fn include(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.include = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Do not match nodes whose name matches `pattern`.
    ///
    /// # Errors
    /// Returns a [`regex::Error`] if `pattern` is not a valid regular expression.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Returns true if a node named `name` matches the filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        !self.exclude.as_ref().is_some_and(|exclude| exclude.is_match(name))
            && self.include.as_ref().map_or(true, |include| include.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_filter() {
        assert!(NodeFilter::new().matches("/a"));
        let filter = NodeFilter::new().include("^/raw").unwrap();
        assert!(filter.matches("/raw/voltage"));
        assert!(!filter.matches("/processed/voltage"));
        let filter = filter.exclude("current").unwrap();
        assert!(filter.matches("/raw/voltage"));
        assert!(!filter.matches("/raw/current"));
        let filter = NodeFilter::new().include("a").unwrap().exclude("a").unwrap();
        assert!(!filter.matches("/a"));
        assert!(NodeFilter::new().include("(").is_err());
    }
}
