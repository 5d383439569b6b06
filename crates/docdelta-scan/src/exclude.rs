/// Substring exclude patterns applied to normalized relative paths.
///
/// A path is excluded when any pattern occurs anywhere in it, so `.git`
/// excludes both the `.git` directory and everything below it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    patterns: Vec<String>,
}

impl ExcludeSet {
    /// Build a set from patterns. Empty patterns are dropped, since they
    /// would match every path.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|p| relative_path.contains(p.as_str()))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match() {
        let set = ExcludeSet::new([".git", "node_modules"]);
        assert!(set.is_excluded(".git"));
        assert!(set.is_excluded(".git/objects/ab"));
        assert!(set.is_excluded("web/node_modules/x.js"));
        assert!(!set.is_excluded("src/main.rs"));
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let set = ExcludeSet::new(["", "tmp"]);
        assert!(set.is_excluded("build/tmp/x.o"));
        assert!(!set.is_excluded("src/lib.rs"));
    }

    #[test]
    fn default_excludes_nothing() {
        let set = ExcludeSet::default();
        assert!(!set.is_excluded("anything"));
    }
}
