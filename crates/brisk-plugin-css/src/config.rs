//! Options shared by the stylesheet plugins.

/// Configuration for [`CssPlugin`](crate::CssPlugin) and
/// [`SassPlugin`](crate::SassPlugin).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssPluginOptions {
    /// Always minify, regardless of the compile options
    pub minify: bool,
}

impl CssPluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Effective minify flag for one transform call.
    pub(crate) fn minify_for(&self, requested: bool) -> bool {
        requested || self.minify
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = CssPluginOptions::new().with_minify(true);
        assert!(options.minify);
    }

    #[test]
    fn test_forced_minify_overrides_request() {
        let forced = CssPluginOptions::new().with_minify(true);
        assert!(forced.minify_for(false));

        let default = CssPluginOptions::new();
        assert!(!default.minify_for(false));
        assert!(default.minify_for(true));
    }
}
