use brisk_bundler::StylesheetHandling;
use clap::ValueEnum;

/// Stylesheet import handling as spelled on the command line
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum StylesheetMode {
    /// Replace each stylesheet import with a string holding its text
    #[value(name = "inline-as-text")]
    InlineAsText,

    /// Strip stylesheet imports and emit a `.css` artifact per entry
    #[value(name = "emit-css")]
    EmitCss,
}

impl From<StylesheetMode> for StylesheetHandling {
    fn from(mode: StylesheetMode) -> Self {
        match mode {
            StylesheetMode::InlineAsText => StylesheetHandling::InlineAsText,
            StylesheetMode::EmitCss => StylesheetHandling::EmitCss,
        }
    }
}
