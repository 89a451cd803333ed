use crate::cli::{BuildArgs, DevArgs};
use brisk_bundler::StylesheetHandling;
use serde::Serialize;
use std::path::PathBuf;

/// Settings given explicitly on the command line.
///
/// Merged as the last figment layer; unset fields are skipped so they do not
/// shadow the config file or environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_maps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet_handling: Option<StylesheetHandling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

/// `Some(value)` when a presence flag was passed, `None` otherwise.
fn flag(set: bool, value: bool) -> Option<bool> {
    set.then_some(value)
}

impl From<&DevArgs> for ConfigOverrides {
    fn from(args: &DevArgs) -> Self {
        Self {
            source_root: args.source_root.clone(),
            destination: args.destination.clone(),
            watch: flag(args.no_watch, false),
            port: args.port,
            host: args.host.clone(),
            minify: flag(args.minify, true),
            source_maps: flag(args.no_sourcemap, false),
            stylesheet_handling: args.stylesheets.map(Into::into),
            recursive: flag(args.recursive, true),
        }
    }
}

impl From<&BuildArgs> for ConfigOverrides {
    fn from(args: &BuildArgs) -> Self {
        Self {
            source_root: args.source_root.clone(),
            destination: args.destination.clone(),
            watch: Some(false),
            port: None,
            host: None,
            minify: flag(args.no_minify, false),
            source_maps: flag(args.sourcemap, true),
            stylesheet_handling: args.stylesheets.map(Into::into),
            recursive: flag(args.recursive, true),
        }
    }
}
