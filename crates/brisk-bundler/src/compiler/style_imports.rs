//! Stylesheet import extraction and source rewriting.

use super::linker::literal;
use crate::discovery::STYLE_EXTENSIONS;
use oxc_ast::ast::{ImportDeclarationSpecifier, Program, Statement};
use std::path::{Path, PathBuf};

/// A top-level `import ... from "./x.css"` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyleImport {
    /// Byte range of the whole import statement
    pub start: u32,
    pub end: u32,
    pub specifier: String,
    /// Local binding of a default or namespace import
    pub binding: Option<String>,
}

impl StyleImport {
    /// Resolve the specifier against the importing file.
    pub fn resolve(&self, importer: &Path) -> PathBuf {
        let base = importer.parent().unwrap_or_else(|| Path::new("."));
        base.join(&self.specifier)
    }
}

pub(crate) fn is_stylesheet_specifier(specifier: &str) -> bool {
    let path = specifier.split(['?', '#']).next().unwrap_or(specifier);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| STYLE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Collect stylesheet imports from a parsed program.
///
/// Named imports from a stylesheet and bare (package) specifiers have no
/// meaning here and are reported as errors.
pub(crate) fn collect(program: &Program<'_>) -> Result<Vec<StyleImport>, Vec<String>> {
    let mut imports = Vec::new();
    let mut errors = Vec::new();

    for statement in &program.body {
        let Statement::ImportDeclaration(decl) = statement else {
            continue;
        };

        let specifier = decl.source.value.as_str();
        if !is_stylesheet_specifier(specifier) {
            continue;
        }

        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            errors.push(format!(
                "Stylesheet import '{}' must be a relative path",
                specifier
            ));
            continue;
        }

        let mut binding = None;
        if let Some(specifiers) = &decl.specifiers {
            for spec in specifiers {
                match spec {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                        binding = Some(default.local.name.as_str().to_string());
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                        binding = Some(namespace.local.name.as_str().to_string());
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(_) => {
                        errors.push(format!(
                            "Named imports from stylesheet '{}' are not supported; use a default import",
                            specifier
                        ));
                    }
                }
            }
        }

        imports.push(StyleImport {
            start: decl.span.start,
            end: decl.span.end,
            specifier: specifier.to_string(),
            binding,
        });
    }

    if errors.is_empty() {
        Ok(imports)
    } else {
        Err(errors)
    }
}

/// Replacement statement that binds the stylesheet text to `binding`.
pub(crate) fn inline_statement(binding: Option<&str>, text: &str) -> String {
    match binding {
        Some(name) => {
            format!("const {} = {};", name, literal(text))
        }
        None => String::new(),
    }
}
