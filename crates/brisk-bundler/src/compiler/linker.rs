//! Static module linking.
//!
//! Every static `import` and `export ... from` that names a script module is
//! resolved and its target pulled into the bundle. Dependencies are wrapped
//! into a registry keyed by module id and evaluated on first require; the
//! entry itself stays an ES module at the bottom of the output:
//!
//! ```text
//! const __brisk_modules = {
//! "lib/util.ts": function (__brisk_exports, __brisk_require) { ... },
//! };
//! <runtime: __brisk_require, __brisk_export, __brisk_reexport>
//! <entry>
//! ```
//!
//! Exports are live getters. Imported bindings are read once, when the
//! importing module runs, so an import cycle sees only what its partner has
//! initialized by then.

use super::edits::Edit;
use super::style_imports::is_stylesheet_specifier;
use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Declaration, ExportDefaultDeclarationKind,
    ImportDeclarationSpecifier, ModuleExportName, Program, Statement,
};
use oxc_span::GetSpan;
use std::path::{Component, Path};

pub(crate) const REQUIRE: &str = "__brisk_require";
pub(crate) const EXPORTS: &str = "__brisk_exports";
const DEFAULT_LOCAL: &str = "__brisk_default";

/// Helpers every bundle with dependencies carries.
pub(crate) const RUNTIME: &str = r#"const __brisk_cache = Object.create(null);
function __brisk_require(id) {
  let exports = __brisk_cache[id];
  if (!exports) {
    exports = __brisk_cache[id] = Object.create(null);
    __brisk_modules[id](exports, __brisk_require);
  }
  return exports;
}
function __brisk_export(target, getters) {
  for (const name of Object.keys(getters)) {
    Object.defineProperty(target, name, { enumerable: true, get: getters[name] });
  }
}
function __brisk_reexport(target, source) {
  for (const name of Object.keys(source)) {
    if (name !== "default" && !(name in target)) {
      Object.defineProperty(target, name, { enumerable: true, get: () => source[name] });
    }
  }
}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Binding {
    Default(String),
    Namespace(String),
    Named { imported: String, local: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Link {
    /// `import ... from`; no bindings for a side-effect import
    Import(Vec<Binding>),
    /// `export { imported as exported } from`
    ReexportNamed(Vec<(String, String)>),
    /// `export * from`
    ReexportAll,
    /// `export * as name from`
    ReexportNamespace(String),
}

/// A top-level statement that pulls in another script module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModuleLink {
    pub start: u32,
    pub end: u32,
    pub specifier: String,
    pub link: Link,
}

/// What a module imports and exports.
#[derive(Debug, Default)]
pub(crate) struct ModuleScan {
    pub links: Vec<ModuleLink>,
    /// Edits that strip module syntax: `export` keywords and type-only
    /// imports and exports. Only applied to wrapped modules.
    pub wrap_edits: Vec<Edit>,
    /// `(exported name, local expression)` of local exports
    pub exports: Vec<(String, String)>,
}

/// Collect module links and local exports from a parsed program.
///
/// Type-only imports and stylesheet imports are not links.
pub(crate) fn scan(program: &Program<'_>) -> ModuleScan {
    let mut scan = ModuleScan::default();

    for statement in &program.body {
        match statement {
            Statement::ImportDeclaration(decl) => {
                let specifier = decl.source.value.as_str();
                if decl.import_kind.is_type() {
                    scan.wrap_edits.push(Edit::remove(decl.span.start, decl.span.end));
                    continue;
                }
                if is_stylesheet_specifier(specifier) {
                    continue;
                }

                let mut bindings = Vec::new();
                for spec in decl.specifiers.iter().flatten() {
                    match spec {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            bindings.push(Binding::Default(default.local.name.to_string()));
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                            bindings.push(Binding::Namespace(namespace.local.name.to_string()));
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(named) => {
                            if named.import_kind.is_type() {
                                continue;
                            }
                            bindings.push(Binding::Named {
                                imported: export_name(&named.imported),
                                local: named.local.name.to_string(),
                            });
                        }
                    }
                }

                scan.links.push(ModuleLink {
                    start: decl.span.start,
                    end: decl.span.end,
                    specifier: specifier.to_string(),
                    link: Link::Import(bindings),
                });
            }
            Statement::ExportNamedDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    scan.wrap_edits.push(Edit::remove(decl.span.start, decl.span.end));
                    continue;
                }

                if let Some(source) = &decl.source {
                    let pairs = decl
                        .specifiers
                        .iter()
                        .filter(|s| !s.export_kind.is_type())
                        .map(|s| (export_name(&s.local), export_name(&s.exported)))
                        .collect();
                    scan.links.push(ModuleLink {
                        start: decl.span.start,
                        end: decl.span.end,
                        specifier: source.value.to_string(),
                        link: Link::ReexportNamed(pairs),
                    });
                    continue;
                }

                match &decl.declaration {
                    Some(declaration) => {
                        let keyword = Edit::remove(decl.span.start, declaration.span().start);
                        scan.wrap_edits.push(keyword);
                        let mut names = Vec::new();
                        declared_names(declaration, &mut names);
                        scan.exports.extend(names.into_iter().map(|name| (name.clone(), name)));
                    }
                    None => {
                        scan.wrap_edits.push(Edit::remove(decl.span.start, decl.span.end));
                        scan.exports.extend(
                            decl.specifiers
                                .iter()
                                .filter(|s| !s.export_kind.is_type())
                                .map(|s| (export_name(&s.exported), export_name(&s.local))),
                        );
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                let inner = decl.declaration.span();
                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                        scan.wrap_edits.push(Edit::remove(decl.span.start, decl.span.end));
                        continue;
                    }
                    _ => None,
                };

                match named {
                    Some(local) => {
                        scan.wrap_edits.push(Edit::remove(decl.span.start, inner.start));
                        scan.exports.push(("default".to_string(), local));
                    }
                    None => {
                        scan.wrap_edits.push(Edit::replace(
                            decl.span.start,
                            inner.start,
                            format!("const {} = ", DEFAULT_LOCAL),
                        ));
                        scan.wrap_edits.push(Edit::insert(inner.end, ";"));
                        scan.exports.push(("default".to_string(), DEFAULT_LOCAL.to_string()));
                    }
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                if decl.export_kind.is_type() {
                    scan.wrap_edits.push(Edit::remove(decl.span.start, decl.span.end));
                    continue;
                }

                let link = match &decl.exported {
                    Some(name) => Link::ReexportNamespace(export_name(name)),
                    None => Link::ReexportAll,
                };
                scan.links.push(ModuleLink {
                    start: decl.span.start,
                    end: decl.span.end,
                    specifier: decl.source.value.to_string(),
                    link,
                });
            }
            _ => {}
        }
    }

    scan
}

/// Rewrite one link into registry lookups.
///
/// `index` keeps the module variable unique within the importing module.
/// Re-exports of a wrapped module become getters in `exports`; the entry
/// keeps real `export` statements.
pub(crate) fn link_edit(
    link: &ModuleLink,
    id: &str,
    index: usize,
    wrapped: bool,
    exports: &mut Vec<(String, String)>,
) -> Result<Edit, String> {
    let module = format!("__brisk_m{}", index);
    let require = format!("const {} = {}({});", module, REQUIRE, literal(id));

    let text = match &link.link {
        Link::Import(bindings) if bindings.is_empty() => {
            format!("{}({});", REQUIRE, literal(id))
        }
        Link::Import(bindings) => {
            let mut text = require;
            for binding in bindings {
                let (local, value) = match binding {
                    Binding::Default(local) => (local, member(&module, "default")),
                    Binding::Namespace(local) => (local, module.clone()),
                    Binding::Named { imported, local } => (local, member(&module, imported)),
                };
                text.push_str(&format!(" const {} = {};", local, value));
            }
            text
        }
        Link::ReexportNamed(pairs) if wrapped => {
            exports.extend(
                pairs
                    .iter()
                    .map(|(imported, exported)| (exported.clone(), member(&module, imported))),
            );
            require
        }
        Link::ReexportNamed(pairs) => {
            let mut text = require;
            for (n, (imported, exported)) in pairs.iter().enumerate() {
                let local = format!("__brisk_r{}_{}", index, n);
                text.push_str(&format!(
                    " const {} = {}; export {{ {} as {} }};",
                    local,
                    member(&module, imported),
                    local,
                    export_ident(exported)
                ));
            }
            text
        }
        Link::ReexportNamespace(name) if wrapped => {
            exports.push((name.clone(), module.clone()));
            require
        }
        Link::ReexportNamespace(name) => {
            format!("{} export {{ {} as {} }};", require, module, export_ident(name))
        }
        Link::ReexportAll if wrapped => {
            format!("{} __brisk_reexport({}, {});", require, EXPORTS, module)
        }
        Link::ReexportAll => {
            return Err(format!(
                "`export * from '{}'` cannot be bundled into an entry; re-export the names explicitly",
                link.specifier
            ));
        }
    };

    Ok(Edit::replace(link.start, link.end, text))
}

/// Statement defining the export getters of a wrapped module.
pub(crate) fn export_prologue(exports: &[(String, String)]) -> String {
    if exports.is_empty() {
        return String::new();
    }

    let getters: Vec<String> = exports
        .iter()
        .map(|(name, local)| format!("{}: () => {}", literal(name), local))
        .collect();
    format!("__brisk_export({}, {{ {} }});", EXPORTS, getters.join(", "))
}

/// Stable id of a module: its path relative to the entry's directory.
pub(crate) fn module_id(path: &Path, base: &Path) -> String {
    let path: Vec<Component<'_>> = path.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    let common = path.iter().zip(&base).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> =
        std::iter::repeat_n("..".to_string(), base.len() - common).collect();
    parts.extend(
        path[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declared_names(declaration: &Declaration<'_>, names: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) if !var.declare => {
            for declarator in &var.declarations {
                pattern_names(&declarator.id, names);
            }
        }
        Declaration::FunctionDeclaration(func) if !func.declare => {
            names.extend(func.id.iter().map(|id| id.name.to_string()));
        }
        Declaration::ClassDeclaration(class) if !class.declare => {
            names.extend(class.id.iter().map(|id| id.name.to_string()));
        }
        Declaration::TSEnumDeclaration(decl) if !decl.declare => {
            names.push(decl.id.name.to_string());
        }
        _ => {}
    }
}

fn pattern_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                pattern_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                pattern_names(element, names);
            }
            if let Some(rest) = &array.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => pattern_names(&assign.left, names),
    }
}

/// JS string literal. serde_json escaping is valid JS syntax.
pub(crate) fn literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

fn member(object: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{}.{}", object, name)
    } else {
        format!("{}[{}]", object, literal(name))
    }
}

fn export_ident(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        literal(name)
    }
}
