//! OXC-backed compiler.
//!
//! Each entry is linked with the script modules it imports, then every
//! module goes through the real pipeline:
//!
//! ```text
//! source → parse → link imports + stylesheets → parse → semantic
//!        → transform (TS/JSX → target) → [minify] → codegen
//! ```
//!
//! An entry without script imports compiles to itself. Otherwise its
//! dependencies are wrapped into a module registry ahead of it (see
//! [`linker`](super::linker)) and their source maps are concatenated.

use super::edits::{self, Edit};
use super::linker;
use super::style_imports::{self, StyleImport};
use super::{CompileOutput, Compiler, Diagnostic};
use crate::artifact::{Artifact, ArtifactKind};
use crate::discovery::{SourceEntry, SCRIPT_EXTENSIONS};
use crate::error::CompileError;
use crate::options::{CompileOptions, StylesheetHandling};
use crate::plugin::StylePlugin;
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_resolver::{ResolveOptions, Resolver};
use oxc_semantic::SemanticBuilder;
use oxc_sourcemap::{ConcatSourceMapBuilder, SourceMap};
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compiler built on the OXC parser, transformer, minifier and codegen.
pub struct OxcCompiler {
    target: String,
    transform: TransformOptions,
    resolve: ResolveOptions,
    plugins: Vec<Arc<dyn StylePlugin>>,
}

/// A module whose imports have been rewritten, ready to transpile.
struct LinkedModule {
    path: PathBuf,
    id: String,
    source: String,
    source_type: SourceType,
    stylesheets: Vec<String>,
}

struct Transpiled {
    id: String,
    code: String,
    map: Option<SourceMap>,
}

/// Everything one entry produced.
struct EntryOutput {
    script: String,
    source_map: Option<String>,
    stylesheet: Option<String>,
}

impl OxcCompiler {
    /// Create a compiler lowering syntax to `target` (e.g. `"es2020"`).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Init`] if the target string is not recognized.
    pub fn new(target: &str) -> Result<Self, CompileError> {
        let transform = TransformOptions::from_target(target)
            .map_err(|e| CompileError::Init(format!("invalid target '{}': {}", target, e)))?;

        let resolve = ResolveOptions {
            condition_names: vec![
                "import".into(),
                "module".into(),
                "browser".into(),
                "default".into(),
            ],
            extensions: SCRIPT_EXTENSIONS.iter().map(|ext| format!(".{}", ext)).collect(),
            extension_alias: vec![(
                ".js".into(),
                vec![".ts".into(), ".tsx".into(), ".js".into()],
            )],
            main_fields: vec!["browser".into(), "module".into(), "main".into()],
            ..Default::default()
        };

        Ok(Self {
            target: target.to_string(),
            transform,
            resolve,
            plugins: Vec::new(),
        })
    }

    /// Register a stylesheet plugin. Earlier plugins take precedence.
    pub fn with_plugin(mut self, plugin: impl StylePlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn plugins(&self) -> impl Iterator<Item = &dyn StylePlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    fn plugin_for(&self, path: &Path) -> Option<&dyn StylePlugin> {
        self.plugins().find(|p| p.accepts(path))
    }

    fn compile_entry(
        &self,
        entry: &SourceEntry,
        resolver: &Resolver,
        options: &CompileOptions,
    ) -> Result<EntryOutput, Vec<Diagnostic>> {
        // The resolver hands back canonical paths; key the graph the same way
        let entry_path =
            std::fs::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
        let base = entry_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut queue = VecDeque::from([entry_path.clone()]);
        let mut seen = HashSet::from([entry_path.clone()]);
        let mut modules = Vec::new();
        let mut diagnostics = Vec::new();

        while let Some(path) = queue.pop_front() {
            let wrapped = path != entry_path;
            match self.link_module(&path, &base, wrapped, resolver, options) {
                Ok((module, dependencies)) => {
                    for dependency in dependencies {
                        if dependency == entry_path {
                            diagnostics.push(Diagnostic::error(
                                &path,
                                format!(
                                    "Cannot import the entry '{}' back from its own dependency",
                                    entry.name
                                ),
                            ));
                        } else if seen.insert(dependency.clone()) {
                            queue.push_back(dependency);
                        }
                    }
                    modules.push(module);
                }
                Err(errors) => diagnostics.extend(errors),
            }
        }

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        let mut transpiled = Vec::with_capacity(modules.len());
        for (index, module) in modules.iter().enumerate() {
            match self.transpile(module, index > 0, options) {
                Ok(output) => transpiled.push(output),
                Err(errors) => diagnostics.extend(errors),
            }
        }

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        if modules.len() > 1 {
            tracing::debug!("Linked {} modules into {}", modules.len(), entry.name);
        }

        let (mut script, map) = bundle(transpiled);
        let source_map = match map {
            Some(map) if options.source_maps => {
                let map_file = format!("{}.js.map", file_basename(&entry.name));
                if !script.ends_with('\n') {
                    script.push('\n');
                }
                script.push_str(&format!("//# sourceMappingURL={}\n", map_file));
                Some(map.to_json_string())
            }
            _ => None,
        };

        // Dependencies' styles come before their importers'
        let extracted: Vec<&str> = modules
            .iter()
            .rev()
            .flat_map(|m| m.stylesheets.iter().map(String::as_str))
            .collect();
        let stylesheet = (!extracted.is_empty()).then(|| {
            let separator = if options.minify { "" } else { "\n" };
            extracted.join(separator)
        });

        Ok(EntryOutput {
            script,
            source_map,
            stylesheet,
        })
    }

    /// Resolve one module's imports and rewrite them into registry lookups.
    ///
    /// Returns the rewritten module and the resolved paths of the script
    /// modules it depends on.
    fn link_module(
        &self,
        path: &Path,
        base: &Path,
        wrapped: bool,
        resolver: &Resolver,
        options: &CompileOptions,
    ) -> Result<(LinkedModule, Vec<PathBuf>), Vec<Diagnostic>> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| vec![Diagnostic::error(path, format!("Failed to read source: {}", e))])?;

        let source_type = SourceType::from_path(path)
            .map_err(|e| vec![Diagnostic::error(path, format!("Unsupported file type: {}", e))])?;

        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, &source, source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            return Err(ret
                .errors
                .iter()
                .map(|e| Diagnostic::error(path, e.to_string()))
                .collect());
        }

        let style_imports = style_imports::collect(&ret.program).map_err(|errors| {
            errors
                .into_iter()
                .map(|message| Diagnostic::error(path, message))
                .collect::<Vec<_>>()
        })?;
        let scan = linker::scan(&ret.program);

        let (mut edits, stylesheets) = self.style_edits(path, &style_imports, options)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut exports = scan.exports;
        let mut dependencies = Vec::new();
        let mut diagnostics = Vec::new();

        for (index, link) in scan.links.iter().enumerate() {
            let resolved = match resolver.resolve(dir, &link.specifier) {
                Ok(resolution) => resolution.path().to_path_buf(),
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        path,
                        format!("Cannot resolve import '{}': {}", link.specifier, e),
                    ));
                    continue;
                }
            };

            if !is_script(&resolved) {
                diagnostics.push(Diagnostic::error(
                    path,
                    format!(
                        "Cannot bundle '{}': only script modules can be imported",
                        link.specifier
                    ),
                ));
                continue;
            }

            let id = linker::module_id(&resolved, base);
            match linker::link_edit(link, &id, index, wrapped, &mut exports) {
                Ok(edit) => edits.push(edit),
                Err(message) => diagnostics.push(Diagnostic::error(path, message)),
            }
            dependencies.push(resolved);
        }

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        if wrapped {
            edits.extend(scan.wrap_edits);
            let prologue = linker::export_prologue(&exports);
            if !prologue.is_empty() {
                edits.push(Edit::insert(0, prologue));
            }
        }

        let module = LinkedModule {
            path: path.to_path_buf(),
            id: linker::module_id(path, base),
            source: edits::apply(&source, edits),
            source_type,
            stylesheets,
        };
        Ok((module, dependencies))
    }

    fn transpile(
        &self,
        module: &LinkedModule,
        wrapped: bool,
        options: &CompileOptions,
    ) -> Result<Transpiled, Vec<Diagnostic>> {
        let path = module.path.as_path();
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, &module.source, module.source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            return Err(ret
                .errors
                .iter()
                .map(|e| Diagnostic::error(path, e.to_string()))
                .collect());
        }
        let mut program = ret.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let transformed = Transformer::new(&allocator, path, &self.transform)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(transformed
                .errors
                .iter()
                .map(|e| Diagnostic::error(path, e.to_string()))
                .collect());
        }

        if wrapped {
            // The JSX runtime import is injected by the transform itself
            let injected: Vec<Diagnostic> = program
                .body
                .iter()
                .filter_map(|statement| match statement {
                    Statement::ImportDeclaration(decl) => Some(Diagnostic::error(
                        path,
                        format!(
                            "Import of '{}' added by the transform cannot be bundled into a dependency",
                            decl.source.value
                        ),
                    )),
                    _ => None,
                })
                .collect();
            if !injected.is_empty() {
                return Err(injected);
            }
        }

        let scoping = if options.minify {
            Minifier::new(MinifierOptions::default())
                .minify(&allocator, &mut program)
                .scoping
        } else {
            None
        };

        let base_options = if options.minify {
            CodegenOptions::minify()
        } else {
            CodegenOptions::default()
        };
        let codegen_options = CodegenOptions {
            source_map_path: options.source_maps.then(|| path.to_path_buf()),
            ..base_options
        };

        let generated = Codegen::new()
            .with_options(codegen_options)
            .with_scoping(scoping)
            .build(&program);

        Ok(Transpiled {
            id: module.id.clone(),
            code: generated.code,
            map: generated.map,
        })
    }

    /// Inline or extract every stylesheet import. Returns the edits replacing
    /// the import statements and the extracted CSS (emit mode only).
    fn style_edits(
        &self,
        importer: &Path,
        imports: &[StyleImport],
        options: &CompileOptions,
    ) -> Result<(Vec<Edit>, Vec<String>), Vec<Diagnostic>> {
        let mut edits = Vec::with_capacity(imports.len());
        let mut extracted: Vec<String> = Vec::new();
        let mut diagnostics = Vec::new();

        for import in imports {
            let style_path = import.resolve(importer);
            let text = match std::fs::read_to_string(&style_path) {
                Ok(text) => text,
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        importer,
                        format!("Cannot read stylesheet '{}': {}", import.specifier, e),
                    ));
                    continue;
                }
            };

            let processed = match (self.plugin_for(&style_path), options.stylesheet_handling) {
                (Some(plugin), _) => {
                    match plugin.transform(&style_path, &text, options.minify) {
                        Ok(css) => css,
                        Err(e) => {
                            diagnostics.push(Diagnostic::error(&style_path, e.to_string()));
                            continue;
                        }
                    }
                }
                (None, StylesheetHandling::InlineAsText) => text,
                (None, StylesheetHandling::EmitCss) => {
                    diagnostics.push(Diagnostic::error(
                        &style_path,
                        "No stylesheet plugin accepts this file; cannot emit CSS",
                    ));
                    continue;
                }
            };

            let replacement = match options.stylesheet_handling {
                StylesheetHandling::InlineAsText => {
                    style_imports::inline_statement(import.binding.as_deref(), &processed)
                }
                StylesheetHandling::EmitCss => {
                    extracted.push(processed);
                    // Keep the binding valid for code that references it
                    import
                        .binding
                        .as_ref()
                        .map(|binding| format!("const {} = undefined;", binding))
                        .unwrap_or_default()
                }
            };
            edits.push(Edit::replace(import.start, import.end, replacement));
        }

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok((edits, extracted))
    }
}

/// Join transpiled modules into one script. The first module is the entry.
fn bundle(mut modules: Vec<Transpiled>) -> (String, Option<SourceMap>) {
    if modules.len() == 1 {
        let entry = modules.remove(0);
        return (entry.code, entry.map);
    }

    let entry = modules.remove(0);
    modules.sort_by(|a, b| a.id.cmp(&b.id));

    let mut code = String::from("const __brisk_modules = {\n");
    let mut maps: Vec<(SourceMap, u32)> = Vec::new();
    for module in modules {
        code.push_str(&format!(
            "{}: function ({}, {}) {{\n",
            linker::literal(&module.id),
            linker::EXPORTS,
            linker::REQUIRE
        ));
        push_chunk(&mut code, &mut maps, module);
        code.push_str("},\n");
    }
    code.push_str("};\n");
    code.push_str(linker::RUNTIME);
    push_chunk(&mut code, &mut maps, entry);

    let map = (!maps.is_empty()).then(|| {
        let parts: Vec<(&SourceMap, u32)> = maps.iter().map(|(map, line)| (map, *line)).collect();
        ConcatSourceMapBuilder::from_sourcemaps(&parts).into_sourcemap()
    });
    (code, map)
}

fn push_chunk(code: &mut String, maps: &mut Vec<(SourceMap, u32)>, module: Transpiled) {
    let line = code.matches('\n').count() as u32;
    if let Some(map) = module.map {
        maps.push((map, line));
    }
    code.push_str(&module.code);
    if !code.ends_with('\n') {
        code.push('\n');
    }
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

impl fmt::Debug for OxcCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OxcCompiler")
            .field("target", &self.target)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Compiler for OxcCompiler {
    fn name(&self) -> &str {
        "oxc"
    }

    fn compile(
        &self,
        entries: &[SourceEntry],
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompileError> {
        // Fresh resolver per call; its cache would miss files created since
        let resolver = Resolver::new(self.resolve.clone());
        let mut artifacts = Vec::new();
        let mut errors = Vec::new();

        for entry in entries {
            tracing::debug!("Compiling {} ({})", entry.name, entry.path.display());
            match self.compile_entry(entry, &resolver, options) {
                Ok(output) => {
                    artifacts.push(Artifact::new(
                        &entry.name,
                        ArtifactKind::Script,
                        output.script,
                    ));
                    if let Some(map) = output.source_map {
                        artifacts.push(Artifact::new(&entry.name, ArtifactKind::SourceMap, map));
                    }
                    if let Some(css) = output.stylesheet {
                        artifacts.push(Artifact::new(&entry.name, ArtifactKind::Stylesheet, css));
                    }
                }
                Err(diagnostics) => errors.extend(diagnostics),
            }
        }

        if !errors.is_empty() {
            return Err(CompileError::Failed {
                diagnostics: errors,
            });
        }

        artifacts.sort_by(|a, b| (&a.name, a.kind).cmp(&(&b.name, b.kind)));
        tracing::debug!(
            "Compiled {} entries into {} artifacts (destination: {})",
            entries.len(),
            artifacts.len(),
            options
                .destination
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "memory".to_string())
        );

        Ok(CompileOutput {
            artifacts,
            diagnostics: Vec::new(),
        })
    }
}

/// Last path segment of a logical name (`pages/about` → `about`).
fn file_basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
