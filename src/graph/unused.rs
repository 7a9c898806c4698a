// src/graph/unused.rs
//! Closed-world unused import / export detection.
//!
//! Only the analyzed files are consulted. A name used from outside the set
//! (another package, a test that was not indexed, reflection) looks unused.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::Resolver;
use crate::types::{FileRecord, SymbolKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedImport {
    pub file: PathBuf,
    pub specifier: String,
    /// The local binding that is never referenced.
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedExport {
    pub file: PathBuf,
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnusedReport {
    pub imports: Vec<UnusedImport>,
    pub exports: Vec<UnusedExport>,
}

impl UnusedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.exports.is_empty()
    }

    /// Keeps only findings located in `files`.
    #[must_use]
    pub fn restricted_to<'a>(mut self, files: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        let keep: HashSet<&Path> = files.into_iter().map(PathBuf::as_path).collect();
        self.imports.retain(|i| keep.contains(i.file.as_path()));
        self.exports.retain(|e| keep.contains(e.file.as_path()));
        self
    }
}

/// Names other files pull from each target.
#[derive(Default)]
struct References {
    named: HashMap<PathBuf, HashSet<String>>,
    /// Targets of `*`, `default` or module-level imports; every export counts as used.
    whole: HashSet<PathBuf>,
}

#[must_use]
pub fn detect(records: &[FileRecord], resolver: &Resolver) -> UnusedReport {
    let mut refs = References::default();
    let mut report = UnusedReport::default();

    for record in records {
        for decl in &record.imports {
            let Some(resolved) = resolver.resolve_binding(record, decl) else {
                continue;
            };
            if resolved.path != record.path {
                if resolved.module_binding {
                    refs.whole.insert(resolved.path);
                } else {
                    note_references(&mut refs, resolved.path, decl.imported_names());
                }
            }
            if decl.is_reexport {
                continue;
            }
            for name in &decl.names {
                if (name.is_wildcard() && name.alias.is_none()) || name.name == "self" {
                    continue;
                }
                if !record.uses_identifier(name.local()) {
                    report.imports.push(UnusedImport {
                        file: record.path.clone(),
                        specifier: decl.source_specifier.clone(),
                        name: name.local().to_string(),
                        line: decl.start_line,
                    });
                }
            }
        }
    }

    for record in records {
        if refs.whole.contains(&record.path) {
            continue;
        }
        let named = refs.named.get(&record.path);
        for symbol in record.exported_symbols() {
            if !named.is_some_and(|n| n.contains(&symbol.name)) {
                report.exports.push(UnusedExport {
                    file: record.path.clone(),
                    name: symbol.name.clone(),
                    kind: symbol.kind,
                    line: symbol.start_line,
                });
            }
        }
    }
    report
}

fn note_references<'a>(refs: &mut References, target: PathBuf, names: impl Iterator<Item = &'a str>) {
    for name in names {
        if matches!(name, "*" | "default" | "self") {
            refs.whole.insert(target.clone());
        } else {
            refs.named.entry(target.clone()).or_default().insert(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{path, record};
    use crate::types::{ImportedName, Symbol};

    fn export(name: &str) -> Symbol {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Function,
            start_line: 1,
            end_line: 1,
            is_exported: true,
            is_private: false,
        }
    }

    fn detect_all(records: &[FileRecord]) -> UnusedReport {
        detect(records, &Resolver::new(records, None))
    }

    #[test]
    fn unreferenced_import_bindings_are_reported() {
        let mut app = record("app.ts", &[("./util", &["used", "idle"]), ("react", &["useState"])]);
        app.usages.insert("used".into());
        let mut util = record("util.ts", &[]);
        util.symbols = vec![export("used"), export("idle"), export("orphan")];

        let report = detect_all(&[app, util]);
        let imports: Vec<_> = report.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(imports, vec!["idle"]);
        let exports: Vec<_> = report.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(exports, vec!["orphan"]);
    }

    #[test]
    fn aliases_are_checked_by_local_name() {
        let mut app = record("app.ts", &[]);
        app.imports = record("x.ts", &[("./util", &[])]).imports;
        app.imports[0].names = vec![ImportedName::aliased("helper", "h"), ImportedName::aliased("*", "ns")];
        app.usages.insert("h".into());
        let report = detect_all(&[app, record("util.ts", &[])]);
        assert_eq!(report.imports.len(), 1);
        assert_eq!(report.imports[0].name, "ns");
    }

    #[test]
    fn namespace_imports_mark_every_export_used() {
        let mut app = record("app.ts", &[]);
        app.imports = record("x.ts", &[("./util", &[])]).imports;
        app.imports[0].names = vec![ImportedName::aliased("*", "util")];
        app.usages.insert("util".into());
        let mut util = record("util.ts", &[]);
        util.symbols = vec![export("a"), export("b")];

        let report = detect_all(&[app, util]);
        assert!(report.is_empty());
    }

    #[test]
    fn python_module_import_keeps_module_exports_alive() {
        let mut main = record("pkg/main.py", &[(".", &["utils"])]);
        main.usages.insert("utils".into());
        let mut utils = record("pkg/utils.py", &[]);
        utils.symbols = vec![export("helper")];

        let report = detect_all(&[main, utils]);
        assert!(report.is_empty(), "{report:?}");
    }

    #[test]
    fn rust_submodule_import_keeps_module_exports_alive() {
        let mut trace = record("src/graph/trace.rs", &[("super", &["cycles"])]);
        trace.usages.insert("cycles".into());
        let mut cycles = record("src/graph/cycles.rs", &[]);
        cycles.symbols = vec![export("detect_cycles")];
        let records = [record("src/lib.rs", &[]), record("src/graph/mod.rs", &[]), trace, cycles];

        let report = detect_all(&records);
        assert!(!report.exports.iter().any(|e| e.name == "detect_cycles"), "{report:?}");
    }

    #[test]
    fn reexports_count_as_references_not_bindings() {
        let mut index = record("index.ts", &[("./util", &["a"])]);
        index.imports[0].is_reexport = true;
        let mut util = record("util.ts", &[]);
        util.symbols = vec![export("a")];

        let report = detect_all(&[index, util]);
        assert!(report.is_empty());
    }

    #[test]
    fn restriction_filters_by_file() {
        let mut a = record("a.ts", &[]);
        a.symbols = vec![export("x")];
        let mut b = record("b.ts", &[]);
        b.symbols = vec![export("y")];
        let report = detect_all(&[a, b]).restricted_to([path("b.ts")].iter());
        assert_eq!(report.exports.len(), 1);
        assert_eq!(report.exports[0].file, path("b.ts"));
    }
}
