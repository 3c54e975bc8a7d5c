//! Extractor output and the builder that keeps symbol ids unique.

use std::collections::HashSet;

use crate::model::{DocComment, Export, Import, Symbol};

/// Everything an extractor produces for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub module_doc: Option<DocComment>,
}

/// Accumulates extractor results for a single file.
///
/// Ids are `{file}:{qualified}`; a repeated qualified name (overloads,
/// redeclarations) gets a `#2`, `#3`, ... suffix.
pub struct ModuleBuilder {
    file_path: String,
    used_ids: HashSet<String>,
    output: ParseOutput,
}

impl ModuleBuilder {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            used_ids: HashSet::new(),
            output: ParseOutput::default(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Add a top-level symbol. Returns its assigned id.
    pub fn add(&mut self, symbol: Symbol) -> String {
        let qualified = symbol.name.clone();
        self.insert(symbol, &qualified, None)
    }

    /// Add a member nested under `parent_id`. Returns its assigned id.
    pub fn add_member(&mut self, parent_id: &str, symbol: Symbol) -> String {
        let parent_qualified = parent_id
            .strip_prefix(&self.file_path)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(parent_id);
        // Drop any collision suffix of the parent from the member path.
        let parent_qualified = parent_qualified.split('#').next().unwrap_or(parent_qualified);
        let qualified = format!("{}.{}", parent_qualified, symbol.name);
        self.insert(symbol, &qualified, Some(parent_id))
    }

    fn insert(&mut self, mut symbol: Symbol, qualified: &str, parent_id: Option<&str>) -> String {
        let base = format!("{}:{}", self.file_path, qualified);
        let mut id = base.clone();
        let mut n = 2;
        while self.used_ids.contains(&id) {
            id = format!("{}#{}", base, n);
            n += 1;
        }
        self.used_ids.insert(id.clone());

        symbol.id = id.clone();
        if let Some(parent) = parent_id {
            symbol.parent_id = Some(parent.to_string());
            if let Some(p) = self.output.symbols.iter_mut().find(|s| s.id == parent) {
                p.children.push(id.clone());
            }
        }
        self.output.symbols.push(symbol);
        id
    }

    /// Mutable access to an already added symbol.
    pub fn symbol_mut(&mut self, id: &str) -> Option<&mut Symbol> {
        self.output.symbols.iter_mut().find(|s| s.id == id)
    }

    /// Find the first top-level symbol with the given name.
    pub fn find_top_level(&self, name: &str) -> Option<&Symbol> {
        self.output
            .symbols
            .iter()
            .find(|s| s.parent_id.is_none() && s.name == name)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.output.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut [Symbol] {
        &mut self.output.symbols
    }

    pub fn import(&mut self, import: Import) {
        self.output.imports.push(import);
    }

    pub fn export(&mut self, export: Export) {
        self.output.exports.push(export);
    }

    pub fn exports(&self) -> &[Export] {
        &self.output.exports
    }

    pub fn set_module_doc(&mut self, doc: Option<DocComment>) {
        if self.output.module_doc.is_none() {
            self.output.module_doc = doc;
        }
    }

    /// Emit an `Export` for every exported top-level symbol that has none yet.
    pub fn export_flagged_symbols(&mut self) {
        let mut pending = Vec::new();
        for symbol in &self.output.symbols {
            if symbol.exported
                && symbol.parent_id.is_none()
                && !self
                    .output
                    .exports
                    .iter()
                    .any(|e| e.symbol_id.as_deref() == Some(symbol.id.as_str()))
            {
                pending.push(Export {
                    name: symbol.name.clone(),
                    symbol_id: Some(symbol.id.clone()),
                    ..Default::default()
                });
            }
        }
        self.output.exports.extend(pending);
    }

    pub fn finish(self) -> ParseOutput {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, SymbolKind};

    fn sym(name: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(name, kind, Location::at("a.java", 1, 1))
    }

    #[test]
    fn test_overloads_get_unique_ids() {
        let mut builder = ModuleBuilder::new("a.java");
        let class_id = builder.add(sym("Calc", SymbolKind::Class));
        let first = builder.add_member(&class_id, sym("add", SymbolKind::Method));
        let second = builder.add_member(&class_id, sym("add", SymbolKind::Method));

        assert_eq!(class_id, "a.java:Calc");
        assert_eq!(first, "a.java:Calc.add");
        assert_eq!(second, "a.java:Calc.add#2");

        let output = builder.finish();
        let class = &output.symbols[0];
        assert_eq!(class.children, vec![first.clone(), second.clone()]);
        assert_eq!(output.symbols[2].parent_id.as_deref(), Some("a.java:Calc"));
    }

    #[test]
    fn test_export_flagged_symbols_once() {
        let mut builder = ModuleBuilder::new("a.java");
        let mut s = sym("Api", SymbolKind::Class);
        s.exported = true;
        builder.add(s);
        builder.export_flagged_symbols();
        builder.export_flagged_symbols();
        let output = builder.finish();
        assert_eq!(output.exports.len(), 1);
        assert_eq!(output.exports[0].symbol_id.as_deref(), Some("a.java:Api"));
    }
}
