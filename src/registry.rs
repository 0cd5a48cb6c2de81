/// Project-wide class registry
///
/// Built by a pre-scan over the whole selection before any file is
/// transformed, so anchor resolution can answer "does a superclass declare
/// this hook?" without an IDE index. Only the hook methods named in the
/// configuration are recorded.
use std::collections::{HashMap, HashSet};

use crate::java::ast::{Param, SourceUnit, TypeDecl};

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
}

#[derive(Debug, Clone)]
struct ClassEntry {
    extends: Option<String>,
    hooks: Vec<HookSig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookSig {
    pub name: String,
    pub params: Vec<Param>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_unit(&mut self, unit: &SourceUnit, hook_names: &[String]) {
        for t in &unit.types {
            self.scan_type(t, hook_names);
        }
    }

    fn scan_type(&mut self, t: &TypeDecl, hook_names: &[String]) {
        let hooks = t
            .methods()
            .filter(|(_, m)| hook_names.iter().any(|h| h == &m.name))
            .map(|(_, m)| HookSig {
                name: m.name.clone(),
                params: m.params.clone(),
            })
            .collect();
        self.classes.insert(
            t.name.clone(),
            ClassEntry {
                extends: t.extends.clone(),
                hooks,
            },
        );
        for idx in t.nested_indices() {
            if let crate::java::ast::Member::Type(nested) = &t.members[idx] {
                self.scan_type(nested, hook_names);
            }
        }
    }

    /// Walk the extends chain of `class` looking for a declared hook.
    /// A visited set guards against inheritance cycles in broken sources.
    pub fn inherited_hook(&self, class: &TypeDecl, hook_names: &[String]) -> Option<&HookSig> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = class.extends.as_deref();
        while let Some(name) = current {
            if !seen.insert(name) {
                return None;
            }
            let entry = self.classes.get(name)?;
            if let Some(hook) = entry
                .hooks
                .iter()
                .find(|h| hook_names.iter().any(|n| n == &h.name))
            {
                return Some(hook);
            }
            current = entry.extends.as_deref();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::parser::parse_source;

    fn hooks() -> Vec<String> {
        vec!["stepAllViews".to_string()]
    }

    #[test]
    fn test_inherited_hook_found_through_chain() {
        let base = parse_source(
            "public class BaseActivity { protected void stepAllViews(View root, Bundle state) { } }",
        )
        .unwrap();
        let mid = parse_source("public class MidActivity extends BaseActivity { }").unwrap();
        let leaf = parse_source("public class LeafActivity extends MidActivity { }").unwrap();

        let mut registry = ClassRegistry::new();
        registry.scan_unit(&base, &hooks());
        registry.scan_unit(&mid, &hooks());
        registry.scan_unit(&leaf, &hooks());

        let hook = registry.inherited_hook(&leaf.types[0], &hooks()).unwrap();
        assert_eq!(hook.name, "stepAllViews");
        assert_eq!(hook.params.len(), 2);
        assert_eq!(hook.params[0].name, "root");
    }

    #[test]
    fn test_unknown_superclass_yields_none() {
        let leaf = parse_source("class Leaf extends SomethingUnscanned { }").unwrap();
        let registry = ClassRegistry::new();
        assert!(registry.inherited_hook(&leaf.types[0], &hooks()).is_none());
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let a = parse_source("class A extends B { }").unwrap();
        let b = parse_source("class B extends A { }").unwrap();
        let mut registry = ClassRegistry::new();
        registry.scan_unit(&a, &hooks());
        registry.scan_unit(&b, &hooks());
        assert!(registry.inherited_hook(&a.types[0], &hooks()).is_none());
    }
}
