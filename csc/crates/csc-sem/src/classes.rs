//! Class registry: metadata, inheritance links, and resolution.
//!
//! All ancestor walks are iterative and bounded by the number of registered
//! classes, so a cyclic hierarchy (reported separately as a diagnostic)
//! can never hang or overflow the stack.

use crate::types::Type;
use csc_util::Span;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

/// Signature of a declared method
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSig {
    pub name: String,
    /// Parameter names and types, in declaration order
    pub params: Vec<(String, Type)>,
    pub ret: Type,
    pub span: Span,
}

impl MethodSig {
    /// Number of declared parameters (without the implicit `this`)
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Metadata record for one declared class
#[derive(Clone, Debug)]
pub struct ClassMeta {
    pub name: String,
    pub superclass: Option<String>,
    /// Ordered own fields (not including inherited ones)
    pub fields: IndexMap<String, Type>,
    /// Ordered own method table (not including inherited ones)
    pub methods: IndexMap<String, MethodSig>,
    /// True when the user declared a `constructor` method
    pub has_constructor: bool,
    /// Declaration site of the class name
    pub span: Span,
}

impl ClassMeta {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            fields: IndexMap::new(),
            methods: IndexMap::new(),
            has_constructor: false,
            span,
        }
    }
}

/// All classes of one compilation, in declaration order
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassMeta>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Register a class; returns false when the name is already taken
    pub fn register(&mut self, meta: ClassMeta) -> bool {
        if self.classes.contains_key(&meta.name) {
            return false;
        }
        self.classes.insert(meta.name.clone(), meta);
        true
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<&ClassMeta> {
        self.classes.get(name)
    }

    /// Mutable lookup, used while populating metadata
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassMeta> {
        self.classes.get_mut(name)
    }

    /// True when `name` is a registered class
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterate classes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ClassMeta> {
        self.classes.values()
    }

    /// Direct superclass name, if any
    pub fn superclass_of(&self, name: &str) -> Option<String> {
        self.classes.get(name)?.superclass.clone()
    }

    /// Set the superclass link (populate pass and tests)
    pub fn set_superclass(&mut self, name: &str, superclass: &str) {
        if let Some(meta) = self.classes.get_mut(name) {
            meta.superclass = Some(superclass.to_string());
        }
    }

    /// Reflexive, transitive subclass test
    pub fn is_subclass(&self, child: &str, ancestor: &str) -> bool {
        if child == ancestor {
            return self.contains(child);
        }
        let mut seen = FxHashSet::default();
        let mut current = self.superclass_of(child);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            if !seen.insert(name.clone()) || seen.len() > self.len() {
                return false;
            }
            current = self.superclass_of(&name);
        }
        false
    }

    /// Detect whether `name` sits on an inheritance cycle
    pub fn has_cycle(&self, name: &str) -> bool {
        let mut seen = FxHashSet::default();
        seen.insert(name.to_string());
        let mut current = self.superclass_of(name);
        while let Some(next) = current {
            if !seen.insert(next.clone()) {
                return true;
            }
            if seen.len() > self.len() {
                return true;
            }
            current = self.superclass_of(&next);
        }
        false
    }

    /// Resolve a field in `class` or its ancestors
    ///
    /// Returns the field type and the name of the defining class.
    pub fn lookup_field(&self, class: &str, field: &str) -> Option<(Type, String)> {
        for owner in self.ancestry(class) {
            if let Some(ty) = self.classes.get(&owner).and_then(|m| m.fields.get(field)) {
                return Some((ty.clone(), owner));
            }
        }
        None
    }

    /// Resolve a method in `class` or its ancestors
    ///
    /// The defining class name is what static dispatch qualifies the call
    /// with (`<Owner>_<method>`).
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<(MethodSig, String)> {
        for owner in self.ancestry(class) {
            if let Some(sig) = self.classes.get(&owner).and_then(|m| m.methods.get(method)) {
                return Some((sig.clone(), owner));
            }
        }
        None
    }

    /// Constructor signature for `new C(..)`
    ///
    /// Resolved through the ancestry like any other method, so a subclass
    /// without its own constructor is built with its parent's.
    pub fn constructor_of(&self, class: &str) -> Option<MethodSig> {
        self.lookup_method(class, "constructor").map(|(sig, _)| sig)
    }

    /// `class` followed by its ancestors, nearest first, cycle-bounded
    pub fn ancestry(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            if !seen.insert(name.clone()) || chain.len() > self.len() {
                break;
            }
            current = self.superclass_of(&name);
            chain.push(name);
        }
        chain
    }

    /// All fields of a class including inherited ones, root ancestor first
    ///
    /// This is the heap layout order: a subclass instance starts with its
    /// ancestors' fields as a prefix.
    pub fn fields_with_inherited(&self, class: &str) -> Vec<(String, Type)> {
        let mut chain = self.ancestry(class);
        chain.reverse();
        let mut fields = Vec::new();
        for name in chain {
            if let Some(meta) = self.classes.get(&name) {
                for (field, ty) in &meta.fields {
                    fields.push((field.clone(), ty.clone()));
                }
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str, params: Vec<(&str, Type)>, ret: Type) -> MethodSig {
        MethodSig {
            name: name.to_string(),
            params: params
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect(),
            ret,
            span: Span::DUMMY,
        }
    }

    fn hierarchy() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        let mut animal = ClassMeta::new("Animal", Span::DUMMY);
        animal.fields.insert("name".into(), Type::Str);
        animal
            .methods
            .insert("speak".into(), sig("speak", vec![], Type::Str));
        registry.register(animal);

        let mut dog = ClassMeta::new("Dog", Span::DUMMY);
        dog.superclass = Some("Animal".into());
        dog.fields.insert("breed".into(), Type::Str);
        registry.register(dog);
        registry
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ClassRegistry::new();
        assert!(registry.register(ClassMeta::new("A", Span::DUMMY)));
        assert!(!registry.register(ClassMeta::new("A", Span::DUMMY)));
    }

    #[test]
    fn test_subclass_reflexive_and_transitive() {
        let mut registry = hierarchy();
        let mut puppy = ClassMeta::new("Puppy", Span::DUMMY);
        puppy.superclass = Some("Dog".into());
        registry.register(puppy);

        assert!(registry.is_subclass("Dog", "Dog"));
        assert!(registry.is_subclass("Puppy", "Dog"));
        assert!(registry.is_subclass("Puppy", "Animal"));
        assert!(!registry.is_subclass("Animal", "Puppy"));
        assert!(!registry.is_subclass("Ghost", "Ghost"));
    }

    #[test]
    fn test_cycle_detection_terminates() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassMeta::new("A", Span::DUMMY));
        registry.register(ClassMeta::new("B", Span::DUMMY));
        registry.set_superclass("A", "B");
        registry.set_superclass("B", "A");

        assert!(registry.has_cycle("A"));
        assert!(registry.has_cycle("B"));
        // is_subclass must not loop forever either.
        assert!(!registry.is_subclass("A", "C"));
    }

    #[test]
    fn test_self_cycle() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassMeta::new("Ouroboros", Span::DUMMY));
        registry.set_superclass("Ouroboros", "Ouroboros");
        assert!(registry.has_cycle("Ouroboros"));
    }

    #[test]
    fn test_inherited_field_lookup() {
        let registry = hierarchy();
        let (ty, owner) = registry.lookup_field("Dog", "name").unwrap();
        assert_eq!(ty, Type::Str);
        assert_eq!(owner, "Animal");

        let (_, owner) = registry.lookup_field("Dog", "breed").unwrap();
        assert_eq!(owner, "Dog");
        assert!(registry.lookup_field("Dog", "age").is_none());
    }

    #[test]
    fn test_method_resolution_reports_owner() {
        let mut registry = hierarchy();
        let (_, owner) = registry.lookup_method("Dog", "speak").unwrap();
        assert_eq!(owner, "Animal");

        // An override moves ownership to the subclass.
        registry
            .get_mut("Dog")
            .unwrap()
            .methods
            .insert("speak".into(), sig("speak", vec![], Type::Str));
        let (_, owner) = registry.lookup_method("Dog", "speak").unwrap();
        assert_eq!(owner, "Dog");
    }

    #[test]
    fn test_constructor_is_inherited() {
        let mut registry = hierarchy();
        registry.get_mut("Animal").unwrap().methods.insert(
            "constructor".into(),
            sig("constructor", vec![("n", Type::Str)], Type::Void),
        );
        let inherited = registry.constructor_of("Dog").unwrap();
        assert_eq!(inherited.arity(), 1);
        assert!(registry.constructor_of("Ghost").is_none());
    }

    #[test]
    fn test_heap_layout_puts_ancestor_fields_first() {
        let registry = hierarchy();
        let fields = registry.fields_with_inherited("Dog");
        let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "breed"]);
    }
}
