//! The type model: representation, assignability, promotion, unification.

use crate::classes::ClassRegistry;
use std::fmt;
use thiserror::Error;

/// A CompilScript type
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Integer,
    Float,
    Str,
    Boolean,
    Void,
    /// Class type, preserving the declared casing
    Class(String),
    /// Array of a scalar element type with rank >= 1
    Array { elem: Box<Type>, rank: u32 },
    /// Type of the `null` literal; assignable to reference types only
    Null,
    /// Polymorphic placeholder: the element type of an empty array literal,
    /// the parameter type of `print`, and the recovery type after an error
    Any,
}

impl Type {
    /// Build an array type over a scalar element
    pub fn array(elem: Type, rank: u32) -> Type {
        debug_assert!(rank >= 1);
        Type::Array {
            elem: Box::new(elem),
            rank,
        }
    }

    /// True for `integer` and `float`
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// True for class and array types (the targets `null` can reach)
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array { .. })
    }

    /// True when this type (or its element type) is the `Any` placeholder
    pub fn contains_any(&self) -> bool {
        match self {
            Type::Any => true,
            Type::Array { elem, .. } => elem.contains_any(),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::Str => write!(f, "string"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array { elem, rank } => {
                write!(f, "{}", elem)?;
                for _ in 0..*rank {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Type::Null => write!(f, "null"),
            Type::Any => write!(f, "any"),
        }
    }
}

/// Failures of the type operations
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("type `{0}` is not an array")]
    NotAnArray(Type),

    #[error("operands `{0}` and `{1}` are not both numeric")]
    NotNumeric(Type, Type),

    #[error("array elements have no common type")]
    HeterogeneousArray,
}

/// Is `actual` assignable to a target of type `target`?
///
/// Direction matters: `integer` goes into `float`, never the reverse;
/// a subclass goes into its ancestor, never the reverse.
pub fn compatible_assign(registry: &ClassRegistry, target: &Type, actual: &Type) -> bool {
    // `Any` absorbs both directions: it is the recovery type and the
    // built-in `print` parameter.
    match (target, actual) {
        (Type::Any, t) => return *t != Type::Void,
        (_, Type::Any) => return true,
        _ => {}
    }

    if target == actual {
        return true;
    }

    match (target, actual) {
        (Type::Float, Type::Integer) => true,
        (t, Type::Null) => t.is_reference(),
        (Type::Class(t), Type::Class(u)) => registry.is_subclass(u, t),
        (
            Type::Array {
                elem: te, rank: tr, ..
            },
            Type::Array {
                elem: ae, rank: ar, ..
            },
        ) => {
            // An empty literal (`any` element) fits any array target.
            if ae.contains_any() {
                return true;
            }
            tr == ar && compatible_assign(registry, te, ae)
        }
        _ => false,
    }
}

/// Numeric promotion for `+ - * /`: float wins, else integer
pub fn promote_numeric(a: &Type, b: &Type) -> Result<Type, TypeError> {
    if matches!(a, Type::Any) || matches!(b, Type::Any) {
        return Ok(Type::Any);
    }
    if !a.is_numeric() || !b.is_numeric() {
        return Err(TypeError::NotNumeric(a.clone(), b.clone()));
    }
    if *a == Type::Float || *b == Type::Float {
        Ok(Type::Float)
    } else {
        Ok(Type::Integer)
    }
}

/// Element type of one indexing step: rank drops by one
pub fn element_type(array: &Type) -> Result<Type, TypeError> {
    match array {
        Type::Array { elem, rank } if *rank == 1 => Ok((**elem).clone()),
        Type::Array { elem, rank } => Ok(Type::Array {
            elem: elem.clone(),
            rank: rank - 1,
        }),
        Type::Any => Ok(Type::Any),
        other => Err(TypeError::NotAnArray(other.clone())),
    }
}

/// Least type every element of an array literal is assignable to
///
/// Pairwise widening over the element list: numeric widening, class
/// upcasting to the nearest common ancestor, `null` folding into any
/// reference type. An empty list yields `Any`, resolved by context.
pub fn unify_array_elements(registry: &ClassRegistry, types: &[Type]) -> Result<Type, TypeError> {
    let mut iter = types.iter();
    let mut acc = match iter.next() {
        Some(first) => first.clone(),
        None => return Ok(Type::Any),
    };
    for ty in iter {
        acc = widen(registry, &acc, ty).ok_or(TypeError::HeterogeneousArray)?;
    }
    Ok(acc)
}

/// Least common type of a pair, if one exists
pub fn widen(registry: &ClassRegistry, a: &Type, b: &Type) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    if compatible_assign(registry, a, b) {
        return Some(a.clone());
    }
    if compatible_assign(registry, b, a) {
        return Some(b.clone());
    }
    if let (Type::Class(ca), Type::Class(cb)) = (a, b) {
        // Nearest ancestor of `a` that also covers `b`.
        let mut current = Some(ca.clone());
        let mut steps = 0;
        while let Some(name) = current {
            if registry.is_subclass(cb, &name) {
                return Some(Type::Class(name));
            }
            current = registry.superclass_of(&name);
            steps += 1;
            if steps > registry.len() {
                break;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ClassMeta, ClassRegistry};
    use quickcheck::{Arbitrary, Gen};

    fn registry_with_animals() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register(ClassMeta::new("Animal", csc_util::Span::DUMMY));
        registry.register(ClassMeta::new("Dog", csc_util::Span::DUMMY));
        registry.register(ClassMeta::new("Cat", csc_util::Span::DUMMY));
        registry.set_superclass("Dog", "Animal");
        registry.set_superclass("Cat", "Animal");
        registry
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::Integer.to_string(), "integer");
        assert_eq!(Type::array(Type::Float, 2).to_string(), "float[][]");
        assert_eq!(Type::Class("Dog".into()).to_string(), "Dog");
    }

    #[test]
    fn test_widening_is_one_way() {
        let registry = ClassRegistry::new();
        assert!(compatible_assign(&registry, &Type::Float, &Type::Integer));
        assert!(!compatible_assign(&registry, &Type::Integer, &Type::Float));
    }

    #[test]
    fn test_class_upcast() {
        let registry = registry_with_animals();
        let animal = Type::Class("Animal".into());
        let dog = Type::Class("Dog".into());
        assert!(compatible_assign(&registry, &animal, &dog));
        assert!(!compatible_assign(&registry, &dog, &animal));
    }

    #[test]
    fn test_null_assignability() {
        let registry = registry_with_animals();
        assert!(compatible_assign(
            &registry,
            &Type::Class("Dog".into()),
            &Type::Null
        ));
        assert!(compatible_assign(
            &registry,
            &Type::array(Type::Integer, 1),
            &Type::Null
        ));
        assert!(!compatible_assign(&registry, &Type::Integer, &Type::Null));
        assert!(!compatible_assign(&registry, &Type::Str, &Type::Null));
    }

    #[test]
    fn test_array_rank_is_invariant() {
        let registry = ClassRegistry::new();
        let one = Type::array(Type::Integer, 1);
        let two = Type::array(Type::Integer, 2);
        assert!(!compatible_assign(&registry, &one, &two));
        assert!(!compatible_assign(&registry, &two, &one));
    }

    #[test]
    fn test_array_element_widening() {
        let registry = registry_with_animals();
        // integer[] fits float[]; Dog[] fits Animal[].
        assert!(compatible_assign(
            &registry,
            &Type::array(Type::Float, 1),
            &Type::array(Type::Integer, 1)
        ));
        assert!(compatible_assign(
            &registry,
            &Type::array(Type::Class("Animal".into()), 1),
            &Type::array(Type::Class("Dog".into()), 1)
        ));
        assert!(!compatible_assign(
            &registry,
            &Type::array(Type::Integer, 1),
            &Type::array(Type::Float, 1)
        ));
    }

    #[test]
    fn test_empty_literal_fits_any_array() {
        let registry = ClassRegistry::new();
        let empty = Type::array(Type::Any, 1);
        assert!(compatible_assign(
            &registry,
            &Type::array(Type::Str, 2),
            &empty
        ));
    }

    #[test]
    fn test_element_type() {
        assert_eq!(
            element_type(&Type::array(Type::Integer, 1)),
            Ok(Type::Integer)
        );
        assert_eq!(
            element_type(&Type::array(Type::Integer, 3)),
            Ok(Type::array(Type::Integer, 2))
        );
        assert_eq!(
            element_type(&Type::Boolean),
            Err(TypeError::NotAnArray(Type::Boolean))
        );
    }

    #[test]
    fn test_unify_numeric_elements() {
        let registry = ClassRegistry::new();
        assert_eq!(
            unify_array_elements(&registry, &[Type::Integer, Type::Float, Type::Integer]),
            Ok(Type::Float)
        );
    }

    #[test]
    fn test_unify_class_elements_to_common_ancestor() {
        let registry = registry_with_animals();
        assert_eq!(
            unify_array_elements(
                &registry,
                &[Type::Class("Dog".into()), Type::Class("Cat".into())]
            ),
            Ok(Type::Class("Animal".into()))
        );
    }

    #[test]
    fn test_unify_heterogeneous_fails() {
        let registry = ClassRegistry::new();
        assert_eq!(
            unify_array_elements(&registry, &[Type::Integer, Type::Str, Type::Boolean]),
            Err(TypeError::HeterogeneousArray)
        );
    }

    #[test]
    fn test_unify_empty_is_any() {
        let registry = ClassRegistry::new();
        assert_eq!(unify_array_elements(&registry, &[]), Ok(Type::Any));
    }

    // ------------------------------------------------------------------
    // Property: numeric promotion law
    // ------------------------------------------------------------------

    #[derive(Clone, Copy, Debug)]
    struct NumericType(bool); // true = float

    impl Arbitrary for NumericType {
        fn arbitrary(g: &mut Gen) -> Self {
            NumericType(bool::arbitrary(g))
        }
    }

    impl From<NumericType> for Type {
        fn from(n: NumericType) -> Type {
            if n.0 {
                Type::Float
            } else {
                Type::Integer
            }
        }
    }

    quickcheck::quickcheck! {
        fn prop_promotion_law(a: NumericType, b: NumericType) -> bool {
            let ta: Type = a.into();
            let tb: Type = b.into();
            let promoted = promote_numeric(&ta, &tb).unwrap();
            if ta == Type::Float || tb == Type::Float {
                promoted == Type::Float
            } else {
                promoted == Type::Integer
            }
        }

        fn prop_promotion_commutes(a: NumericType, b: NumericType) -> bool {
            let ta: Type = a.into();
            let tb: Type = b.into();
            promote_numeric(&ta, &tb) == promote_numeric(&tb, &ta)
        }
    }

    #[test]
    fn test_promote_rejects_non_numeric() {
        assert!(promote_numeric(&Type::Str, &Type::Integer).is_err());
        assert!(promote_numeric(&Type::Boolean, &Type::Boolean).is_err());
    }
}
