//! Rule-based converters.
//!
//! A rule matches a (source, destination) pair by predicate instead of by
//! exact registration, covering families of conversions with one entry.
//! Rules are consulted in registration order; the first match wins.

use std::any::{type_name, Any, TypeId};

use super::hierarchy::TypeHierarchy;
use crate::error::BoxError;

type RuleMatcherFn = Box<dyn Fn(&TypeHierarchy, TypeId, TypeId) -> bool>;
type RuleConvertFn = Box<dyn Fn(&TypeHierarchy, &dyn Any, TypeId) -> Result<Box<dyn Any>, BoxError>>;

/// A predicate-matched converter.
pub struct ConverterRule {
    matcher: RuleMatcherFn,
    convert: RuleConvertFn,
}

impl ConverterRule {
    /// Creates a rule from a matcher predicate and a conversion function.
    ///
    /// The conversion function receives the hierarchy, the source value, and
    /// the requested destination type.
    pub fn new(
        matcher: impl Fn(&TypeHierarchy, TypeId, TypeId) -> bool + 'static,
        convert: impl Fn(&TypeHierarchy, &dyn Any, TypeId) -> Result<Box<dyn Any>, BoxError> + 'static,
    ) -> Self {
        ConverterRule {
            matcher: Box::new(matcher),
            convert: Box::new(convert),
        }
    }

    /// Returns true if this rule applies to the given type pair.
    pub fn can_convert(&self, hierarchy: &TypeHierarchy, src: TypeId, dst: TypeId) -> bool {
        (self.matcher)(hierarchy, src, dst)
    }

    /// Runs the rule's conversion function.
    pub(crate) fn apply(
        &self,
        hierarchy: &TypeHierarchy,
        value: &dyn Any,
        dst: TypeId,
    ) -> Result<Box<dyn Any>, BoxError> {
        (self.convert)(hierarchy, value, dst)
    }

    /// Rule matching any source type converted to the fixed destination `D`.
    ///
    /// The conversion function receives the raw, untyped source value.
    pub fn any_source_fixed_destination<D: Any>(
        convert: impl Fn(&dyn Any) -> Result<D, BoxError> + 'static,
    ) -> Self {
        ConverterRule::new(
            |_hierarchy, _src, dst| dst == TypeId::of::<D>(),
            move |_hierarchy, value, _dst| {
                convert(value).map(|d| Box::new(d) as Box<dyn Any>)
            },
        )
    }

    /// Rule matching any source assignable to `S` (per the hierarchy),
    /// converted to the fixed destination `D`.
    ///
    /// The source value is upcast to its `S` view before conversion.
    pub fn assignable_source_fixed_destination<S: Any, D: Any>(
        convert: impl Fn(&S) -> Result<D, BoxError> + 'static,
    ) -> Self {
        ConverterRule::new(
            |hierarchy, src, dst| {
                dst == TypeId::of::<D>() && hierarchy.is_assignable(src, TypeId::of::<S>())
            },
            move |hierarchy, value, _dst| {
                if let Some(s) = value.downcast_ref::<S>() {
                    return convert(s).map(|d| Box::new(d) as Box<dyn Any>);
                }
                let upcast = hierarchy
                    .upcast_path(value.type_id(), TypeId::of::<S>())
                    .ok_or_else(|| {
                        BoxError::from(format!(
                            "source value is not assignable to {}",
                            type_name::<S>()
                        ))
                    })?;
                let view = upcast(value).ok_or_else(|| {
                    BoxError::from(format!("upcast to {} failed", type_name::<S>()))
                })?;
                let s = view.downcast_ref::<S>().ok_or_else(|| {
                    BoxError::from(format!("upcast produced a value that is not {}", type_name::<S>()))
                })?;
                convert(s).map(|d| Box::new(d) as Box<dyn Any>)
            },
        )
    }

    /// Rule matching the fixed source `S` converted to any destination that
    /// `D` is assignable to (per the hierarchy).
    ///
    /// The produced `D` is upcast to the requested destination.
    pub fn fixed_source_assignable_destination<S: Any, D: Any>(
        convert: impl Fn(&S) -> Result<D, BoxError> + 'static,
    ) -> Self {
        ConverterRule::new(
            |hierarchy, src, dst| {
                src == TypeId::of::<S>() && hierarchy.is_assignable(TypeId::of::<D>(), dst)
            },
            move |hierarchy, value, dst| {
                let s = value.downcast_ref::<S>().ok_or_else(|| {
                    BoxError::from(format!("value is not a {}", type_name::<S>()))
                })?;
                let produced = convert(s)?;
                if dst == TypeId::of::<D>() {
                    return Ok(Box::new(produced) as Box<dyn Any>);
                }
                let upcast = hierarchy
                    .upcast_path(TypeId::of::<D>(), dst)
                    .ok_or_else(|| {
                        BoxError::from(format!(
                            "no upcast from {} to the requested destination",
                            type_name::<D>()
                        ))
                    })?;
                upcast(&produced).ok_or_else(|| {
                    BoxError::from(format!("upcast of produced {} failed", type_name::<D>()))
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Inches(f64);
    #[derive(Debug, Clone, PartialEq)]
    struct Length(f64);

    fn hierarchy() -> TypeHierarchy {
        let mut h = TypeHierarchy::new();
        h.register_ancestor(|i: &Inches| Length(i.0 * 25.4));
        h
    }

    #[test]
    fn test_any_source_fixed_destination_matches_by_destination() {
        let h = hierarchy();
        let rule = ConverterRule::any_source_fixed_destination::<String>(|_value| {
            Ok("anything".to_string())
        });

        assert!(rule.can_convert(&h, TypeId::of::<Inches>(), TypeId::of::<String>()));
        assert!(rule.can_convert(&h, TypeId::of::<i32>(), TypeId::of::<String>()));
        assert!(!rule.can_convert(&h, TypeId::of::<Inches>(), TypeId::of::<i32>()));
    }

    #[test]
    fn test_assignable_source_sees_upcast_view() {
        let h = hierarchy();
        let rule = ConverterRule::assignable_source_fixed_destination::<Length, String>(
            |length| Ok(format!("{}mm", length.0)),
        );

        assert!(rule.can_convert(&h, TypeId::of::<Inches>(), TypeId::of::<String>()));
        assert!(rule.can_convert(&h, TypeId::of::<Length>(), TypeId::of::<String>()));
        assert!(!rule.can_convert(&h, TypeId::of::<i32>(), TypeId::of::<String>()));

        let out = rule
            .apply(&h, &Inches(2.0), TypeId::of::<String>())
            .unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "50.8mm");
    }

    #[test]
    fn test_fixed_source_assignable_destination_upcasts_result() {
        let h = hierarchy();
        let rule = ConverterRule::fixed_source_assignable_destination::<f64, Inches>(
            |value| Ok(Inches(*value)),
        );

        assert!(rule.can_convert(&h, TypeId::of::<f64>(), TypeId::of::<Inches>()));
        // Inches is assignable to Length, so the rule also serves Length
        assert!(rule.can_convert(&h, TypeId::of::<f64>(), TypeId::of::<Length>()));
        assert!(!rule.can_convert(&h, TypeId::of::<i32>(), TypeId::of::<Length>()));

        let out = rule.apply(&h, &2.0f64, TypeId::of::<Length>()).unwrap();
        assert_eq!(out.downcast_ref::<Length>(), Some(&Length(50.8)));
    }
}
