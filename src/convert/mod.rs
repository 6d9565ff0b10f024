//! Pluggable type conversion.
//!
//! A [`TypeConverterRegistry`] resolves a converter for a (source,
//! destination) type pair in three stages:
//!
//! 1. Exact: the pair was registered directly.
//! 2. Rule-based: registered [`ConverterRule`]s are consulted in
//!    registration order; the first whose predicate matches wins.
//! 3. Fuzzy: the explicit [`TypeHierarchy`] is walked for an exact converter
//!    that becomes applicable through upcasts.
//!
//! The registry is a plain value with no global state. Registration happens
//! once at startup through [`ConverterRegistrar`] units; lookups afterward
//! are read-only and safe for concurrent readers as long as nobody
//! registers concurrently.

pub mod defaults;
mod hierarchy;
mod rule;

pub use defaults::CoreConverterRegistrar;
pub use hierarchy::TypeHierarchy;
pub use rule::ConverterRule;

use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{BoxError, Error, Result};
use hierarchy::UpcastFn;

type ExactConvertFn = Rc<dyn Fn(&dyn Any) -> std::result::Result<Box<dyn Any>, BoxError>>;

/// Populates a registry at startup.
///
/// Registrar units are the discovery seam: the process collects its
/// registrars and hands them to [`TypeConverterRegistry::init`] once.
pub trait ConverterRegistrar {
    /// Registers this unit's converters, rules, and hierarchy entries.
    fn register_converters(&self, registry: &mut TypeConverterRegistry) -> Result<()>;
}

/// Registry mapping (source type, destination type) pairs to converters.
///
/// Not thread-safe during registration; see the module docs.
pub struct TypeConverterRegistry {
    exact: FxHashMap<(TypeId, TypeId), ExactConvertFn>,
    rules: Vec<ConverterRule>,
    hierarchy: TypeHierarchy,
}

impl Default for TypeConverterRegistry {
    fn default() -> Self {
        TypeConverterRegistry {
            exact: FxHashMap::default(),
            rules: Vec::new(),
            hierarchy: TypeHierarchy::new(),
        }
    }
}

impl TypeConverterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry and populates it from the given registrars.
    pub fn init<'a>(
        registrars: impl IntoIterator<Item = &'a dyn ConverterRegistrar>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for registrar in registrars {
            registrar.register_converters(&mut registry)?;
        }
        Ok(registry)
    }

    /// Returns the type hierarchy used for fuzzy resolution.
    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// Returns a mutable reference to the type hierarchy.
    pub fn hierarchy_mut(&mut self) -> &mut TypeHierarchy {
        &mut self.hierarchy
    }

    /// Registers an infallible converter for the exact pair `(S, D)`.
    pub fn register<S: Any, D: Any>(&mut self, converter: impl Fn(&S) -> D + 'static) -> Result<()> {
        self.register_fallible(move |s: &S| Ok(converter(s)))
    }

    /// Registers a fallible converter for the exact pair `(S, D)`.
    ///
    /// Registering the same pair twice fails with
    /// [`Error::ConverterAlreadyRegistered`].
    pub fn register_fallible<S: Any, D: Any>(
        &mut self,
        converter: impl Fn(&S) -> std::result::Result<D, BoxError> + 'static,
    ) -> Result<()> {
        let pair = (TypeId::of::<S>(), TypeId::of::<D>());
        if self.exact.contains_key(&pair) {
            return Err(Error::ConverterAlreadyRegistered {
                source_type: type_name::<S>(),
                dest_type: type_name::<D>(),
            });
        }
        self.hierarchy.record_type::<S>();
        self.hierarchy.record_type::<D>();

        let erased: ExactConvertFn = Rc::new(move |value: &dyn Any| {
            let s = value.downcast_ref::<S>().ok_or_else(|| {
                BoxError::from(format!("value is not a {}", type_name::<S>()))
            })?;
            converter(s).map(|d| Box::new(d) as Box<dyn Any>)
        });
        self.exact.insert(pair, erased);
        Ok(())
    }

    /// Appends a rule. Rules are consulted in registration order.
    pub fn register_rule(&mut self, rule: ConverterRule) {
        self.rules.push(rule);
    }

    /// Returns the number of exactly registered converters.
    pub fn converter_count(&self) -> usize {
        self.exact.len()
    }

    /// Returns the number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Converts `value` to type `D`.
    pub fn convert<S: Any, D: Any>(&self, value: &S) -> Result<D> {
        let out = self.convert_erased(
            value,
            TypeId::of::<S>(),
            type_name::<S>(),
            TypeId::of::<D>(),
            type_name::<D>(),
        )?;
        match out.downcast::<D>() {
            Ok(d) => Ok(*d),
            Err(_) => Err(Error::ConversionFailed {
                source_type: type_name::<S>(),
                dest_type: type_name::<D>(),
                source: "converter produced a value of an unexpected type".into(),
            }),
        }
    }

    /// Converts an untyped value to the destination named by `dst`.
    ///
    /// Error messages use recorded type names, so unregistered types show up
    /// as `<unregistered type>`.
    pub fn convert_dynamic(&self, value: &dyn Any, dst: TypeId) -> Result<Box<dyn Any>> {
        let src = value.type_id();
        self.convert_erased(
            value,
            src,
            self.hierarchy.name_of(src),
            dst,
            self.hierarchy.name_of(dst),
        )
    }

    /// Removes every registered converter, rule, and hierarchy entry.
    ///
    /// Exists for test isolation; a cleared registry resolves nothing.
    pub fn clear(&mut self) {
        self.exact.clear();
        self.rules.clear();
        self.hierarchy.clear();
    }

    fn convert_erased(
        &self,
        value: &dyn Any,
        src: TypeId,
        src_name: &'static str,
        dst: TypeId,
        dst_name: &'static str,
    ) -> Result<Box<dyn Any>> {
        let failed = |cause: BoxError| Error::ConversionFailed {
            source_type: src_name,
            dest_type: dst_name,
            source: cause,
        };

        // 1. Exact match
        if let Some(exact) = self.exact.get(&(src, dst)) {
            return exact(value).map_err(failed);
        }

        // 2. Rules, in registration order
        for rule in &self.rules {
            if rule.can_convert(&self.hierarchy, src, dst) {
                return rule.apply(&self.hierarchy, value, dst).map_err(failed);
            }
        }

        // 3. Fuzzy resolution through the hierarchy
        if let Some(result) = self.convert_fuzzy(value, src, dst) {
            return result.map_err(failed);
        }

        Err(Error::NoConverterFound {
            source_type: src_name,
            dest_type: dst_name,
        })
    }

    /// Walks the source's ancestors (nearest first) against the destination
    /// and its registered descendants, looking for an exact converter that
    /// becomes applicable through upcasts.
    fn convert_fuzzy(
        &self,
        value: &dyn Any,
        src: TypeId,
        dst: TypeId,
    ) -> Option<std::result::Result<Box<dyn Any>, BoxError>> {
        let mut src_chain: Vec<(TypeId, Option<UpcastFn>)> = vec![(src, None)];
        src_chain.extend(
            self.hierarchy
                .ancestors_of(src)
                .into_iter()
                .map(|(id, upcast)| (id, Some(upcast))),
        );
        let mut dst_candidates: Vec<TypeId> = vec![dst];
        dst_candidates.extend(self.hierarchy.descendants_of(dst));

        for (src_view, src_upcast) in &src_chain {
            for produced in &dst_candidates {
                if *src_view == src && *produced == dst {
                    // Already tried as the exact pair
                    continue;
                }
                if let Some(exact) = self.exact.get(&(*src_view, *produced)) {
                    return Some(self.apply_fuzzy(value, src_upcast, exact, *produced, dst));
                }
            }
        }
        None
    }

    fn apply_fuzzy(
        &self,
        value: &dyn Any,
        src_upcast: &Option<UpcastFn>,
        exact: &ExactConvertFn,
        produced: TypeId,
        dst: TypeId,
    ) -> std::result::Result<Box<dyn Any>, BoxError> {
        let converted = match src_upcast {
            Some(upcast) => {
                let view = upcast(value)
                    .ok_or_else(|| BoxError::from("upcast of source value failed"))?;
                exact(view.as_ref())?
            }
            None => exact(value)?,
        };
        if produced == dst {
            return Ok(converted);
        }
        let upcast = self
            .hierarchy
            .upcast_path(produced, dst)
            .ok_or_else(|| BoxError::from("no upcast from produced value to destination"))?;
        upcast(converted.as_ref())
            .ok_or_else(|| BoxError::from("upcast of produced value failed"))
    }
}
