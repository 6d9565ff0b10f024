//! Standard converter set.
//!
//! The core registrar covers the string and primitive conversions that
//! nearly every consumer of the registry wants, including the identity
//! conversion for strings used by the XML layer.

use super::{ConverterRegistrar, TypeConverterRegistry};
use crate::error::{BoxError, Result};

/// Registrar providing string ↔ primitive conversions and the widening
/// numeric conversions.
pub struct CoreConverterRegistrar;

impl ConverterRegistrar for CoreConverterRegistrar {
    fn register_converters(&self, registry: &mut TypeConverterRegistry) -> Result<()> {
        // Identity for strings
        registry.register(|s: &String| s.clone())?;

        // To string
        registry.register(|v: &i8| v.to_string())?;
        registry.register(|v: &i16| v.to_string())?;
        registry.register(|v: &i32| v.to_string())?;
        registry.register(|v: &i64| v.to_string())?;
        registry.register(|v: &u8| v.to_string())?;
        registry.register(|v: &u16| v.to_string())?;
        registry.register(|v: &u32| v.to_string())?;
        registry.register(|v: &u64| v.to_string())?;
        registry.register(|v: &f32| v.to_string())?;
        registry.register(|v: &f64| v.to_string())?;
        registry.register(|v: &bool| v.to_string())?;
        registry.register(|v: &char| v.to_string())?;

        // From string
        registry.register_fallible(|s: &String| s.parse::<i8>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<i16>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<i32>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<i64>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<u8>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<u16>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<u32>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<u64>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<f32>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<f64>().map_err(BoxError::from))?;
        registry.register_fallible(|s: &String| s.parse::<bool>().map_err(BoxError::from))?;

        // Lossless numeric widening
        registry.register(|v: &i8| i16::from(*v))?;
        registry.register(|v: &i16| i32::from(*v))?;
        registry.register(|v: &i32| i64::from(*v))?;
        registry.register(|v: &i32| f64::from(*v))?;
        registry.register(|v: &u8| u16::from(*v))?;
        registry.register(|v: &u16| u32::from(*v))?;
        registry.register(|v: &u32| u64::from(*v))?;
        registry.register(|v: &u32| i64::from(*v))?;
        registry.register(|v: &f32| f64::from(*v))?;

        Ok(())
    }
}
