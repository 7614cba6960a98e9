//! # Parameter store
//!
//! Each program owns a set of named numeric parameters which can be tuned while it runs. Every
//! parameter also has a short code, which is what `set:<code>=<value>` commands refer to.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use comms_if::cmd::SetValue;
use log::info;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Nominal motor speed, between 0.0 and 1.0.
pub const SPEED: &str = "speed";

/// Distance travelled in one second at a speed of 1.0.
///
/// Units: centimetres/second
pub const DISTANCE_PER_SECOND: &str = "distance_per_second";

/// Angle rotated in one second at a speed of 1.0.
///
/// Units: degrees/second
pub const ANGLE_PER_SECOND: &str = "angle_per_second";

/// Parameters every program has.
pub const BASE_PARAMS: &[ParamDef] = &[
    ParamDef::new("sp", SPEED, 0.5),
    ParamDef::new("ds", DISTANCE_PER_SECOND, 20.0),
    ParamDef::new("as", ANGLE_PER_SECOND, 180.0),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Definition of a single parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamDef {
    pub code: &'static str,
    pub name: &'static str,
    pub default: f64,
}

/// Named parameter values plus the short code lookup.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    values: BTreeMap<&'static str, f64>,
    codes: BTreeMap<&'static str, &'static str>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter code: {0}")]
    UnknownCode(String),

    #[error("invalid value for {code}: {value}")]
    InvalidValue { code: String, value: String },

    #[error("no parameter named {0}")]
    UnknownName(String),

    #[error("parameter code {code} is already used by {existing}")]
    DuplicateCode { code: String, existing: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ParamDef {
    pub const fn new(code: &'static str, name: &'static str, default: f64) -> Self {
        Self { code, name, default }
    }
}

impl ParamStore {
    /// Create a store holding only the [`BASE_PARAMS`].
    pub fn with_base() -> Self {
        let mut store = Self::default();
        for def in BASE_PARAMS {
            store.values.insert(def.name, def.default);
            store.codes.insert(def.code, def.name);
        }
        store
    }

    /// Add parameter definitions to the store.
    ///
    /// Redefining an existing parameter under the same code replaces its default. A code may only
    /// ever refer to one parameter.
    pub fn add(&mut self, defs: &[ParamDef]) -> Result<(), ParamError> {
        for def in defs {
            if let Some(existing) = self.codes.get(def.code) {
                if *existing != def.name {
                    return Err(ParamError::DuplicateCode {
                        code: def.code.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
        }

        for def in defs {
            self.values.insert(def.name, def.default);
            self.codes.insert(def.code, def.name);
        }

        Ok(())
    }

    /// Get a parameter's value by name.
    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ParamError::UnknownName(name.to_string()))
    }

    /// Set a parameter's value by name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        match self.values.get_mut(name) {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => Err(ParamError::UnknownName(name.to_string())),
        }
    }

    /// Get the name of the parameter with the given short code.
    pub fn name_for(&self, code: &str) -> Result<&'static str, ParamError> {
        self.codes
            .get(code)
            .copied()
            .ok_or_else(|| ParamError::UnknownCode(code.to_string()))
    }

    /// Execute the value part of a `set:` command against the parameter with the given code.
    ///
    /// Queries return the current value as text, assignments validate and store the new value.
    pub fn apply(&mut self, code: &str, value: &SetValue) -> Result<String, ParamError> {
        let name = self.name_for(code)?;

        match value {
            SetValue::Query => Ok(self.get(name)?.to_string()),
            SetValue::Assign(raw) => {
                let parsed: f64 = raw
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| ParamError::InvalidValue {
                        code: code.to_string(),
                        value: raw.clone(),
                    })?;

                self.set(name, parsed)?;
                info!("Parameter {} ({}) set to {}", name, code, parsed);

                Ok(format!("{} = {}", name, parsed))
            }
        }
    }
}
