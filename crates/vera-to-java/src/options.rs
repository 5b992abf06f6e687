// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling one translation session. Usually loaded from a toml file next to
/// the Vera sources; every field has a default so an empty file is valid.
///
/// NOTE: any fields carrying structured data must appear at the end for making
/// toml printing work.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorOptions {
    /// Java package of the generated compilation unit.
    pub package: Option<String>,
    /// Name of the top-level class. Defaults to the capitalized unit name.
    pub unit_class: Option<String>,
    /// Verbosity level for logging.
    pub verbosity_level: LevelFilter,
    /// Integer to enum conversions throw on values with no enumerator instead of
    /// producing the undefined sentinel.
    pub checked_enum_conversion: bool,
    /// Emit Java `assert` statements for Vera `assert` calls.
    pub emit_assertions: bool,
    /// Declare locals and parameters `final` when they are never reassigned.
    pub mark_final: bool,
    /// Map `local` members to `private`; otherwise they stay package-private.
    pub local_as_private: bool,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            package: None,
            unit_class: None,
            verbosity_level: LevelFilter::Info,
            checked_enum_conversion: true,
            emit_assertions: true,
            mark_final: false,
            local_as_private: true,
        }
    }
}

impl TranslatorOptions {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options from {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing options in {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Cap the global log level at the configured verbosity
    pub fn apply_verbosity(&self) {
        log::set_max_level(self.verbosity_level);
    }
}
