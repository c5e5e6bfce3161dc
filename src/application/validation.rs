//! Request validation performed before any sheet is opened.

use std::collections::BTreeMap;
use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::domain::is_blank;

/// Field-keyed validation messages.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// `"field message; field message"` in field order.
    fn summary(&self) -> String {
        self.fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{} {}", field, m)))
            .join("; ")
    }
}

/// Raw import request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    /// Target context (mission/tenant) identifier
    pub context: Option<String>,
    /// Name of the option tree to create
    pub name: Option<String>,
    /// Sheet to import
    pub source: Option<PathBuf>,
}

/// A request whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImport {
    pub context: String,
    pub name: String,
    pub source: PathBuf,
}

impl ImportRequest {
    /// Check required fields, collecting every failure.
    pub fn validate(&self) -> Result<ValidImport, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let context = present(&self.context, "context", &mut errors);
        let name = present(&self.name, "name", &mut errors);
        let source = match &self.source {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => {
                errors.add("source", "can't be blank");
                None
            }
        };

        match (context, name, source) {
            (Some(context), Some(name), Some(source)) if errors.is_empty() => Ok(ValidImport {
                context,
                name,
                source,
            }),
            _ => Err(errors),
        }
    }
}

fn present(value: &Option<String>, field: &'static str, errors: &mut ValidationErrors) -> Option<String> {
    if is_blank(value.as_deref()) {
        errors.add(field, "can't be blank");
        None
    } else {
        value.as_ref().map(|v| v.trim().to_string())
    }
}
