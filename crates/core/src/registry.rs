// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobTypeRegistry` port (spec §6) — per-type validation of input,
//! output, continuation reference, blocker reference, and entry
//! eligibility.
//!
//! A registry may be schema-driven (structural checks) or identity-only
//! (nominal by name); two reference implementations of each flavor are
//! provided (SPEC_FULL.md §C), mirroring the teacher's pattern of a real
//! adapter plus a fake for tests.

use crate::error::{ContractError, ValidationCode};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A typed reference to a continuation or blocker chain: the declared
/// type name and its (unvalidated) input payload.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub type_name: String,
    pub input: serde_json::Value,
}

impl TypeRef {
    pub fn new(type_name: impl Into<String>, input: serde_json::Value) -> Self {
        Self { type_name: type_name.into(), input }
    }
}

/// Per-type validation port.
#[async_trait]
pub trait JobTypeRegistry: Send + Sync + 'static {
    /// Asserts `type_name` is registered as a chain-entry-point type.
    async fn validate_entry(&self, type_name: &str) -> Result<(), ContractError>;

    /// Parses/validates a job's input, returning the canonicalized value
    /// stored on the job.
    async fn parse_input(
        &self,
        type_name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError>;

    /// Parses/validates a job's output at completion time.
    async fn parse_output(
        &self,
        type_name: &str,
        output: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError>;

    /// Validates that `type_name`'s declared `continueWith` reference
    /// accepts `next`.
    async fn validate_continue_with(
        &self,
        type_name: &str,
        next: &TypeRef,
    ) -> Result<(), ContractError>;

    /// Validates that `type_name`'s declared blocker schema accepts each
    /// of `blockers`.
    async fn validate_blockers(
        &self,
        type_name: &str,
        blockers: &[TypeRef],
    ) -> Result<(), ContractError>;
}

/// Declares, per type, whether it is an entry point and which type names
/// are legal as its continuation/blockers. Performs no structural
/// validation of input/output payloads — useful when callers trust their
/// own producers and only want topology checked.
#[derive(Debug, Clone, Default)]
pub struct TypeDeclaration {
    pub is_entry_point: bool,
    pub allowed_continuations: Option<Vec<String>>,
    pub allowed_blockers: Option<Vec<String>>,
}

#[derive(Default)]
pub struct NominalRegistry {
    declarations: RwLock<HashMap<String, TypeDeclaration>>,
}

impl NominalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, type_name: impl Into<String>, decl: TypeDeclaration) -> &Self {
        self.declarations.write().insert(type_name.into(), decl);
        self
    }
}

#[async_trait]
impl JobTypeRegistry for NominalRegistry {
    async fn validate_entry(&self, type_name: &str) -> Result<(), ContractError> {
        let declared = self.declarations.read().get(type_name).map(|d| d.is_entry_point);
        match declared {
            Some(true) => Ok(()),
            _ => Err(ContractError::JobTypeValidation {
                code: ValidationCode::NotEntryPoint,
                type_name: type_name.to_string(),
                details: format!("{type_name} is not registered as an entry point"),
            }),
        }
    }

    async fn parse_input(
        &self,
        _type_name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError> {
        Ok(input)
    }

    async fn parse_output(
        &self,
        _type_name: &str,
        output: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError> {
        Ok(output)
    }

    async fn validate_continue_with(
        &self,
        type_name: &str,
        next: &TypeRef,
    ) -> Result<(), ContractError> {
        let declarations = self.declarations.read();
        if let Some(allowed) = declarations.get(type_name).and_then(|d| d.allowed_continuations.as_ref()) {
            if !allowed.iter().any(|a| a == &next.type_name) {
                return Err(ContractError::JobTypeValidation {
                    code: ValidationCode::InvalidContinuation,
                    type_name: type_name.to_string(),
                    details: format!("{} may not continue with {}", type_name, next.type_name),
                });
            }
        }
        Ok(())
    }

    async fn validate_blockers(
        &self,
        type_name: &str,
        blockers: &[TypeRef],
    ) -> Result<(), ContractError> {
        let declarations = self.declarations.read();
        if let Some(allowed) = declarations.get(type_name).and_then(|d| d.allowed_blockers.as_ref()) {
            for blocker in blockers {
                if !allowed.iter().any(|a| a == &blocker.type_name) {
                    return Err(ContractError::JobTypeValidation {
                        code: ValidationCode::InvalidBlockers,
                        type_name: type_name.to_string(),
                        details: format!("{} may not be blocked by {}", type_name, blocker.type_name),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A predicate-based structural validator for a single type: closures
/// over `serde_json::Value` standing in for a JSON-schema validator
/// (spec.md's "out of scope" language excludes a product-grade schema
/// library, not a reference predicate registry).
pub struct TypeSchema {
    pub is_entry_point: bool,
    pub input: Arc<dyn Fn(&serde_json::Value) -> bool + Send + Sync>,
    pub output: Arc<dyn Fn(&serde_json::Value) -> bool + Send + Sync>,
    pub allowed_continuations: Option<Vec<String>>,
    pub allowed_blockers: Option<Vec<String>>,
}

impl TypeSchema {
    pub fn any(is_entry_point: bool) -> Self {
        Self {
            is_entry_point,
            input: Arc::new(|_| true),
            output: Arc::new(|_| true),
            allowed_continuations: None,
            allowed_blockers: None,
        }
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, TypeSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, type_name: impl Into<String>, schema: TypeSchema) -> &Self {
        self.schemas.write().insert(type_name.into(), schema);
        self
    }
}

#[async_trait]
impl JobTypeRegistry for SchemaRegistry {
    async fn validate_entry(&self, type_name: &str) -> Result<(), ContractError> {
        let declared = self.schemas.read().get(type_name).map(|s| s.is_entry_point);
        match declared {
            Some(true) => Ok(()),
            _ => Err(ContractError::JobTypeValidation {
                code: ValidationCode::NotEntryPoint,
                type_name: type_name.to_string(),
                details: format!("{type_name} is not registered as an entry point"),
            }),
        }
    }

    async fn parse_input(
        &self,
        type_name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError> {
        let schemas = self.schemas.read();
        match schemas.get(type_name) {
            Some(schema) if (schema.input)(&input) => Ok(input),
            Some(_) => Err(ContractError::JobTypeValidation {
                code: ValidationCode::InvalidInput,
                type_name: type_name.to_string(),
                details: "input failed schema predicate".to_string(),
            }),
            None => Ok(input),
        }
    }

    async fn parse_output(
        &self,
        type_name: &str,
        output: serde_json::Value,
    ) -> Result<serde_json::Value, ContractError> {
        let schemas = self.schemas.read();
        match schemas.get(type_name) {
            Some(schema) if (schema.output)(&output) => Ok(output),
            Some(_) => Err(ContractError::JobTypeValidation {
                code: ValidationCode::InvalidOutput,
                type_name: type_name.to_string(),
                details: "output failed schema predicate".to_string(),
            }),
            None => Ok(output),
        }
    }

    async fn validate_continue_with(
        &self,
        type_name: &str,
        next: &TypeRef,
    ) -> Result<(), ContractError> {
        let schemas = self.schemas.read();
        if let Some(allowed) = schemas.get(type_name).and_then(|s| s.allowed_continuations.as_ref()) {
            if !allowed.iter().any(|a| a == &next.type_name) {
                return Err(ContractError::JobTypeValidation {
                    code: ValidationCode::InvalidContinuation,
                    type_name: type_name.to_string(),
                    details: format!("{} may not continue with {}", type_name, next.type_name),
                });
            }
        }
        Ok(())
    }

    async fn validate_blockers(
        &self,
        type_name: &str,
        blockers: &[TypeRef],
    ) -> Result<(), ContractError> {
        let schemas = self.schemas.read();
        if let Some(allowed) = schemas.get(type_name).and_then(|s| s.allowed_blockers.as_ref()) {
            for blocker in blockers {
                if !allowed.iter().any(|a| a == &blocker.type_name) {
                    return Err(ContractError::JobTypeValidation {
                        code: ValidationCode::InvalidBlockers,
                        type_name: type_name.to_string(),
                        details: format!("{} may not be blocked by {}", type_name, blocker.type_name),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nominal_registry_rejects_unregistered_entry() {
        let registry = NominalRegistry::new();
        let err = registry.validate_entry("greet").await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::JobTypeValidation { code: ValidationCode::NotEntryPoint, .. }
        ));
    }

    #[tokio::test]
    async fn nominal_registry_accepts_registered_entry() {
        let registry = NominalRegistry::new();
        registry.register("greet", TypeDeclaration { is_entry_point: true, ..Default::default() });
        registry.validate_entry("greet").await.unwrap();
    }

    #[tokio::test]
    async fn nominal_registry_rejects_unlisted_continuation() {
        let registry = NominalRegistry::new();
        registry.register(
            "order:validate",
            TypeDeclaration {
                is_entry_point: true,
                allowed_continuations: Some(vec!["order:process".to_string()]),
                ..Default::default()
            },
        );
        let bad = TypeRef::new("order:ship", serde_json::Value::Null);
        let err = registry.validate_continue_with("order:validate", &bad).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::JobTypeValidation { code: ValidationCode::InvalidContinuation, .. }
        ));
    }

    #[tokio::test]
    async fn schema_registry_rejects_input_failing_predicate() {
        let registry = SchemaRegistry::new();
        registry.register(
            "greet",
            TypeSchema {
                is_entry_point: true,
                input: Arc::new(|v| v.get("name").is_some()),
                output: Arc::new(|_| true),
                allowed_continuations: None,
                allowed_blockers: None,
            },
        );
        let err = registry.parse_input("greet", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::JobTypeValidation { code: ValidationCode::InvalidInput, .. }
        ));
        registry.parse_input("greet", serde_json::json!({"name": "World"})).await.unwrap();
    }
}
