//! Tool catalog.
//!
//! Descriptors are built once at startup and never mutated. Each one owns
//! its compiled input schema, so arguments are checked against exactly the
//! schema `tools/list` advertises. Lookup is an exact, case-sensitive match
//! on the tool name; listing preserves registration order.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::error;

use crate::envelope::Envelope;
use crate::handlers;
use crate::schema::{self, compile_schema, SchemaValidationError};
use crate::upstream::UpstreamClient;
use crate::validation::ValidationErrors;

/// Why a handler did not produce an envelope.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments failed input validation. Caller should fix the input.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    /// Anything else that went wrong locally, including a handler panic.
    #[error("{0}")]
    Internal(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("failed to convert tool data: {e}"))
    }
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Envelope<Value>, ToolError>> + Send + 'a>>;

/// A tool's entry point. `arguments` have already passed the tool's input
/// schema.
pub trait ToolHandler: Send + Sync {
    fn call<'a>(&'a self, arguments: &'a Value) -> ToolFuture<'a>;
}

pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Value,
    validator: Validator,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Fails if `input_schema` does not compile.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: impl ToolHandler + 'static,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let validator = compile_schema(&input_schema).map_err(|source| RegistryError::InvalidSchema {
            name: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            validator,
            handler: Arc::new(handler),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema advertised through `tools/list`.
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Check `arguments` against the input schema. Absent or `null`
    /// arguments are checked as an empty object so every required field
    /// reports individually.
    pub fn check_arguments(&self, arguments: Option<Value>) -> Result<Value, ValidationErrors> {
        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };
        schema::check(&self.validator, &arguments)?;
        Ok(arguments)
    }

    /// Validate, then run the handler on its own task. A panicking handler
    /// comes back as [`ToolError::Internal`] carrying the panic message.
    pub async fn call(&self, arguments: Option<Value>) -> Result<Envelope<Value>, ToolError> {
        let arguments = self.check_arguments(arguments)?;
        let handler = Arc::clone(&self.handler);

        match tokio::spawn(async move { handler.call(&arguments).await }).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(tool = %self.name, panic = %message, "tool handler panicked");
                Err(ToolError::Internal(message))
            }
            Err(e) => Err(ToolError::Internal(e.to_string())),
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
    #[error("invalid input schema for tool {name}: {source}")]
    InvalidSchema {
        name: String,
        #[source]
        source: SchemaValidationError,
    },
}

#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Rejects duplicate names.
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        for (i, tool) in tools.iter().enumerate() {
            if tools[..i].iter().any(|t| t.name == tool.name) {
                return Err(RegistryError::DuplicateName(tool.name.clone()));
            }
        }

        Ok(Self { tools })
    }

    /// `geocode`, `reverse_geocode`, `poi_search`, `route`, in that order.
    pub fn standard(client: Arc<UpstreamClient>) -> Result<Self, RegistryError> {
        Self::new(vec![
            handlers::geocode::descriptor(Arc::clone(&client))?,
            handlers::reverse_geocode::descriptor(Arc::clone(&client))?,
            handlers::poi_search::descriptor(Arc::clone(&client))?,
            handlers::route::descriptor(client)?,
        ])
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::envelope::ErrorCode;

    struct Fixed;

    impl ToolHandler for Fixed {
        fn call<'a>(&'a self, _arguments: &'a Value) -> ToolFuture<'a> {
            Box::pin(async { Ok(Envelope::failure(ErrorCode::InternalError, "fixed")) })
        }
    }

    fn tool(name: &str, schema: Value) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool", schema, Fixed).unwrap()
    }

    #[test]
    fn find_is_exact_and_case_sensitive() {
        let registry = ToolRegistry::new(vec![
            tool("alpha", json!({"type": "object"})),
            tool("beta", json!({"type": "object"})),
        ])
        .unwrap();

        assert_eq!(registry.find("beta").map(ToolDescriptor::name), Some("beta"));
        assert!(registry.find("Beta").is_none());
        assert!(registry.find("bet").is_none());
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = ToolRegistry::new(vec![
            tool("zeta", json!({"type": "object"})),
            tool("alpha", json!({"type": "object"})),
        ])
        .unwrap();

        let names: Vec<_> = registry.list().iter().map(ToolDescriptor::name).collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ToolRegistry::new(vec![
            tool("same", json!({"type": "object"})),
            tool("same", json!({"type": "object"})),
        ])
        .unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "same"));
    }

    #[test]
    fn malformed_schema_is_rejected() {
        let err = ToolDescriptor::new("bad", "test tool", json!({"type": "not-a-type"}), Fixed).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { name, .. } if name == "bad"));
    }

    #[test]
    fn null_arguments_check_as_empty_object() {
        let tool = tool("needs_q", json!({"type": "object", "required": ["q"]}));

        let err = tool.check_arguments(Some(Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "q: Required");
        assert_eq!(tool.check_arguments(Some(json!({"q": 1}))).unwrap(), json!({"q": 1}));
    }

    #[tokio::test]
    async fn rejected_arguments_never_reach_the_handler() {
        let tool = tool("needs_q", json!({"type": "object", "required": ["q"]}));
        let err = tool.call(None).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
