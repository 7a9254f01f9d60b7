//! GraphQL query resolvers

use async_graphql::{
    Context, ErrorExtensions, InputValueError, InputValueResult, Json, Object, Result, Scalar,
    ScalarType, Value,
};

use crate::errors::codes;

/// Root query resolver
pub struct Query;

#[Object]
impl Query {
    /// Greeting, mostly useful as a liveness check for clients
    async fn hello(&self, name: Option<String>) -> String {
        format!("Hello, {}!", name.as_deref().unwrap_or("world"))
    }

    /// Identity attached to this operation's context
    #[graphql(cache_control(private))]
    async fn me(&self, ctx: &Context<'_>) -> Option<String> {
        super::current_user(ctx)
    }

    /// Entry point of the recursive viewer graph
    async fn viewer(&self, ctx: &Context<'_>) -> Viewer {
        Viewer {
            name: super::current_user(ctx).unwrap_or_else(|| "anonymous".to_string()),
            hops: 0,
        }
    }

    /// Returns its argument unchanged
    async fn echo(&self, value: Json<serde_json::Value>) -> Json<serde_json::Value> {
        value
    }

    /// Returns its object argument unchanged
    async fn echo_object(&self, value: JsonObject) -> JsonObject {
        value
    }

    /// Always fails with the given message
    async fn failure(&self, message: String) -> Result<bool> {
        Err(async_graphql::Error::new(message)
            .extend_with(|_, e| e.set("code", codes::INTERNAL_SERVER_ERROR)))
    }
}

/// Self-referencing node; nesting `friend` grows query depth without bound
#[derive(Debug, Clone)]
pub struct Viewer {
    name: String,
    hops: i32,
}

#[Object]
impl Viewer {
    async fn name(&self) -> &str {
        &self.name
    }

    /// Distance from the root viewer
    async fn hops(&self) -> i32 {
        self.hops
    }

    async fn friend(&self) -> Viewer {
        self.next()
    }

    /// Not counted towards query depth
    async fn idontcare(&self) -> Viewer {
        self.next()
    }

    /// Not counted towards query depth
    #[graphql(name = "profile_trusted")]
    async fn profile_trusted(&self) -> Viewer {
        self.next()
    }
}

impl Viewer {
    fn next(&self) -> Viewer {
        Viewer {
            name: format!("friend of {}", self.name),
            hops: self.hops + 1,
        }
    }
}

/// Arbitrary JSON restricted to objects
#[derive(Debug, Clone, PartialEq)]
pub struct JsonObject(pub serde_json::Map<String, serde_json::Value>);

#[Scalar(name = "JSONObject")]
impl ScalarType for JsonObject {
    fn parse(value: Value) -> InputValueResult<Self> {
        if !matches!(value, Value::Object(_)) {
            return Err(InputValueError::expected_type(value));
        }

        match value.into_json().map_err(InputValueError::custom)? {
            serde_json::Value::Object(map) => Ok(JsonObject(map)),
            other => Err(InputValueError::custom(format!("expected an object, found {}", other))),
        }
    }

    fn is_valid(value: &Value) -> bool {
        matches!(value, Value::Object(_))
    }

    fn to_value(&self) -> Value {
        Value::from_json(serde_json::Value::Object(self.0.clone())).unwrap_or(Value::Null)
    }
}
