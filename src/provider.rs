//! The `garage` provider: configuration, type dispatch and diagnostics.
//!
//! Every request names a resource or data source type and carries its data as
//! JSON. The provider decodes it into the matching model, runs the adapter
//! against the configured admin client and turns any failure into a
//! Terraform diagnostic instead of an error.

use std::{collections::BTreeMap, marker::PhantomData};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    garage_admin::GarageAdmin,
    reconcilers::{type_name, Lookup, Reconcile},
    resources::{AccessKey, Bucket, BucketData, BucketPermission, ProviderConfig},
    schema::{Attribute, AttributeType, Schema},
    Error, Result,
};

pub const ENDPOINT_ENV: &str = "GARAGE_ENDPOINT";
pub const TOKEN_ENV: &str = "GARAGE_TOKEN";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn at(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }

    /// Turn a failed `action` on a `noun` into the diagnostic Terraform shows
    fn from_error(error: &Error, action: &str, noun: &str) -> Self {
        match error {
            Error::IllegalImportId(_) => Self::error("Invalid Import ID", error.to_string()),
            Error::IllegalResource(_) => Self::error("Invalid Configuration", error.to_string()),
            Error::NotConfigured => Self::error(
                "Unconfigured Provider",
                format!("Unable to {action} {noun}: the provider has not been configured."),
            ),
            Error::UnknownType(name) => Self::error(
                "Unknown Resource Type",
                format!("The garage provider does not support the type '{name}'."),
            ),
            _ => Self::error(
                "Client Error",
                format!("Unable to {action} {noun}, got error: {error}"),
            ),
        }
    }
}

/// Resolve the provider block, falling back on `env` for anything unset or empty
pub fn resolve(
    config: &ProviderConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<GarageAdmin, Vec<Diagnostic>> {
    let pick = |value: &Option<String>, var: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| env(var).filter(|v| !v.is_empty()))
    };
    let endpoint = pick(&config.endpoint, ENDPOINT_ENV);
    let token = pick(&config.token, TOKEN_ENV);

    let mut diagnostics = Vec::new();
    if endpoint.is_none() {
        diagnostics.push(
            Diagnostic::error(
                "Missing Garage Endpoint",
                "The provider cannot create the Garage API client as there is a missing or empty value for the Garage endpoint. \
                 Set the endpoint value in the configuration or use the GARAGE_ENDPOINT environment variable. \
                 If either is already set, ensure the value is not empty.",
            )
            .at("endpoint"),
        );
    }
    if token.is_none() {
        diagnostics.push(
            Diagnostic::error(
                "Missing Garage Token",
                "The provider cannot create the Garage API client as there is a missing or empty value for the Garage admin token. \
                 Set the token value in the configuration or use the GARAGE_TOKEN environment variable. \
                 If either is already set, ensure the value is not empty.",
            )
            .at("token"),
        );
    }

    match (endpoint, token) {
        (Some(endpoint), Some(token)) => Ok(GarageAdmin::with_secret(&endpoint, &token)),
        _ => Err(diagnostics),
    }
}

/// Decode Terraform data into a model. Null attributes are dropped so the
/// model's defaults apply to them.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    let value = match value {
        Value::Object(mut map) => {
            map.retain(|_, v| !v.is_null());
            Value::Object(map)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(Error::SerializationError)
}

fn encode<T: Serialize>(model: &T) -> Result<Value> {
    serde_json::to_value(model).map_err(Error::SerializationError)
}

/// A resource type with its model erased to JSON
#[async_trait]
trait ResourceType: Send + Sync {
    fn noun(&self) -> String;
    fn schema(&self) -> Schema;
    fn validate(&self, config: Value) -> Result<()>;
    async fn create(&self, planned: Value, admin: &GarageAdmin) -> Result<Value>;
    async fn read(&self, state: Value, admin: &GarageAdmin) -> Result<Option<Value>>;
    async fn update(&self, planned: Value, prior: Value, admin: &GarageAdmin) -> Result<Value>;
    async fn delete(&self, state: Value, admin: &GarageAdmin) -> Result<()>;
    fn import(&self, id: &str) -> Result<Value>;
}

/// A data source type with its model erased to JSON
#[async_trait]
trait DataSourceType: Send + Sync {
    fn noun(&self) -> String;
    fn schema(&self) -> Schema;
    fn validate(&self, config: Value) -> Result<()>;
    async fn read(&self, config: Value, admin: &GarageAdmin) -> Result<Value>;
}

struct Handle<T>(PhantomData<fn() -> T>);

impl<T> Handle<T> {
    fn boxed() -> Box<Self> {
        Box::new(Self(PhantomData))
    }
}

#[async_trait]
impl<R: Reconcile + 'static> ResourceType for Handle<R> {
    fn noun(&self) -> String {
        R::noun()
    }

    fn schema(&self) -> Schema {
        R::schema()
    }

    fn validate(&self, config: Value) -> Result<()> {
        decode::<R>(config)?.validate()
    }

    async fn create(&self, planned: Value, admin: &GarageAdmin) -> Result<Value> {
        let created = decode::<R>(planned)?.create(admin).await?;
        encode(&created)
    }

    async fn read(&self, state: Value, admin: &GarageAdmin) -> Result<Option<Value>> {
        match decode::<R>(state)?.read(admin).await? {
            Some(read) => Ok(Some(encode(&read)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, planned: Value, prior: Value, admin: &GarageAdmin) -> Result<Value> {
        let prior = decode::<R>(prior)?;
        let updated = decode::<R>(planned)?.update(prior, admin).await?;
        encode(&updated)
    }

    async fn delete(&self, state: Value, admin: &GarageAdmin) -> Result<()> {
        decode::<R>(state)?.delete(admin).await
    }

    fn import(&self, id: &str) -> Result<Value> {
        encode(&R::import(id)?)
    }
}

#[async_trait]
impl<L: Lookup + 'static> DataSourceType for Handle<L> {
    fn noun(&self) -> String {
        L::TYPE_NAME.replace('_', " ")
    }

    fn schema(&self) -> Schema {
        L::schema()
    }

    fn validate(&self, config: Value) -> Result<()> {
        decode::<L>(config)?.validate()
    }

    async fn read(&self, config: Value, admin: &GarageAdmin) -> Result<Value> {
        let found = decode::<L>(config)?.lookup(admin).await?;
        encode(&found)
    }
}

/// One request from the host, tagged by `op`
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Configure {
        #[serde(default)]
        config: ProviderConfig,
    },
    Schema,
    Validate {
        type_name: String,
        config: Value,
        /// Validate against the data source of that name rather than the resource
        #[serde(default)]
        data_source: bool,
    },
    Plan {
        type_name: String,
        #[serde(default)]
        prior_state: Option<Value>,
        proposed: Value,
    },
    Create {
        type_name: String,
        planned_state: Value,
    },
    Read {
        type_name: String,
        state: Value,
    },
    Update {
        type_name: String,
        planned_state: Value,
        prior_state: Value,
    },
    Delete {
        type_name: String,
        state: Value,
    },
    Import {
        type_name: String,
        id: String,
    },
    ReadDataSource {
        type_name: String,
        config: Value,
    },
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Request::Configure { .. } => "configure",
            Request::Schema => "schema",
            Request::Validate { .. } => "validate",
            Request::Plan { .. } => "plan",
            Request::Create { .. } => "create",
            Request::Read { .. } => "read",
            Request::Update { .. } => "update",
            Request::Delete { .. } => "delete",
            Request::Import { .. } => "import",
            Request::ReadDataSource { .. } => "read_data_source",
        }
    }
}

/// Every schema the provider serves
#[derive(Serialize, Clone, Debug)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

/// Answer to one request. `state` is null once a resource is gone.
#[derive(Serialize, Clone, Debug, Default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ProviderSchema>,
    pub state: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires_replace: Vec<&'static str>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Response {
    fn state(state: Option<Value>) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

pub struct GarageProvider {
    admin: Option<GarageAdmin>,
    resources: BTreeMap<String, Box<dyn ResourceType>>,
    data_sources: BTreeMap<String, Box<dyn DataSourceType>>,
}

impl Default for GarageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GarageProvider {
    pub fn new() -> Self {
        let mut resources: BTreeMap<String, Box<dyn ResourceType>> = BTreeMap::new();
        resources.insert(type_name(Bucket::TYPE_NAME), Handle::<Bucket>::boxed());
        resources.insert(type_name(AccessKey::TYPE_NAME), Handle::<AccessKey>::boxed());
        resources.insert(
            type_name(BucketPermission::TYPE_NAME),
            Handle::<BucketPermission>::boxed(),
        );

        let mut data_sources: BTreeMap<String, Box<dyn DataSourceType>> = BTreeMap::new();
        data_sources.insert(type_name(BucketData::TYPE_NAME), Handle::<BucketData>::boxed());

        Self {
            admin: None,
            resources,
            data_sources,
        }
    }

    /// A provider already holding a client, skipping configuration
    pub fn with_admin(admin: GarageAdmin) -> Self {
        Self {
            admin: Some(admin),
            ..Self::new()
        }
    }

    pub fn provider_schema() -> Schema {
        Schema {
            type_name: crate::reconcilers::TYPE_PREFIX.to_string(),
            description: "Interact with a Garage object storage cluster through its admin API.",
            attributes: vec![
                Attribute::optional(
                    "endpoint",
                    AttributeType::String,
                    "The Garage Admin API endpoint URL. Can also be set via the GARAGE_ENDPOINT environment variable.",
                ),
                Attribute::optional(
                    "token",
                    AttributeType::String,
                    "The Garage Admin API bearer token. Can also be set via the GARAGE_TOKEN environment variable.",
                )
                .sensitive(),
            ],
            json_schema: schemars::schema_for!(ProviderConfig),
        }
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: Self::provider_schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.clone(), d.schema()))
                .collect(),
        }
    }

    /// Configure from the provider block, using the process environment as fallback
    pub fn configure(&mut self, config: &ProviderConfig) -> Vec<Diagnostic> {
        self.configure_with(config, |var| std::env::var(var).ok())
    }

    pub fn configure_with(
        &mut self,
        config: &ProviderConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Vec<Diagnostic> {
        match resolve(config, env) {
            Ok(admin) => {
                info!(endpoint = admin.endpoint(), "Configured garage provider");
                self.admin = Some(admin);
                Vec::new()
            }
            Err(diagnostics) => {
                warn!(count = diagnostics.len(), "Provider configuration is incomplete");
                self.admin = None;
                diagnostics
            }
        }
    }

    fn admin(&self) -> Result<&GarageAdmin> {
        self.admin.as_ref().ok_or(Error::NotConfigured)
    }

    fn resource(&self, name: &str) -> Result<&dyn ResourceType> {
        self.resources
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    fn data_source(&self, name: &str) -> Result<&dyn DataSourceType> {
        self.data_sources
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    pub async fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Configure { config } => Response {
                diagnostics: self.configure(&config),
                ..Default::default()
            },
            Request::Schema => Response {
                schema: Some(self.schema()),
                ..Default::default()
            },
            Request::Validate {
                type_name,
                config,
                data_source,
            } => {
                let result = if data_source {
                    self.data_source(&type_name)
                        .and_then(|data_source| data_source.validate(config))
                } else {
                    self.resource(&type_name)
                        .and_then(|resource| resource.validate(config))
                };
                self.respond(result.map(|()| None), "validate", &type_name)
            }
            Request::Plan {
                type_name,
                prior_state,
                proposed,
            } => match self.resource(&type_name) {
                Ok(resource) => {
                    let plan = resource.schema().plan(prior_state.as_ref(), proposed);
                    Response {
                        state: Some(plan.planned_state),
                        requires_replace: plan.requires_replace,
                        ..Default::default()
                    }
                }
                Err(e) => self.respond(Err(e), "plan", &type_name),
            },
            Request::Create {
                type_name,
                planned_state,
            } => {
                let result = self.create(&type_name, planned_state).await.map(Some);
                self.respond(result, "create", &type_name)
            }
            Request::Read { type_name, state } => {
                let result = self.read(&type_name, state).await;
                self.respond(result, "read", &type_name)
            }
            Request::Update {
                type_name,
                planned_state,
                prior_state,
            } => {
                let result = self
                    .update(&type_name, planned_state, prior_state)
                    .await
                    .map(Some);
                self.respond(result, "update", &type_name)
            }
            Request::Delete { type_name, state } => {
                let result = self.delete(&type_name, state).await.map(|()| None);
                self.respond(result, "delete", &type_name)
            }
            Request::Import { type_name, id } => {
                let result = self
                    .resource(&type_name)
                    .and_then(|resource| resource.import(&id))
                    .map(Some);
                self.respond(result, "import", &type_name)
            }
            Request::ReadDataSource { type_name, config } => {
                let result = self.read_data_source(&type_name, config).await.map(Some);
                self.respond(result, "read", &type_name)
            }
        }
    }

    pub async fn create(&self, type_name: &str, planned: Value) -> Result<Value> {
        let resource = self.resource(type_name)?;
        debug!(type_name, "Create");
        resource.create(planned, self.admin()?).await
    }

    pub async fn read(&self, type_name: &str, state: Value) -> Result<Option<Value>> {
        let resource = self.resource(type_name)?;
        debug!(type_name, "Read");
        resource.read(state, self.admin()?).await
    }

    pub async fn update(&self, type_name: &str, planned: Value, prior: Value) -> Result<Value> {
        let resource = self.resource(type_name)?;
        debug!(type_name, "Update");
        resource.update(planned, prior, self.admin()?).await
    }

    pub async fn delete(&self, type_name: &str, state: Value) -> Result<()> {
        let resource = self.resource(type_name)?;
        debug!(type_name, "Delete");
        resource.delete(state, self.admin()?).await
    }

    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value> {
        let data_source = self.data_source(type_name)?;
        debug!(type_name, "Read data source");
        data_source.read(config, self.admin()?).await
    }

    /// Build the response, naming the failed `action` in any diagnostic
    fn respond(&self, result: Result<Option<Value>>, action: &str, type_name: &str) -> Response {
        match result {
            Ok(state) => Response::state(state),
            Err(error) => {
                let noun = self
                    .resources
                    .get(type_name)
                    .map(|r| r.noun())
                    .or_else(|| self.data_sources.get(type_name).map(|d| d.noun()))
                    .unwrap_or_else(|| type_name.to_string());
                warn!(type_name, %error, "Request failed");
                Response::failed(Diagnostic::from_error(&error, action, &noun))
            }
        }
    }
}
