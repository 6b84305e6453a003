//! DynamoDB Store Client.
//!
//! Built on `aws_sdk_dynamodb::Client`. Records are plain JSON attribute maps
//! on the [`StoreClient`] side and [`AttributeValue`] maps on the wire; UUID
//! key attributes are stored as 16-byte binary values.
//!
//! Credentials and region come from the standard AWS config chain unless
//! overridden by [`DynamoConfig`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Number, Value};
use taskdeck_core::{task_fields, user_fields, ConfigError, StoreError};
use uuid::Uuid;

use super::{Filter, Record, StoreClient, StoreResult};

/// Top-level attributes holding UUIDs, stored as binary.
const BINARY_FIELDS: [&str; 2] = [task_fields::TASK_ID, user_fields::USER_ID];

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CREDENTIALS_PROVIDER_NAME: &str = "taskdeck-env";

type Item = HashMap<String, AttributeValue>;

/// Static credentials taken from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for [`DynamoStore`].
///
/// Unset fields fall back to the AWS config chain (environment, profile,
/// instance metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoConfig {
    pub region: Option<String>,
    /// Overrides the regional endpoint, e.g. for DynamoDB Local.
    pub endpoint: Option<String>,
    pub credentials: Option<StaticCredentials>,
    pub timeout: Duration,
}

impl DynamoConfig {
    /// Load from the process environment.
    ///
    /// - `AWS_REGION` (optional, else the config chain decides)
    /// - `TASKDECK_AWS_CREDENTIALS_BASE64=true`: `AWS_ACCESS_KEY_ID` and
    ///   `AWS_SECRET_ACCESS_KEY` are required and base64-encoded
    /// - `AWS_SESSION_TOKEN` (optional, with the base64 credentials)
    /// - `TASKDECK_DYNAMO_ENDPOINT` (optional)
    /// - `TASKDECK_STORE_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| ConfigError::MissingRequired {
                field: key.to_string(),
            })
        };

        let base64_credentials = lookup("TASKDECK_AWS_CREDENTIALS_BASE64")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);
        let credentials = if base64_credentials {
            Some(StaticCredentials {
                access_key_id: decode_credential(
                    "AWS_ACCESS_KEY_ID",
                    &required("AWS_ACCESS_KEY_ID")?,
                )?,
                secret_access_key: decode_credential(
                    "AWS_SECRET_ACCESS_KEY",
                    &required("AWS_SECRET_ACCESS_KEY")?,
                )?,
                session_token: optional("AWS_SESSION_TOKEN"),
            })
        } else {
            None
        };

        let timeout_secs = match lookup("TASKDECK_STORE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: "TASKDECK_STORE_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            region: optional("AWS_REGION"),
            endpoint: optional("TASKDECK_DYNAMO_ENDPOINT"),
            credentials,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn decode_credential(field: &str, raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: field.to_string(),
        value: "<redacted>".to_string(),
        reason,
    };
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| invalid(e.to_string()))?;
    let decoded = String::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
    Ok(decoded.trim().to_string())
}

/// Store Client talking to DynamoDB.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Wrap a pre-built client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS config chain with `config` overrides.
    pub async fn connect(config: &DynamoConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.timeout)
                .build(),
        );
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                credentials.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }
        let shared = loader.load().await;
        Self::new(Client::new(&shared))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StoreClient for DynamoStore {
    async fn put(&self, table: &str, record: Record) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(&record)))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| write_failed(table, sdk_error(table, e)))
    }

    async fn update(&self, table: &str, key: Record, fields: Record) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let update = UpdateParts::new(&fields);
        self.client
            .update_item()
            .table_name(table)
            .set_key(Some(to_item(&key)))
            .update_expression(update.expression)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| write_failed(table, sdk_error(table, e)))
    }

    async fn delete(&self, table: &str, key: Record) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_item(&key)))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| match sdk_error(table, e) {
                StoreError::Rejected { code, message } => StoreError::DeleteFailed {
                    table: table.to_string(),
                    reason: format!("{}: {}", code, message),
                },
                other => other,
            })
    }

    async fn get(&self, table: &str, key: Record) -> StoreResult<Option<Record>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_item(&key)))
            .send()
            .await
            .map_err(|e| sdk_error(table, e))?;
        output
            .item()
            .map(|item| from_item(item).map_err(|reason| read_failed(table, reason)))
            .transpose()
    }

    async fn scan(
        &self,
        table: &str,
        filter: &Filter,
        projection: &[&str],
    ) -> StoreResult<Vec<Record>> {
        let mut names = HashMap::from([("#f".to_string(), filter.field.clone())]);
        let values = HashMap::from([(
            ":v".to_string(),
            to_attribute(&filter.field, &filter.value),
        )]);
        let projection_expression = (!projection.is_empty()).then(|| {
            projection
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let name = format!("#p{}", i);
                    names.insert(name.clone(), field.to_string());
                    name
                })
                .collect::<Vec<_>>()
                .join(", ")
        });

        let mut records = Vec::new();
        let mut exclusive_start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(table)
                .filter_expression("#f = :v")
                .set_projection_expression(projection_expression.clone())
                .set_expression_attribute_names(Some(names.clone()))
                .set_expression_attribute_values(Some(values.clone()))
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| sdk_error(table, e))?;

            for item in output.items() {
                records.push(from_item(item).map_err(|reason| read_failed(table, reason))?);
            }

            match output.last_evaluated_key() {
                Some(last_key) if !last_key.is_empty() => {
                    exclusive_start_key = Some(last_key.clone());
                }
                _ => return Ok(records),
            }
        }
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Record>> {
        let page_limit = limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX));

        let mut records = Vec::new();
        let mut exclusive_start_key = None;
        loop {
            let output = self
                .client
                .query()
                .table_name(table)
                .index_name(index)
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", field)
                .expression_attribute_values(":v", to_attribute(field, value))
                .set_limit(page_limit)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| sdk_error(table, e))?;

            for item in output.items() {
                records.push(from_item(item).map_err(|reason| read_failed(table, reason))?);
                if limit.is_some_and(|l| records.len() >= l) {
                    return Ok(records);
                }
            }

            match output.last_evaluated_key() {
                Some(last_key) if !last_key.is_empty() => {
                    exclusive_start_key = Some(last_key.clone());
                }
                _ => return Ok(records),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// `SET` expression with placeholder names and values for a partial update.
struct UpdateParts {
    expression: String,
    names: HashMap<String, String>,
    values: Item,
}

impl UpdateParts {
    fn new(fields: &Record) -> Self {
        let mut names = HashMap::with_capacity(fields.len());
        let mut values = HashMap::with_capacity(fields.len());
        let mut assignments = Vec::with_capacity(fields.len());
        for (i, (field, value)) in fields.iter().enumerate() {
            let name = format!("#f{}", i);
            let placeholder = format!(":v{}", i);
            assignments.push(format!("{} = {}", name, placeholder));
            names.insert(name, field.clone());
            values.insert(placeholder, to_attribute(field, value));
        }
        Self {
            expression: format!("SET {}", assignments.join(", ")),
            names,
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

fn to_item(record: &Record) -> Item {
    record
        .iter()
        .map(|(field, value)| (field.clone(), to_attribute(field, value)))
        .collect()
}

/// Convert a top-level attribute; UUID fields become binary.
fn to_attribute(field: &str, value: &Value) -> AttributeValue {
    if BINARY_FIELDS.contains(&field) {
        if let Some(uuid) = value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
            return AttributeValue::B(Blob::new(uuid.as_bytes().to_vec()));
        }
    }
    to_value_attribute(value)
}

fn to_value_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_value_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_value_attribute(v)))
                .collect(),
        ),
    }
}

fn from_item(item: &Item) -> Result<Record, String> {
    item.iter()
        .map(|(field, attr)| {
            from_attribute(attr)
                .map(|value| (field.clone(), value))
                .map_err(|reason| format!("attribute {}: {}", field, reason))
        })
        .collect()
}

fn from_attribute(attr: &AttributeValue) -> Result<Value, String> {
    match attr {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::B(blob) => Ok(binary_value(blob)),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(items) => items
            .iter()
            .map(from_attribute)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(fields) => from_item(fields).map(Value::Object),
        AttributeValue::Ss(members) => Ok(Value::Array(
            members.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(members) => members
            .iter()
            .map(|n| parse_number(n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::Bs(members) => Ok(Value::Array(members.iter().map(binary_value).collect())),
        other => Err(format!("unsupported attribute type {:?}", other)),
    }
}

fn parse_number(raw: &str) -> Result<Value, String> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Value::Number(u.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("invalid number {}", raw))
}

/// 16-byte blobs read back as hyphenated UUIDs, anything else as base64.
fn binary_value(blob: &Blob) -> Value {
    let bytes = blob.as_ref();
    match Uuid::from_slice(bytes) {
        Ok(uuid) => Value::String(uuid.to_string()),
        Err(_) => Value::String(STANDARD.encode(bytes)),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

fn sdk_error<E, R>(table: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => classify(
            table,
            service.code().unwrap_or("UnknownError"),
            service.message().unwrap_or_default(),
        ),
        None => StoreError::unavailable(DisplayErrorContext(&err).to_string()),
    }
}

/// Map a DynamoDB error code to a store error.
fn classify(table: &str, code: &str, message: &str) -> StoreError {
    match code {
        "ResourceNotFoundException" => StoreError::UnknownTable {
            table: table.to_string(),
        },
        "ProvisionedThroughputExceededException"
        | "ThrottlingException"
        | "InternalServerError"
        | "ServiceUnavailable"
        | "RequestLimitExceeded" => StoreError::unavailable(format!("{}: {}", code, message)),
        _ => StoreError::Rejected {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

fn write_failed(table: &str, error: StoreError) -> StoreError {
    match error {
        StoreError::Rejected { code, message } => StoreError::WriteFailed {
            table: table.to_string(),
            reason: format!("{}: {}", code, message),
        },
        other => other,
    }
}

fn read_failed(table: &str, reason: String) -> StoreError {
    StoreError::ReadFailed {
        table: table.to_string(),
        reason,
    }
}
