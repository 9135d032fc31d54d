//! An in-process stand-in for the garage admin API, recording every call it receives.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::garage_admin::{
    BucketAliasRequest, BucketInfo, BucketKeyInfo, BucketKeyPermRequest, CreateBucketRequest,
    CreateKeyRequest, GarageAdmin, ImportKeyRequest, KeyBucketInfo, KeyInfo, ListBucketsItem,
    ListKeysItem, Permissions, UpdateBucketRequest, UpdateKeyRequest, WebsiteConfig,
};

pub(crate) const TOKEN: &str = "test-token";

#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub method: String,
    pub call: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RecordedCall>,
    buckets: BTreeMap<String, BucketInfo>,
    keys: BTreeMap<String, (KeyInfo, String)>,
    canned: Option<(StatusCode, String)>,
    failing: HashMap<String, (StatusCode, String)>,
    counter: u64,
}

type Shared = Arc<Mutex<FakeState>>;

pub(crate) struct FakeGarage {
    pub admin: GarageAdmin,
    state: Shared,
}

impl FakeGarage {
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            admin: GarageAdmin::with_secret(&format!("http://{addr}/"), TOKEN),
            state,
        }
    }

    pub fn seed_bucket(&self, id: &str, alias: &str) {
        self.state.lock().unwrap().buckets.insert(
            id.to_string(),
            BucketInfo {
                id: id.to_string(),
                global_aliases: vec![alias.to_string()],
                ..Default::default()
            },
        );
    }

    pub fn bucket(&self, id: &str) -> Option<BucketInfo> {
        self.state.lock().unwrap().buckets.get(id).cloned()
    }

    /// Answer every following request with this status and body
    pub fn fail_with(&self, status: u16, body: &str) {
        self.respond_with(status, body)
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        self.state.lock().unwrap().canned =
            Some((StatusCode::from_u16(status).unwrap(), body.to_string()));
    }

    /// Answer requests to one API call with this status and body
    pub fn fail_call(&self, call: &str, status: u16, body: &str) {
        self.state.lock().unwrap().failing.insert(
            call.to_string(),
            (StatusCode::from_u16(status).unwrap(), body.to_string()),
        );
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, call: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.call == call).collect()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("no call was recorded")
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();

    let call = uri.path().trim_start_matches("/v2/").to_string();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.calls.push(RecordedCall {
        method: method.to_string(),
        call: call.clone(),
        query: query.clone(),
        body: serde_json::from_slice(&body).ok(),
        authorization: authorization.clone(),
    });

    if let Some((status, body)) = state.canned.clone().or_else(|| state.failing.get(&call).cloned()) {
        return (status, body).into_response();
    }
    if authorization.as_deref() != Some(format!("Bearer {TOKEN}").as_str()) {
        return (StatusCode::FORBIDDEN, "Forbidden: invalid token").into_response();
    }

    match route(&mut state, &call, &query, &body) {
        Ok(Some(value)) => Json(value).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err((status, message)) => (status, message.to_string()).into_response(),
    }
}

type Reply = Result<Option<Value>, (StatusCode, &'static str)>;

fn parse<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, (StatusCode, &'static str)> {
    serde_json::from_slice(body).map_err(|_| (StatusCode::BAD_REQUEST, "Bad request"))
}

fn to_value<T: serde::Serialize>(value: &T) -> Reply {
    Ok(Some(serde_json::to_value(value).unwrap()))
}

const BUCKET_NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "Bucket not found");
const KEY_NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "Key not found");

fn route(state: &mut FakeState, call: &str, query: &HashMap<String, String>, body: &[u8]) -> Reply {
    let id = query.get("id").cloned().unwrap_or_default();

    match call {
        "ListBuckets" => {
            let items: Vec<ListBucketsItem> = state
                .buckets
                .values()
                .map(|b| ListBucketsItem {
                    id: b.id.clone(),
                    global_aliases: b.global_aliases.clone(),
                })
                .collect();
            to_value(&items)
        }
        "GetBucketInfo" => {
            let bucket = match query.get("globalAlias") {
                Some(alias) => state
                    .buckets
                    .values()
                    .find(|b| b.global_aliases.contains(alias)),
                None => state.buckets.get(&id),
            };
            to_value(bucket.ok_or(BUCKET_NOT_FOUND)?)
        }
        "CreateBucket" => {
            let req: CreateBucketRequest = parse(body)?;
            let alias = req.global_alias.unwrap_or_default();
            if state
                .buckets
                .values()
                .any(|b| b.global_aliases.contains(&alias))
            {
                return Err((StatusCode::CONFLICT, "Bucket already exists"));
            }
            state.counter += 1;
            let id = format!("{:064x}", state.counter);
            let bucket = BucketInfo {
                id: id.clone(),
                global_aliases: vec![alias],
                ..Default::default()
            };
            state.buckets.insert(id, bucket.clone());
            to_value(&bucket)
        }
        "UpdateBucket" => {
            let req: UpdateBucketRequest = parse(body)?;
            let bucket = state.buckets.get_mut(&id).ok_or(BUCKET_NOT_FOUND)?;
            if let Some(website) = req.website_access {
                bucket.website_access = website.enabled;
                bucket.website_config = website.enabled.then(|| WebsiteConfig {
                    index_document: website
                        .index_document
                        .unwrap_or_else(|| "index.html".into()),
                    error_document: website.error_document,
                });
            }
            if let Some(quotas) = req.quotas {
                bucket.quotas = Some(quotas);
            }
            to_value(&*bucket)
        }
        "DeleteBucket" => {
            state.buckets.remove(&id).ok_or(BUCKET_NOT_FOUND)?;
            Ok(None)
        }
        "AddBucketAlias" | "RemoveBucketAlias" => {
            let req: BucketAliasRequest = parse(body)?;
            let bucket = state
                .buckets
                .get_mut(&req.bucket_id)
                .ok_or(BUCKET_NOT_FOUND)?;
            if call == "AddBucketAlias" {
                bucket.global_aliases.push(req.global_alias);
            } else {
                bucket.global_aliases.retain(|a| *a != req.global_alias);
            }
            to_value(&*bucket)
        }
        "AllowBucketKey" | "DenyBucketKey" => {
            let req: BucketKeyPermRequest = parse(body)?;
            let (key, _) = state.keys.get(&req.access_key_id).ok_or(KEY_NOT_FOUND)?;
            let name = key.name.clone();
            let bucket = state
                .buckets
                .get_mut(&req.bucket_id)
                .ok_or(BUCKET_NOT_FOUND)?;

            let mut current = bucket.permissions_of(&req.access_key_id);
            let flag = call == "AllowBucketKey";
            if req.permissions.read {
                current.read = flag;
            }
            if req.permissions.write {
                current.write = flag;
            }
            if req.permissions.owner {
                current.owner = flag;
            }

            bucket.keys.retain(|k| k.access_key_id != req.access_key_id);
            if current.any() {
                bucket.keys.push(BucketKeyInfo {
                    access_key_id: req.access_key_id,
                    name,
                    permissions: current,
                });
            }
            to_value(&*bucket)
        }
        "ListKeys" => {
            let items: Vec<ListKeysItem> = state
                .keys
                .values()
                .map(|(k, _)| ListKeysItem {
                    id: k.access_key_id.clone(),
                    name: k.name.clone(),
                })
                .collect();
            to_value(&items)
        }
        "CreateKey" => {
            let req: CreateKeyRequest = parse(body)?;
            state.counter += 1;
            let id = format!("GK{:024x}", state.counter);
            let secret = format!("{:064x}", state.counter);
            let key = KeyInfo {
                access_key_id: id.clone(),
                name: req.name.unwrap_or_else(|| "Unnamed key".into()),
                ..Default::default()
            };
            state.keys.insert(id, (key.clone(), secret.clone()));
            to_value(&KeyInfo {
                secret_access_key: Some(secret),
                ..key
            })
        }
        "ImportKey" => {
            let req: ImportKeyRequest = parse(body)?;
            if state.keys.contains_key(&req.access_key_id) {
                return Err((StatusCode::CONFLICT, "Key already exists"));
            }
            let key = KeyInfo {
                access_key_id: req.access_key_id.clone(),
                name: req.name.unwrap_or_default(),
                ..Default::default()
            };
            state
                .keys
                .insert(req.access_key_id, (key.clone(), req.secret_access_key.clone()));
            to_value(&KeyInfo {
                secret_access_key: Some(req.secret_access_key),
                ..key
            })
        }
        "GetKeyInfo" => {
            let (key, _) = state.keys.get(&id).ok_or(KEY_NOT_FOUND)?;
            let buckets = state
                .buckets
                .values()
                .filter(|b| b.keys.iter().any(|k| k.access_key_id == id))
                .map(|b| KeyBucketInfo {
                    id: b.id.clone(),
                    global_aliases: b.global_aliases.clone(),
                    permissions: b.permissions_of(&id),
                })
                .collect();
            to_value(&KeyInfo {
                buckets,
                ..key.clone()
            })
        }
        "UpdateKey" => {
            let req: UpdateKeyRequest = parse(body)?;
            let (key, _) = state.keys.get_mut(&id).ok_or(KEY_NOT_FOUND)?;
            if let Some(name) = req.name {
                key.name = name;
            }
            to_value(&*key)
        }
        "DeleteKey" => {
            state.keys.remove(&id).ok_or(KEY_NOT_FOUND)?;
            for bucket in state.buckets.values_mut() {
                bucket.keys.retain(|k| k.access_key_id != id);
            }
            Ok(None)
        }
        _ => Err((StatusCode::BAD_REQUEST, "Unknown API call")),
    }
}

/// Helper to flip a bucket into a state the provider did not create
pub(crate) fn grant(garage: &FakeGarage, bucket_id: &str, access_key_id: &str, permissions: Permissions) {
    let mut state = garage.state.lock().unwrap();
    let bucket = state.buckets.get_mut(bucket_id).unwrap();
    bucket.keys.retain(|k| k.access_key_id != access_key_id);
    bucket.keys.push(BucketKeyInfo {
        access_key_id: access_key_id.to_string(),
        name: String::new(),
        permissions,
    });
}
