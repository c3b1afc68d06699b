//! In-memory policy server used by the client integration tests.
//!
//! `MemoryServer` implements `Transport` directly, so an `Enforcer` can be
//! driven end to end without a socket. `serve_tcp` exposes the same server
//! over line-delimited JSON frames for the TCP channel tests.
//!
//! Enforcement follows a fixed `sub, obj, act` model: a request is allowed when
//! the subject, or any role it holds through `g`, has a matching `p` rule. An
//! attribute-token subject is resolved through its `sub` field.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::codec::{Framed, LinesCodec};

use casbin_rpc_client::{ChannelOptions, Transport};
use casbin_rpc_core::error::{CasbinRpcError, RemoteCode, Result};
use casbin_rpc_core::protocol::abac::is_attribute_token;
use casbin_rpc_core::protocol::frame::{decode_request_frame, encode_frame};
use casbin_rpc_core::protocol::table::table_to_reply;
use casbin_rpc_core::protocol::wire::*;
use casbin_rpc_core::protocol::{decode_attributes, FieldFilter, Method, RemoteStatus, ReplyFrame, Rule};
use casbin_rpc_core::NO_ADAPTER;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Short timeouts so a stuck test fails fast.
pub fn test_options() -> ChannelOptions {
    ChannelOptions {
        connect_timeout: std::time::Duration::from_secs(2),
        request_timeout: Some(std::time::Duration::from_secs(5)),
        max_frame_bytes: 64 * 1024,
    }
}

#[derive(Default)]
struct Policies {
    // ptype -> rules in insertion order
    tables: BTreeMap<String, Vec<Rule>>,
}

impl Policies {
    fn table(&self, ptype: &str) -> Vec<Rule> {
        self.tables.get(ptype).cloned().unwrap_or_default()
    }

    fn has(&self, ptype: &str, rule: &[String]) -> bool {
        self.tables
            .get(ptype)
            .is_some_and(|t| t.iter().any(|r| r == rule))
    }

    fn add(&mut self, ptype: &str, rule: Rule) -> bool {
        let t = self.tables.entry(ptype.to_string()).or_default();
        if t.contains(&rule) {
            return false;
        }
        t.push(rule);
        true
    }

    fn remove(&mut self, ptype: &str, rule: &[String]) -> bool {
        self.remove_where(ptype, |r| r == rule)
    }

    fn remove_where(&mut self, ptype: &str, pred: impl Fn(&Rule) -> bool) -> bool {
        let Some(t) = self.tables.get_mut(ptype) else {
            return false;
        };
        let before = t.len();
        t.retain(|r| !pred(r));
        t.len() != before
    }

    fn column(&self, ptype: &str, idx: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in self.tables.get(ptype).into_iter().flatten() {
            if let Some(v) = r.get(idx) {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
        }
        out
    }

    fn direct_roles(&self, user: &str) -> Vec<String> {
        self.tables
            .get("g")
            .into_iter()
            .flatten()
            .filter(|r| r.first().map(String::as_str) == Some(user))
            .filter_map(|r| r.get(1).cloned())
            .collect()
    }

    fn implicit_roles(&self, user: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::from([user.to_string()]);
        while let Some(name) = queue.pop_front() {
            for role in self.direct_roles(&name) {
                if role != user && !out.contains(&role) {
                    out.push(role.clone());
                    queue.push_back(role);
                }
            }
        }
        out
    }

    fn permissions_for(&self, user: &str) -> Vec<Rule> {
        self.table("p")
            .into_iter()
            .filter(|r| r.first().map(String::as_str) == Some(user))
            .collect()
    }

    fn allows(&self, sub: &str, obj: &str, act: &str) -> bool {
        std::iter::once(sub.to_string())
            .chain(self.implicit_roles(sub))
            .any(|s| self.has("p", &[s, obj.to_string(), act.to_string()]))
    }
}

#[derive(Default)]
struct State {
    next_handle: i32,
    adapters: HashMap<i32, (String, String)>,
    enforcers: HashMap<i32, Policies>,
    // enforcers created with enableAcceptJsonRequest
    json_requests: Vec<i32>,
}

/// Reference policy server holding every enforcer in memory.
#[derive(Default)]
pub struct MemoryServer {
    state: Mutex<State>,
    calls: Mutex<Vec<Method>>,
    fail_new_enforcer: AtomicBool,
    closed: AtomicBool,
}

impl MemoryServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every `NewEnforcer` fail with `FAILED_PRECONDITION`.
    pub fn fail_new_enforcer(&self, fail: bool) {
        self.fail_new_enforcer.store(fail, Ordering::SeqCst);
    }

    /// Operations received so far, in arrival order.
    pub fn calls(&self) -> Vec<Method> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls().into_iter().filter(|m| *m == method).count()
    }

    pub fn adapter_count(&self) -> usize {
        self.state.lock().unwrap().adapters.len()
    }

    pub fn enforcer_count(&self) -> usize {
        self.state.lock().unwrap().enforcers.len()
    }

    pub fn accepts_json_requests(&self, enforcer: i32) -> bool {
        self.state.lock().unwrap().json_requests.contains(&enforcer)
    }

    /// Seed rules directly, bypassing the wire.
    pub fn seed(&self, enforcer: i32, ptype: &str, rules: &[&[&str]]) {
        let mut st = self.state.lock().unwrap();
        let p = st.enforcers.get_mut(&enforcer).expect("unknown enforcer");
        for r in rules {
            p.add(ptype, r.iter().map(|s| s.to_string()).collect());
        }
    }

    /// Execute one operation against the in-memory state.
    pub fn handle(&self, method: Method, body: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(method);
        let mut st = self.state.lock().unwrap();

        match method {
            Method::NewAdapter => {
                let req: NewAdapterRequest = decode(body)?;
                st.next_handle += 1;
                let id = st.next_handle;
                st.adapters.insert(id, (req.driver_name, req.connect_string));
                reply(&NewAdapterReply { handler: id })
            }
            Method::NewEnforcer => {
                let req: NewEnforcerRequest = decode(body)?;
                if self.fail_new_enforcer.load(Ordering::SeqCst) {
                    return Err(CasbinRpcError::remote(RemoteCode::FailedPrecondition, "invalid model"));
                }
                if req.adapter_handle != NO_ADAPTER && !st.adapters.contains_key(&req.adapter_handle) {
                    return Err(CasbinRpcError::remote(RemoteCode::NotFound, "adapter not found"));
                }
                st.next_handle += 1;
                let id = st.next_handle;
                st.enforcers.insert(id, Policies::default());
                if req.enable_accept_json_request {
                    st.json_requests.push(id);
                }
                reply(&NewEnforcerReply { handler: id })
            }
            Method::Enforce => {
                let req: EnforceRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                let [sub, obj, act] = req.params.as_slice() else {
                    return Err(CasbinRpcError::remote(
                        RemoteCode::InvalidArgument,
                        format!("invalid request size: expected 3, got {}", req.params.len()),
                    ));
                };
                let sub = resolve_subject(sub)?;
                reply(&BoolReply { res: p.allows(&sub, obj, act) })
            }
            Method::LoadPolicy | Method::SavePolicy => {
                let req: EmptyRequest = decode(body)?;
                enforcer(&st, req.handler)?;
                reply(&EmptyReply {})
            }

            Method::AddPolicy
            | Method::AddNamedPolicy
            | Method::AddGroupingPolicy
            | Method::AddNamedGroupingPolicy => {
                let req: PolicyRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.add(&req.p_type, req.params) })
            }
            Method::RemovePolicy
            | Method::RemoveNamedPolicy
            | Method::RemoveGroupingPolicy
            | Method::RemoveNamedGroupingPolicy => {
                let req: PolicyRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove(&req.p_type, &req.params) })
            }
            Method::HasPolicy
            | Method::HasNamedPolicy
            | Method::HasGroupingPolicy
            | Method::HasNamedGroupingPolicy => {
                let req: PolicyRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.has(&req.p_type, &req.params) })
            }
            Method::RemoveFilteredPolicy
            | Method::RemoveFilteredNamedPolicy
            | Method::RemoveFilteredGroupingPolicy
            | Method::RemoveFilteredNamedGroupingPolicy => {
                let req: FilteredPolicyRequest = decode(body)?;
                let filter = filter_of(&req)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove_where(&req.p_type, |r| filter.matches(r)) })
            }
            Method::GetPolicy | Method::GetGroupingPolicy => {
                let req: EmptyRequest = decode(body)?;
                let p = enforcer(&st, req.handler)?;
                let ptype = if method == Method::GetPolicy { "p" } else { "g" };
                reply(&table_to_reply(p.table(ptype)))
            }
            Method::GetNamedPolicy | Method::GetNamedGroupingPolicy => {
                let req: PolicyRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&table_to_reply(p.table(&req.p_type)))
            }
            Method::GetFilteredPolicy
            | Method::GetFilteredNamedPolicy
            | Method::GetFilteredGroupingPolicy
            | Method::GetFilteredNamedGroupingPolicy => {
                let req: FilteredPolicyRequest = decode(body)?;
                let filter = filter_of(&req)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                let rules = p.table(&req.p_type).into_iter().filter(|r| filter.matches(r));
                reply(&table_to_reply(rules))
            }

            Method::GetAllSubjects | Method::GetAllObjects | Method::GetAllActions | Method::GetAllRoles => {
                let req: EmptyRequest = decode(body)?;
                let p = enforcer(&st, req.handler)?;
                let (ptype, idx) = match method {
                    Method::GetAllSubjects => ("p", 0),
                    Method::GetAllObjects => ("p", 1),
                    Method::GetAllActions => ("p", 2),
                    _ => ("g", 1),
                };
                reply(&ArrayReply { array: p.column(ptype, idx) })
            }
            Method::GetAllNamedSubjects
            | Method::GetAllNamedObjects
            | Method::GetAllNamedActions
            | Method::GetAllNamedRoles => {
                let req: SimpleGetRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                let idx = match method {
                    Method::GetAllNamedSubjects => 0,
                    Method::GetAllNamedObjects => 1,
                    Method::GetAllNamedActions => 2,
                    _ => 1,
                };
                reply(&ArrayReply { array: p.column(&req.p_type, idx) })
            }

            Method::GetRolesForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&ArrayReply { array: p.direct_roles(&req.user) })
            }
            Method::GetImplicitRolesForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&ArrayReply { array: p.implicit_roles(&req.user) })
            }
            Method::GetUsersForRole => {
                // role name travels in `user`
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                let users = p
                    .table("g")
                    .into_iter()
                    .filter(|r| r.get(1) == Some(&req.user))
                    .filter_map(|r| r.first().cloned())
                    .collect();
                reply(&ArrayReply { array: users })
            }
            Method::HasRoleForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.has("g", &[req.user, req.role]) })
            }
            Method::AddRoleForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.add("g", vec![req.user, req.role]) })
            }
            Method::DeleteRoleForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove("g", &[req.user, req.role]) })
            }
            Method::DeleteRolesForUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove_where("g", |r| r.first() == Some(&req.user)) })
            }
            Method::DeleteUser => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                let g = p.remove_where("g", |r| r.first() == Some(&req.user));
                let pp = p.remove_where("p", |r| r.first() == Some(&req.user));
                reply(&BoolReply { res: g || pp })
            }
            Method::DeleteRole => {
                let req: UserRoleRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                p.remove_where("g", |r| r.get(1) == Some(&req.role));
                p.remove_where("p", |r| r.first() == Some(&req.role));
                reply(&EmptyReply {})
            }

            Method::GetPermissionsForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&table_to_reply(p.permissions_for(&req.user)))
            }
            Method::GetImplicitPermissionsForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                let rules: Vec<Rule> = std::iter::once(req.user.clone())
                    .chain(p.implicit_roles(&req.user))
                    .flat_map(|s| p.permissions_for(&s))
                    .collect();
                reply(&table_to_reply(rules))
            }
            Method::AddPermissionForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.add("p", user_rule(req.user, req.permissions)) })
            }
            Method::DeletePermissionForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove("p", &user_rule(req.user, req.permissions)) })
            }
            Method::DeletePermissionsForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.remove_where("p", |r| r.first() == Some(&req.user)) })
            }
            Method::DeletePermission => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer_mut(&mut st, req.enforcer_handler)?;
                reply(&BoolReply {
                    res: p.remove_where("p", |r| r.get(1..) == Some(req.permissions.as_slice())),
                })
            }
            Method::HasPermissionForUser => {
                let req: PermissionRequest = decode(body)?;
                let p = enforcer(&st, req.enforcer_handler)?;
                reply(&BoolReply { res: p.has("p", &user_rule(req.user, req.permissions)) })
            }
        }
    }
}

#[async_trait]
impl Transport for MemoryServer {
    async fn call(&self, method: Method, body: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CasbinRpcError::Connection("memory server closed".into()));
        }
        self.handle(method, body)
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Transport whose calls never complete.
pub struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
    async fn call(&self, _method: Method, _body: Value) -> Result<Value> {
        std::future::pending().await
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| CasbinRpcError::remote(RemoteCode::InvalidArgument, format!("bad body: {e}")))
}

fn reply<T: Serialize>(rep: &T) -> Result<Value> {
    serde_json::to_value(rep).map_err(|e| CasbinRpcError::Internal(e.to_string()))
}

fn enforcer(st: &State, handle: i32) -> Result<&Policies> {
    st.enforcers
        .get(&handle)
        .ok_or_else(|| CasbinRpcError::remote(RemoteCode::NotFound, format!("enforcer {handle} not found")))
}

fn enforcer_mut(st: &mut State, handle: i32) -> Result<&mut Policies> {
    st.enforcers
        .get_mut(&handle)
        .ok_or_else(|| CasbinRpcError::remote(RemoteCode::NotFound, format!("enforcer {handle} not found")))
}

fn filter_of(req: &FilteredPolicyRequest) -> Result<FieldFilter> {
    let idx = usize::try_from(req.field_index)
        .map_err(|_| CasbinRpcError::remote(RemoteCode::InvalidArgument, "negative field index"))?;
    Ok(FieldFilter::new(idx, req.field_values.clone()))
}

fn resolve_subject(sub: &str) -> Result<String> {
    if !is_attribute_token(sub) {
        return Ok(sub.to_string());
    }
    let record = decode_attributes(sub)
        .map_err(|e| CasbinRpcError::remote(RemoteCode::InvalidArgument, e.to_string()))?;
    match record.get("sub") {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(CasbinRpcError::remote(RemoteCode::InvalidArgument, "attribute record has no sub")),
    }
}

fn user_rule(user: String, permissions: Vec<String>) -> Rule {
    std::iter::once(user).chain(permissions).collect()
}

// --------------------
// TCP front end
// --------------------

/// How the TCP test server treats requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    /// Reply to every request.
    Normal,
    /// Read requests, never reply.
    Silent,
    /// Drop the connection after the first request.
    HangUp,
    /// Reply normally but add an envelope field the client does not know.
    ExtraField,
}

/// Serve `server` on an ephemeral localhost port. Returns the bound address.
pub async fn serve_tcp(server: Arc<MemoryServer>, mode: ServeMode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(1024 * 1024));
                while let Some(Ok(line)) = framed.next().await {
                    match mode {
                        ServeMode::Silent => continue,
                        ServeMode::HangUp => return,
                        ServeMode::Normal | ServeMode::ExtraField => {}
                    }
                    let frame = match decode_request_frame(&line) {
                        Ok(f) => f,
                        Err(_) => continue,
                    };
                    let outcome = frame
                        .method()
                        .and_then(|m| server.handle(m, frame.body.clone()));
                    let reply = match outcome {
                        Ok(body) => ReplyFrame::ok(frame.id, body),
                        Err(e) => ReplyFrame::err(frame.id, RemoteStatus::from_error(&e)),
                    };
                    let line = if mode == ServeMode::ExtraField {
                        let mut v = serde_json::to_value(&reply).unwrap();
                        v["trace"] = Value::from("x");
                        v.to_string()
                    } else {
                        encode_frame(&reply).unwrap()
                    };
                    if framed.send(line).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    addr
}
