//! Request and reply bodies for every remote operation.
//!
//! Field names follow the proto3 JSON mapping of the policy service
//! (`enforcerHandler`, `pType`, `fieldIndex`, ...). Missing repeated fields
//! decode as empty so a server that omits empty lists stays compatible.

use serde::{Deserialize, Serialize};

macro_rules! methods {
    ($($variant:ident),* $(,)?) => {
        /// Remote operation names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Method {
            $($variant,)*
        }

        impl Method {
            /// Every operation, in declaration order.
            pub const ALL: &'static [Method] = &[$(Method::$variant),*];

            /// Wire name of the operation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Method::$variant => stringify!($variant),)*
                }
            }

            /// Resolve a wire name. Returns `None` for unknown operations.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $(stringify!($variant) => Some(Method::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

methods!(
    NewAdapter,
    NewEnforcer,
    Enforce,
    LoadPolicy,
    SavePolicy,
    AddPolicy,
    AddNamedPolicy,
    RemovePolicy,
    RemoveNamedPolicy,
    RemoveFilteredPolicy,
    RemoveFilteredNamedPolicy,
    GetPolicy,
    GetNamedPolicy,
    GetFilteredPolicy,
    GetFilteredNamedPolicy,
    HasPolicy,
    HasNamedPolicy,
    AddGroupingPolicy,
    AddNamedGroupingPolicy,
    RemoveGroupingPolicy,
    RemoveNamedGroupingPolicy,
    RemoveFilteredGroupingPolicy,
    RemoveFilteredNamedGroupingPolicy,
    GetGroupingPolicy,
    GetNamedGroupingPolicy,
    GetFilteredGroupingPolicy,
    GetFilteredNamedGroupingPolicy,
    HasGroupingPolicy,
    HasNamedGroupingPolicy,
    GetAllSubjects,
    GetAllNamedSubjects,
    GetAllObjects,
    GetAllNamedObjects,
    GetAllActions,
    GetAllNamedActions,
    GetAllRoles,
    GetAllNamedRoles,
    GetRolesForUser,
    GetImplicitRolesForUser,
    GetUsersForRole,
    HasRoleForUser,
    AddRoleForUser,
    DeleteRoleForUser,
    DeleteRolesForUser,
    DeleteUser,
    DeleteRole,
    GetPermissionsForUser,
    GetImplicitPermissionsForUser,
    DeletePermission,
    AddPermissionForUser,
    DeletePermissionForUser,
    DeletePermissionsForUser,
    HasPermissionForUser,
);

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --------------------
// Requests
// --------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdapterRequest {
    pub driver_name: String,
    pub connect_string: String,
    #[serde(default)]
    pub db_specified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnforcerRequest {
    #[serde(default)]
    pub model_text: String,
    /// `-1` when no adapter is attached.
    pub adapter_handle: i32,
    /// Lets the server accept JSON-object enforce parameters. Omitted when unset.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_accept_json_request: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforceRequest {
    pub enforcer_handler: i32,
    #[serde(default)]
    pub params: Vec<String>,
}

/// Handle-only request (`GetPolicy`, `LoadPolicy`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyRequest {
    pub handler: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequest {
    pub enforcer_handler: i32,
    pub p_type: String,
    #[serde(default)]
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleGetRequest {
    pub enforcer_handler: i32,
    pub p_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPolicyRequest {
    pub enforcer_handler: i32,
    pub p_type: String,
    pub field_index: i32,
    #[serde(default)]
    pub field_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRequest {
    pub enforcer_handler: i32,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub enforcer_handler: i32,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

// --------------------
// Replies
// --------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdapterReply {
    pub handler: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnforcerReply {
    pub handler: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolReply {
    #[serde(default)]
    pub res: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyReply {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayReply {
    #[serde(default)]
    pub array: Vec<String>,
}

/// One row of a rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Array1D {
    #[serde(default)]
    pub d1: Vec<String>,
}

/// A rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Array2DReply {
    #[serde(default)]
    pub d2: Vec<Array1D>,
}
