//! Role and permission operations.
//!
//! These act on the default `"g"` and `"p"` tables server-side. Lookups that
//! return roles or users yield plain string lists; permission lookups yield
//! rule tables.

use casbin_rpc_core::error::{CasbinRpcError, Result};
use casbin_rpc_core::protocol::table::Rule;
use casbin_rpc_core::protocol::wire::{PermissionRequest, UserRoleRequest};
use casbin_rpc_core::protocol::Method;

use crate::channel::CallContext;

use super::Enforcer;

impl Enforcer {
    fn user_role_request(&self, user: &str, role: &str) -> UserRoleRequest {
        UserRoleRequest {
            enforcer_handler: self.handle.id(),
            user: user.to_string(),
            role: role.to_string(),
        }
    }

    fn permission_request<I, S>(&self, user: &str, permissions: I) -> Result<PermissionRequest>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions: Vec<String> = permissions.into_iter().map(Into::into).collect();
        if permissions.is_empty() {
            return Err(CasbinRpcError::Request("permission must have at least one field".into()));
        }
        Ok(self.user_permissions(user, permissions))
    }

    fn user_permissions(&self, user: &str, permissions: Vec<String>) -> PermissionRequest {
        PermissionRequest {
            enforcer_handler: self.handle.id(),
            user: user.to_string(),
            permissions,
        }
    }

    // --------------------
    // Roles
    // --------------------

    /// Roles directly assigned to `user`.
    pub async fn get_roles_for_user(&self, ctx: &CallContext, user: &str) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetRolesForUser, &self.user_role_request(user, ""))
            .await
    }

    /// Direct and inherited roles of `user`.
    ///
    /// Domain-scoped lookups are not part of the wire request; the server
    /// resolves roles in its default domain.
    pub async fn get_implicit_roles_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
    ) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetImplicitRolesForUser, &self.user_role_request(user, ""))
            .await
    }

    /// Users that hold `role`.
    pub async fn get_users_for_role(&self, ctx: &CallContext, role: &str) -> Result<Vec<String>> {
        // the server reads the role name from the `user` field
        self.call_array(ctx, Method::GetUsersForRole, &self.user_role_request(role, ""))
            .await
    }

    pub async fn has_role_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
        role: &str,
    ) -> Result<bool> {
        self.call_bool(ctx, Method::HasRoleForUser, &self.user_role_request(user, role))
            .await
    }

    /// Returns `false` if the user already has the role.
    pub async fn add_role_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
        role: &str,
    ) -> Result<bool> {
        self.call_bool(ctx, Method::AddRoleForUser, &self.user_role_request(user, role))
            .await
    }

    /// Returns `false` if the user did not have the role.
    pub async fn delete_role_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
        role: &str,
    ) -> Result<bool> {
        self.call_bool(ctx, Method::DeleteRoleForUser, &self.user_role_request(user, role))
            .await
    }

    pub async fn delete_roles_for_user(&self, ctx: &CallContext, user: &str) -> Result<bool> {
        self.call_bool(ctx, Method::DeleteRolesForUser, &self.user_role_request(user, ""))
            .await
    }

    /// Remove the user from every role and policy rule.
    /// Returns `false` if the user does not exist.
    pub async fn delete_user(&self, ctx: &CallContext, user: &str) -> Result<bool> {
        self.call_bool(ctx, Method::DeleteUser, &self.user_role_request(user, ""))
            .await
    }

    /// Remove the role from every assignment and policy rule.
    pub async fn delete_role(&self, ctx: &CallContext, role: &str) -> Result<()> {
        self.call_empty(ctx, Method::DeleteRole, &self.user_role_request("", role))
            .await
    }

    // --------------------
    // Permissions
    // --------------------

    pub async fn get_permissions_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
    ) -> Result<Vec<Rule>> {
        self.call_table(
            ctx,
            Method::GetPermissionsForUser,
            &self.user_permissions(user, Vec::new()),
        )
        .await
    }

    /// Permissions of `user` including those inherited through roles.
    pub async fn get_implicit_permissions_for_user(
        &self,
        ctx: &CallContext,
        user: &str,
    ) -> Result<Vec<Rule>> {
        self.call_table(
            ctx,
            Method::GetImplicitPermissionsForUser,
            &self.user_permissions(user, Vec::new()),
        )
        .await
    }

    /// Returns `false` if the user already has the permission.
    pub async fn add_permission_for_user<I, S>(
        &self,
        ctx: &CallContext,
        user: &str,
        permission: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.permission_request(user, permission)?;
        self.call_bool(ctx, Method::AddPermissionForUser, &req).await
    }

    pub async fn delete_permission_for_user<I, S>(
        &self,
        ctx: &CallContext,
        user: &str,
        permission: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.permission_request(user, permission)?;
        self.call_bool(ctx, Method::DeletePermissionForUser, &req).await
    }

    pub async fn delete_permissions_for_user(&self, ctx: &CallContext, user: &str) -> Result<bool> {
        self.call_bool(
            ctx,
            Method::DeletePermissionsForUser,
            &self.user_permissions(user, Vec::new()),
        )
        .await
    }

    /// Remove a permission from every user and role.
    /// Returns `false` if no rule carried it.
    pub async fn delete_permission<I, S>(&self, ctx: &CallContext, permission: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.permission_request("", permission)?;
        self.call_bool(ctx, Method::DeletePermission, &req).await
    }

    pub async fn has_permission_for_user<I, S>(
        &self,
        ctx: &CallContext,
        user: &str,
        permission: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.permission_request(user, permission)?;
        self.call_bool(ctx, Method::HasPermissionForUser, &req).await
    }
}
