//! Policy and grouping rule management.
//!
//! Every operation is scoped to one policy type. The unnamed variants target
//! `"p"` (policy) or `"g"` (grouping) and otherwise behave like their named
//! counterparts.

use casbin_rpc_core::error::Result;
use casbin_rpc_core::protocol::table::Rule;
use casbin_rpc_core::protocol::wire::PolicyRequest;
use casbin_rpc_core::protocol::{Method, Param};

use crate::channel::CallContext;

use super::{Enforcer, PTYPE_GROUPING, PTYPE_POLICY};

impl Enforcer {
    async fn rule_bool<I, P>(
        &self,
        ctx: &CallContext,
        method: Method,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        let req = self.rule_request(ptype, params)?;
        self.call_bool(ctx, method, &req).await
    }

    async fn filtered_bool<I, S>(
        &self,
        ctx: &CallContext,
        method: Method,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.filtered_request(ptype, field_index, field_values)?;
        self.call_bool(ctx, method, &req).await
    }

    async fn filtered_table<I, S>(
        &self,
        ctx: &CallContext,
        method: Method,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<Vec<Rule>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.filtered_request(ptype, field_index, field_values)?;
        self.call_table(ctx, method, &req).await
    }

    async fn named_table(
        &self,
        ctx: &CallContext,
        method: Method,
        ptype: &str,
    ) -> Result<Vec<Rule>> {
        let req = PolicyRequest {
            enforcer_handler: self.handle.id(),
            p_type: ptype.to_string(),
            params: Vec::new(),
        };
        self.call_table(ctx, method, &req).await
    }

    // --------------------
    // Policy rules
    // --------------------

    /// Add a rule. Returns `false` if it already exists.
    pub async fn add_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::AddPolicy, PTYPE_POLICY, params).await
    }

    /// Add a rule to the named policy. Returns `false` if it already exists.
    pub async fn add_named_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::AddNamedPolicy, ptype, params).await
    }

    /// Remove a rule. Returns `false` if it was not present.
    pub async fn remove_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::RemovePolicy, PTYPE_POLICY, params).await
    }

    pub async fn remove_named_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::RemoveNamedPolicy, ptype, params).await
    }

    /// Remove every rule whose fields from `field_index` on equal `field_values`.
    pub async fn remove_filtered_policy<I, S>(
        &self,
        ctx: &CallContext,
        field_index: usize,
        field_values: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_bool(
            ctx,
            Method::RemoveFilteredPolicy,
            PTYPE_POLICY,
            field_index,
            field_values,
        )
        .await
    }

    pub async fn remove_filtered_named_policy<I, S>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_bool(ctx, Method::RemoveFilteredNamedPolicy, ptype, field_index, field_values)
            .await
    }

    /// All rules of the policy. An empty policy yields an empty table.
    pub async fn get_policy(&self, ctx: &CallContext) -> Result<Vec<Rule>> {
        self.call_table(ctx, Method::GetPolicy, &self.empty_request()).await
    }

    pub async fn get_named_policy(&self, ctx: &CallContext, ptype: &str) -> Result<Vec<Rule>> {
        self.named_table(ctx, Method::GetNamedPolicy, ptype).await
    }

    pub async fn get_filtered_policy<I, S>(
        &self,
        ctx: &CallContext,
        field_index: usize,
        field_values: I,
    ) -> Result<Vec<Rule>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_table(ctx, Method::GetFilteredPolicy, PTYPE_POLICY, field_index, field_values)
            .await
    }

    pub async fn get_filtered_named_policy<I, S>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<Vec<Rule>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_table(ctx, Method::GetFilteredNamedPolicy, ptype, field_index, field_values)
            .await
    }

    pub async fn has_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::HasPolicy, PTYPE_POLICY, params).await
    }

    pub async fn has_named_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::HasNamedPolicy, ptype, params).await
    }

    // --------------------
    // Grouping rules
    // --------------------

    /// Add a role inheritance rule. Returns `false` if it already exists.
    pub async fn add_grouping_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::AddGroupingPolicy, PTYPE_GROUPING, params).await
    }

    pub async fn add_named_grouping_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::AddNamedGroupingPolicy, ptype, params).await
    }

    pub async fn remove_grouping_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::RemoveGroupingPolicy, PTYPE_GROUPING, params).await
    }

    pub async fn remove_named_grouping_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::RemoveNamedGroupingPolicy, ptype, params).await
    }

    pub async fn remove_filtered_grouping_policy<I, S>(
        &self,
        ctx: &CallContext,
        field_index: usize,
        field_values: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_bool(
            ctx,
            Method::RemoveFilteredGroupingPolicy,
            PTYPE_GROUPING,
            field_index,
            field_values,
        )
        .await
    }

    pub async fn remove_filtered_named_grouping_policy<I, S>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_bool(
            ctx,
            Method::RemoveFilteredNamedGroupingPolicy,
            ptype,
            field_index,
            field_values,
        )
        .await
    }

    pub async fn get_grouping_policy(&self, ctx: &CallContext) -> Result<Vec<Rule>> {
        self.call_table(ctx, Method::GetGroupingPolicy, &self.empty_request()).await
    }

    pub async fn get_named_grouping_policy(
        &self,
        ctx: &CallContext,
        ptype: &str,
    ) -> Result<Vec<Rule>> {
        self.named_table(ctx, Method::GetNamedGroupingPolicy, ptype).await
    }

    pub async fn get_filtered_grouping_policy<I, S>(
        &self,
        ctx: &CallContext,
        field_index: usize,
        field_values: I,
    ) -> Result<Vec<Rule>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_table(
            ctx,
            Method::GetFilteredGroupingPolicy,
            PTYPE_GROUPING,
            field_index,
            field_values,
        )
        .await
    }

    pub async fn get_filtered_named_grouping_policy<I, S>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        field_index: usize,
        field_values: I,
    ) -> Result<Vec<Rule>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_table(
            ctx,
            Method::GetFilteredNamedGroupingPolicy,
            ptype,
            field_index,
            field_values,
        )
        .await
    }

    pub async fn has_grouping_policy<I, P>(&self, ctx: &CallContext, params: I) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::HasGroupingPolicy, PTYPE_GROUPING, params).await
    }

    pub async fn has_named_grouping_policy<I, P>(
        &self,
        ctx: &CallContext,
        ptype: &str,
        params: I,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.rule_bool(ctx, Method::HasNamedGroupingPolicy, ptype, params).await
    }

    // --------------------
    // Enumeration
    // --------------------

    /// Subjects that appear in the policy.
    pub async fn get_all_subjects(&self, ctx: &CallContext) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllSubjects, &self.empty_request()).await
    }

    pub async fn get_all_named_subjects(
        &self,
        ctx: &CallContext,
        ptype: &str,
    ) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllNamedSubjects, &self.simple_get_request(ptype)).await
    }

    /// Objects that appear in the policy.
    pub async fn get_all_objects(&self, ctx: &CallContext) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllObjects, &self.empty_request()).await
    }

    pub async fn get_all_named_objects(
        &self,
        ctx: &CallContext,
        ptype: &str,
    ) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllNamedObjects, &self.simple_get_request(ptype)).await
    }

    /// Actions that appear in the policy.
    pub async fn get_all_actions(&self, ctx: &CallContext) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllActions, &self.empty_request()).await
    }

    pub async fn get_all_named_actions(
        &self,
        ctx: &CallContext,
        ptype: &str,
    ) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllNamedActions, &self.simple_get_request(ptype)).await
    }

    /// Roles that appear in the grouping policy.
    pub async fn get_all_roles(&self, ctx: &CallContext) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllRoles, &self.empty_request()).await
    }

    pub async fn get_all_named_roles(&self, ctx: &CallContext, ptype: &str) -> Result<Vec<String>> {
        self.call_array(ctx, Method::GetAllNamedRoles, &self.simple_get_request(ptype)).await
    }
}
