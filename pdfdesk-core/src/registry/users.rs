//! User, broker company, quota and activity administration
//!
//! Visibility follows the signed-in user: superusers see everyone, other
//! admins see the users of their own broker company, standard users see only
//! themselves.

use super::item_path;
use crate::api::ApiClient;
use crate::error::{ApiError, FieldErrors};
use crate::model::page::{ListQuery, Page};
use crate::model::user::{AuthUser, BrokerCompany, QuotaUsage, User, UserActivity, UserFilters};
use crate::notify::{require_confirmation, Confirm};
use crate::validation::forms::check_password;
use crate::validation::{BrokerCompanyForm, UserForm, Validate};
use crate::Result;
use serde_json::{json, Value};

pub const USERS_PATH: &str = "users/";
pub const BROKER_COMPANIES_PATH: &str = "users/broker-companies/";
pub const QUOTA_USAGE_PATH: &str = "users/quota-usage/";
pub const ACTIVITY_PATH: &str = "users/activity/";

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct UserAdmin {
    client: ApiClient,
}

impl UserAdmin {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn actor(&self) -> Result<AuthUser> {
        self.client.session().user().ok_or(ApiError::Unauthorized)
    }

    fn is_visible(actor: &AuthUser, user: &User) -> bool {
        actor.is_superuser || actor.id == user.id || actor.can_manage(user)
    }

    fn ensure_manageable(actor: &AuthUser, user: &User) -> Result<()> {
        if actor.can_manage(user) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{} may not manage {}", actor.email, user.email)))
        }
    }

    // ========================================================================
    // USERS
    // ========================================================================

    /// Users visible to the signed-in account. `count` is reduced by the
    /// rows hidden from this page.
    pub async fn list(&self, filters: &UserFilters) -> Result<Page<User>> {
        let actor = self.actor()?;
        let mut page: Page<User> = self.client.get_with(USERS_PATH, filters.to_query()).await?;
        let fetched = page.results.len();
        page.results.retain(|user| Self::is_visible(&actor, user));
        let hidden = (fetched - page.results.len()) as u64;
        page.count = page.count.saturating_sub(hidden);
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        let actor = self.actor()?;
        let user: User = self.client.get(&item_path(USERS_PATH, id)).await?;
        if Self::is_visible(&actor, &user) {
            Ok(user)
        } else {
            Err(ApiError::NotFound(format!("user {}", id)))
        }
    }

    /// Register an account; admins may only register into their own company
    pub async fn create(&self, form: &UserForm) -> Result<User> {
        let actor = self.actor()?;
        let new_user = form.validate()?;
        if !actor.can_manage_company(Some(&new_user.broker_company)) {
            return Err(ApiError::Forbidden(format!(
                "{} may not add users to {}",
                actor.email, new_user.broker_company
            )));
        }
        let created: User = self.client.post("users/register/", &new_user).await?;
        log::info!("Registered user {}", created.email);
        Ok(created)
    }

    /// Edit names and broker details; email, role and password stay fixed
    pub async fn update(&self, user: &User, form: &UserForm) -> Result<User> {
        let actor = self.actor()?;
        Self::ensure_manageable(&actor, user)?;
        let patch = form.validate_update()?;
        if let Some(company) = &patch.broker_company {
            if !actor.can_manage_company(Some(company)) {
                return Err(ApiError::Forbidden(format!("{} may not move users to {}", actor.email, company)));
            }
        }
        self.client.patch(&item_path(USERS_PATH, &user.id), &patch).await
    }

    pub async fn set_active(&self, user: &User, active: bool) -> Result<User> {
        let actor = self.actor()?;
        Self::ensure_manageable(&actor, user)?;
        self.client.patch(&item_path(USERS_PATH, &user.id), &json!({ "is_active": active })).await
    }

    pub async fn delete(&self, user: &User, confirm: &dyn Confirm) -> Result<()> {
        let actor = self.actor()?;
        Self::ensure_manageable(&actor, user)?;
        require_confirmation(confirm, &format!("Delete user {}?", user.email))?;
        self.client.delete(&item_path(USERS_PATH, &user.id)).await
    }

    // ========================================================================
    // OWN ACCOUNT
    // ========================================================================

    pub async fn profile(&self) -> Result<User> {
        self.client.get("users/me/").await
    }

    pub async fn update_profile(&self, form: &UserForm) -> Result<User> {
        let patch = form.validate_update()?;
        self.client.patch("users/profile/", &patch).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        let mut errors = FieldErrors::new();
        if old_password.is_empty() {
            errors.add("old_password", "Current password is required");
        }
        check_password(&mut errors, "new_password", new_password);
        errors.into_result()?;

        let body = json!({ "old_password": old_password, "new_password": new_password });
        let _: Value = self.client.post("users/change-password/", &body).await?;
        Ok(())
    }

    // ========================================================================
    // BROKER COMPANIES - keyed by IA registration code
    // ========================================================================

    pub async fn broker_companies(&self, query: &ListQuery) -> Result<Page<BrokerCompany>> {
        self.client.get_with(BROKER_COMPANIES_PATH, query.to_query()).await
    }

    pub async fn broker_company(&self, ia_reg_code: &str) -> Result<BrokerCompany> {
        self.client.get(&item_path(BROKER_COMPANIES_PATH, ia_reg_code)).await
    }

    pub async fn create_broker_company(&self, form: &BrokerCompanyForm) -> Result<BrokerCompany> {
        let company = form.validate()?;
        self.client.post(BROKER_COMPANIES_PATH, &company).await
    }

    pub async fn update_broker_company(
        &self,
        ia_reg_code: &str,
        form: &BrokerCompanyForm,
    ) -> Result<BrokerCompany> {
        let company = form.validate()?;
        self.client.patch(&item_path(BROKER_COMPANIES_PATH, ia_reg_code), &company).await
    }

    pub async fn delete_broker_company(&self, company: &BrokerCompany, confirm: &dyn Confirm) -> Result<()> {
        require_confirmation(confirm, &format!("Delete broker company {}?", company.name))?;
        self.client.delete(&item_path(BROKER_COMPANIES_PATH, &company.ia_reg_code)).await
    }

    // ========================================================================
    // USAGE
    // ========================================================================

    pub async fn quota_usage(&self) -> Result<QuotaUsage> {
        self.client.get(QUOTA_USAGE_PATH).await
    }

    /// Most recent activity, for one user or the signed-in account
    pub async fn activity(&self, user_id: Option<&str>, limit: u32) -> Result<Vec<UserActivity>> {
        let mut query = Vec::new();
        if let Some(id) = user_id {
            query.push(("userId".to_string(), id.to_string()));
        }
        query.push(("limit".to_string(), limit.to_string()));
        let page: Page<UserActivity> = self.client.get_with(ACTIVITY_PATH, query).await?;
        Ok(page.results)
    }
}
