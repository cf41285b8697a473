//! Users, broker companies, quota and activity

use super::{default_true, wire_enum};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum Role {
        Admin => "admin",
        Standard => "standard",
    }
}

wire_enum! {
    /// Activity feed entry kind
    pub enum ActivityKind {
        Login => "login",
        Logout => "logout",
        Create => "create",
        Update => "update",
        Delete => "delete",
        EmailVerification => "email_verification",
        PasswordChange => "password_change",
        PasswordResetRequest => "password_reset_request",
        PasswordReset => "password_reset",
        FormGenerated => "form_generated",
        ClientAdded => "client_added",
        ClientUpdated => "client_updated",
        ClientExported => "client_exported",
        Other => "other",
    }
    fallback Other
}

/// Identity returned by login and kept in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    /// IA registration code of the user's broker company
    #[serde(default)]
    pub broker_company: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            is_staff: false,
            is_superuser: false,
            broker_company: None,
        }
    }

    pub fn with_broker_company(mut self, code: impl Into<String>) -> Self {
        self.broker_company = Some(code.into());
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self.is_staff = true;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == Role::Admin
    }

    /// Whether this user may manage accounts of `company`.
    ///
    /// Superusers manage everyone; other admins only users of their own
    /// broker company; standard users nobody.
    pub fn can_manage_company(&self, company: Option<&str>) -> bool {
        if self.is_superuser {
            return true;
        }
        if self.role != Role::Admin {
            return false;
        }
        matches!((self.broker_company.as_deref(), company), (Some(own), Some(other)) if own == other)
    }

    pub fn can_manage(&self, user: &User) -> bool {
        self.can_manage_company(user.broker_company.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub broker_company: Option<String>,
    #[serde(default)]
    pub tr_name: Option<String>,
    #[serde(default)]
    pub tr_license_number: Option<String>,
    #[serde(default)]
    pub tr_phone_number: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub daily_form_quota: Option<u64>,
    #[serde(default)]
    pub monthly_form_quota: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub broker_company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_phone_number: Option<String>,
}

/// Editable user members; email, role and password are fixed after creation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tr_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerCompany {
    #[serde(default, deserialize_with = "super::opt_id_string")]
    pub id: Option<String>,
    pub name: String,
    pub ia_reg_code: String,
    #[serde(default)]
    pub mpfa_reg_code: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub responsible_officer_email: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBrokerCompany {
    pub name: String,
    pub ia_reg_code: String,
    pub mpfa_reg_code: String,
    pub phone_number: String,
    pub address: String,
    pub responsible_officer_email: String,
    pub contact_email: String,
}

/// Daily and monthly generation usage against quota
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaUsage {
    #[serde(default)]
    pub daily_usage: u64,
    #[serde(default)]
    pub daily_quota: Option<u64>,
    #[serde(default)]
    pub has_daily_quota: bool,
    #[serde(default)]
    pub monthly_usage: u64,
    #[serde(default)]
    pub monthly_quota: Option<u64>,
    #[serde(default)]
    pub has_monthly_quota: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(rename = "type", alias = "action")]
    pub kind: ActivityKind,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Filters for the user list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(role) = self.role {
            query.push(("role".to_string(), role.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page_size".to_string(), size.to_string()));
        }
        query
    }
}
