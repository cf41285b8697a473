//! Commonly used types
//!
//! ```rust,ignore
//! use pdfdesk_core::prelude::*;
//! ```

pub use crate::api::{ApiClient, Download};
pub use crate::config::PdfdeskConfig;
pub use crate::dashboard::{DashboardData, DashboardPoller, DashboardService};
pub use crate::error::{ApiError, FieldErrors};
pub use crate::model::{
    AuthUser, Client, ClientFilters, ClientRecord, FieldMapping, FormGenerationBatch, FormSet, ListQuery,
    Page, Role, StandardizedField, Template, User,
};
pub use crate::notify::{AlwaysConfirm, Confirm, LogNotifier, NeverConfirm, Notifier};
pub use crate::ordering::{DisplayOrderManager, ReorderOutcome};
pub use crate::quota::{QuotaGauge, QuotaLevel, QuotaService};
pub use crate::registry::{
    CategoryRegistry, ClientStore, FieldFilter, FieldMappingLayer, FieldRegistry, FormSetComposer,
    TemplateFilter, TemplateRegistry, UserAdmin,
};
pub use crate::session::{AuthService, SessionHandle};
pub use crate::validation::{
    FieldMappingForm, FormSetForm, StandardizedFieldForm, TemplateForm, UserForm, Validate,
};
pub use crate::workflow::{FormGenerationWorkflow, FormGenerator, WorkflowStep};
pub use crate::Result;
