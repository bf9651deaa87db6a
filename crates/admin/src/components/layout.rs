//! Data every console page's layout needs.

use crate::backend::Company;
use crate::middleware::{Administrators, Cashiers, Officers, RolePolicy};
use crate::models::Principal;

/// Default primary color when the company has none.
pub const DEFAULT_BRAND_COLOR: &str = "#1f6feb";

/// Signed-in user and branding, as shown in the page chrome.
#[derive(Debug, Clone)]
pub struct ConsoleView {
    pub username: String,
    pub roles: String,
    pub company_name: String,
    pub logo_url: Option<String>,
    pub brand_color: String,
    pub can_manage_catalog: bool,
    pub can_manage_credits: bool,
    pub can_record_payments: bool,
    /// Path of the page, for highlighting the active menu entry.
    pub current_path: String,
    /// One-time notice from the previous request.
    pub flash: Option<String>,
}

impl ConsoleView {
    #[must_use]
    pub fn new(principal: &Principal, company: Option<&Company>, current_path: &str) -> Self {
        Self {
            username: principal.username.clone(),
            roles: principal.role_labels(),
            company_name: company
                .map(|c| c.nombre.clone())
                .or_else(|| principal.company_name.clone())
                .unwrap_or_else(|| "Lendix".to_string()),
            logo_url: company.and_then(|c| c.logo_url.clone()),
            brand_color: company
                .and_then(|c| c.color_primario.clone())
                .unwrap_or_else(|| DEFAULT_BRAND_COLOR.to_string()),
            can_manage_catalog: principal.has_any_role(Administrators::ALLOWED),
            can_manage_credits: principal.has_any_role(Officers::ALLOWED),
            can_record_payments: principal.has_any_role(Cashiers::ALLOWED),
            current_path: current_path.to_string(),
            flash: None,
        }
    }

    #[must_use]
    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash;
        self
    }

    /// Whether the menu entry for `prefix` is the active one.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.current_path == "/";
        }
        self.current_path.starts_with(prefix)
    }
}
