//! Wire types exchanged with the lending backend.
//!
//! Field names follow the backend's JSON (Spanish); Rust names are English
//! and mapped with `#[serde(rename)]`.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lendix_core::{
    AddressId, ClientId, CompanyId, CreditId, CreditStatus, CreditTypeId, DocumentationId,
    EmploymentId, Money, PaymentId, Role, UserId,
};

// =============================================================================
// Pagination
// =============================================================================

/// Paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Page<T> {
    /// Whether there is a page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Whether there is a page before this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Page selection sent as query parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "page_size", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(rename = "search", skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PageQuery {
    /// Request a single page.
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page.max(1)),
            ..Self::default()
        }
    }

    /// Only the `count` is of interest.
    #[must_use]
    pub fn count_only() -> Self {
        Self {
            page: None,
            page_size: Some(1),
            search: None,
        }
    }

    /// Add a search term, ignoring blank input.
    #[must_use]
    pub fn search(mut self, term: Option<String>) -> Self {
        self.search = term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Credentials posted to the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login response.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access")]
    pub token: String,
    #[serde(alias = "usuario")]
    pub user: UserProfile,
}

/// The authenticated user as described by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(rename = "empresa", default)]
    pub company_id: Option<CompanyId>,
    #[serde(rename = "empresa_nombre", default)]
    pub company_name: Option<String>,
    #[serde(rename = "permisos", default)]
    pub permissions: Option<BTreeSet<String>>,
}

// =============================================================================
// Clients
// =============================================================================

/// A registered client (borrower).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub nombre: String,
    pub apellido: String,
    pub telefono: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ci: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Client {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

/// Body for creating or updating a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewClient {
    pub nombre: String,
    pub apellido: String,
    pub telefono: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci: Option<String>,
}

// =============================================================================
// Wizard satellites
// =============================================================================

/// A client's identity documentation.
#[derive(Debug, Clone, Deserialize)]
pub struct Documentation {
    pub id: DocumentationId,
    #[serde(rename = "cliente")]
    pub client: ClientId,
    pub ci: String,
    #[serde(default)]
    pub archivo: Option<String>,
}

/// An uploaded scan of the client's identity document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Documentation to register for a client (sent as multipart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocumentation {
    pub client: ClientId,
    pub ci: String,
    pub file: DocumentFile,
}

/// A client's employment record.
#[derive(Debug, Clone, Deserialize)]
pub struct Employment {
    pub id: EmploymentId,
    #[serde(rename = "cliente")]
    pub client: ClientId,
    pub empresa: String,
    pub cargo: String,
    pub salario: Money,
    #[serde(default)]
    pub descripcion: Option<String>,
}

/// Employment to register for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEmployment {
    #[serde(rename = "cliente")]
    pub client: ClientId,
    pub empresa: String,
    pub cargo: String,
    pub salario: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

/// A client's home address.
#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "cliente")]
    pub client: ClientId,
    pub descripcion: String,
    #[serde(default)]
    pub url_mapa: Option<String>,
    #[serde(default)]
    pub es_propia: bool,
}

/// Address to register for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAddress {
    #[serde(rename = "cliente")]
    pub client: ClientId,
    pub descripcion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_mapa: Option<String>,
    pub es_propia: bool,
}

// =============================================================================
// Credit products and applications
// =============================================================================

/// A credit product in the company catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreditType {
    pub id: CreditTypeId,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub monto_minimo: Money,
    pub monto_maximo: Money,
    /// Flat interest rate in percent over the whole term.
    pub tasa_interes: Decimal,
    /// Minimum term in months.
    pub plazo_minimo: u32,
    /// Maximum term in months.
    pub plazo_maximo: u32,
}

/// Body for creating or updating a credit product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCreditType {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub monto_minimo: Money,
    pub monto_maximo: Money,
    pub tasa_interes: Decimal,
    pub plazo_minimo: u32,
    pub plazo_maximo: u32,
}

/// A credit application.
#[derive(Debug, Clone, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    #[serde(rename = "cliente")]
    pub client: ClientId,
    #[serde(rename = "tipo_credito")]
    pub credit_type: CreditTypeId,
    pub monto: Money,
    pub plazo: u32,
    pub tasa_interes: Decimal,
    pub cuota: Money,
    pub total: Money,
    pub estado: CreditStatus,
    #[serde(default)]
    pub fecha: Option<NaiveDate>,
}

/// Body for filing a credit application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCredit {
    #[serde(rename = "cliente")]
    pub client: ClientId,
    #[serde(rename = "tipo_credito")]
    pub credit_type: CreditTypeId,
    pub monto: Money,
    pub plazo: u32,
    pub tasa_interes: Decimal,
    pub cuota: Money,
    pub total: Money,
    pub estado: CreditStatus,
}

/// Body for changing a credit's status.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditStatusUpdate {
    pub estado: CreditStatus,
}

/// Filters for listing credits.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreditQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<CreditStatus>,
    #[serde(rename = "cliente", skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientId>,
}

// =============================================================================
// Payments
// =============================================================================

/// A payment recorded against a credit.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(rename = "credito")]
    pub credit: CreditId,
    pub monto: Money,
    pub fecha: NaiveDate,
}

/// Body for recording a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPayment {
    #[serde(rename = "credito")]
    pub credit: CreditId,
    pub monto: Money,
    pub fecha: NaiveDate,
}

// =============================================================================
// Users and companies
// =============================================================================

/// A console user within the principal's company.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Body for creating a console user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<Role>,
}

/// The tenant company and its branding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Company {
    pub id: CompanyId,
    pub nombre: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub color_primario: Option<String>,
}

/// Body for updating company branding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyBranding {
    pub nombre: String,
    pub logo_url: Option<String>,
    pub color_primario: Option<String>,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_accepts_access_alias() {
        let json = r#"{
            "access": "tok",
            "user": {"id": 3, "username": "ana", "roles": ["admin", "asesor"], "empresa": 7}
        }"#;
        let login: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(login.token, "tok");
        assert_eq!(login.user.company_id, Some(CompanyId::new(7)));
        assert!(login.user.roles.contains(&Role::Advisor));
        assert!(login.user.permissions.is_none());
    }

    #[test]
    fn test_page_envelope() {
        let json = r#"{"results":[{"id":1,"nombre":"Ana","apellido":"Quispe","telefono":"+59171234567"}],
                       "count":31,"next":"http://x/?page=2","previous":null}"#;
        let page: Page<Client> = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, 31);
        assert!(page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.results[0].full_name(), "Ana Quispe");
    }

    #[test]
    fn test_new_credit_serializes_wire_names() {
        let credit = NewCredit {
            client: ClientId::new(42),
            credit_type: CreditTypeId::new(3),
            monto: Money::new(Decimal::new(1000, 0)),
            plazo: 10,
            tasa_interes: Decimal::new(12, 0),
            cuota: Money::new(Decimal::new(11_200, 2)),
            total: Money::new(Decimal::new(1120, 0)),
            estado: CreditStatus::Pending,
        };
        let json = serde_json::to_value(&credit).unwrap();
        assert_eq!(json["cliente"], 42);
        assert_eq!(json["tipo_credito"], 3);
        assert_eq!(json["estado"], "pendiente");
        assert_eq!(json["monto"], "1000");
    }

    #[test]
    fn test_credit_query_skips_empty_filters() {
        let query = CreditQuery {
            page: PageQuery::page(2),
            estado: Some(CreditStatus::Active),
            client: None,
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"page": 2, "estado": "activo"}));
    }
}
