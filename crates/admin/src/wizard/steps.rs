//! Step forms and local validation.
//!
//! Each form checks presence and format before anything is sent. A failed
//! check yields a [`ValidationError`] naming the offending field.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use lendix_core::{ClientId, CreditStatus, CreditTypeId, Email, Money, MoneyError};

use crate::backend::{
    CreditType, DocumentFile, NewAddress, NewClient, NewCredit, NewDocumentation, NewEmployment,
};

/// Largest accepted identity-document upload.
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Accepted identity-document content types.
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// A form field failed a local check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Wire name of the field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn required(field: &'static str) -> Self {
        Self::new(field, format!("{field} is required."))
    }
}

/// Trimmed value of a required field.
fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

/// Trimmed value of an optional field, `None` when blank.
fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn money(field: &'static str, value: &str) -> Result<Money, ValidationError> {
    Money::parse_positive(value).map_err(|e| match e {
        MoneyError::Empty => ValidationError::required(field),
        other => ValidationError::new(field, format!("{field}: {other}.")),
    })
}

/// Phone numbers: optional leading `+`, then 7 to 15 digits. Spaces and
/// dashes are dropped.
fn phone(value: &str) -> Result<String, ValidationError> {
    let raw = required("telefono", value)?;
    let (plus, rest) = raw
        .strip_prefix('+')
        .map_or(("", raw.as_str()), |rest| ("+", rest));
    let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-')).collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::new(
            "telefono",
            "telefono must contain 7 to 15 digits.",
        ));
    }
    Ok(format!("{plus}{digits}"))
}

// =============================================================================
// Step 1: client
// =============================================================================

/// Client identity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ci: Option<String>,
}

impl ClientForm {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<NewClient, ValidationError> {
        let nombre = required("nombre", &self.nombre)?;
        let apellido = required("apellido", &self.apellido)?;
        let telefono = phone(&self.telefono)?;
        let email = optional(self.email.as_deref())
            .map(|raw| {
                Email::parse(&raw)
                    .map(|email| email.as_str().to_string())
                    .map_err(|e| ValidationError::new("email", format!("email: {e}.")))
            })
            .transpose()?;

        Ok(NewClient {
            nombre,
            apellido,
            telefono,
            email,
            ci: optional(self.ci.as_deref()),
        })
    }
}

// =============================================================================
// Step 2: documentation
// =============================================================================

/// National ID number and the uploaded scan.
#[derive(Debug, Clone, Default)]
pub struct DocumentationForm {
    pub ci: String,
    pub file: Option<DocumentFile>,
}

impl DocumentationForm {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self, client: ClientId) -> Result<NewDocumentation, ValidationError> {
        let ci = required("ci", &self.ci)?;
        let file = self
            .file
            .as_ref()
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(|| ValidationError::required("archivo"))?;

        if !DOCUMENT_CONTENT_TYPES.contains(&file.content_type.as_str()) {
            return Err(ValidationError::new(
                "archivo",
                "archivo must be a PDF, JPEG or PNG file.",
            ));
        }
        if file.bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(ValidationError::new(
                "archivo",
                "archivo must be at most 5 MB.",
            ));
        }

        Ok(NewDocumentation {
            client,
            ci,
            file: file.clone(),
        })
    }
}

// =============================================================================
// Step 3: employment
// =============================================================================

/// Employer, position and monthly salary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmploymentForm {
    #[serde(default)]
    pub empresa: String,
    #[serde(default)]
    pub cargo: String,
    #[serde(default)]
    pub salario: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

impl EmploymentForm {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self, client: ClientId) -> Result<NewEmployment, ValidationError> {
        Ok(NewEmployment {
            client,
            empresa: required("empresa", &self.empresa)?,
            cargo: required("cargo", &self.cargo)?,
            salario: money("salario", &self.salario)?,
            descripcion: optional(self.descripcion.as_deref()),
        })
    }
}

// =============================================================================
// Step 4: address
// =============================================================================

/// Home address with an optional map link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub url_mapa: Option<String>,
    /// Checkbox: present when checked.
    #[serde(default)]
    pub es_propia: Option<String>,
}

impl AddressForm {
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self, client: ClientId) -> Result<NewAddress, ValidationError> {
        let descripcion = required("descripcion", &self.descripcion)?;
        let url_mapa = optional(self.url_mapa.as_deref())
            .map(|raw| match Url::parse(&raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
                _ => Err(ValidationError::new(
                    "url_mapa",
                    "url_mapa must be a full http(s) link.",
                )),
            })
            .transpose()?;

        Ok(NewAddress {
            client,
            descripcion,
            url_mapa,
            es_propia: self.es_propia.is_some(),
        })
    }
}

// =============================================================================
// Step 5: credit type
// =============================================================================

/// Choice of credit product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditTypeForm {
    #[serde(default)]
    pub tipo_credito: String,
}

impl CreditTypeForm {
    /// # Errors
    ///
    /// Returns an error unless a product id was picked.
    pub fn validate(&self) -> Result<CreditTypeId, ValidationError> {
        let raw = required("tipo_credito", &self.tipo_credito)?;
        raw.parse()
            .map_err(|_| ValidationError::new("tipo_credito", "Pick a credit type from the list."))
    }
}

// =============================================================================
// Step 6: credit application
// =============================================================================

/// Installment and total for a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditTerms {
    pub total: Money,
    pub cuota: Money,
}

impl CreditTerms {
    /// Flat interest: `total = monto * (1 + tasa / 100)`, `cuota = total / plazo`,
    /// both rounded to cents.
    #[must_use]
    pub fn compute(monto: Money, tasa_interes: Decimal, plazo: u32) -> Self {
        let factor = Decimal::ONE + tasa_interes / Decimal::ONE_HUNDRED;
        let total = (monto.amount() * factor)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cuota = if plazo == 0 {
            total
        } else {
            (total / Decimal::from(plazo))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            total: Money::new(total),
            cuota: Money::new(cuota),
        }
    }
}

/// Amount and term of the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditForm {
    #[serde(default)]
    pub monto: String,
    #[serde(default)]
    pub plazo: String,
}

impl CreditForm {
    /// Check the amount and term against the chosen product and compute
    /// the installment.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(
        &self,
        client: ClientId,
        credit_type: &CreditType,
    ) -> Result<NewCredit, ValidationError> {
        let monto = money("monto", &self.monto)?;
        if monto < credit_type.monto_minimo || monto > credit_type.monto_maximo {
            return Err(ValidationError::new(
                "monto",
                format!(
                    "monto must be between {} and {}.",
                    credit_type.monto_minimo, credit_type.monto_maximo
                ),
            ));
        }

        let plazo: u32 = required("plazo", &self.plazo)?
            .parse()
            .map_err(|_| ValidationError::new("plazo", "plazo must be a whole number of months."))?;
        if plazo < credit_type.plazo_minimo.max(1) || plazo > credit_type.plazo_maximo {
            return Err(ValidationError::new(
                "plazo",
                format!(
                    "plazo must be between {} and {} months.",
                    credit_type.plazo_minimo.max(1),
                    credit_type.plazo_maximo
                ),
            ));
        }

        let terms = CreditTerms::compute(monto, credit_type.tasa_interes, plazo);
        Ok(NewCredit {
            client,
            credit_type: credit_type.id,
            monto,
            plazo,
            tasa_interes: credit_type.tasa_interes,
            cuota: terms.cuota,
            total: terms.total,
            estado: CreditStatus::Pending,
        })
    }
}

#[cfg(test)]
pub(crate) fn consumer_credit_type() -> CreditType {
    CreditType {
        id: CreditTypeId::new(3),
        nombre: "Consumo".to_string(),
        descripcion: None,
        monto_minimo: Money::new(Decimal::new(500, 0)),
        monto_maximo: Money::new(Decimal::new(20_000, 0)),
        tasa_interes: Decimal::new(12, 0),
        plazo_minimo: 3,
        plazo_maximo: 36,
    }
}
