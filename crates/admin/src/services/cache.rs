//! In-process cache for slow-changing backend data.
//!
//! Company branding and the credit product catalog are read on most pages
//! but change rarely. Entries expire after 5 minutes; catalog writes
//! invalidate the company's catalog immediately.

use std::time::Duration;

use moka::future::Cache;

use lendix_core::{CompanyId, UserId};

use crate::backend::{Company, CreditType};

const TTL: Duration = Duration::from_secs(300);

/// Key for the branding shown on the logged-out login page.
const LOGIN_BRANDING_KEY: &str = "branding:login";

#[derive(Debug, Clone)]
enum CacheValue {
    Company(Box<Company>),
    CreditTypes(Vec<CreditType>),
}

/// Cache shared by all requests.
#[derive(Clone)]
pub struct ConsoleCache {
    cache: Cache<String, CacheValue>,
}

impl Default for ConsoleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1000)
                .time_to_live(TTL)
                .build(),
        }
    }

    fn company_key(company: CompanyId) -> String {
        format!("company:{company}")
    }

    fn user_company_key(user: UserId) -> String {
        format!("company:user:{user}")
    }

    fn catalog_key(company: Option<CompanyId>) -> String {
        company.map_or_else(|| "credit_types:all".to_string(), |c| format!("credit_types:{c}"))
    }

    /// Cached company, if fresh.
    pub async fn company(&self, id: CompanyId) -> Option<Company> {
        match self.cache.get(&Self::company_key(id)).await {
            Some(CacheValue::Company(company)) => Some(*company),
            _ => None,
        }
    }

    /// Store a company. It also becomes the login page's branding.
    pub async fn insert_company(&self, company: &Company) {
        let value = CacheValue::Company(Box::new(company.clone()));
        self.cache
            .insert(Self::company_key(company.id), value.clone())
            .await;
        self.cache.insert(LOGIN_BRANDING_KEY.to_string(), value).await;
    }

    /// Cached company of a user whose session carries no company id.
    pub async fn user_company(&self, user: UserId) -> Option<Company> {
        match self.cache.get(&Self::user_company_key(user)).await {
            Some(CacheValue::Company(company)) => Some(*company),
            _ => None,
        }
    }

    /// Store the company the backend resolved for `user`.
    pub async fn insert_user_company(&self, user: UserId, company: &Company) {
        self.cache
            .insert(
                Self::user_company_key(user),
                CacheValue::Company(Box::new(company.clone())),
            )
            .await;
        self.insert_company(company).await;
    }

    /// Branding of the last company seen by this console.
    pub async fn login_branding(&self) -> Option<Company> {
        match self.cache.get(LOGIN_BRANDING_KEY).await {
            Some(CacheValue::Company(company)) => Some(*company),
            _ => None,
        }
    }

    /// Cached credit product catalog for a company.
    pub async fn credit_types(&self, company: Option<CompanyId>) -> Option<Vec<CreditType>> {
        match self.cache.get(&Self::catalog_key(company)).await {
            Some(CacheValue::CreditTypes(types)) => Some(types),
            _ => None,
        }
    }

    pub async fn insert_credit_types(&self, company: Option<CompanyId>, types: Vec<CreditType>) {
        self.cache
            .insert(Self::catalog_key(company), CacheValue::CreditTypes(types))
            .await;
    }

    /// Drop a company's catalog after it changed.
    pub async fn invalidate_credit_types(&self, company: Option<CompanyId>) {
        self.cache.invalidate(&Self::catalog_key(company)).await;
    }
}
