use derive_builder::Builder;

use std::sync::Arc;

use crate::{accounts::AccountResolver, business_date::BusinessDateProvider, loan::LoanLookup};

#[derive(Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct LoanTransferConfig {
    #[builder(setter(into, strip_option), default)]
    pub(super) db_con: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub(super) max_connections: Option<u32>,
    #[builder(default)]
    pub(super) exec_migrations: bool,
    #[builder(setter(into, strip_option), default)]
    pub(super) pool: Option<sqlx::SqlitePool>,
    /// Resolve open transfers of loans that become closed or overpaid.
    #[builder(default = "true")]
    pub(super) externalize_non_active_loans: bool,
    /// Assign a random external id to transfers requested without one.
    #[builder(default)]
    pub(super) auto_generate_external_id: bool,
}

impl LoanTransferConfig {
    pub fn builder() -> LoanTransferConfigBuilder {
        LoanTransferConfigBuilder::default()
    }
}

impl LoanTransferConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match (self.db_con.as_ref(), self.pool.as_ref()) {
            (None, None) | (Some(None), None) | (None, Some(None)) => {
                return Err("One of db_con or pool must be set".to_string())
            }
            (Some(_), Some(_)) => return Err("Only one of db_con or pool must be set".to_string()),
            _ => (),
        }
        Ok(())
    }
}

/// Services of the surrounding loan system the engine depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub loans: Arc<dyn LoanLookup>,
    pub accounts: Arc<dyn AccountResolver>,
    pub business_date: Arc<dyn BusinessDateProvider>,
}
