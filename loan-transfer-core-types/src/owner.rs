use serde::{Deserialize, Serialize};

use crate::primitives::OwnerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerValues {
    pub id: OwnerId,
    pub external_id: String,
}
