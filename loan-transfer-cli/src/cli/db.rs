use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_db_con")]
    pub db_con: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_con: default_db_con(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_con() -> String {
    "sqlite://loan-transfer.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}
