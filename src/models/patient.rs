use serde::{Deserialize, Serialize};

/// Optional demographic fields captured at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDemographics {
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Registered patient. The credential hash never leaves the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(flatten)]
    pub demographics: PatientDemographics,
    pub created_at: String,
}
