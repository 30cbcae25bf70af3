use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralInformation {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub production_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialComposition {
    pub cathode: Option<String>,
    pub anode: Option<String>,
    pub electrolyte: Option<String>,
    pub casing: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonFootprint {
    // Explicit renames: the wire format capitalizes CO2e.
    #[serde(rename = "productionKgCO2e")]
    pub production_kg_co2e: Option<f64>,
    #[serde(rename = "lifecycleKgCO2e")]
    pub lifecycle_kg_co2e: Option<f64>,
}

/// Mutation body accepted by create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassportBody {
    pub general_information: GeneralInformation,
    pub material_composition: MaterialComposition,
    pub carbon_footprint: CarbonFootprint,
}

/// A stored battery passport document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportDocument {
    pub id: Uuid,
    pub general_information: GeneralInformation,
    pub material_composition: MaterialComposition,
    pub carbon_footprint: CarbonFootprint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
