//! Typed records for the seven warehouse resources.
//!
//! Every non-key attribute is optional: the backend omits columns freely
//! and the client treats whatever it returns as authoritative.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::resource::ResourceKind;
use crate::types::Record;

/// Synthetic primary keys assigned by the backend.
pub type RecordId = i64;

/// Implemented by every typed record so generic helpers can find the
/// resource and the shared `pdb_id` join key.
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    const KIND: ResourceKind;

    fn pdb_id(&self) -> &str;

    /// Convert into the generic JSON row used by the views.
    fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Record::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinInfo {
    pub pdb_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub expression_system: Option<String>,
    #[serde(default)]
    pub molecular_weight: Option<f64>,
    #[serde(default)]
    pub atom_count: Option<i64>,
    #[serde(default)]
    pub residue_count: Option<i64>,
    #[serde(default)]
    pub polymer_entity_count: Option<i64>,
    #[serde(default, with = "lenient_date")]
    pub deposition_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalData {
    pub pdb_id: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub r_value_work: Option<f64>,
    #[serde(default)]
    pub r_value_free: Option<f64>,
    #[serde(default)]
    pub space_group: Option<String>,
    #[serde(default)]
    pub crystallization_method: Option<String>,
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macromolecule {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub pdb_id: String,
    pub entity_id: i64,
    #[serde(default)]
    pub molecule_name: Option<String>,
    #[serde(default)]
    pub chain_ids: Option<String>,
    #[serde(default)]
    pub sequence_length: Option<i64>,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub mutation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ligand {
    pub ligand_id: String,
    pub pdb_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub molecular_weight: Option<f64>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub smiles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorsFunding {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub pdb_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_order: Option<i64>,
    #[serde(default)]
    pub funding_organization: Option<String>,
    #[serde(default)]
    pub grant_number: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareUsed {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub pdb_id: String,
    #[serde(default)]
    pub software_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistory {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub pdb_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, with = "lenient_date")]
    pub revision_date: Option<NaiveDate>,
    #[serde(default)]
    pub revision_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: ResourceKind = ResourceKind::$kind;

                fn pdb_id(&self) -> &str {
                    &self.pdb_id
                }
            }
        )+
    };
}

impl_entity! {
    ProteinInfo => ProteinInfo,
    ExperimentalData => ExperimentalData,
    Macromolecule => Macromolecules,
    Ligand => Ligands,
    AuthorsFunding => AuthorsFunding,
    SoftwareUsed => SoftwareUsed,
    VersionHistory => VersionHistory,
}

/// Dates arrive either as `YYYY-MM-DD` or as full RFC 3339 timestamps,
/// depending on how the backend serialises its date columns.
pub mod lenient_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
    }

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn protein_info_accepts_partial_payload() {
        let p: ProteinInfo = serde_json::from_value(json!({ "pdb_id": "1ABC", "title": "X" })).unwrap();
        assert_eq!(p.pdb_id, "1ABC");
        assert_eq!(p.title.as_deref(), Some("X"));
        assert!(p.organism.is_none());
    }

    #[test]
    fn dates_accept_timestamps_and_plain_dates() {
        let v: VersionHistory = serde_json::from_value(json!({
            "id": 3,
            "pdb_id": "1ABC",
            "revision_date": "2021-06-02T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(v.revision_date, NaiveDate::from_ymd_opt(2021, 6, 2));

        let p: ProteinInfo = serde_json::from_value(json!({
            "pdb_id": "1ABC",
            "deposition_date": "1999-12-31",
            "release_date": null
        }))
        .unwrap();
        assert_eq!(p.deposition_date, NaiveDate::from_ymd_opt(1999, 12, 31));
        assert_eq!(p.release_date, None);
    }

    #[test]
    fn to_record_exposes_join_key() {
        let ligand = Ligand {
            ligand_id: "HEM".into(),
            pdb_id: "4HHB".into(),
            name: Some("Heme".into()),
            formula: None,
            molecular_weight: Some(616.49),
            chain_id: None,
            smiles: None,
        };
        let record = ligand.to_record();
        assert_eq!(record["pdb_id"], "4HHB");
        assert_eq!(record["ligand_id"], "HEM");
        assert_eq!(Ligand::KIND, ResourceKind::Ligands);
        assert_eq!(ligand.pdb_id(), "4HHB");
    }
}
