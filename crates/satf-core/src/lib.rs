//! Core domain model + release normalization for SATF.
//!
//! Everything in this crate is pure: the classification tables, the lifecycle
//! resolver, and the normalizer take a raw OCDS release and a caller-supplied
//! clock and return values. No I/O, no ambient time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CRATE_NAME: &str = "satf-core";

/// Closing date fallback when the feed omits `tenderPeriod.endDate`.
pub const DEFAULT_CLOSING_OFFSET_DAYS: i64 = 30;

pub const DEFAULT_CURRENCY: &str = "ZAR";
pub const DEFAULT_DOCUMENT_LANGUAGE: &str = "en";

// ---------------------------------------------------------------------------
// Raw feed shapes (OCDS release subset, camelCase on the wire)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRelease {
    #[serde(default)]
    pub ocid: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parties: Vec<Party>,
    pub buyer: Option<OrganizationRef>,
    pub tender: Option<TenderSection>,
    #[serde(default)]
    pub awards: Vec<Award>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub address: Option<Address>,
    pub contact_point: Option<ContactPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub region: Option<String>,
    pub locality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoint {
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderSection {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub value: Option<MonetaryValue>,
    #[serde(default)]
    pub submission_method: Vec<String>,
    pub tender_period: Option<Period>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub documents: Vec<ReleaseDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryValue {
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub classification: Option<Classification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub document_type: Option<String>,
    pub language: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: Option<String>,
    pub status: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Canonical persisted shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "Eastern Cape")]
    EasternCape,
    #[serde(rename = "Free State")]
    FreeState,
    #[serde(rename = "Gauteng")]
    Gauteng,
    #[serde(rename = "KwaZulu-Natal")]
    KwaZuluNatal,
    #[serde(rename = "Limpopo")]
    Limpopo,
    #[serde(rename = "Mpumalanga")]
    Mpumalanga,
    #[serde(rename = "Northern Cape")]
    NorthernCape,
    #[serde(rename = "North West")]
    NorthWest,
    #[serde(rename = "Western Cape")]
    WesternCape,
    #[serde(rename = "National")]
    National,
}

impl Province {
    pub fn as_str(&self) -> &'static str {
        match self {
            Province::EasternCape => "Eastern Cape",
            Province::FreeState => "Free State",
            Province::Gauteng => "Gauteng",
            Province::KwaZuluNatal => "KwaZulu-Natal",
            Province::Limpopo => "Limpopo",
            Province::Mpumalanga => "Mpumalanga",
            Province::NorthernCape => "Northern Cape",
            Province::NorthWest => "North West",
            Province::WesternCape => "Western Cape",
            Province::National => "National",
        }
    }
}

impl std::fmt::Display for Province {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndustryCategory {
    #[serde(rename = "Construction & Infrastructure")]
    Construction,
    #[serde(rename = "Information Technology")]
    InformationTechnology,
    #[serde(rename = "Healthcare & Medical")]
    Healthcare,
    #[serde(rename = "Education & Training")]
    Education,
    #[serde(rename = "Transportation & Logistics")]
    Transportation,
    #[serde(rename = "Security & Safety")]
    Security,
    #[serde(rename = "Professional Services")]
    ProfessionalServices,
    #[serde(rename = "Utilities & Energy")]
    Utilities,
    #[serde(rename = "Food & Catering")]
    FoodCatering,
    #[serde(rename = "Office Supplies & Equipment")]
    OfficeSupplies,
    #[serde(rename = "Cleaning & Maintenance")]
    Cleaning,
    #[serde(rename = "Other")]
    Other,
}

impl IndustryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryCategory::Construction => "Construction & Infrastructure",
            IndustryCategory::InformationTechnology => "Information Technology",
            IndustryCategory::Healthcare => "Healthcare & Medical",
            IndustryCategory::Education => "Education & Training",
            IndustryCategory::Transportation => "Transportation & Logistics",
            IndustryCategory::Security => "Security & Safety",
            IndustryCategory::ProfessionalServices => "Professional Services",
            IndustryCategory::Utilities => "Utilities & Energy",
            IndustryCategory::FoodCatering => "Food & Catering",
            IndustryCategory::OfficeSupplies => "Office Supplies & Equipment",
            IndustryCategory::Cleaning => "Cleaning & Maintenance",
            IndustryCategory::Other => "Other",
        }
    }
}

impl std::fmt::Display for IndustryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenderStatus {
    Open,
    Closed,
    Cancelled,
    Awarded,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Open => "open",
            TenderStatus::Closed => "closed",
            TenderStatus::Cancelled => "cancelled",
            TenderStatus::Awarded => "awarded",
        }
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical tender record as handed to the reconciliation store.
///
/// `created_at`/`updated_at` are maintained by the store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTender {
    pub ocid: String,
    pub title: String,
    pub description: Option<String>,
    pub buyer_name: String,
    pub buyer_contact_email: Option<String>,
    pub buyer_contact_phone: Option<String>,
    pub province: Province,
    pub industry: IndustryCategory,
    pub value_amount: Option<f64>,
    pub value_currency: String,
    pub submission_method: String,
    pub date_published: DateTime<Utc>,
    pub date_closing: DateTime<Utc>,
    pub status: TenderStatus,
    pub raw_release: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderDocument {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub document_type: Option<String>,
    pub language: String,
    pub date_published: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

/// One normalized release: the canonical record plus its flattened documents.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTender {
    pub tender: CanonicalTender,
    pub documents: Vec<TenderDocument>,
}

#[derive(Debug, Error)]
#[error("release {ocid}: missing required field `{field}`")]
pub struct NormalizationError {
    pub ocid: String,
    pub field: &'static str,
}

// ---------------------------------------------------------------------------
// Classification engine
// ---------------------------------------------------------------------------

/// Ordered region/city -> province association list. Order is the tie-break:
/// the first matching entry wins, both for exact region lookups and for
/// free-text substring scans. Keys must be lowercase.
const PROVINCE_LOOKUP: &[(&str, Province)] = &[
    ("eastern cape", Province::EasternCape),
    ("free state", Province::FreeState),
    ("gauteng", Province::Gauteng),
    ("kwazulu-natal", Province::KwaZuluNatal),
    ("kwazulu natal", Province::KwaZuluNatal),
    ("kzn", Province::KwaZuluNatal),
    ("limpopo", Province::Limpopo),
    ("mpumalanga", Province::Mpumalanga),
    ("northern cape", Province::NorthernCape),
    ("north west", Province::NorthWest),
    ("north-west", Province::NorthWest),
    ("western cape", Province::WesternCape),
    ("johannesburg", Province::Gauteng),
    ("joburg", Province::Gauteng),
    ("pretoria", Province::Gauteng),
    ("tshwane", Province::Gauteng),
    ("soweto", Province::Gauteng),
    ("sandton", Province::Gauteng),
    ("midrand", Province::Gauteng),
    ("centurion", Province::Gauteng),
    ("ekurhuleni", Province::Gauteng),
    ("cape town", Province::WesternCape),
    ("stellenbosch", Province::WesternCape),
    ("paarl", Province::WesternCape),
    ("durban", Province::KwaZuluNatal),
    ("ethekwini", Province::KwaZuluNatal),
    ("pietermaritzburg", Province::KwaZuluNatal),
    ("richards bay", Province::KwaZuluNatal),
    ("port elizabeth", Province::EasternCape),
    ("gqeberha", Province::EasternCape),
    ("east london", Province::EasternCape),
    ("mthatha", Province::EasternCape),
    ("bloemfontein", Province::FreeState),
    ("welkom", Province::FreeState),
    ("polokwane", Province::Limpopo),
    ("thohoyandou", Province::Limpopo),
    ("nelspruit", Province::Mpumalanga),
    ("mbombela", Province::Mpumalanga),
    ("emalahleni", Province::Mpumalanga),
    ("kimberley", Province::NorthernCape),
    ("upington", Province::NorthernCape),
    ("mahikeng", Province::NorthWest),
    ("mafikeng", Province::NorthWest),
    ("rustenburg", Province::NorthWest),
    ("potchefstroom", Province::NorthWest),
];

/// Ordered industry -> keyword table. Declaration order is the tie-break
/// when keywords from several categories co-occur in one tender.
const INDUSTRY_RULES: &[(IndustryCategory, &[&str])] = &[
    (
        IndustryCategory::Construction,
        &[
            "construction",
            "building works",
            "civil works",
            "civil engineering",
            "road",
            "bridge",
            "paving",
            "earthworks",
            "renovation",
            "refurbishment",
            "infrastructure",
        ],
    ),
    (
        IndustryCategory::InformationTechnology,
        &[
            "information technology",
            "software",
            "ict",
            "computer",
            "network infrastructure",
            "server",
            "website",
            "data centre",
            "it support",
            "licences",
        ],
    ),
    (
        IndustryCategory::Healthcare,
        &[
            "medical",
            "health",
            "hospital",
            "clinic",
            "pharmaceutical",
            "ambulance",
            "nursing",
            "surgical",
        ],
    ),
    (
        IndustryCategory::Education,
        &[
            "education",
            "training",
            "school",
            "learnership",
            "curriculum",
            "tvet",
            "skills development",
        ],
    ),
    (
        IndustryCategory::Transportation,
        &[
            "transport",
            "logistics",
            "freight",
            "fleet",
            "courier",
            "shuttle",
            "vehicle hire",
        ],
    ),
    (
        IndustryCategory::Security,
        &[
            "security",
            "guarding",
            "surveillance",
            "cctv",
            "access control",
            "armed response",
            "fire protection",
        ],
    ),
    (
        IndustryCategory::ProfessionalServices,
        &[
            "consulting",
            "consultancy",
            "advisory",
            "audit",
            "legal services",
            "accounting",
            "actuarial",
            "feasibility study",
        ],
    ),
    (
        IndustryCategory::Utilities,
        &[
            "electricity",
            "electrical",
            "water supply",
            "sanitation",
            "energy",
            "solar",
            "generator",
            "sewerage",
            "boreholes",
        ],
    ),
    (
        IndustryCategory::FoodCatering,
        &["catering", "food", "meals", "canteen", "groceries"],
    ),
    (
        IndustryCategory::OfficeSupplies,
        &[
            "stationery",
            "office supplies",
            "office furniture",
            "printing",
            "toner",
            "photocopier",
        ],
    ),
    (
        IndustryCategory::Cleaning,
        &[
            "cleaning",
            "hygiene",
            "pest control",
            "gardening",
            "landscaping",
            "waste removal",
            "refuse",
        ],
    ),
];

fn lookup_province(input: &str) -> Option<Province> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    PROVINCE_LOOKUP
        .iter()
        .find(|(key, _)| *key == needle)
        .map(|(_, province)| *province)
}

fn buyer_party(release: &RawRelease) -> Option<&Party> {
    release
        .parties
        .iter()
        .find(|p| p.roles.iter().any(|r| r.eq_ignore_ascii_case("buyer")))
}

fn tender_text(release: &RawRelease) -> String {
    let title = release
        .tender
        .as_ref()
        .and_then(|t| t.title.as_deref())
        .unwrap_or("");
    let description = release
        .tender
        .as_ref()
        .and_then(|t| t.description.as_deref())
        .unwrap_or("");
    format!("{title} {description}").to_lowercase()
}

/// Derive a province for a release. Priority: buyer address region, then
/// buyer address locality, then a substring scan of title + description.
/// Falls back to `National` when nothing matches. Total: never fails.
pub fn derive_province(release: &RawRelease) -> Province {
    let buyer = buyer_party(release);

    if let Some(region) = buyer
        .and_then(|p| p.address.as_ref())
        .and_then(|a| a.region.as_deref())
    {
        if let Some(province) = lookup_province(region) {
            return province;
        }
    }

    if let Some(locality) = buyer
        .and_then(|p| p.address.as_ref())
        .and_then(|a| a.locality.as_deref())
    {
        if let Some(province) = lookup_province(locality) {
            return province;
        }
    }

    let haystack = tender_text(release);
    if !haystack.trim().is_empty() {
        for (key, province) in PROVINCE_LOOKUP {
            if haystack.contains(key) {
                return *province;
            }
        }
    }

    Province::National
}

/// Derive an industry category from tender title + description + the first
/// line item's classification description. First matching category in table
/// order wins; `Other` when nothing matches. Total: never fails.
pub fn categorize_industry(release: &RawRelease) -> IndustryCategory {
    let mut haystack = tender_text(release);
    if let Some(item_desc) = release
        .tender
        .as_ref()
        .and_then(|t| t.items.first())
        .and_then(|i| i.classification.as_ref())
        .and_then(|c| c.description.as_deref())
    {
        haystack.push(' ');
        haystack.push_str(&item_desc.to_lowercase());
    }

    for (category, keywords) in INDUSTRY_RULES {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            return *category;
        }
    }
    IndustryCategory::Other
}

// ---------------------------------------------------------------------------
// Lifecycle resolver
// ---------------------------------------------------------------------------

/// Resolve the canonical lifecycle status of a release at time `now`.
///
/// Decision order matters: cancellation outranks an award, and both outrank
/// a merely-past closing date. A missing closing date reads as still open.
pub fn resolve_status(release: &RawRelease, now: DateTime<Utc>) -> TenderStatus {
    let raw_status = release
        .tender
        .as_ref()
        .and_then(|t| t.status.as_deref())
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if raw_status == "cancelled" {
        return TenderStatus::Cancelled;
    }
    if raw_status == "complete" || !release.awards.is_empty() {
        return TenderStatus::Awarded;
    }

    let closing = release
        .tender
        .as_ref()
        .and_then(|t| t.tender_period.as_ref())
        .and_then(|p| p.end_date);
    if let Some(closing) = closing {
        if closing < now {
            return TenderStatus::Closed;
        }
    }

    TenderStatus::Open
}

// ---------------------------------------------------------------------------
// Record normalizer
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Normalize one raw release into the canonical tender shape plus its
/// flattened document list.
///
/// Malformed-but-present optional data degrades to defaults; the only
/// failure mode is a missing required field (ocid, tender title, or any
/// buyer reference), reported with the field name.
pub fn normalize(
    release: &RawRelease,
    now: DateTime<Utc>,
) -> Result<NormalizedTender, NormalizationError> {
    let ocid = non_empty(Some(release.ocid.as_str())).ok_or(NormalizationError {
        ocid: "<unknown>".to_string(),
        field: "ocid",
    })?;

    let title = non_empty(
        release
            .tender
            .as_ref()
            .and_then(|t| t.title.as_deref()),
    )
    .ok_or_else(|| NormalizationError {
        ocid: ocid.clone(),
        field: "tender.title",
    })?;

    let buyer = buyer_party(release);
    let buyer_name = buyer
        .and_then(|p| non_empty(p.name.as_deref()))
        .or_else(|| {
            release
                .buyer
                .as_ref()
                .and_then(|b| non_empty(b.name.as_deref()))
        })
        .ok_or_else(|| NormalizationError {
            ocid: ocid.clone(),
            field: "buyer",
        })?;

    let contact = buyer.and_then(|p| p.contact_point.as_ref());
    let buyer_contact_email = contact.and_then(|c| non_empty(c.email.as_deref()));
    let buyer_contact_phone = contact.and_then(|c| non_empty(c.telephone.as_deref()));

    let tender_block = release.tender.as_ref();

    let value = tender_block.and_then(|t| t.value.as_ref());
    let value_amount = value.and_then(|v| v.amount);
    let value_currency = value
        .and_then(|v| non_empty(v.currency.as_deref()))
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let submission_method = tender_block
        .map(|t| {
            t.submission_method
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "Not specified".to_string());

    let date_published = release.date.unwrap_or(now);
    let date_closing = tender_block
        .and_then(|t| t.tender_period.as_ref())
        .and_then(|p| p.end_date)
        .unwrap_or_else(|| date_published + Duration::days(DEFAULT_CLOSING_OFFSET_DAYS));

    let documents = tender_block
        .map(|t| t.documents.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|doc| TenderDocument {
            title: non_empty(doc.title.as_deref())
                .unwrap_or_else(|| "Untitled document".to_string()),
            description: non_empty(doc.description.as_deref()),
            url: non_empty(doc.url.as_deref()),
            format: non_empty(doc.format.as_deref()),
            document_type: non_empty(doc.document_type.as_deref()),
            language: non_empty(doc.language.as_deref())
                .unwrap_or_else(|| DEFAULT_DOCUMENT_LANGUAGE.to_string()),
            date_published: doc.date_published,
            date_modified: doc.date_modified,
        })
        .collect();

    let tender = CanonicalTender {
        province: derive_province(release),
        industry: categorize_industry(release),
        status: resolve_status(release, now),
        description: tender_block.and_then(|t| non_empty(t.description.as_deref())),
        ocid,
        title,
        buyer_name,
        buyer_contact_email,
        buyer_contact_phone,
        value_amount,
        value_currency,
        submission_method,
        date_published,
        date_closing,
        raw_release: serde_json::to_value(release).ok(),
    };

    Ok(NormalizedTender { tender, documents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn release_from_json(value: serde_json::Value) -> RawRelease {
        serde_json::from_value(value).expect("release fixture")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap()
    }

    fn cape_town_road_release() -> RawRelease {
        release_from_json(serde_json::json!({
            "ocid": "ocds-1",
            "date": "2026-02-20T08:00:00Z",
            "tender": {
                "title": "Road construction project",
                "status": "active",
                "tenderPeriod": { "endDate": "2026-04-01T00:00:00Z" }
            },
            "parties": [{
                "name": "City of Cape Town",
                "roles": ["buyer"],
                "address": { "region": "Western Cape" }
            }]
        }))
    }

    #[test]
    fn unknown_location_falls_back_to_national() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": { "title": "Supply of widgets", "description": "generic widgets" },
            "parties": [{
                "name": "Some Department",
                "roles": ["buyer"],
                "address": { "region": "Atlantis Prime" }
            }]
        }));
        assert_eq!(derive_province(&release), Province::National);
    }

    #[test]
    fn buyer_region_outranks_conflicting_text() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": { "title": "Upgrades near Durban harbour" },
            "parties": [{
                "name": "Provincial Treasury",
                "roles": ["buyer"],
                "address": { "region": "  Western Cape  " }
            }]
        }));
        assert_eq!(derive_province(&release), Province::WesternCape);
    }

    #[test]
    fn locality_is_consulted_when_region_misses() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": { "title": "Generic supply contract" },
            "parties": [{
                "name": "Metro",
                "roles": ["buyer"],
                "address": { "region": "District 9", "locality": "Polokwane" }
            }]
        }));
        assert_eq!(derive_province(&release), Province::Limpopo);
    }

    #[test]
    fn text_scan_catches_city_mentions() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "Fencing of depot",
                "description": "Perimeter fencing at the Bloemfontein depot"
            }
        }));
        assert_eq!(derive_province(&release), Province::FreeState);
    }

    #[test]
    fn industry_table_order_breaks_ties() {
        // Both "construction" and "security" keywords appear; the table
        // declares Construction first, so it wins.
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "Construction of security fencing",
                "description": "guarding and construction works"
            }
        }));
        assert_eq!(categorize_industry(&release), IndustryCategory::Construction);
    }

    #[test]
    fn industry_uses_first_line_item_classification() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "RFQ 2026-117",
                "items": [
                    { "classification": { "description": "Pharmaceutical supplies" } }
                ]
            }
        }));
        assert_eq!(categorize_industry(&release), IndustryCategory::Healthcare);
    }

    #[test]
    fn industry_is_total_over_arbitrary_text() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": { "title": "zzz qqq", "description": "" }
        }));
        assert_eq!(categorize_industry(&release), IndustryCategory::Other);
    }

    #[test]
    fn award_resolves_awarded_even_with_future_closing() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "t",
                "status": "active",
                "tenderPeriod": { "endDate": "2027-01-01T00:00:00Z" }
            },
            "awards": [{ "id": "a1", "status": "active" }]
        }));
        assert_eq!(resolve_status(&release, fixed_now()), TenderStatus::Awarded);
    }

    #[test]
    fn cancellation_outranks_awards() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": { "title": "t", "status": "cancelled" },
            "awards": [{ "id": "a1", "status": "active" }]
        }));
        assert_eq!(
            resolve_status(&release, fixed_now()),
            TenderStatus::Cancelled
        );
    }

    #[test]
    fn past_closing_resolves_closed_future_stays_open() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "t",
                "status": "active",
                "tenderPeriod": { "endDate": "2026-03-10T00:00:00Z" }
            }
        }));
        let before = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).single().unwrap();
        let after = Utc.with_ymd_and_hms(2026, 4, 14, 0, 0, 0).single().unwrap();
        assert_eq!(resolve_status(&release, before), TenderStatus::Open);
        assert_eq!(resolve_status(&release, after), TenderStatus::Closed);
    }

    #[test]
    fn example_scenario_normalizes_as_documented() {
        let normalized = normalize(&cape_town_road_release(), fixed_now()).expect("normalize");
        assert_eq!(normalized.tender.province, Province::WesternCape);
        assert_eq!(
            normalized.tender.industry,
            IndustryCategory::Construction
        );
        assert_eq!(normalized.tender.status, TenderStatus::Open);
        assert_eq!(normalized.tender.buyer_name, "City of Cape Town");
        assert_eq!(normalized.tender.value_currency, "ZAR");
        assert_eq!(normalized.tender.submission_method, "Not specified");
    }

    #[test]
    fn example_scenario_with_award_flips_to_awarded() {
        let mut release = cape_town_road_release();
        release.awards.push(Award {
            id: Some("a1".to_string()),
            status: Some("active".to_string()),
            date: None,
        });
        let normalized = normalize(&release, fixed_now()).expect("normalize");
        assert_eq!(normalized.tender.status, TenderStatus::Awarded);
    }

    #[test]
    fn renormalizing_after_closing_flips_to_closed() {
        let release = cape_town_road_release();
        let first = normalize(&release, fixed_now()).expect("first pass");
        assert_eq!(first.tender.status, TenderStatus::Open);

        let forty_days_later = fixed_now() + Duration::days(40);
        let second = normalize(&release, forty_days_later).expect("second pass");
        assert_eq!(second.tender.status, TenderStatus::Closed);
    }

    #[test]
    fn missing_closing_date_defaults_to_thirty_days_after_publication() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "date": "2026-02-01T00:00:00Z",
            "tender": { "title": "t" },
            "buyer": { "name": "National Treasury" }
        }));
        let normalized = normalize(&release, fixed_now()).expect("normalize");
        assert_eq!(
            normalized.tender.date_closing,
            normalized.tender.date_published + Duration::days(30)
        );
    }

    #[test]
    fn missing_title_is_a_normalization_error() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-broken",
            "tender": { "description": "no title here" },
            "buyer": { "name": "National Treasury" }
        }));
        let err = normalize(&release, fixed_now()).expect_err("must fail");
        assert_eq!(err.field, "tender.title");
        assert_eq!(err.ocid, "ocds-broken");
    }

    #[test]
    fn missing_buyer_is_a_normalization_error() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-broken",
            "tender": { "title": "t" }
        }));
        let err = normalize(&release, fixed_now()).expect_err("must fail");
        assert_eq!(err.field, "buyer");
    }

    #[test]
    fn documents_are_flattened_with_language_default() {
        let release = release_from_json(serde_json::json!({
            "ocid": "ocds-x",
            "tender": {
                "title": "t",
                "documents": [
                    {
                        "title": "Bid specification",
                        "url": "https://example.org/spec.pdf",
                        "format": "application/pdf",
                        "documentType": "biddingDocuments"
                    },
                    { "description": "unnamed attachment" }
                ]
            },
            "buyer": { "name": "National Treasury" }
        }));
        let normalized = normalize(&release, fixed_now()).expect("normalize");
        assert_eq!(normalized.documents.len(), 2);
        assert_eq!(normalized.documents[0].language, "en");
        assert_eq!(normalized.documents[1].title, "Untitled document");
        assert_eq!(
            normalized.documents[1].description.as_deref(),
            Some("unnamed attachment")
        );
    }
}
