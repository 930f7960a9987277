use crate::types::ComplianceCheck;

/// The labeling requirements every product image is checked against.
///
/// Order is the report order. All rules carry equal weight.
pub const COMPLIANCE_RULES: [&str; 10] = [
    "Product name is clearly visible",
    "Ingredients list is complete and legible",
    "Allergen warnings are present",
    "Expiration/Best by date is visible",
    "Nutritional information is present",
    "Barcode or product code is visible",
    "Manufacturer information is included",
    "Weight/Volume measurements are displayed",
    "Storage instructions are provided",
    "Country of origin is specified",
];

/// Denominator for every compliance score, regardless of how many checks the model returned.
pub const RULE_COUNT: usize = COMPLIANCE_RULES.len();

/// Placeholder details for checks the model never evaluated.
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze";

/// Full checklist with every rule marked failed.
pub fn canonical_rules() -> Vec<ComplianceCheck> {
    COMPLIANCE_RULES
        .iter()
        .map(|rule| ComplianceCheck {
            rule: (*rule).to_string(),
            passed: false,
            details: UNABLE_TO_ANALYZE.to_string(),
        })
        .collect()
}
