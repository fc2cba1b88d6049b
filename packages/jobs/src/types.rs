// ABOUTME: Named job kinds and submission acknowledgements
// ABOUTME: Wire names are kebab-case and consumed by the external worker fleet

use serde::{Deserialize, Serialize};

/// Every job the engine can submit to the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Generate design artwork for an idea entering the design stage
    CreateDesign,
    /// Build variant/pricing data for an idea entering the product stage
    ConfigureProduct,
    /// Draft listing copy for an idea entering the listing stage
    ConfigureListing,
    /// Create the storefront product for a publish-ready idea
    CreateCommerceProduct,
    /// Rework the current stage's artifacts from operator notes
    RefineIdea,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::CreateDesign => "create-design",
            JobKind::ConfigureProduct => "configure-product",
            JobKind::ConfigureListing => "configure-listing",
            JobKind::CreateCommerceProduct => "create-commerce-product",
            JobKind::RefineIdea => "refine-idea",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement that the bus accepted a submission. Acceptance is not
/// completion; job execution is asynchronous and never read back here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAck {
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_kebab_case() {
        assert_eq!(JobKind::CreateDesign.as_str(), "create-design");
        assert_eq!(JobKind::ConfigureProduct.as_str(), "configure-product");
        assert_eq!(JobKind::ConfigureListing.as_str(), "configure-listing");
        assert_eq!(
            JobKind::CreateCommerceProduct.as_str(),
            "create-commerce-product"
        );
        assert_eq!(JobKind::RefineIdea.as_str(), "refine-idea");
    }

    #[test]
    fn serde_matches_wire_names() {
        let json = serde_json::to_string(&JobKind::CreateCommerceProduct).unwrap();
        assert_eq!(json, "\"create-commerce-product\"");
    }
}
