// ABOUTME: Stage-to-job dispatch table
// ABOUTME: Exhaustive match so a new stage cannot compile without a dispatch decision

use crate::types::Stage;
use inkline_jobs::JobKind;

/// The job submitted when an idea enters `stage` via `advance`.
///
/// Phrase is the entry stage and has no inbound job. Publish is entered
/// silently; the commerce job only fires from the explicit `publish`
/// operation.
pub fn job_for_stage(stage: Stage) -> Option<JobKind> {
    match stage {
        Stage::Phrase => None,
        Stage::Design => Some(JobKind::CreateDesign),
        Stage::Product => Some(JobKind::ConfigureProduct),
        Stage::Listing => Some(JobKind::ConfigureListing),
        Stage::Publish => None,
    }
}

/// Refine always submits the same job regardless of stage.
pub const REFINE_JOB: JobKind = JobKind::RefineIdea;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table_matches_contract() {
        assert_eq!(job_for_stage(Stage::Phrase), None);
        assert_eq!(job_for_stage(Stage::Design), Some(JobKind::CreateDesign));
        assert_eq!(
            job_for_stage(Stage::Product),
            Some(JobKind::ConfigureProduct)
        );
        assert_eq!(
            job_for_stage(Stage::Listing),
            Some(JobKind::ConfigureListing)
        );
        assert_eq!(job_for_stage(Stage::Publish), None);
    }
}
