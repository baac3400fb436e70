pub mod orchestration;

pub use orchestration::{
    list_configuration, report_outcome, run_release_workflow, ReleaseWorkflowArgs,
};
