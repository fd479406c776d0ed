pub mod entities;
pub mod requests;

pub use entities::{AssignmentStatus, AssignmentSubmission, current_submissions};
pub use requests::{GradeSubmissionRequest, GradeUpdate, NewSubmission, SubmitAssignmentRequest};
