// Application intake: form validation, the submit state machine and the
// per-session draft/profile persistence around it.

pub mod drafts;
pub mod handlers;
pub mod submit;
pub mod validation;
