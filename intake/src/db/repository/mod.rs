mod cases;
mod documents;

pub use cases::CaseRepository;
pub use documents::DocumentRepository;
