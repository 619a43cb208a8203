mod annotation_repo;
mod correction_repo;
mod essay_render_repo;

pub use annotation_repo::AnnotationRepo;
pub use correction_repo::CorrectionRepo;
pub use essay_render_repo::EssayRenderRepo;
