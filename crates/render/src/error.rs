use renderkit_mesh::MeshError;

/// Errors from renderer setup and mesh upload.
///
/// Per-frame problems are never errors: an unavailable drawable skips the
/// frame instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("failed to acquire GPU device: {0}")]
    Device(String),
    #[error("shader module failed validation: {0}")]
    Shader(String),
    #[error("render pipeline creation failed: {0}")]
    Pipeline(String),
    #[error("mesh upload failed: {0}")]
    MeshUpload(#[from] MeshError),
}
