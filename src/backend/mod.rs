pub mod mock;
pub mod ollama;
pub mod traits;

pub use mock::MockModelService;
pub use ollama::OllamaModelService;
pub use traits::{BackendError, ModelService};
