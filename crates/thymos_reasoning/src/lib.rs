pub mod classifier;
pub mod engine;
pub mod extraction;
pub mod prompts;
pub mod providers;

pub use classifier::{Classifier, ClassifierError};
pub use engine::{Turn, UpdateEngine};
pub use providers::{build_classifier, MockClassifier, MockReply};
