pub mod types;
pub mod matcher;
pub mod knowledge;
pub mod label;
pub mod openfda;
pub mod cache;
pub mod augmenter;
pub mod interactions;
pub mod allergies;
pub mod refills;
pub mod side_effects;
pub mod engine;

pub use types::*;
pub use matcher::*;
pub use knowledge::*;
pub use label::*;
pub use openfda::*;
pub use cache::*;
pub use augmenter::*;
pub use interactions::*;
pub use allergies::*;
pub use refills::*;
pub use side_effects::*;
pub use engine::*;
