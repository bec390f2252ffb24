//! Display name generation

use rand::Rng;

/// Lowest number used in generated display names
pub const NAME_NUMBER_MIN: u16 = 1000;

/// Highest number used in generated display names
pub const NAME_NUMBER_MAX: u16 = 9999;

/// Source of candidate display names
pub trait NameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `User-<N>` with N uniform in 1000..=9999
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNames;

impl NameGenerator for RandomNames {
    fn generate(&self) -> String {
        let number = rand::rng().random_range(NAME_NUMBER_MIN..=NAME_NUMBER_MAX);
        format!("User-{}", number)
    }
}
