use crate::error::GeneratorError;
use crate::Generator;
use linklet_core::ShortCode;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use typed_builder::TypedBuilder;

/// Digits followed by lowercase letters.
pub const BASE36_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

/// Configures a [`RandomGenerator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGeneratorSettings {
    /// Number of characters per code, `3..=32`.
    #[builder(default = 6)]
    pub length: usize,
    #[builder(default = BASE36_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
    /// Fixed seed for reproducible sequences; `None` seeds from the OS.
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
}

impl Default for RandomGeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Draws fixed-length codes uniformly from an alphabet.
///
/// Codes are not guaranteed to be unique; pair this generator with an
/// [`Allocator`](crate::Allocator).
#[derive(Debug)]
pub struct RandomGenerator {
    alphabet: Vec<char>,
    length: usize,
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    pub fn new(settings: RandomGeneratorSettings) -> Result<Self, GeneratorError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&settings.length) {
            return Err(GeneratorError::InvalidLength {
                length: settings.length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }

        let alphabet: Vec<char> = settings.alphabet.chars().collect();
        if alphabet.is_empty() || !alphabet.iter().all(char::is_ascii_alphanumeric) {
            return Err(GeneratorError::InvalidAlphabet);
        }

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            alphabet,
            length: settings.length,
            rng: Mutex::new(rng),
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = self.rng.lock();
        let code: String = (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect();
        ShortCode::new_unchecked(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_codes_are_six_base36_characters() {
        let generator = RandomGenerator::new(RandomGeneratorSettings::default()).unwrap();

        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let settings = RandomGeneratorSettings::builder().seed(42).build();
        let a = RandomGenerator::new(settings.clone()).unwrap();
        let b = RandomGenerator::new(settings).unwrap();

        for _ in 0..10 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn custom_alphabet_and_length() {
        let settings = RandomGeneratorSettings::builder()
            .length(10)
            .alphabet("AB")
            .seed(7)
            .build();
        let generator = RandomGenerator::new(settings).unwrap();

        let code = generator.generate();
        assert_eq!(code.as_str().len(), 10);
        assert!(code.as_str().chars().all(|c| c == 'A' || c == 'B'));
    }

    #[test]
    fn rejects_invalid_settings() {
        let too_short = RandomGeneratorSettings::builder().length(2).build();
        assert!(matches!(
            RandomGenerator::new(too_short),
            Err(GeneratorError::InvalidLength { length: 2, .. })
        ));

        let empty = RandomGeneratorSettings::builder().alphabet("").build();
        assert_eq!(
            RandomGenerator::new(empty).unwrap_err(),
            GeneratorError::InvalidAlphabet
        );

        let slash = RandomGeneratorSettings::builder().alphabet("ab/").build();
        assert_eq!(
            RandomGenerator::new(slash).unwrap_err(),
            GeneratorError::InvalidAlphabet
        );
    }
}
