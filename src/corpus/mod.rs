//! @ai:module:intent Benchmark inputs: formats, file discovery and translation
//! @ai:module:layer domain
//! @ai:module:public_api Format, InputLoader, FormatTranslator, TranslationCache, TranslatedInput

pub mod input;
pub mod translator;

pub use input::{Format, InputLoader};
pub use translator::{FormatTranslator, TranslatedInput, TranslationCache};
