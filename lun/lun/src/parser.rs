use crate::{Language, LanguageError, Options, Tree};

/// Parses Lun source into [Tree]s, once given a [Language].
///
/// ```
/// let mut parser = lun::Parser::new();
/// assert!(parser.parse("x :: 1;").is_none());
///
/// parser.set_language(&lun::language()).unwrap();
/// let tree = parser.parse("x :: 1;").unwrap();
/// assert!(!tree.has_error());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    language: Option<Language>,
    options: Options,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Sets the language used to parse. Fails when the handle has an ABI
    /// version this parser doesn't support, in which case the previous
    /// language is kept.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        if !language.is_compatible() {
            log::debug!("rejecting language with ABI version {}", language.abi_version());
            return Err(LanguageError {
                version: language.abi_version(),
            });
        }
        self.language = Some(*language);
        Ok(())
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    /// Restores the default options. The language is kept.
    pub fn reset(&mut self) {
        self.options = Options::default();
    }

    /// Parses a source. Returns `None` only when no language has been set;
    /// errors in the source become `ERROR` nodes of the tree.
    pub fn parse(&self, source: &str) -> Option<Tree> {
        let language = self.language?;
        Some(Tree::parse(language, source, &self.options))
    }
}
