#![cfg(not(target_family = "wasm"))]

use lunlib::Options;
use pyo3::{exceptions, prelude::*};

/// Returns the Lun grammar.
#[pyfunction]
pub fn language() -> Language {
    Language {
        inner: lunlib::language(),
    }
}

#[pymodule]
fn lun(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(language, m)?)?;
    m.add_class::<Language>()?;
    m.add_class::<Parser>()?;
    m.add_class::<Tree>()?;
    // From https://github.com/PyO3/maturin/issues/100
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

/// A handle to the Lun grammar.
#[pyclass(module = "lun", frozen, eq)]
#[derive(Clone, Debug, PartialEq)]
pub struct Language {
    inner: lunlib::Language,
}

#[pymethods]
impl Language {
    /// Copies a handle. `abi_version` overrides the ABI version it
    /// advertises, which lets hosts check how parsers treat other builds.
    #[new]
    #[pyo3(signature = (language, *, abi_version=None))]
    pub fn new(language: PyRef<'_, Language>, abi_version: Option<usize>) -> Self {
        let inner = match abi_version {
            Some(abi_version) => language.inner.with_abi_version(abi_version),
            None => language.inner,
        };
        Language { inner }
    }

    #[getter]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    #[getter]
    pub fn version(&self) -> String {
        self.inner.version().to_string()
    }

    #[getter]
    pub fn abi_version(&self) -> usize {
        self.inner.abi_version()
    }

    #[getter]
    pub fn node_kind_count(&self) -> usize {
        self.inner.node_kind_count()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Language {} {} (ABI {})>",
            self.inner.name(),
            self.inner.version(),
            self.inner.abi_version()
        )
    }
}

/// Parses Lun source into trees, once given a language.
#[pyclass(module = "lun")]
#[derive(Debug)]
pub struct Parser {
    inner: lunlib::Parser,
}

#[pymethods]
impl Parser {
    #[new]
    #[pyo3(signature = (language=None))]
    pub fn new(language: Option<PyRef<'_, Language>>) -> PyResult<Self> {
        let mut parser = Parser {
            inner: lunlib::Parser::new().with_options(Options::default().no_color()),
        };
        if let Some(language) = language {
            parser.set_language(language)?;
        }
        Ok(parser)
    }

    #[getter]
    pub fn language(&self) -> Option<Language> {
        self.inner.language().map(|inner| Language { inner })
    }

    #[setter]
    pub fn set_language(&mut self, language: PyRef<'_, Language>) -> PyResult<()> {
        self.inner
            .set_language(&language.inner)
            .map_err(|e| PyErr::new::<exceptions::PyValueError, _>(e.to_string()))
    }

    /// Parses a source. Errors in the source don't raise; they're reported by
    /// the tree.
    pub fn parse(&self, source: &str) -> PyResult<Tree> {
        let Some(inner) = self.inner.parse(source) else {
            return Err(PyErr::new::<exceptions::PyValueError, _>(
                "no language set on the parser".to_string(),
            ));
        };
        Ok(Tree { inner })
    }
}

/// A syntax tree.
#[pyclass(module = "lun", frozen)]
pub struct Tree {
    inner: lunlib::Tree,
}

#[pymethods]
impl Tree {
    /// S-expression of the tree, with field names.
    pub fn sexp(&self) -> String {
        self.inner.to_sexp()
    }

    #[getter]
    pub fn has_error(&self) -> bool {
        self.inner.has_error()
    }

    /// Errors of the parse, as JSON. Messages are listed under `inner`.
    pub fn errors_json(&self) -> String {
        self.inner.error_messages().to_json()
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.inner)
    }
}
