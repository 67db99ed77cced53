#![cfg(not(target_family = "wasm"))]

extern crate libc;

use std::ffi::{CStr, CString};
use std::sync::OnceLock;

use libc::{c_char, size_t};
use lun::{ErrorMessages, Options};

/// Handle to the Lun grammar. Opaque to C; only ever used behind a pointer.
pub type LunLanguage = lun::Language;

/// A parser, created by `lun_parser_new` and destroyed by
/// `lun_parser_delete`. Opaque to C.
pub struct LunParser {
    inner: lun::Parser,
}

/// Returns the Lun grammar. The handle is static; it must not be freed.
#[no_mangle]
pub extern "C" fn lun_language() -> *const LunLanguage {
    static LANGUAGE: OnceLock<LunLanguage> = OnceLock::new();
    LANGUAGE.get_or_init(lun::language)
}

/// Name of the grammar, as a static string.
///
/// # Safety
///
/// `language` must be null or returned by `lun_language`.
#[no_mangle]
pub unsafe extern "C" fn lun_language_name(language: *const LunLanguage) -> *const c_char {
    static NAME: OnceLock<CString> = OnceLock::new();
    match language.as_ref() {
        Some(language) => static_c_str(&NAME, language.name()),
        None => std::ptr::null(),
    }
}

/// Semver version of the grammar, as a static string.
///
/// # Safety
///
/// `language` must be null or returned by `lun_language`.
#[no_mangle]
pub unsafe extern "C" fn lun_language_version(language: *const LunLanguage) -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    match language.as_ref() {
        Some(language) => static_c_str(&VERSION, &language.version().to_string()),
        None => std::ptr::null(),
    }
}

/// ABI version of the grammar, or 0 for a null handle.
///
/// # Safety
///
/// `language` must be null or returned by `lun_language`.
#[no_mangle]
pub unsafe extern "C" fn lun_language_abi_version(language: *const LunLanguage) -> size_t {
    language.as_ref().map_or(0, |l| l.abi_version())
}

/// Creates a parser without a language. Error messages of its parses are
/// plain text.
///
/// Calling code is responsible for freeing the parser with `lun_parser_delete`.
#[no_mangle]
pub extern "C" fn lun_parser_new() -> *mut LunParser {
    let inner = lun::Parser::new().with_options(Options::default().no_color());
    Box::into_raw(Box::new(LunParser { inner }))
}

/// Sets the language of a parser. Returns false when either pointer is null,
/// or when the language has an incompatible ABI version.
///
/// # Safety
///
/// `parser` must be null or returned by `lun_parser_new` and not yet deleted.
/// `language` must be null or returned by `lun_language`.
#[no_mangle]
pub unsafe extern "C" fn lun_parser_set_language(
    parser: *mut LunParser,
    language: *const LunLanguage,
) -> bool {
    let (Some(parser), Some(language)) = (parser.as_mut(), language.as_ref()) else {
        return false;
    };
    parser.inner.set_language(language).is_ok()
}

/// Parses Lun source into the S-expression of its syntax tree.
///
/// The output is set even when the source has errors, which are returned as
/// messages. Without a language, the output is empty and there's a single
/// message.
///
/// # Safety
///
/// This function assumes zero-terminated input strings.
/// Calling code is responsible for freeing memory allocated for `ParseResult`
/// by calling `result_destroy`.
#[no_mangle]
pub unsafe extern "C" fn lun_parser_parse(
    parser: *const LunParser,
    source: *const c_char,
) -> ParseResult {
    let Some(parser) = parser.as_ref() else {
        return simple_error("parser is null");
    };
    if source.is_null() {
        return simple_error("source is null");
    }
    let source = c_str_to_string(source);

    match parser.inner.parse(&source) {
        Some(tree) => result_into_c(tree.to_sexp(), tree.error_messages()),
        None => simple_error("no language set on the parser"),
    }
}

/// Destroys a parser.
///
/// # Safety
///
/// `parser` must be null or returned by `lun_parser_new`, and must not be
/// used afterwards.
#[no_mangle]
pub unsafe extern "C" fn lun_parser_delete(parser: *mut LunParser) {
    if !parser.is_null() {
        drop(Box::from_raw(parser));
    }
}

/// Result of a parse.
#[repr(C)]
pub struct ParseResult {
    pub output: *const libc::c_char,
    pub messages: *const Message,
    pub messages_len: size_t,
}

/// Message kind. Currently only Error is implemented.
#[repr(C)]
pub enum MessageKind {
    Error,
    Warning,
    Lint,
}

/// Parse result message.
///
/// Calling code is responsible for freeing all memory allocated
/// for fields as well as strings.
// Make sure to keep in sync with lun::ErrorMessage
#[repr(C)]
pub struct Message {
    /// Message kind. Currently only Error is implemented.
    pub kind: MessageKind,
    /// Machine-readable identifier of the error
    pub code: *const *const libc::c_char,
    /// Plain text of the error
    pub reason: *const libc::c_char,
    /// A list of suggestions of how to fix the error
    pub hint: *const *const libc::c_char,
    /// Character offset of error origin within a source file
    pub span: *const Span,

    /// Annotated code, containing cause and hints.
    pub display: *const *const libc::c_char,
    /// Line and column number of error origin within a source file
    pub location: *const SourceLocation,
}

/// Identifier of a location in source.
/// Contains offsets in terms of chars.
// Make sure to keep in sync with lun::Span
#[repr(C)]
pub struct Span {
    pub start: size_t,
    pub end: size_t,
}

/// Location within a source file.
// Make sure to keep in sync with lun::SourceLocation
#[repr(C)]
pub struct SourceLocation {
    pub start_line: size_t,
    pub start_col: size_t,

    pub end_line: size_t,
    pub end_col: size_t,
}

/// Destroy a `ParseResult` once you are done with it.
///
/// # Safety
///
/// This function expects to be called exactly once after the call of any the functions
/// that return `ParseResult`. No fields should be freed manually.
#[no_mangle]
pub unsafe extern "C" fn result_destroy(res: ParseResult) {
    for i in 0..res.messages_len {
        let e = &*res.messages.add(i);

        if !e.code.is_null() {
            drop(CString::from_raw(*e.code as *mut libc::c_char));
            drop(Box::from_raw(e.code as *mut *const libc::c_char));
        }
        drop(CString::from_raw(e.reason as *mut libc::c_char));
        if !e.hint.is_null() {
            drop(CString::from_raw(*e.hint as *mut libc::c_char));
            drop(Box::from_raw(e.hint as *mut *const libc::c_char));
        }
        if !e.span.is_null() {
            drop(Box::from_raw(e.span as *mut Span));
        }
        if !e.display.is_null() {
            drop(CString::from_raw(*e.display as *mut libc::c_char));
            drop(Box::from_raw(e.display as *mut *const libc::c_char));
        }
        if !e.location.is_null() {
            drop(Box::from_raw(e.location as *mut SourceLocation));
        }
    }
    if !res.messages.is_null() {
        // the messages were leaked from a boxed slice of exactly this length
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            res.messages as *mut Message,
            res.messages_len,
        )));
    }
    drop(CString::from_raw(res.output as *mut libc::c_char));
}

fn simple_error(reason: &str) -> ParseResult {
    result_into_c(String::new(), lun::Error::new_simple(reason).into())
}

fn result_into_c(output: String, messages: ErrorMessages) -> ParseResult {
    let messages: Box<[Message]> = messages
        .inner
        .into_iter()
        .map(|e| Message {
            kind: MessageKind::Error,
            code: option_to_ptr(e.code.map(convert_string)),
            reason: convert_string(e.reason),
            hint: option_to_ptr(if e.hints.is_empty() {
                None
            } else {
                Some(convert_string(e.hints.join("\n")))
            }),
            span: option_to_ptr(e.span.map(convert_span)),
            display: option_to_ptr(e.display.map(convert_string)),
            location: option_to_ptr(e.location.map(convert_source_location)),
        })
        .collect();

    let messages_len = messages.len();
    ParseResult {
        output: convert_string(output),
        messages: if messages_len == 0 {
            std::ptr::null()
        } else {
            Box::leak(messages).as_ptr()
        },
        messages_len,
    }
}

/// Allocates the value on the heap and returns a pointer to it.
/// If the input is None, it returns null pointer.
fn option_to_ptr<T>(o: Option<T>) -> *const T {
    match o {
        Some(x) => {
            let b = Box::new(x);
            Box::into_raw(b)
        }
        None => ::std::ptr::null(),
    }
}

fn convert_string(x: String) -> *const libc::c_char {
    CString::new(x).unwrap_or_default().into_raw()
}

fn static_c_str(cell: &'static OnceLock<CString>, value: &str) -> *const c_char {
    cell.get_or_init(|| CString::new(value).unwrap_or_default())
        .as_ptr()
}

fn convert_span(x: lun::Span) -> Span {
    Span {
        start: x.start,
        end: x.end,
    }
}

fn convert_source_location(x: lun::SourceLocation) -> SourceLocation {
    SourceLocation {
        start_line: x.start.0,
        start_col: x.start.1,
        end_line: x.end.0,
        end_col: x.end.1,
    }
}

unsafe fn c_str_to_string(c_str: *const c_char) -> String {
    // inefficient, but simple
    CStr::from_ptr(c_str).to_string_lossy().into_owned()
}
