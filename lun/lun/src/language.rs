//! The Lun language handle, along with the node kinds and field names of the
//! trees produced by [crate::Parser].

use std::sync::OnceLock;

use semver::Version;
use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};

use crate::{Error, ErrorSource, Reason, WithErrorInfo};

/// ABI version of the trees produced by this crate. Bumped whenever node
/// kinds or fields change in a way hosts would notice.
pub const LANGUAGE_VERSION: usize = 1;

/// Oldest ABI version a [crate::Parser] accepts.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: usize = 1;

/// Returns the Lun language handle.
pub fn language() -> Language {
    Language {
        abi_version: LANGUAGE_VERSION,
    }
}

/// A handle to the Lun grammar. All of its data is static, so it's cheap to
/// copy around and share between threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Language {
    abi_version: usize,
}

impl Language {
    pub fn name(&self) -> &'static str {
        "lun"
    }

    /// Version of the grammar, which is the version of this crate.
    pub fn version(&self) -> &'static Version {
        static VERSION: OnceLock<Version> = OnceLock::new();
        VERSION.get_or_init(|| {
            Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|e| {
                log::info!("Could not parse crate version number: {e}");
                Version::new(0, 0, 0)
            })
        })
    }

    pub fn abi_version(&self) -> usize {
        self.abi_version
    }

    /// The same grammar, advertising another ABI version. Hosts embedding
    /// handles from other builds use this to check compatibility.
    pub fn with_abi_version(self, abi_version: usize) -> Self {
        Language { abi_version }
    }

    pub fn is_compatible(&self) -> bool {
        (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&self.abi_version)
    }

    pub fn node_kind_count(&self) -> usize {
        NodeKind::COUNT
    }

    pub fn node_kind_for_id(&self, id: u16) -> Option<&'static str> {
        NodeKind::from_repr(id).map(NodeKind::name)
    }

    /// Looks up a node kind by name. Operators share names with other
    /// tokens, so `named` distinguishes `ERROR` or `identifier` from `-`.
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        NodeKind::iter()
            .find(|k| k.name() == kind && k.is_named() == named)
            .map(NodeKind::id)
    }

    pub fn node_kind_is_named(&self, id: u16) -> bool {
        NodeKind::from_repr(id).is_some_and(|k| k.is_named())
    }

    pub fn field_count(&self) -> usize {
        Field::COUNT
    }

    /// Field ids start at 1.
    pub fn field_name_for_id(&self, id: u16) -> Option<&'static str> {
        Field::from_repr(id).map(Field::name)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<u16> {
        Field::iter().find(|f| f.name() == name).map(Field::id)
    }

    pub fn node_kinds(&self) -> impl Iterator<Item = NodeKind> {
        NodeKind::iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> {
        Field::iter()
    }
}

impl Default for Language {
    fn default() -> Self {
        language()
    }
}

/// Returned when a parser is given a language with an unsupported ABI
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageError {
    pub version: usize,
}

impl std::fmt::Display for LanguageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Incompatible language version {}. Expected minimum {}, maximum {}",
            self.version, MIN_COMPATIBLE_LANGUAGE_VERSION, LANGUAGE_VERSION
        )
    }
}

impl std::error::Error for LanguageError {}

impl From<LanguageError> for Error {
    fn from(e: LanguageError) -> Self {
        Error::new(Reason::Simple(e.to_string()))
            .with_code("E0003")
            .with_source(ErrorSource::Language)
    }
}

/// Kinds of the nodes of a [crate::Tree]. Named kinds mirror grammar rules;
/// the others are the operator tokens which appear as `op` or `deref` fields.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::EnumIter,
    strum::EnumCount,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u16)]
pub enum NodeKind {
    SourceFile,
    GlobalDefItem,
    PrimitiveType,
    MutSpec,
    BlockExpr,
    LabeledExpr,
    BoolExpr,
    LitExpr,
    ParenExpr,
    PathExpr,
    Path,
    BinaryExpr,
    AssignExpr,
    LeftUnaryExpr,
    RightUnaryExpr,
    BorrowExpr,
    Arguments,
    CallExpr,
    IfExpr,
    WhileExpr,
    ForExpr,
    LoopExpr,
    ReturnExpr,
    BreakExpr,
    ContinueExpr,
    NullExpr,
    FieldExpr,
    Block,
    Comment,
    IntegerLit,
    StringLit,
    StringContent,
    EscapeSequence,
    Identifier,
    #[strum(serialize = "ERROR")]
    Error,

    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Gte,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = ".*")]
    Deref,
}

impl NodeKind {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn is_named(self) -> bool {
        self <= NodeKind::Error
    }

    /// Kinds made of a single token, which never contain other nodes.
    pub fn is_leaf(self) -> bool {
        !self.is_named()
            || matches!(
                self,
                NodeKind::PrimitiveType
                    | NodeKind::MutSpec
                    | NodeKind::BoolExpr
                    | NodeKind::NullExpr
                    | NodeKind::Comment
                    | NodeKind::IntegerLit
                    | NodeKind::StringContent
                    | NodeKind::EscapeSequence
                    | NodeKind::Identifier
            )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Names under which a node can be attached to its parent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::EnumIter,
    strum::EnumCount,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u16)]
pub enum Field {
    Name = 1,
    Typeexpr,
    Value,
    Block,
    Label,
    FirstSeg,
    Seg,
    Lhs,
    Op,
    Rhs,
    Deref,
    Callee,
    Args,
    Cond,
    Then,
    Else,
    Var,
    Iterator,
    Body,
    Field,
    Stmt,
    LastExpr,
    Tag,
}

impl Field {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
