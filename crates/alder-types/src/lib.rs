//! Type representations for Alder.
//!
//! This crate defines the semantic types used by the binder, the constraint
//! collector, and the unifier. These are distinct from syntactic type
//! annotations (which live in `alder-ast`). A single recursive sum type,
//! [`Type`], underlies every type in the system.

use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identity of an enum declaration within one compilation.
///
/// Stamped onto an [`EnumType`] when the binder installs the declaration.
/// Unification compares enums by this id: two enums are the same type only
/// when they come from the same declaration, regardless of structural
/// similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub u32);

// ---------------------------------------------------------------------------
// Built-in scalars
// ---------------------------------------------------------------------------

/// The built-in native type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    String,
    Number,
    Boolean,
    Void,
    Array,
    Object,
    Unknown,
}

impl NativeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeKind::String => "string",
            NativeKind::Number => "number",
            NativeKind::Boolean => "boolean",
            NativeKind::Void => "void",
            NativeKind::Array => "array",
            NativeKind::Object => "object",
            NativeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A semantic type in Alder.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Built-in scalar.
    Native(NativeKind),
    /// Type pinned to a literal string (also used for variant tags).
    Literal(String),
    /// Unsolved type variable. The name (`t0`, `fn1`, …) keys the slot in
    /// the scope graph's type tables, which act as the substitution store.
    Var(String),
    /// Named type reference, resolved through the scope graph.
    Ident(String),
    /// Generic application: `base<args>`.
    Reference { base: Box<Type>, args: Vec<Type> },
    /// Function signature.
    Function(FunctionType),
    /// The shape of a call site, paired against a [`FunctionType`] during
    /// unification.
    Call(FunctionCallType),
    /// Record with ordered properties.
    Object(ObjectType),
    /// Sum of alternatives: `:Bar | :Baz`.
    Variant(Vec<Type>),
    /// Named ADT declaration.
    Enum(EnumType),
    /// One constructor of an enum.
    EnumMember(EnumMemberType),
    /// An enum instance: a member applied to arguments.
    EnumCall(EnumCallType),
    /// Match pattern naming a specific enum member.
    EnumPattern(EnumPatternType),
    /// A destructuring pattern paired with the variable it binds.
    Pattern(PatternType),
}

/// A single function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamType {
    pub name: String,
    pub annotation: Type,
    pub spread: bool,
}

/// Function signature: ordered parameters, return type, optional identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub ident: Option<String>,
    pub params: Vec<ParamType>,
    pub ret: Box<Type>,
}

/// The shape of a call site: callee, collected argument types, and a fresh
/// return-type variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallType {
    pub callee: Box<Type>,
    pub args: Vec<Type>,
    pub ret: Box<Type>,
}

/// One record property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropDef {
    pub name: String,
    pub value: Type,
}

/// Record type with ordered property definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub ident: Option<String>,
    pub props: Vec<PropDef>,
}

impl ObjectType {
    pub fn prop(&self, name: &str) -> Option<&Type> {
        self.props
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// A named ADT declaration: identity, type parameters, ordered members.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub id: EnumId,
    pub ident: String,
    pub params: Vec<String>,
    pub members: Vec<EnumMemberType>,
}

impl EnumType {
    pub fn member(&self, name: &str) -> Option<&EnumMemberType> {
        self.members.iter().find(|m| m.ident == name)
    }
}

/// One enum constructor and its declared parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMemberType {
    pub ident: String,
    pub params: Vec<Type>,
}

/// An enum instance: `Option.Some(number)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCallType {
    pub enum_ty: Box<Type>,
    pub member: String,
    pub args: Vec<Type>,
}

/// A pattern matching one specific enum member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumPatternType {
    pub enum_ty: Box<Type>,
    pub member: String,
}

/// Wraps a destructuring pattern and the fresh variable it binds; unified
/// against the matched value's type to recover the binding's type.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternType {
    pub pattern: Box<Type>,
    pub var: Box<Type>,
}

impl Type {
    pub const STRING: Type = Type::Native(NativeKind::String);
    pub const NUMBER: Type = Type::Native(NativeKind::Number);
    pub const BOOLEAN: Type = Type::Native(NativeKind::Boolean);
    pub const VOID: Type = Type::Native(NativeKind::Void);

    /// An array of `elem`, expressed as a generic application of the native
    /// array type.
    pub fn array_of(elem: Type) -> Type {
        Type::Reference {
            base: Box::new(Type::Native(NativeKind::Array)),
            args: vec![elem],
        }
    }

    /// The name of this type when it is a reference that still needs the
    /// scope graph to resolve it (a type variable or a named identifier).
    pub fn as_ref_name(&self) -> Option<&str> {
        match self {
            Type::Var(name) | Type::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The enum declaration identity carried by this type, if any.
    pub fn enum_id(&self) -> Option<EnumId> {
        match self {
            Type::Enum(e) => Some(e.id),
            Type::EnumCall(call) => call.enum_ty.enum_id(),
            Type::EnumPattern(pat) => pat.enum_ty.enum_id(),
            _ => None,
        }
    }

    /// The enum declaration carried by this type, if any.
    pub fn enum_type(&self) -> Option<&EnumType> {
        match self {
            Type::Enum(e) => Some(e),
            Type::EnumCall(call) => call.enum_ty.enum_type(),
            Type::EnumPattern(pat) => pat.enum_ty.enum_type(),
            _ => None,
        }
    }

    /// Whether `name` occurs anywhere in this type as a variable or named
    /// reference. Used for the occurs check: binding a variable to a type
    /// containing itself would make resolution non-terminating.
    pub fn contains_ref(&self, name: &str) -> bool {
        match self {
            Type::Var(n) | Type::Ident(n) => n == name,
            Type::Native(_) | Type::Literal(_) => false,
            Type::Reference { base, args } => {
                base.contains_ref(name) || args.iter().any(|a| a.contains_ref(name))
            }
            Type::Function(func) => {
                func.params.iter().any(|p| p.annotation.contains_ref(name))
                    || func.ret.contains_ref(name)
            }
            Type::Call(call) => {
                call.callee.contains_ref(name)
                    || call.args.iter().any(|a| a.contains_ref(name))
                    || call.ret.contains_ref(name)
            }
            Type::Object(obj) => obj.props.iter().any(|p| p.value.contains_ref(name)),
            Type::Variant(alts) => alts.iter().any(|a| a.contains_ref(name)),
            Type::Enum(e) => e
                .members
                .iter()
                .any(|m| m.params.iter().any(|p| p.contains_ref(name))),
            Type::EnumMember(member) => member.params.iter().any(|p| p.contains_ref(name)),
            Type::EnumCall(call) => {
                call.enum_ty.contains_ref(name) || call.args.iter().any(|a| a.contains_ref(name))
            }
            Type::EnumPattern(pat) => pat.enum_ty.contains_ref(name),
            Type::Pattern(pattern) => {
                pattern.pattern.contains_ref(name) || pattern.var.contains_ref(name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Native(kind) => write!(f, "{kind}"),
            Type::Literal(text) => write!(f, "`{text}`"),
            Type::Var(name) => write!(f, "{name}"),
            Type::Ident(name) => write!(f, "{name}"),
            Type::Reference { base, args } => {
                write!(f, "{base}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::Function(func) => {
                write!(f, "(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if param.spread {
                        write!(f, "...")?;
                    }
                    write!(f, "{}", param.annotation)?;
                }
                write!(f, ") -> {}", func.ret)
            }
            Type::Call(call) => {
                write!(f, "call(")?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ") -> {}", call.ret)
            }
            Type::Object(obj) => {
                write!(f, "{{ ")?;
                for (i, prop) in obj.props.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", prop.name, prop.value)?;
                }
                write!(f, " }}")
            }
            Type::Variant(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    match alt {
                        Type::Literal(tag) => write!(f, ":{tag}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            Type::Enum(e) => write!(f, "{}", e.ident),
            Type::EnumMember(member) => write!(f, "{}", member.ident),
            Type::EnumCall(call) => {
                write!(f, "{}.{}", call.enum_ty, call.member)?;
                if !call.args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in call.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Type::EnumPattern(pat) => write!(f, "{}.{}", pat.enum_ty, pat.member),
            Type::Pattern(pattern) => write!(f, "pattern {}", pattern.pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natives_render_lowercase() {
        assert_eq!(Type::NUMBER.to_string(), "number");
        assert_eq!(Type::STRING.to_string(), "string");
        assert_eq!(Type::BOOLEAN.to_string(), "boolean");
        assert_eq!(Type::VOID.to_string(), "void");
    }

    #[test]
    fn function_type_renders_arrow_form() {
        let calc = Type::Function(FunctionType {
            ident: Some("calc".to_string()),
            params: vec![ParamType {
                name: "factor".to_string(),
                annotation: Type::NUMBER,
                spread: false,
            }],
            ret: Box::new(Type::NUMBER),
        });
        assert_eq!(calc.to_string(), "(number) -> number");
    }

    #[test]
    fn array_reference_renders_with_args() {
        assert_eq!(Type::array_of(Type::STRING).to_string(), "array<string>");
    }

    #[test]
    fn variant_renders_tags() {
        let variant = Type::Variant(vec![
            Type::Literal("Bar".to_string()),
            Type::Literal("Baz".to_string()),
        ]);
        assert_eq!(variant.to_string(), ":Bar | :Baz");
    }

    #[test]
    fn enum_member_lookup_is_by_name() {
        let option = EnumType {
            id: EnumId(0),
            ident: "Option".to_string(),
            params: vec!["T".to_string()],
            members: vec![
                EnumMemberType {
                    ident: "Some".to_string(),
                    params: vec![Type::Ident("T".to_string())],
                },
                EnumMemberType {
                    ident: "None".to_string(),
                    params: vec![],
                },
            ],
        };
        assert!(option.member("Some").is_some());
        assert!(option.member("Nope").is_none());
    }

    #[test]
    fn enum_id_is_found_through_calls_and_patterns() {
        let e = EnumType {
            id: EnumId(7),
            ident: "Status".to_string(),
            params: vec![],
            members: vec![EnumMemberType {
                ident: "Ok".to_string(),
                params: vec![],
            }],
        };
        let call = Type::EnumCall(EnumCallType {
            enum_ty: Box::new(Type::Enum(e.clone())),
            member: "Ok".to_string(),
            args: vec![],
        });
        assert_eq!(call.enum_id(), Some(EnumId(7)));
        let pat = Type::EnumPattern(EnumPatternType {
            enum_ty: Box::new(Type::Enum(e)),
            member: "Ok".to_string(),
        });
        assert_eq!(pat.enum_id(), Some(EnumId(7)));
    }
}
