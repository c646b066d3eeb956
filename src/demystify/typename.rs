//! C#-flavored display names for signature types.
//!
//! `int` instead of `System.Int32`, `T?` instead of `Nullable<T>`, `List<string>` instead of
//! ``List`1[System.String]``, `Outer<T>+Inner` for nested types when a full name is asked for.

use crate::demystify::provider::{TypeRefName, TypeSig};

/// How a type name is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayNameOptions {
    /// Prefix namespace and enclosing types
    pub full_name: bool,
    /// Render generic parameters by name; otherwise they are left empty (`Dictionary<,>`)
    pub include_generic_parameter_names: bool,
}

impl DisplayNameOptions {
    /// Namespace-qualified names with generic parameter names.
    pub const FULL: DisplayNameOptions = DisplayNameOptions {
        full_name: true,
        include_generic_parameter_names: true,
    };

    /// Short names with generic parameter names.
    pub const SHORT: DisplayNameOptions = DisplayNameOptions {
        full_name: false,
        include_generic_parameter_names: true,
    };
}

/// Renders `sig` into a new string.
///
/// # Examples
///
/// ```rust
/// use dotsym::demystify::{type_display_name, DisplayNameOptions, TypeRefName, TypeSig};
///
/// let list = TypeSig::GenericInst(
///     TypeRefName::new("System.Collections.Generic", "List`1"),
///     vec![TypeSig::I4],
/// );
/// assert_eq!(type_display_name(&list, DisplayNameOptions::SHORT), "List<int>");
/// assert_eq!(
///     type_display_name(&list, DisplayNameOptions::FULL),
///     "System.Collections.Generic.List<int>"
/// );
/// ```
#[must_use]
pub fn type_display_name(sig: &TypeSig, options: DisplayNameOptions) -> String {
    let mut out = String::new();
    append_type_display_name(&mut out, sig, options);
    out
}

/// Appends the display name of `sig` to `out`.
pub fn append_type_display_name(out: &mut String, sig: &TypeSig, options: DisplayNameOptions) {
    match sig {
        TypeSig::GenericInst(name, args) => {
            if name.is("System", "Nullable`1") && args.len() == 1 {
                append_type_display_name(out, &args[0], options);
                out.push('?');
            } else {
                append_generic_type(out, name, args, options);
            }
        }
        TypeSig::SzArray(_) | TypeSig::Array(..) => append_array_type(out, sig, options),
        TypeSig::Named(name) => append_named_type(out, name, options),
        TypeSig::GenericParam(name) => {
            if options.include_generic_parameter_names {
                out.push_str(name);
            }
        }
        TypeSig::Pointer(inner) => {
            append_type_display_name(out, inner, options);
            out.push('*');
        }
        TypeSig::ByRef(inner) => {
            append_type_display_name(out, inner, options);
            out.push('&');
        }
        TypeSig::Unknown => out.push('?'),
        primitive => out.push_str(primitive_name(primitive)),
    }
}

/// Name of a generic type without its arity suffix: ``List`1`` becomes `List`.
#[must_use]
pub fn generic_type_name(name: &str) -> &str {
    match name.find('`') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// `System.ValueTuple`N`, the type behind C# tuple syntax.
#[must_use]
pub fn is_value_tuple(name: &TypeRefName) -> bool {
    name.namespace == "System" && name.name.contains("ValueTuple`")
}

fn arity(name: &str) -> usize {
    name.find('`')
        .and_then(|index| name[index + 1..].parse().ok())
        .unwrap_or(0)
}

fn primitive_name(sig: &TypeSig) -> &'static str {
    match sig {
        TypeSig::Void => "void",
        TypeSig::Bool => "bool",
        TypeSig::Char => "char",
        TypeSig::I1 => "sbyte",
        TypeSig::U1 => "byte",
        TypeSig::I2 => "short",
        TypeSig::U2 => "ushort",
        TypeSig::I4 => "int",
        TypeSig::U4 => "uint",
        TypeSig::I8 => "long",
        TypeSig::U8 => "ulong",
        TypeSig::R4 => "float",
        TypeSig::R8 => "double",
        TypeSig::String => "string",
        TypeSig::Object => "object",
        TypeSig::IntPtr | TypeSig::FnPtr => "IntPtr",
        TypeSig::UIntPtr => "UIntPtr",
        TypeSig::TypedReference => "TypedReference",
        _ => "?",
    }
}

/// Keyword for a `System` type referenced by name instead of by element type.
fn builtin_name(name: &TypeRefName) -> Option<&'static str> {
    if name.namespace != "System" || !name.enclosing.is_empty() {
        return None;
    }

    let keyword = match name.name.as_str() {
        "Void" => "void",
        "Boolean" => "bool",
        "Byte" => "byte",
        "Char" => "char",
        "Decimal" => "decimal",
        "Double" => "double",
        "Single" => "float",
        "Int32" => "int",
        "Int64" => "long",
        "Object" => "object",
        "SByte" => "sbyte",
        "Int16" => "short",
        "String" => "string",
        "UInt32" => "uint",
        "UInt64" => "ulong",
        "UInt16" => "ushort",
        _ => return None,
    };

    Some(keyword)
}

fn append_named_type(out: &mut String, name: &TypeRefName, options: DisplayNameOptions) {
    if let Some(keyword) = builtin_name(name) {
        out.push_str(keyword);
    } else if name.namespace == "System" || !options.full_name {
        out.push_str(&name.name);
    } else {
        out.push_str(&name.full_name());
    }
}

fn append_array_type(out: &mut String, sig: &TypeSig, options: DisplayNameOptions) {
    let mut ranks = Vec::new();
    let mut inner = sig;
    loop {
        match inner {
            TypeSig::SzArray(element) => {
                ranks.push(1);
                inner = element;
            }
            TypeSig::Array(element, rank) => {
                ranks.push((*rank).max(1));
                inner = element;
            }
            _ => break,
        }
    }

    append_type_display_name(out, inner, options);
    for rank in ranks {
        out.push('[');
        for _ in 1..rank {
            out.push(',');
        }
        out.push(']');
    }
}

fn append_generic_type(
    out: &mut String,
    name: &TypeRefName,
    args: &[TypeSig],
    options: DisplayNameOptions,
) {
    // Generic arguments of nested types list the enclosing types' arguments first
    let mut segments: Vec<(&str, usize, usize)> = Vec::with_capacity(name.enclosing.len() + 1);
    let mut start = 0;
    for segment in name.enclosing.iter().chain(std::iter::once(&name.name)) {
        let end = start + arity(segment);
        segments.push((segment.as_str(), start, end));
        start = end;
    }

    if options.full_name {
        if !name.namespace.is_empty() {
            out.push_str(&name.namespace);
            out.push('.');
        }

        for (index, (segment, start, end)) in segments.iter().enumerate() {
            if index > 0 {
                out.push('+');
            }
            append_generic_segment(out, segment, args, *start, *end, options);
        }
    } else if let Some((segment, start, end)) = segments.last() {
        append_generic_segment(out, segment, args, *start, *end, options);
    }
}

fn append_generic_segment(
    out: &mut String,
    segment: &str,
    args: &[TypeSig],
    start: usize,
    end: usize,
    options: DisplayNameOptions,
) {
    let Some(backtick) = segment.find('`').filter(|index| *index > 0) else {
        out.push_str(segment);
        return;
    };

    out.push_str(&segment[..backtick]);
    out.push('<');

    let end = end.min(args.len());
    for index in start..end {
        append_type_display_name(out, &args[index], options);
        if index + 1 == end {
            continue;
        }

        out.push(',');
        if options.include_generic_parameter_names
            || !matches!(args[index + 1], TypeSig::GenericParam(_))
        {
            out.push(' ');
        }
    }

    out.push('>');
}
