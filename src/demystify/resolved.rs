//! Display-ready results of name resolution.

use std::fmt;

use crate::{
    demystify::{
        provider::{TypeRefName, TypeSig},
        typename::{append_type_display_name, generic_type_name, is_value_tuple, DisplayNameOptions},
    },
    metadata::token::Token,
};

/// Passing mode of a parameter as C# spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum ParameterPrefix {
    #[default]
    #[strum(serialize = "")]
    None,
    Ref,
    Out,
    In,
    Params,
}

/// A parameter (or return value) in display form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedParameter {
    /// Declared name; empty for return values
    pub name: Option<String>,
    /// Type with any by-ref wrapper removed; `None` renders as `?`
    pub resolved_type: Option<TypeSig>,
    /// `ref`, `out`, `in` or `params`
    pub prefix: ParameterPrefix,
    /// Declared `dynamic`
    pub is_dynamic_type: bool,
    /// Element names of a tuple-typed parameter; `None` entries are unnamed elements
    pub tuple_names: Option<Vec<Option<String>>>,
}

impl ResolvedParameter {
    fn append_type_name(&self, out: &mut String, resolved_type: &TypeSig) {
        let Some(tuple_names) = &self.tuple_names else {
            append_type_display_name(out, resolved_type, DisplayNameOptions::SHORT);
            return;
        };

        match resolved_type {
            TypeSig::GenericInst(name, args) if is_value_tuple(name) => {
                append_value_tuple(out, args, tuple_names);
            }
            TypeSig::GenericInst(name, args) => {
                // The names describe the tuple in the first generic argument: Task<(int a, int b)>
                out.push_str(generic_type_name(&name.name));
                out.push('<');
                match args.first() {
                    Some(TypeSig::GenericInst(_, tuple_args)) => {
                        append_value_tuple(out, tuple_args, tuple_names);
                    }
                    Some(other) => append_type_display_name(out, other, DisplayNameOptions::SHORT),
                    None => {}
                }
                out.push('>');
            }
            other => append_type_display_name(out, other, DisplayNameOptions::SHORT),
        }
    }
}

fn append_value_tuple(out: &mut String, args: &[TypeSig], tuple_names: &[Option<String>]) {
    out.push('(');
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }

        append_type_display_name(out, arg, DisplayNameOptions::SHORT);
        if let Some(Some(name)) = tuple_names.get(index) {
            out.push(' ');
            out.push_str(name);
        }
    }
    out.push(')');
}

impl fmt::Display for ResolvedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if self.prefix != ParameterPrefix::None {
            out.push_str(self.prefix.as_ref());
            out.push(' ');
        }

        if self.is_dynamic_type {
            out.push_str("dynamic");
        } else if let Some(resolved_type) = &self.resolved_type {
            self.append_type_name(&mut out, resolved_type);
        } else {
            out.push('?');
        }

        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            out.push(' ');
            out.push_str(name);
        }

        f.write_str(&out)
    }
}

/// A method as it should be shown in a stack trace.
///
/// Produced by [`crate::demystify::Demystifier::resolve`]. For compiler-generated code, the
/// fields describe the user-written method the code came from, with the generated part in
/// [`ResolvedMethod::sub_method`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedMethod {
    /// The method the display refers to; `None` when a generated name could not be traced back
    /// to its origin, which renders the parameter list as `(?)`
    pub method: Option<Token>,
    /// The generated method behind a sub-method annotation
    pub sub_method_base: Option<Token>,
    /// Declaring type of the displayed method
    pub declaring_type: Option<TypeSig>,
    /// Method name, `.ctor` and `.cctor` included
    pub name: String,
    /// Name of the local function, iterator body (`MoveNext`) or lambda (empty) inside `name`
    pub sub_method: Option<String>,
    /// Position of a lambda among its siblings, set only when there are several
    pub ordinal: Option<i32>,
    /// Display names of the method's generic arguments
    pub generic_arguments: Vec<String>,
    /// Parameters of the displayed method
    pub parameters: Vec<ResolvedParameter>,
    /// Parameters of the generated method, without compiler-synthesized ones
    pub sub_method_parameters: Vec<ResolvedParameter>,
    /// Return value; `None` for constructors
    pub return_parameter: Option<ResolvedParameter>,
    /// The frame is the body of an `async` method
    pub is_async: bool,
    /// The frame is a lambda body
    pub is_lambda: bool,
}

impl ResolvedMethod {
    /// Full name of the declaring type as reflection spells it (`Ns.Outer+Inner`), if known.
    #[must_use]
    pub fn declaring_type_full_name(&self) -> Option<String> {
        match &self.declaring_type {
            Some(TypeSig::Named(name) | TypeSig::GenericInst(name, _)) => Some(name.full_name()),
            _ => None,
        }
    }

    /// The declaring type's name reference, if known.
    #[must_use]
    pub fn declaring_type_name(&self) -> Option<&TypeRefName> {
        match &self.declaring_type {
            Some(TypeSig::Named(name) | TypeSig::GenericInst(name, _)) => Some(name),
            _ => None,
        }
    }

    fn append_declaring_type(&self, out: &mut String) {
        if let Some(declaring_type) = &self.declaring_type {
            append_type_display_name(out, declaring_type, DisplayNameOptions::FULL);
        }
    }
}

fn append_parameters(out: &mut String, resolved: bool, parameters: &[ResolvedParameter]) {
    out.push('(');
    if resolved {
        for (index, parameter) in parameters.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            out.push_str(&parameter.to_string());
        }
    } else {
        out.push('?');
    }
    out.push(')');
}

impl fmt::Display for ResolvedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(128);

        if self.is_async {
            out.push_str("async ");
        }

        if let Some(return_parameter) = &self.return_parameter {
            out.push_str(&return_parameter.to_string());
            out.push(' ');
        }

        let has_sub_method = self.sub_method.as_deref().is_some_and(|sub| !sub.is_empty());
        if self.declaring_type.is_some() {
            match self.name.as_str() {
                ".ctor" => {
                    if !has_sub_method && !self.is_lambda {
                        out.push_str("new ");
                    }
                    self.append_declaring_type(&mut out);
                }
                ".cctor" => {
                    out.push_str("static ");
                    self.append_declaring_type(&mut out);
                }
                name => {
                    self.append_declaring_type(&mut out);
                    out.push('.');
                    out.push_str(name);
                }
            }
        } else {
            out.push_str(&self.name);
        }

        if !self.generic_arguments.is_empty() {
            out.push('<');
            out.push_str(&self.generic_arguments.join(", "));
            out.push('>');
        }

        append_parameters(&mut out, self.method.is_some(), &self.parameters);

        if has_sub_method || self.is_lambda {
            out.push('+');
            out.push_str(self.sub_method.as_deref().unwrap_or_default());
            append_parameters(
                &mut out,
                self.sub_method_base.is_some(),
                &self.sub_method_parameters,
            );

            if self.is_lambda {
                out.push_str(" => { }");
                if let Some(ordinal) = self.ordinal {
                    out.push_str(&format!(" [{ordinal}]"));
                }
            }
        }

        f.write_str(&out)
    }
}
