//! Tracing compiler-generated methods back to the code the user wrote.
//!
//! Frames of `async` methods, iterators, lambdas and local functions point at methods the C#
//! compiler synthesized: `<Main>d__0.MoveNext`, `<>c.<Run>b__1_0`, `<Start>g__Local|2_0`. The
//! [`Demystifier`] undoes that in three steps:
//!
//! 1. A state machine's `MoveNext` is replaced by the method carrying the matching
//!    `[AsyncStateMachine]`/`[IteratorStateMachine]` attribute in the enclosing type.
//! 2. A generated name is parsed and the method it was generated from is looked up by name in
//!    the declaring type and up to ten enclosing types. A candidate only counts if its IL
//!    references the generated method (or, for lambdas, if it has a local of the closure type).
//! 3. The signature of the resolved method is rendered, with the generated method's own
//!    parameters kept separately as a sub-method.

use crate::{
    demystify::{
        generatedname::{lambda_ordinal, GeneratedName, GeneratedNameKind},
        provider::{well_known, MetadataProvider, MethodInfo, ParameterInfo, TypeSig},
        resolved::{ParameterPrefix, ResolvedMethod, ResolvedParameter},
        typename::{type_display_name, DisplayNameOptions},
    },
    metadata::{
        customattributes::CustomAttributeArgument,
        method::{opcodes, Instructions},
        token::Token,
    },
};

/// Maximum number of enclosing types searched for the origin of a generated method.
pub const MAX_RESOLVE_DEPTH: usize = 10;

/// The method a generated method was traced back to.
struct SourceMethod {
    method: MethodInfo,
    ordinal: Option<i32>,
}

/// Outcome of resolving a generated method name.
struct GeneratedNameResolution {
    kind: GeneratedNameKind,
    /// Name between the brackets, or the full name when it is not a generated name
    original_name: String,
    /// Local function name, or the empty string for lambdas
    sub_method_name: Option<String>,
    source: Option<SourceMethod>,
}

/// Resolves method tokens of one module to [`ResolvedMethod`]s.
///
/// Resolution never fails for "could not demystify": each step that finds no confirmation
/// leaves the method as it is and the display falls back to the raw generated name.
pub struct Demystifier<'a> {
    provider: &'a dyn MetadataProvider,
}

impl<'a> Demystifier<'a> {
    /// Creates a demystifier over the metadata of one module.
    #[must_use]
    pub fn new(provider: &'a dyn MetadataProvider) -> Self {
        Demystifier { provider }
    }

    /// Resolves the display form of `origin`.
    ///
    /// Returns `None` only when the module has no method for the token.
    #[must_use]
    pub fn resolve(&self, origin: Token) -> Option<ResolvedMethod> {
        let origin_info = self.provider.method(origin)?;

        let mut resolved = ResolvedMethod {
            sub_method_base: Some(origin),
            ..Default::default()
        };

        let mut method = origin_info.clone();
        let mut declaring_type = method.declaring_type;
        let mut sub_method_name = Some(method.name.clone());
        let mut method_name = method.name.clone();

        if let Some(state_machine) = declaring_type.filter(|ty| self.is_state_machine(*ty)) {
            resolved.is_async = self.implements(state_machine, well_known::I_ASYNC_STATE_MACHINE);

            match self.state_machine_owner(state_machine) {
                Some((owner, true)) => {
                    declaring_type = owner.declaring_type;
                    method = owner;
                }
                Some((owner, false)) => {
                    // async methods resolve silently to their owner
                    declaring_type = owner.declaring_type;
                    method = owner;
                    resolved.sub_method_base = None;
                    sub_method_name = None;
                }
                None => {
                    log::trace!("No owner found for state machine method {}", origin);
                    resolved.sub_method_base = None;
                    sub_method_name = None;
                }
            }

            method_name = method.name.clone();
        }

        resolved.method = Some(method.token);
        resolved.name = method_name.clone();

        let mut display_method = method.clone();
        if method.name.contains('<') {
            let resolution = self.resolve_generated_name(&method);

            declaring_type = method.declaring_type;
            sub_method_name = resolution.sub_method_name;
            resolved.is_lambda = resolution.kind == GeneratedNameKind::LambdaMethod;

            match resolution.source {
                Some(source) => {
                    declaring_type = source.method.declaring_type;
                    method_name = source.method.name.clone();
                    resolved.method = Some(source.method.token);
                    resolved.name = method_name.clone();
                    resolved.ordinal = source.ordinal;
                    display_method = source.method;

                    if resolved.is_lambda && method_name == ".cctor" {
                        if let Some(field) = declaring_type.and_then(|resolved_type| {
                            self.static_field_of_lambda(resolved_type, &display_method, &origin_info)
                        }) {
                            resolved.name = field;
                            resolved.is_lambda = false;
                            display_method = origin_info.clone();
                        }
                    }
                }
                None => {
                    log::trace!("Generated method {} left unresolved", method.name);
                    method_name = resolution.original_name;
                    resolved.method = None;
                }
            }
        }

        if sub_method_name.as_deref() != Some(method_name.as_str()) {
            resolved.sub_method = sub_method_name;
        }

        resolved.declaring_type =
            declaring_type.and_then(|declaring_type| self.provider.type_signature(declaring_type));

        if !display_method.is_constructor() {
            resolved.return_parameter = match self.provider.return_parameter(display_method.token) {
                Some(parameter) => Some(self.resolve_parameter(&parameter)),
                None => display_method.return_type.clone().map(|return_type| ResolvedParameter {
                    name: Some(String::new()),
                    resolved_type: Some(return_type),
                    ..Default::default()
                }),
            };
        }

        resolved.generic_arguments = display_method
            .generic_arguments
            .iter()
            .map(|argument| type_display_name(argument, DisplayNameOptions::SHORT))
            .collect();

        resolved.parameters = self
            .provider
            .parameters(display_method.token)
            .iter()
            .map(|parameter| self.resolve_parameter(parameter))
            .collect();

        if resolved.sub_method_base == resolved.method {
            resolved.sub_method_base = None;
        } else if let Some(sub_method) = resolved.sub_method_base {
            resolved.sub_method_parameters = self
                .provider
                .parameters(sub_method)
                .iter()
                .map(|parameter| self.resolve_parameter(parameter))
                .filter(|parameter| {
                    parameter
                        .name
                        .as_deref()
                        .is_some_and(|name| !name.starts_with('<'))
                })
                .collect();
        }

        Some(resolved)
    }

    fn implements(&self, type_token: Token, interface: &str) -> bool {
        self.provider
            .type_info(type_token)
            .is_some_and(|info| info.interfaces.iter().any(|name| name == interface))
    }

    fn is_state_machine(&self, type_token: Token) -> bool {
        self.provider
            .has_attribute(type_token, well_known::COMPILER_GENERATED)
            && (self.implements(type_token, well_known::I_ASYNC_STATE_MACHINE)
                || self.implements(type_token, well_known::I_ENUMERATOR))
    }

    /// Finds the method whose state machine attribute names `state_machine`, and whether it
    /// is an iterator.
    fn state_machine_owner(&self, state_machine: Token) -> Option<(MethodInfo, bool)> {
        let parent = self.provider.type_info(state_machine)?.enclosing?;
        let state_machine_name = self.provider.type_name(state_machine)?.full_name();

        for candidate in self.provider.methods(parent) {
            let mut found = false;
            let mut iterator = false;

            for attribute in self.provider.custom_attributes(candidate) {
                let is_iterator = match attribute.type_name.as_str() {
                    well_known::ASYNC_STATE_MACHINE => false,
                    well_known::ITERATOR_STATE_MACHINE
                    | well_known::ASYNC_ITERATOR_STATE_MACHINE => true,
                    _ => continue,
                };

                let names_state_machine = attribute
                    .value
                    .fixed_args
                    .first()
                    .and_then(CustomAttributeArgument::as_str)
                    .is_some_and(|name| strip_assembly(name) == state_machine_name);

                if names_state_machine {
                    found = true;
                    iterator |= is_iterator;
                }
            }

            if found {
                return self
                    .provider
                    .method(candidate)
                    .map(|method| (method, iterator));
            }
        }

        None
    }

    fn resolve_generated_name(&self, method: &MethodInfo) -> GeneratedNameResolution {
        let Some(generated) = GeneratedName::parse(&method.name) else {
            return GeneratedNameResolution {
                kind: GeneratedNameKind::None,
                original_name: method.name.clone(),
                sub_method_name: None,
                source: None,
            };
        };

        let original_name = generated.original_name();
        let sub_method_name = match generated.kind {
            GeneratedNameKind::LocalFunction => generated.local_function_name().map(str::to_string),
            GeneratedNameKind::LambdaMethod => Some(String::new()),
            _ => None,
        };

        let mut resolution = GeneratedNameResolution {
            kind: generated.kind,
            original_name: original_name.to_string(),
            sub_method_name,
            source: None,
        };

        let Some(mut declaring_type) = method.declaring_type else {
            return resolution;
        };

        let match_hint = generated.match_hint();

        resolution.source =
            self.find_source_method(declaring_type, original_name, &generated, match_hint, method);
        if resolution.source.is_some() {
            return resolution;
        }

        for _ in 0..MAX_RESOLVE_DEPTH {
            let Some(enclosing) = self
                .provider
                .type_info(declaring_type)
                .and_then(|info| info.enclosing)
            else {
                break;
            };
            declaring_type = enclosing;

            resolution.source = self.find_source_method(
                declaring_type,
                original_name,
                &generated,
                match_hint,
                method,
            );
            if resolution.source.is_some() {
                return resolution;
            }

            if original_name == ".cctor" {
                let cctor = self
                    .provider
                    .methods(declaring_type)
                    .into_iter()
                    .filter_map(|token| self.provider.method(token))
                    .find(|candidate| candidate.name == ".cctor");

                if let Some(cctor) = cctor {
                    resolution.source = Some(SourceMethod {
                        method: cctor,
                        ordinal: None,
                    });
                    return resolution;
                }
            }
        }

        resolution
    }

    /// Searches the methods named `name` in `type_token` for one that references `generated`.
    fn find_source_method(
        &self,
        type_token: Token,
        name: &str,
        generated_name: &GeneratedName<'_>,
        match_hint: Option<&str>,
        generated: &MethodInfo,
    ) -> Option<SourceMethod> {
        let is_lambda = generated_name.kind == GeneratedNameKind::LambdaMethod;

        for candidate in self.provider.methods(type_token) {
            let Some(candidate) = self.provider.method(candidate) else {
                continue;
            };
            if candidate.name != name {
                continue;
            }

            let Some(body) = self.provider.method_body(candidate.token) else {
                continue;
            };

            let confirmed_by_closure = is_lambda
                && generated.declaring_type.is_some_and(|closure| {
                    body.locals
                        .iter()
                        .any(|local| local.definition() == Some(closure))
                });

            if confirmed_by_closure || self.references(&body.il, generated, match_hint) {
                let ordinal = if is_lambda {
                    self.ordinal(generated)
                } else {
                    None
                };

                return Some(SourceMethod {
                    method: candidate,
                    ordinal,
                });
            }
        }

        None
    }

    /// Whether `il` has a method operand that is `generated`, or that carries the same local
    /// function scope hint.
    fn references(&self, il: &[u8], generated: &MethodInfo, match_hint: Option<&str>) -> bool {
        for instruction in Instructions::new(il) {
            let Ok(instruction) = instruction else {
                // IL that cannot be walked does not confirm anything
                return false;
            };

            let Some(target) = instruction
                .token()
                .and_then(|token| self.provider.resolve_method(token))
            else {
                continue;
            };

            if target == generated.token {
                return true;
            }

            if let Some(hint) = match_hint {
                if self
                    .provider
                    .method(target)
                    .is_some_and(|target| target.name.contains(hint))
                {
                    return true;
                }
            }
        }

        false
    }

    /// The ordinal of a lambda, kept only if a sibling with the same name prefix exists.
    fn ordinal(&self, generated: &MethodInfo) -> Option<i32> {
        let (ordinal, prefix_len) = lambda_ordinal(&generated.name)?;
        let prefix = &generated.name[..prefix_len];
        let declaring_type = generated.declaring_type?;

        let siblings = self
            .provider
            .methods(declaring_type)
            .into_iter()
            .filter_map(|token| self.provider.method(token))
            .filter(|sibling| sibling.name.len() > prefix_len && sibling.name.starts_with(prefix))
            .take(2)
            .count();

        (siblings > 1).then_some(ordinal)
    }

    /// Name of the static field a `.cctor` lambda is stored in.
    ///
    /// Looks for `ldsfld <closure instance>; ldftn <lambda>; ...; stsfld <field>` in the
    /// static constructor, with the field declared on the type being initialized.
    fn static_field_of_lambda(
        &self,
        resolved_type: Token,
        cctor: &MethodInfo,
        lambda: &MethodInfo,
    ) -> Option<String> {
        let info = self.provider.type_info(resolved_type)?;
        if !info.generic_parameters.is_empty() {
            return None;
        }

        let closure = lambda.declaring_type?;
        let body = self.provider.method_body(cctor.token)?;

        let mut target_loaded = false;
        let mut delegate_created = false;
        for instruction in Instructions::new(&body.il) {
            let instruction = instruction.ok()?;
            let Some(token) = instruction.token() else {
                continue;
            };

            match instruction.opcode {
                opcodes::LDSFLD => {
                    target_loaded = self
                        .provider
                        .resolve_field(token)
                        .and_then(|field| self.provider.field(field))
                        .is_some_and(|field| field.declaring_type == closure);
                }
                opcodes::LDFTN => {
                    delegate_created = target_loaded
                        && self.provider.resolve_method(token) == Some(lambda.token);
                    target_loaded = false;
                }
                opcodes::STSFLD if delegate_created => {
                    delegate_created = false;
                    let field = self
                        .provider
                        .resolve_field(token)
                        .and_then(|field| self.provider.field(field));

                    if let Some(field) = field {
                        if field.is_static && field.declaring_type == resolved_type {
                            return Some(field.name);
                        }
                    }
                }
                _ => {}
            }
        }

        None
    }

    fn resolve_parameter(&self, parameter: &ParameterInfo) -> ResolvedParameter {
        let has_attribute = |name: &str| {
            parameter
                .token
                .is_some_and(|token| self.provider.has_attribute(token, name))
        };

        let prefix = if has_attribute(well_known::PARAM_ARRAY) {
            ParameterPrefix::Params
        } else if parameter.is_out() {
            ParameterPrefix::Out
        } else if parameter.is_in() {
            ParameterPrefix::In
        } else if parameter.param_type.is_by_ref() {
            ParameterPrefix::Ref
        } else {
            ParameterPrefix::None
        };

        if parameter.param_type.is_generic() {
            if let Some(tuple_names) = self.tuple_element_names(parameter) {
                return ResolvedParameter {
                    name: parameter.name.clone(),
                    resolved_type: Some(parameter.param_type.clone()),
                    prefix,
                    is_dynamic_type: false,
                    tuple_names: Some(tuple_names),
                };
            }
        }

        let resolved_type = match &parameter.param_type {
            TypeSig::ByRef(inner) => inner.as_ref().clone(),
            other => other.clone(),
        };

        ResolvedParameter {
            name: parameter.name.clone(),
            resolved_type: Some(resolved_type),
            prefix,
            is_dynamic_type: has_attribute(well_known::DYNAMIC),
            tuple_names: None,
        }
    }

    fn tuple_element_names(&self, parameter: &ParameterInfo) -> Option<Vec<Option<String>>> {
        let token = parameter.token?;
        let attribute = self
            .provider
            .custom_attributes(token)
            .into_iter()
            .find(|attribute| attribute.type_name == well_known::TUPLE_ELEMENT_NAMES)?;

        let Some(CustomAttributeArgument::Array(Some(elements))) = attribute.value.fixed_args.first()
        else {
            return None;
        };

        let names: Vec<Option<String>> = elements
            .iter()
            .map(|element| element.as_str().map(str::to_string))
            .collect();

        (!names.is_empty()).then_some(names)
    }
}

/// Drops the assembly qualification of a serialized type name.
fn strip_assembly(name: &str) -> &str {
    let mut depth = 0_i32;
    for (index, c) in name.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => return name[..index].trim_end(),
            _ => {}
        }
    }

    name
}
