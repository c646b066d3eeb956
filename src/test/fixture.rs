//! An in-memory [`MetadataProvider`] with the shapes the C# compiler emits.

use std::collections::HashMap;

use crate::{
    demystify::{
        well_known, CustomAttributeInfo, FieldInfo, MetadataProvider, MethodBodyInfo, MethodInfo,
        ParameterInfo, TypeInfo, TypeRefName, TypeSig, METHOD_IMPL_AGGRESSIVE_INLINING, PARAM_IN,
        PARAM_OUT,
    },
    metadata::{
        customattributes::{CustomAttributeArgument, CustomAttributeValue},
        tables::TableId,
        token::Token,
    },
    test::Il,
};

/// Metadata of a fictional module, assembled by hand.
#[derive(Default)]
pub struct FixtureProvider {
    types: Vec<TypeInfo>,
    methods: Vec<MethodInfo>,
    fields: Vec<FieldInfo>,
    type_methods: HashMap<Token, Vec<Token>>,
    parameters: HashMap<Token, Vec<ParameterInfo>>,
    returns: HashMap<Token, ParameterInfo>,
    attributes: HashMap<Token, Vec<CustomAttributeInfo>>,
    bodies: HashMap<Token, MethodBodyInfo>,
    param_rows: u32,
    member_refs: u32,
}

fn type_argument(name: &str) -> CustomAttributeValue {
    CustomAttributeValue {
        fixed_args: vec![CustomAttributeArgument::Type(Some(name.to_string()))],
        named_args: Vec::new(),
    }
}

fn tuple_names(names: &[&str]) -> CustomAttributeValue {
    CustomAttributeValue {
        fixed_args: vec![CustomAttributeArgument::Array(Some(
            names
                .iter()
                .map(|name| CustomAttributeArgument::String(Some(name.to_string())))
                .collect(),
        ))],
        named_args: Vec::new(),
    }
}

fn named(namespace: &str, name: &str) -> TypeSig {
    TypeSig::Named(TypeRefName::new(namespace, name))
}

fn generic(namespace: &str, name: &str, args: Vec<TypeSig>) -> TypeSig {
    TypeSig::GenericInst(TypeRefName::new(namespace, name), args)
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, namespace: &str, name: &str, enclosing: Option<Token>) -> Token {
        let token = Token::from_parts(TableId::TypeDef.id(), self.types.len() as u32 + 1);
        self.types.push(TypeInfo {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
            enclosing,
            generic_parameters: Vec::new(),
            interfaces: Vec::new(),
        });
        token
    }

    /// Marks a type `[CompilerGenerated]` and lists the interfaces it implements.
    pub fn compiler_generated(&mut self, type_token: Token, interfaces: &[&str]) {
        self.attribute(type_token, well_known::COMPILER_GENERATED, CustomAttributeValue::default());
        if let Some(info) = self.type_mut(type_token) {
            info.interfaces = interfaces.iter().map(|name| name.to_string()).collect();
        }
    }

    pub fn set_generic_parameters(&mut self, type_token: Token, names: &[&str]) {
        if let Some(info) = self.type_mut(type_token) {
            info.generic_parameters = names.iter().map(|name| name.to_string()).collect();
        }
    }

    fn type_mut(&mut self, type_token: Token) -> Option<&mut TypeInfo> {
        self.types.get_mut(type_token.row() as usize - 1)
    }

    pub fn add_method(&mut self, type_token: Token, name: &str, return_type: Option<TypeSig>) -> Token {
        let token = Token::from_parts(TableId::MethodDef.id(), self.methods.len() as u32 + 1);
        self.methods.push(MethodInfo {
            token,
            name: name.to_string(),
            declaring_type: Some(type_token),
            flags: 0,
            impl_flags: 0,
            return_type,
            generic_arguments: Vec::new(),
        });
        self.type_methods.entry(type_token).or_default().push(token);
        token
    }

    fn method_mut(&mut self, method: Token) -> Option<&mut MethodInfo> {
        self.methods.get_mut(method.row() as usize - 1)
    }

    pub fn set_impl_flags(&mut self, method: Token, impl_flags: u32) {
        if let Some(info) = self.method_mut(method) {
            info.impl_flags = impl_flags;
        }
    }

    pub fn set_generic_arguments(&mut self, method: Token, names: &[&str]) {
        if let Some(info) = self.method_mut(method) {
            info.generic_arguments = names
                .iter()
                .map(|name| TypeSig::GenericParam(name.to_string()))
                .collect();
        }
    }

    fn next_param(&mut self) -> Token {
        self.param_rows += 1;
        Token::from_parts(TableId::Param.id(), self.param_rows)
    }

    pub fn add_param(&mut self, method: Token, name: Option<&str>, param_type: TypeSig, flags: u32) -> Token {
        let token = self.next_param();
        let list = self.parameters.entry(method).or_default();
        list.push(ParameterInfo {
            token: Some(token),
            name: name.map(str::to_string),
            sequence: list.len() as u32 + 1,
            param_type,
            flags,
        });
        token
    }

    pub fn add_return_param(&mut self, method: Token, param_type: TypeSig) -> Token {
        let token = self.next_param();
        self.returns.insert(
            method,
            ParameterInfo {
                token: Some(token),
                name: None,
                sequence: 0,
                param_type,
                flags: 0,
            },
        );
        token
    }

    pub fn set_body(&mut self, method: Token, il: Vec<u8>, locals: Vec<TypeSig>) {
        self.bodies.insert(method, MethodBodyInfo { il, locals });
    }

    pub fn add_field(&mut self, type_token: Token, name: &str, is_static: bool) -> Token {
        let token = Token::from_parts(TableId::Field.id(), self.fields.len() as u32 + 1);
        self.fields.push(FieldInfo {
            token,
            name: name.to_string(),
            declaring_type: type_token,
            is_static,
        });
        token
    }

    pub fn attribute(&mut self, owner: Token, type_name: &str, value: CustomAttributeValue) {
        self.attributes.entry(owner).or_default().push(CustomAttributeInfo {
            type_name: type_name.to_string(),
            value,
        });
    }

    /// A `MemberRef` token to a method of another assembly.
    pub fn external_method(&mut self) -> Token {
        self.member_refs += 1;
        Token::from_parts(TableId::MemberRef.id(), self.member_refs)
    }

    /// The type with the given reflection full name.
    pub fn type_token(&self, full_name: &str) -> Token {
        self.types
            .iter()
            .map(|info| info.token)
            .find(|token| {
                self.type_name(*token)
                    .is_some_and(|name| name.full_name() == full_name)
            })
            .unwrap_or_else(|| panic!("no type {full_name}"))
    }

    /// The first method named `name` in the type with the given full name.
    pub fn method_token(&self, type_full_name: &str, name: &str) -> Token {
        let type_token = self.type_token(type_full_name);
        self.methods
            .iter()
            .find(|method| method.declaring_type == Some(type_token) && method.name == name)
            .map(|method| method.token)
            .unwrap_or_else(|| panic!("no method {type_full_name}.{name}"))
    }

    fn signature(&self, type_token: Token) -> TypeSig {
        self.type_signature(type_token).unwrap_or_default()
    }

    /// A small program with every kind of generated method:
    ///
    /// ```csharp
    /// namespace App;
    /// class Program {
    ///     static Action s_action = () => throw null;        // <>c.<.cctor>b__8_0
    ///     static void Main(string[] args) {
    ///         Action<int> a = x => { };                      // <>c.<Main>b__0_0
    ///         Action<int> b = x => throw null;               // <>c.<Main>b__0_1
    ///         Start();
    ///     }
    ///     static void Start() {
    ///         LocalFunc2(3);                                 // <Start>g__LocalFunc2|1_0
    ///         void LocalFunc2(int depth) => LocalFunc3();
    ///         void LocalFunc3() => throw null;               // <Start>g__LocalFunc3|1_1
    ///     }
    ///     static async Task RunAsync(int delay) { ... }      // <RunAsync>d__4
    ///     static IEnumerable<int> Numbers(int count) { ... } // <Numbers>d__5
    ///     static void Capture(int value) { Action a = () => Use(value); } // <>c__DisplayClass6_0
    /// }
    /// ```
    pub fn sample() -> Self {
        let mut fixture = FixtureProvider::new();

        let program = fixture.add_type("App", "Program", None);
        let lambdas = fixture.add_type("", "<>c", Some(program));
        fixture.compiler_generated(lambdas, &[]);
        let run_async = fixture.add_type("", "<RunAsync>d__4", Some(program));
        fixture.compiler_generated(run_async, &[well_known::I_ASYNC_STATE_MACHINE]);
        let numbers = fixture.add_type("", "<Numbers>d__5", Some(program));
        fixture.compiler_generated(
            numbers,
            &["System.Collections.Generic.IEnumerator`1", well_known::I_ENUMERATOR],
        );
        let display_class = fixture.add_type("", "<>c__DisplayClass6_0", Some(program));
        fixture.compiler_generated(display_class, &[]);
        let orphan = fixture.add_type("", "<Orphan>d__9", Some(program));
        fixture.compiler_generated(orphan, &[well_known::I_ENUMERATOR]);
        let hidden_type = fixture.add_type("App", "HiddenType", None);
        fixture.attribute(hidden_type, well_known::STACK_TRACE_HIDDEN, CustomAttributeValue::default());
        let awaiter = fixture.add_type("System.Runtime.CompilerServices", "TaskAwaiter", None);

        let external = fixture.external_method();
        let s_action = fixture.add_field(program, "s_action", true);
        let singleton = fixture.add_field(lambdas, "<>9", true);

        // Program
        let main = fixture.add_method(program, "Main", Some(TypeSig::Void));
        fixture.add_param(main, Some("args"), TypeSig::SzArray(Box::new(TypeSig::String)), 0);

        let start = fixture.add_method(program, "Start", Some(TypeSig::Void));
        let local2 = fixture.add_method(program, "<Start>g__LocalFunc2|1_0", Some(TypeSig::Void));
        fixture.add_param(local2, Some("depth"), TypeSig::I4, 0);
        fixture.add_param(local2, None, TypeSig::ByRef(Box::new(TypeSig::Object)), 0);
        let local3 = fixture.add_method(program, "<Start>g__LocalFunc3|1_1", Some(TypeSig::Void));

        let prefixes = fixture.add_method(program, "Prefixes", Some(TypeSig::Bool));
        fixture.add_param(prefixes, Some("a"), TypeSig::ByRef(Box::new(TypeSig::I4)), 0);
        fixture.add_param(prefixes, Some("b"), TypeSig::ByRef(Box::new(TypeSig::String)), PARAM_OUT);
        fixture.add_param(prefixes, Some("c"), TypeSig::ByRef(Box::new(TypeSig::I8)), PARAM_IN);
        let params = fixture.add_param(prefixes, Some("d"), TypeSig::SzArray(Box::new(TypeSig::Object)), 0);
        fixture.attribute(params, well_known::PARAM_ARRAY, CustomAttributeValue::default());
        let dynamic = fixture.add_param(prefixes, Some("e"), TypeSig::Object, 0);
        fixture.attribute(dynamic, well_known::DYNAMIC, CustomAttributeValue::default());

        let tuples = fixture.add_method(program, "Tuples", None);
        let returned = fixture.add_return_param(
            tuples,
            generic("System", "ValueTuple`2", vec![TypeSig::I4, TypeSig::String]),
        );
        fixture.attribute(returned, well_known::TUPLE_ELEMENT_NAMES, tuple_names(&["id", "name"]));
        let point = fixture.add_param(
            tuples,
            Some("point"),
            generic("System", "ValueTuple`2", vec![TypeSig::I4, TypeSig::I4]),
            0,
        );
        fixture.attribute(point, well_known::TUPLE_ELEMENT_NAMES, tuple_names(&["x", "y"]));

        let convert = fixture.add_method(
            program,
            "Convert",
            Some(generic(
                "System.Collections.Generic",
                "List`1",
                vec![TypeSig::GenericParam("T".into())],
            )),
        );
        fixture.set_generic_arguments(convert, &["T"]);
        fixture.add_param(convert, Some("value"), TypeSig::GenericParam("T".into()), 0);
        fixture.add_param(
            convert,
            Some("count"),
            generic("System", "Nullable`1", vec![TypeSig::I4]),
            0,
        );

        let run = fixture.add_method(program, "RunAsync", Some(named("System.Threading.Tasks", "Task")));
        fixture.add_param(run, Some("delay"), TypeSig::I4, 0);
        fixture.attribute(
            run,
            well_known::ASYNC_STATE_MACHINE,
            type_argument("App.Program+<RunAsync>d__4, App, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"),
        );

        let iterate = fixture.add_method(
            program,
            "Numbers",
            Some(generic("System.Collections.Generic", "IEnumerable`1", vec![TypeSig::I4])),
        );
        fixture.add_param(iterate, Some("count"), TypeSig::I4, 0);
        fixture.attribute(
            iterate,
            well_known::ITERATOR_STATE_MACHINE,
            type_argument("App.Program+<Numbers>d__5"),
        );

        let capture = fixture.add_method(program, "Capture", Some(TypeSig::Void));
        fixture.add_param(capture, Some("value"), TypeSig::I4, 0);

        let inlined = fixture.add_method(program, "Inlined", Some(TypeSig::Void));
        fixture.set_impl_flags(inlined, METHOD_IMPL_AGGRESSIVE_INLINING);
        let hidden = fixture.add_method(program, "Hidden", Some(TypeSig::Void));
        fixture.attribute(hidden, well_known::STACK_TRACE_HIDDEN, CustomAttributeValue::default());

        let ctor = fixture.add_method(program, ".ctor", None);
        let cctor = fixture.add_method(program, ".cctor", None);

        // <>c
        let lambdas_cctor = fixture.add_method(lambdas, ".cctor", None);
        let lambdas_ctor = fixture.add_method(lambdas, ".ctor", None);
        let lambda0 = fixture.add_method(lambdas, "<Main>b__0_0", Some(TypeSig::Void));
        fixture.add_param(lambda0, Some("x"), TypeSig::I4, 0);
        let lambda1 = fixture.add_method(lambdas, "<Main>b__0_1", Some(TypeSig::Void));
        fixture.add_param(lambda1, Some("x"), TypeSig::I4, 0);
        fixture.add_method(lambdas, "<Gone>b__7_0", Some(TypeSig::Void));
        let static_lambda = fixture.add_method(lambdas, "<.cctor>b__8_0", Some(TypeSig::Void));

        // State machines and closures
        fixture.add_method(run_async, "MoveNext", Some(TypeSig::Void));
        fixture.add_method(numbers, "MoveNext", Some(TypeSig::Bool));
        fixture.add_method(orphan, "MoveNext", Some(TypeSig::Bool));
        let display_ctor = fixture.add_method(display_class, ".ctor", None);
        fixture.add_method(display_class, "<Capture>b__0", Some(TypeSig::Void));
        fixture.add_method(hidden_type, "Run", Some(TypeSig::Void));
        fixture.add_method(awaiter, "GetResult", Some(TypeSig::Void));

        // Bodies
        let il = Il::new()
            .ldsfld(singleton)
            .ldftn(lambda0)
            .newobj(external)
            .pop()
            .ldsfld(singleton)
            .ldftn(lambda1)
            .newobj(external)
            .pop()
            .call(start)
            .ret()
            .build();
        fixture.set_body(main, il, Vec::new());

        let il = Il::new().ldc_i4(3).ldarg_0().call(local2).ret().build();
        fixture.set_body(start, il, Vec::new());
        let il = Il::new().call(local3).ret().build();
        fixture.set_body(local2, il, Vec::new());
        fixture.set_body(local3, Il::new().newobj(external).ret().build(), Vec::new());

        let il = Il::new().newobj(display_ctor).pop().ret().build();
        let closure = fixture.signature(display_class);
        fixture.set_body(capture, il, vec![TypeSig::I4, closure]);

        let il = Il::new()
            .ldsfld(singleton)
            .ldftn(static_lambda)
            .newobj(external)
            .stsfld(s_action)
            .ret()
            .build();
        fixture.set_body(cctor, il, Vec::new());
        fixture.set_body(ctor, Il::new().ldarg_0().call(external).ret().build(), Vec::new());

        let il = Il::new().newobj(lambdas_ctor).stsfld(singleton).ret().build();
        fixture.set_body(lambdas_cctor, il, Vec::new());
        fixture.set_body(lambdas_ctor, Il::new().ret().build(), Vec::new());

        fixture
    }
}

impl MetadataProvider for FixtureProvider {
    fn method(&self, method: Token) -> Option<MethodInfo> {
        if !method.is_table(TableId::MethodDef.id()) || method.is_null() {
            return None;
        }
        self.methods.get(method.row() as usize - 1).cloned()
    }

    fn type_info(&self, type_token: Token) -> Option<TypeInfo> {
        if !type_token.is_table(TableId::TypeDef.id()) || type_token.is_null() {
            return None;
        }
        self.types.get(type_token.row() as usize - 1).cloned()
    }

    fn field(&self, field: Token) -> Option<FieldInfo> {
        if !field.is_table(TableId::Field.id()) || field.is_null() {
            return None;
        }
        self.fields.get(field.row() as usize - 1).cloned()
    }

    fn methods(&self, type_token: Token) -> Vec<Token> {
        self.type_methods.get(&type_token).cloned().unwrap_or_default()
    }

    fn parameters(&self, method: Token) -> Vec<ParameterInfo> {
        self.parameters.get(&method).cloned().unwrap_or_default()
    }

    fn return_parameter(&self, method: Token) -> Option<ParameterInfo> {
        if let Some(parameter) = self.returns.get(&method) {
            return Some(parameter.clone());
        }

        let info = self.method(method)?;
        info.return_type.map(|param_type| ParameterInfo {
            token: None,
            name: None,
            sequence: 0,
            param_type,
            flags: 0,
        })
    }

    fn custom_attributes(&self, owner: Token) -> Vec<CustomAttributeInfo> {
        self.attributes.get(&owner).cloned().unwrap_or_default()
    }

    fn method_body(&self, method: Token) -> Option<MethodBodyInfo> {
        self.bodies.get(&method).cloned()
    }

    fn resolve_method(&self, operand: Token) -> Option<Token> {
        self.method(operand).map(|method| method.token)
    }

    fn resolve_field(&self, operand: Token) -> Option<Token> {
        self.field(operand).map(|field| field.token)
    }
}
