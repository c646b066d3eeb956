//! A loaded .NET module, seen through [`MetadataProvider`].
//!
//! [`CilModule`] owns a PE [`File`] and the ECMA-335 metadata image inside it. It answers the
//! questions the demystifier asks (methods of a type, parameters, custom attributes, IL) by
//! reading the raw tables, and it extracts the module's [`DebugMeta`] from the debug directory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::{demystify::Demystifier, metadata::{cilmodule::CilModule, token::Token}};
//! use std::path::Path;
//!
//! let module = CilModule::from_file(Path::new("MyApp.dll"))?;
//! if let Some(meta) = module.debug_meta()? {
//!     println!("{meta}");
//! }
//!
//! if let Some(method) = Demystifier::new(&module).resolve(Token::new(0x0600_0001)) {
//!     println!("{method}");
//! }
//! # Ok::<(), dotsym::Error>(())
//! ```

use std::{collections::HashMap, ops::Range, path::Path};

use ouroboros::self_referencing;

use crate::{
    demystify::{
        CustomAttributeInfo, FieldInfo, MetadataProvider, MethodBodyInfo, MethodInfo,
        ParameterInfo, TypeInfo, TypeRefName, TypeSig,
    },
    file::File,
    metadata::{
        cor20header::Cor20Header,
        customattributes::{parse_custom_attribute_data, ArgType},
        image::MetadataImage,
        method::MethodBody,
        signatures::{
            parse_field_signature, parse_local_var_signature, parse_method_signature,
            parse_type_spec_signature, SignatureMethod, SignatureParameter, TypeSignature,
        },
        tables::{
            CodedIndex, CustomAttributeRaw, FieldRaw, GenericParamRaw, InterfaceImplRaw,
            MemberRefRaw, MethodDefRaw, MethodSpecRaw, ModuleRaw, NestedClassRaw, ParamRaw,
            StandAloneSigRaw, TableId, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
    },
    symbols::{extract_debug_meta, DebugMeta},
    Result,
};

/// `FieldAttributes.Static`
const FIELD_STATIC: u32 = 0x0010;

/// Maximum depth of nested type references followed while naming a signature type.
const MAX_TYPE_DEPTH: usize = 32;

/// Lookup tables built once per module from rows that are only reachable by a full scan.
#[derive(Default)]
struct ModuleIndex {
    /// Declaring `TypeDef` row per `MethodDef` row (index `rid - 1`), 0 for global methods
    method_owner: Vec<u32>,
    /// Declaring `TypeDef` row per `Field` row (index `rid - 1`)
    field_owner: Vec<u32>,
    /// Nested `TypeDef` row -> enclosing `TypeDef` row
    enclosing: HashMap<u32, u32>,
    /// `TypeDef` row -> implemented interfaces
    interfaces: HashMap<u32, Vec<CodedIndex>>,
    /// Owner token -> `CustomAttribute` rows
    attributes: HashMap<Token, Vec<u32>>,
    /// Owner token -> (number, name) of its generic parameters
    generic_parameters: HashMap<Token, Vec<(u32, u32)>>,
}

impl ModuleIndex {
    fn build(image: &MetadataImage<'_>) -> ModuleIndex {
        let method_count = image.row_count::<MethodDefRaw>();
        let field_count = image.row_count::<FieldRaw>();

        let mut index = ModuleIndex {
            method_owner: vec![0; method_count as usize],
            field_owner: vec![0; field_count as usize],
            ..Default::default()
        };

        if let Some(types) = image.table::<TypeDefRaw>() {
            let rows: Vec<TypeDefRaw> = types.iter().collect();
            for (position, row) in rows.iter().enumerate() {
                let next = rows.get(position + 1);
                // Methods of <Module> are global functions
                let is_global = image
                    .string(row.type_name)
                    .is_ok_and(|name| name == "<Module>");
                let owner = if is_global { 0 } else { row.rid };

                let methods = row.method_list..next.map_or(method_count + 1, |next| next.method_list);
                assign_owner(&mut index.method_owner, methods, owner);

                let fields = row.field_list..next.map_or(field_count + 1, |next| next.field_list);
                assign_owner(&mut index.field_owner, fields, row.rid);
            }
        }

        if let Some(nested) = image.table::<NestedClassRaw>() {
            for row in &nested {
                index.enclosing.insert(row.nested_class, row.enclosing_class);
            }
        }

        if let Some(interfaces) = image.table::<InterfaceImplRaw>() {
            for row in &interfaces {
                index
                    .interfaces
                    .entry(row.class)
                    .or_default()
                    .push(row.interface);
            }
        }

        if let Some(attributes) = image.table::<CustomAttributeRaw>() {
            for row in &attributes {
                index
                    .attributes
                    .entry(row.parent.token)
                    .or_default()
                    .push(row.rid);
            }
        }

        if let Some(parameters) = image.table::<GenericParamRaw>() {
            for row in &parameters {
                index
                    .generic_parameters
                    .entry(row.owner.token)
                    .or_default()
                    .push((row.number, row.name));
            }

            for list in index.generic_parameters.values_mut() {
                list.sort_by_key(|(number, _)| *number);
            }
        }

        index
    }
}

fn assign_owner(owners: &mut [u32], rows: Range<u32>, owner: u32) {
    for rid in rows {
        let Some(slot) = rid
            .checked_sub(1)
            .and_then(|position| owners.get_mut(position as usize))
        else {
            break;
        };
        *slot = owner;
    }
}

/// Names of the generic parameters in scope of a signature.
#[derive(Default)]
struct GenericContext {
    type_parameters: Vec<String>,
    method_parameters: Vec<String>,
}

/// Everything of a module that borrows from its file.
struct ModuleData<'a> {
    file: &'a File,
    image: MetadataImage<'a>,
    index: ModuleIndex,
}

impl<'a> ModuleData<'a> {
    fn read(file: &'a File) -> Result<ModuleData<'a>> {
        let (clr_rva, clr_size) = file.clr();
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let header = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(header.meta_data_rva as usize)?;
        let metadata = file.data_slice(metadata_offset, header.meta_data_size as usize)?;
        let image = MetadataImage::read(metadata)?;
        if image.pdb.is_some() {
            return Err(malformed_error!("Module metadata carries a #Pdb stream"));
        }

        let index = ModuleIndex::build(&image);
        Ok(ModuleData { file, image, index })
    }

    fn mvid(&self) -> Result<uguid::Guid> {
        let Some(module) = self.image.row::<ModuleRaw>(1) else {
            return Err(malformed_error!("Module table is empty"));
        };

        match self.image.guid(module.mvid)? {
            Some(mvid) => Ok(mvid),
            None => Err(malformed_error!("Module has no MVID")),
        }
    }

    fn string(&self, index: u32) -> String {
        self.image.string(index).unwrap_or_default().to_string()
    }

    fn method_row(&self, method: Token) -> Option<MethodDefRaw> {
        if !method.is_table(TableId::MethodDef.id()) {
            return None;
        }
        self.image.row::<MethodDefRaw>(method.row())
    }

    fn method_signature(&self, row: &MethodDefRaw) -> Option<SignatureMethod> {
        let blob = self.image.blob(row.signature).ok()?;
        parse_method_signature(blob).ok()
    }

    fn declaring_type(&self, method_rid: u32) -> Option<Token> {
        let owner = *self.index.method_owner.get(method_rid.checked_sub(1)? as usize)?;
        (owner != 0).then(|| Token::from_parts(TableId::TypeDef.id(), owner))
    }

    fn generic_names(&self, owner: Token) -> Vec<String> {
        self.index
            .generic_parameters
            .get(&owner)
            .map(|parameters| {
                parameters
                    .iter()
                    .map(|(_, name)| self.string(*name))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method_context(&self, method: Token) -> GenericContext {
        let type_parameters = self
            .declaring_type(method.row())
            .map(|owner| self.generic_names(owner))
            .unwrap_or_default();

        GenericContext {
            type_parameters,
            method_parameters: self.generic_names(method),
        }
    }

    /// Rows `[start, end)` of a list column, ending where the next row's list starts.
    fn list_range(start: u32, next: Option<u32>, count: u32) -> Range<u32> {
        let end = next.unwrap_or(count + 1).min(count + 1);
        start.max(1)..end.max(start.max(1))
    }

    fn method_range(&self, type_rid: u32) -> Range<u32> {
        let count = self.image.row_count::<MethodDefRaw>();
        let Some(row) = self.image.row::<TypeDefRaw>(type_rid) else {
            return 0..0;
        };
        let next = self.image.row::<TypeDefRaw>(type_rid + 1).map(|next| next.method_list);
        Self::list_range(row.method_list, next, count)
    }

    fn field_range(&self, type_rid: u32) -> Range<u32> {
        let count = self.image.row_count::<FieldRaw>();
        let Some(row) = self.image.row::<TypeDefRaw>(type_rid) else {
            return 0..0;
        };
        let next = self.image.row::<TypeDefRaw>(type_rid + 1).map(|next| next.field_list);
        Self::list_range(row.field_list, next, count)
    }

    fn param_rows(&self, method: &MethodDefRaw) -> Vec<ParamRaw> {
        let count = self.image.row_count::<ParamRaw>();
        let next = self
            .image
            .row::<MethodDefRaw>(method.rid + 1)
            .map(|next| next.param_list);

        Self::list_range(method.param_list, next, count)
            .filter_map(|rid| self.image.row::<ParamRaw>(rid))
            .collect()
    }

    fn typeref_name(&self, rid: u32, depth: usize) -> Option<TypeRefName> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }

        let row = self.image.row::<TypeRefRaw>(rid)?;
        let mut name = TypeRefName::new(
            self.image.string(row.type_namespace).ok()?,
            self.image.string(row.type_name).ok()?,
        );

        if row.resolution_scope.tag == TableId::TypeRef && !row.resolution_scope.is_null() {
            let outer = self.typeref_name(row.resolution_scope.row, depth + 1)?;
            name.namespace = outer.namespace;
            name.enclosing = outer.enclosing;
            name.enclosing.push(outer.name);
        }

        Some(name)
    }

    /// Names a `TypeDefOrRef` token; a `TypeSpec` is named after its generic definition.
    fn type_reference_name(&self, token: Token, depth: usize) -> Option<TypeRefName> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }

        match TableId::try_from(token.table()).ok()? {
            TableId::TypeDef => self.type_name(token),
            TableId::TypeRef => self.typeref_name(token.row(), depth + 1),
            TableId::TypeSpec => match self.type_spec(token.row(), &GenericContext::default(), depth + 1)? {
                TypeSig::Named(name) | TypeSig::GenericInst(name, _) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    fn type_spec(&self, rid: u32, context: &GenericContext, depth: usize) -> Option<TypeSig> {
        let row = self.image.row::<TypeSpecRaw>(rid)?;
        let blob = self.image.blob(row.signature).ok()?;
        let signature = parse_type_spec_signature(blob).ok()?;
        Some(self.convert(&signature, context, depth + 1))
    }

    fn convert_parameter(&self, parameter: &SignatureParameter, context: &GenericContext) -> TypeSig {
        let base = self.convert(&parameter.base, context, 0);
        if parameter.by_ref {
            TypeSig::ByRef(Box::new(base))
        } else {
            base
        }
    }

    /// Turns a decoded signature type into a [`TypeSig`] with names resolved.
    fn convert(&self, signature: &TypeSignature, context: &GenericContext, depth: usize) -> TypeSig {
        if depth > MAX_TYPE_DEPTH {
            return TypeSig::Unknown;
        }

        let inner = |inner: &TypeSignature| Box::new(self.convert(inner, context, depth + 1));

        match signature {
            TypeSignature::Unknown => TypeSig::Unknown,
            TypeSignature::Void => TypeSig::Void,
            TypeSignature::Boolean => TypeSig::Bool,
            TypeSignature::Char => TypeSig::Char,
            TypeSignature::I1 => TypeSig::I1,
            TypeSignature::U1 => TypeSig::U1,
            TypeSignature::I2 => TypeSig::I2,
            TypeSignature::U2 => TypeSig::U2,
            TypeSignature::I4 => TypeSig::I4,
            TypeSignature::U4 => TypeSig::U4,
            TypeSignature::I8 => TypeSig::I8,
            TypeSignature::U8 => TypeSig::U8,
            TypeSignature::R4 => TypeSig::R4,
            TypeSignature::R8 => TypeSig::R8,
            TypeSignature::String => TypeSig::String,
            TypeSignature::Object => TypeSig::Object,
            TypeSignature::I => TypeSig::IntPtr,
            TypeSignature::U => TypeSig::UIntPtr,
            TypeSignature::TypedByRef => TypeSig::TypedReference,
            TypeSignature::FnPtr(_) => TypeSig::FnPtr,
            TypeSignature::Ptr(pointee) => TypeSig::Pointer(inner(pointee)),
            TypeSignature::ByRef(referent) => TypeSig::ByRef(inner(referent)),
            TypeSignature::SzArray(element) => TypeSig::SzArray(inner(element)),
            TypeSignature::Array(element, rank) => TypeSig::Array(inner(element), *rank),
            TypeSignature::Pinned(pinned) => self.convert(pinned, context, depth + 1),
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                if token.is_table(TableId::TypeSpec.id()) {
                    return self
                        .type_spec(token.row(), context, depth + 1)
                        .unwrap_or_default();
                }

                self.type_reference_name(*token, depth + 1)
                    .map_or(TypeSig::Unknown, TypeSig::Named)
            }
            TypeSignature::GenericInst(definition, arguments) => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.convert(argument, context, depth + 1))
                    .collect();

                match self.convert(definition, context, depth + 1) {
                    TypeSig::Named(name) => TypeSig::GenericInst(name, arguments),
                    _ => TypeSig::Unknown,
                }
            }
            TypeSignature::GenericParamType(number) => TypeSig::GenericParam(
                context
                    .type_parameters
                    .get(*number as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("!{number}")),
            ),
            TypeSignature::GenericParamMethod(number) => TypeSig::GenericParam(
                context
                    .method_parameters
                    .get(*number as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("!!{number}")),
            ),
        }
    }

    /// The attribute type and constructor signature of a `CustomAttributeType` index.
    fn attribute_constructor(&self, constructor: CodedIndex) -> Option<(TypeRefName, SignatureMethod)> {
        match constructor.tag {
            TableId::MethodDef => {
                let row = self.image.row::<MethodDefRaw>(constructor.row)?;
                let owner = self.declaring_type(row.rid)?;
                Some((self.type_name(owner)?, self.method_signature(&row)?))
            }
            TableId::MemberRef => {
                let row = self.image.row::<MemberRefRaw>(constructor.row)?;
                let name = self.type_reference_name(row.class.token, 0)?;
                let blob = self.image.blob(row.signature).ok()?;
                Some((name, parse_method_signature(blob).ok()?))
            }
            _ => None,
        }
    }

    fn argument_type(&self, signature: &TypeSignature) -> Option<ArgType> {
        Some(match signature {
            TypeSignature::Boolean => ArgType::Bool,
            TypeSignature::Char => ArgType::Char,
            TypeSignature::I1 => ArgType::I1,
            TypeSignature::U1 => ArgType::U1,
            TypeSignature::I2 => ArgType::I2,
            TypeSignature::U2 => ArgType::U2,
            TypeSignature::I4 => ArgType::I4,
            TypeSignature::U4 => ArgType::U4,
            TypeSignature::I8 => ArgType::I8,
            TypeSignature::U8 => ArgType::U8,
            TypeSignature::R4 => ArgType::R4,
            TypeSignature::R8 => ArgType::R8,
            TypeSignature::String => ArgType::String,
            TypeSignature::Object => ArgType::Object,
            TypeSignature::SzArray(element) => {
                ArgType::SzArray(Box::new(self.argument_type(element)?))
            }
            TypeSignature::Class(token) => {
                let name = self.type_reference_name(*token, 0)?;
                if !name.is("System", "Type") {
                    return None;
                }
                ArgType::Type
            }
            TypeSignature::ValueType(token) => {
                ArgType::Enum(Box::new(self.enum_underlying_type(*token)))
            }
            _ => return None,
        })
    }

    /// Underlying type of an enum: the type of `value__` for local enums, `int` otherwise.
    fn enum_underlying_type(&self, token: Token) -> ArgType {
        if !token.is_table(TableId::TypeDef.id()) {
            return ArgType::I4;
        }

        self.field_range(token.row())
            .filter_map(|rid| self.image.row::<FieldRaw>(rid))
            .find(|field| self.image.string(field.name).is_ok_and(|name| name == "value__"))
            .and_then(|field| self.image.blob(field.signature).ok())
            .and_then(|blob| parse_field_signature(blob).ok())
            .and_then(|signature| self.argument_type(&signature.base))
            .unwrap_or(ArgType::I4)
    }

    fn custom_attribute(&self, rid: u32) -> Option<CustomAttributeInfo> {
        let row = self.image.row::<CustomAttributeRaw>(rid)?;
        let (type_name, constructor) = self.attribute_constructor(row.constructor)?;

        let arguments: Option<Vec<ArgType>> = constructor
            .params
            .iter()
            .map(|parameter| self.argument_type(&parameter.base))
            .collect();

        let value = match (arguments, self.image.blob(row.value)) {
            (Some(arguments), Ok(blob)) if !blob.is_empty() => {
                parse_custom_attribute_data(blob, &arguments).unwrap_or_else(|error| {
                    log::trace!("Undecodable {} arguments: {}", type_name.full_name(), error);
                    Default::default()
                })
            }
            _ => Default::default(),
        };

        Some(CustomAttributeInfo {
            type_name: type_name.full_name(),
            value,
        })
    }

    /// A member of a local type named by a `MemberRef` on a `TypeDef` or on a generic
    /// instantiation of one.
    fn member_parent(&self, reference: &MemberRefRaw) -> Option<u32> {
        let class = reference.class;
        match class.tag {
            TableId::TypeDef => Some(class.row),
            TableId::TypeSpec => self
                .type_spec(class.row, &GenericContext::default(), 0)?
                .definition()
                .map(|definition| definition.row()),
            _ => None,
        }
    }

    fn method_by_reference(&self, reference: &MemberRefRaw) -> Option<Token> {
        let owner = self.member_parent(reference)?;
        let name = self.image.string(reference.name).ok()?;
        let param_count = self
            .image
            .blob(reference.signature)
            .ok()
            .and_then(|blob| parse_method_signature(blob).ok())
            .map(|signature| signature.params.len());

        self.method_range(owner)
            .filter_map(|rid| self.image.row::<MethodDefRaw>(rid))
            .find(|row| {
                self.image.string(row.name).is_ok_and(|candidate| candidate == name)
                    && param_count.map_or(true, |count| {
                        self.method_signature(row)
                            .is_some_and(|signature| signature.params.len() == count)
                    })
            })
            .map(|row| row.token)
    }

    fn field_by_reference(&self, reference: &MemberRefRaw) -> Option<Token> {
        let owner = self.member_parent(reference)?;
        let name = self.image.string(reference.name).ok()?;

        self.field_range(owner)
            .filter_map(|rid| self.image.row::<FieldRaw>(rid))
            .find(|row| self.image.string(row.name).is_ok_and(|candidate| candidate == name))
            .map(|row| row.token)
    }

    fn parameter_info(&self, row: Option<&ParamRaw>, sequence: u32, param_type: TypeSig) -> ParameterInfo {
        ParameterInfo {
            token: row.map(|row| row.token),
            name: row.and_then(|row| {
                self.image
                    .string(row.name)
                    .ok()
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            }),
            sequence,
            param_type,
            flags: row.map_or(0, |row| row.flags),
        }
    }
}

impl MetadataProvider for ModuleData<'_> {
    fn method(&self, method: Token) -> Option<MethodInfo> {
        let row = self.method_row(method)?;
        let name = self.string(row.name);
        let context = self.method_context(row.token);

        let return_type = if name == ".ctor" || name == ".cctor" {
            None
        } else {
            self.method_signature(&row)
                .map(|signature| self.convert_parameter(&signature.return_type, &context))
        };

        Some(MethodInfo {
            token: row.token,
            declaring_type: self.declaring_type(row.rid),
            flags: row.flags,
            impl_flags: row.impl_flags,
            return_type,
            generic_arguments: context
                .method_parameters
                .into_iter()
                .map(TypeSig::GenericParam)
                .collect(),
            name,
        })
    }

    fn type_info(&self, type_token: Token) -> Option<TypeInfo> {
        if !type_token.is_table(TableId::TypeDef.id()) {
            return None;
        }

        let row = self.image.row::<TypeDefRaw>(type_token.row())?;
        let enclosing = self
            .index
            .enclosing
            .get(&row.rid)
            .map(|outer| Token::from_parts(TableId::TypeDef.id(), *outer));

        let interfaces = self
            .index
            .interfaces
            .get(&row.rid)
            .map(|interfaces| {
                interfaces
                    .iter()
                    .filter_map(|interface| self.type_reference_name(interface.token, 0))
                    .map(|name| name.full_name())
                    .collect()
            })
            .unwrap_or_default();

        Some(TypeInfo {
            token: row.token,
            namespace: self.string(row.type_namespace),
            name: self.string(row.type_name),
            enclosing,
            generic_parameters: self.generic_names(row.token),
            interfaces,
        })
    }

    fn field(&self, field: Token) -> Option<FieldInfo> {
        if !field.is_table(TableId::Field.id()) {
            return None;
        }

        let row = self.image.row::<FieldRaw>(field.row())?;
        let owner = *self.index.field_owner.get(row.rid as usize - 1)?;

        Some(FieldInfo {
            token: row.token,
            name: self.string(row.name),
            declaring_type: Token::from_parts(TableId::TypeDef.id(), owner),
            is_static: row.flags & FIELD_STATIC != 0,
        })
    }

    fn methods(&self, type_token: Token) -> Vec<Token> {
        if !type_token.is_table(TableId::TypeDef.id()) {
            return Vec::new();
        }

        self.method_range(type_token.row())
            .map(|rid| Token::from_parts(TableId::MethodDef.id(), rid))
            .collect()
    }

    fn parameters(&self, method: Token) -> Vec<ParameterInfo> {
        let Some(row) = self.method_row(method) else {
            return Vec::new();
        };
        let Some(signature) = self.method_signature(&row) else {
            return Vec::new();
        };

        let context = self.method_context(row.token);
        let rows = self.param_rows(&row);

        signature
            .params
            .iter()
            .zip(1..)
            .map(|(parameter, sequence)| {
                let param_row = rows.iter().find(|param| param.sequence == sequence);
                self.parameter_info(param_row, sequence, self.convert_parameter(parameter, &context))
            })
            .collect()
    }

    fn return_parameter(&self, method: Token) -> Option<ParameterInfo> {
        let row = self.method_row(method)?;
        let name = self.image.string(row.name).ok()?;
        if name == ".ctor" || name == ".cctor" {
            return None;
        }

        let signature = self.method_signature(&row)?;
        let context = self.method_context(row.token);
        let rows = self.param_rows(&row);
        let param_row = rows.iter().find(|param| param.sequence == 0);

        Some(self.parameter_info(
            param_row,
            0,
            self.convert_parameter(&signature.return_type, &context),
        ))
    }

    fn custom_attributes(&self, owner: Token) -> Vec<CustomAttributeInfo> {
        self.index
            .attributes
            .get(&owner)
            .map(|rows| {
                rows.iter()
                    .filter_map(|rid| self.custom_attribute(*rid))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method_body(&self, method: Token) -> Option<MethodBodyInfo> {
        let row = self.method_row(method)?;
        if row.rva == 0 {
            return None;
        }

        let offset = self.file.rva_to_offset(row.rva as usize).ok()?;
        let data = self.file.data().get(offset..)?;
        let body = MethodBody::from(data).ok()?;
        let il = body.code(data).ok()?.to_vec();

        let mut locals = Vec::new();
        let locals_token = Token::new(body.local_var_sig_token);
        if locals_token.is_table(TableId::StandAloneSig.id()) && !locals_token.is_null() {
            let context = self.method_context(row.token);
            let signature = self
                .image
                .row::<StandAloneSigRaw>(locals_token.row())
                .and_then(|sig| self.image.blob(sig.signature).ok())
                .and_then(|blob| parse_local_var_signature(blob).ok());

            if let Some(signature) = signature {
                locals = signature
                    .locals
                    .iter()
                    .map(|local| {
                        let base = self.convert(&local.base, &context, 0);
                        if local.is_byref {
                            TypeSig::ByRef(Box::new(base))
                        } else {
                            base
                        }
                    })
                    .collect();
            }
        }

        Some(MethodBodyInfo { il, locals })
    }

    fn resolve_method(&self, operand: Token) -> Option<Token> {
        match TableId::try_from(operand.table()).ok()? {
            TableId::MethodDef => self.method_row(operand).map(|row| row.token),
            TableId::MethodSpec => {
                let row = self.image.row::<MethodSpecRaw>(operand.row())?;
                match row.method.tag {
                    TableId::MethodDef | TableId::MemberRef => self.resolve_method(row.method.token),
                    _ => None,
                }
            }
            TableId::MemberRef => {
                let row = self.image.row::<MemberRefRaw>(operand.row())?;
                self.method_by_reference(&row)
            }
            _ => None,
        }
    }

    fn resolve_field(&self, operand: Token) -> Option<Token> {
        match TableId::try_from(operand.table()).ok()? {
            TableId::Field => self.image.row::<FieldRaw>(operand.row()).map(|row| row.token),
            TableId::MemberRef => {
                let row = self.image.row::<MemberRefRaw>(operand.row())?;
                self.field_by_reference(&row)
            }
            _ => None,
        }
    }
}

#[self_referencing]
/// A .NET module loaded for symbolication.
///
/// The PE image is kept open (memory-mapped or owned) for as long as the module lives. Lookups
/// read the metadata tables on demand; only the rows that cannot be found without a full scan
/// (nesting, interface implementations, custom attributes, generic parameters and member
/// owners) are indexed on load.
pub struct CilModule {
    file: File,
    #[borrows(file)]
    #[not_covariant]
    data: ModuleData<'this>,
}

impl CilModule {
    /// Loads a module from disk. The file is memory-mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a managed PE image or its metadata
    /// is malformed.
    pub fn from_file(path: &Path) -> Result<CilModule> {
        Self::from_pe(File::from_file(path)?)
    }

    /// Loads a module from a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is not a managed PE image or its metadata is malformed.
    pub fn from_mem(data: Vec<u8>) -> Result<CilModule> {
        Self::from_pe(File::from_mem(data)?)
    }

    /// Reads the metadata of an already loaded PE image.
    ///
    /// # Errors
    ///
    /// Returns an error if the CLR header or the metadata image is malformed.
    pub fn from_pe(file: File) -> Result<CilModule> {
        CilModule::try_new(file, |file| ModuleData::read(file))
    }

    /// The underlying PE image.
    #[must_use]
    pub fn file(&self) -> &File {
        self.borrow_file()
    }

    /// The module version id (`Module.Mvid`).
    ///
    /// # Errors
    ///
    /// Returns an error if the `Module` table or its GUID is missing.
    pub fn mvid(&self) -> Result<uguid::Guid> {
        self.with_data(|data| data.mvid())
    }

    /// The module name (`Module.Name`), usually the file name.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.with_data(|data| {
            let module = data.image.row::<ModuleRaw>(1)?;
            data.image.string(module.name).ok().map(str::to_string)
        })
    }

    /// Extracts the identifiers of the module's symbol file from its debug directory.
    ///
    /// Returns `Ok(None)` for images without a CodeView entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the debug directory or the metadata is malformed.
    pub fn debug_meta(&self) -> Result<Option<DebugMeta>> {
        self.with_data(|data| extract_debug_meta(data.file, data.mvid()?))
    }
}

impl MetadataProvider for CilModule {
    fn method(&self, method: Token) -> Option<MethodInfo> {
        self.with_data(|data| data.method(method))
    }

    fn type_info(&self, type_token: Token) -> Option<TypeInfo> {
        self.with_data(|data| data.type_info(type_token))
    }

    fn field(&self, field: Token) -> Option<FieldInfo> {
        self.with_data(|data| data.field(field))
    }

    fn methods(&self, type_token: Token) -> Vec<Token> {
        self.with_data(|data| data.methods(type_token))
    }

    fn parameters(&self, method: Token) -> Vec<ParameterInfo> {
        self.with_data(|data| data.parameters(method))
    }

    fn return_parameter(&self, method: Token) -> Option<ParameterInfo> {
        self.with_data(|data| data.return_parameter(method))
    }

    fn custom_attributes(&self, owner: Token) -> Vec<CustomAttributeInfo> {
        self.with_data(|data| data.custom_attributes(owner))
    }

    fn method_body(&self, method: Token) -> Option<MethodBodyInfo> {
        self.with_data(|data| data.method_body(method))
    }

    fn resolve_method(&self, operand: Token) -> Option<Token> {
        self.with_data(|data| data.resolve_method(operand))
    }

    fn resolve_field(&self, operand: Token) -> Option<Token> {
        self.with_data(|data| data.resolve_field(operand))
    }
}
