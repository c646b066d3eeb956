use crate::{
    file::parser::Parser,
    metadata::{
        signatures::{
            SignatureField, SignatureLocalVariable, SignatureLocalVariables, SignatureMethod,
            SignatureMethodSpec, SignatureParameter, TypeSignature, ELEMENT_TYPE,
        },
        token::Token,
    },
    Error::RecursionLimit,
    Result,
};

/// Maximum nesting depth of a type inside a signature
const MAX_RECURSION_DEPTH: usize = 50;

/// Parser for the signature blobs of ECMA-335 II.23.2
///
/// # Example
///
/// ```rust
/// use dotsym::metadata::signatures::SignatureParser;
/// let data = &[0x20, 0x01, 0x01, 0x0E];
/// let mut parser = SignatureParser::new(data);
/// let sig = parser.parse_method_signature().unwrap();
/// assert_eq!(sig.params.len(), 1);
/// ```
///
/// A parser instance is meant for a single signature; use the wrapper functions of
/// [`crate::metadata::signatures`] where possible.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a new `SignatureParser` from a byte slice
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
        }
    }

    /// Parse a single type from the signature blob
    fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::PTR => {
                self.skip_custom_mods()?;
                Ok(TypeSignature::Ptr(Box::new(self.parse_type()?)))
            }
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_compressed_token()?,
            )),
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parser.read_compressed_token()?)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let elem_type = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                // Sizes and lower bounds do not show up in a type name
                let num_sizes = self.parser.read_compressed_uint()?;
                for _ in 0..num_sizes {
                    self.parser.read_compressed_uint()?;
                }
                let num_lo_bounds = self.parser.read_compressed_uint()?;
                for _ in 0..num_lo_bounds {
                    self.parser.read_compressed_int()?;
                }

                Ok(TypeSignature::Array(Box::new(elem_type), rank))
            }
            ELEMENT_TYPE::GENERICINST => {
                let peek_byte = self.parser.peek_byte()?;
                if peek_byte != ELEMENT_TYPE::CLASS && peek_byte != ELEMENT_TYPE::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                        peek_byte
                    ));
                }

                let base_type = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;

                let mut type_args = Vec::with_capacity(arg_count.min(64) as usize);
                for _ in 0..arg_count {
                    type_args.push(self.parse_type()?);
                }

                Ok(TypeSignature::GenericInst(Box::new(base_type), type_args))
            }
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::SZARRAY => {
                self.skip_custom_mods()?;
                Ok(TypeSignature::SzArray(Box::new(self.parse_type()?)))
            }
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::CMOD_REQD | ELEMENT_TYPE::CMOD_OPT => {
                // A modifier in front of a nested type, e.g. `int modreq(IsVolatile)`
                self.parser.read_compressed_token()?;
                self.parse_type_inner()
            }
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {}",
                current_byte
            )),
        }
    }

    /// Parse custom modifiers (`CMOD_OPT` or `CMOD_REQD`)
    fn parse_custom_mods(&mut self) -> Result<Vec<Token>> {
        let mut mods = Vec::new();

        while self.parser.has_more_data() {
            let next_byte = self.parser.peek_byte()?;
            if next_byte != ELEMENT_TYPE::CMOD_OPT && next_byte != ELEMENT_TYPE::CMOD_REQD {
                break;
            }

            self.parser.advance_by(1)?;
            mods.push(self.parser.read_compressed_token()?);
        }

        Ok(mods)
    }

    fn skip_custom_mods(&mut self) -> Result<()> {
        self.parse_custom_mods().map(|_| ())
    }

    /// Parse a parameter including custom modifiers (`return_type` counts as parameter)
    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let modifiers = self.parse_custom_mods()?;

        let mut by_ref = false;
        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.advance_by(1)?;
            by_ref = true;
        }

        Ok(SignatureParameter {
            modifiers,
            by_ref,
            base: self.parse_type()?,
        })
    }

    /// Parse a method signature from the blob - `MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig`
    ///
    /// # Errors
    /// Returns an error if the signature data is malformed or if reading beyond the buffer bounds.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let convention_byte = self.parser.read_le::<u8>()?;

        let param_count_generic = if convention_byte & 0x10 != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;

        let mut method = SignatureMethod {
            has_this: convention_byte & 0x20 != 0,
            explicit_this: convention_byte & 0x40 != 0,
            vararg: convention_byte & 0x0F == 0x05,
            param_count_generic,
            return_type: self.parse_param()?,
            params: Vec::with_capacity(param_count.min(64) as usize),
        };

        for _ in 0..param_count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                // Everything after the sentinel is a vararg argument of the call site
                self.parser.advance_by(1)?;
            }

            method.params.push(self.parse_param()?);
        }

        Ok(method)
    }

    /// Parse a field signature from the blob (II.23.2.4)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or if the field type cannot be parsed.
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x06 {
            return Err(malformed_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        let modifiers = self.parse_custom_mods()?;
        let base = self.parse_type()?;

        Ok(SignatureField { modifiers, base })
    }

    /// Parse a local variable signature from the blob (II.23.2.6)
    ///
    /// # Errors
    /// Returns an error if the header is invalid or if variable types cannot be parsed.
    pub fn parse_local_var_signature(&mut self) -> Result<SignatureLocalVariables> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x07 {
            return Err(malformed_error!(
                "SignatureLocalVar - invalid start - {}",
                head_byte
            ));
        }

        let count = self.parser.read_compressed_uint()?;

        let mut locals = Vec::with_capacity(count.min(256) as usize);
        for _ in 0..count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::TYPEDBYREF {
                self.parser.advance_by(1)?;
                locals.push(SignatureLocalVariable {
                    is_byref: false,
                    is_pinned: false,
                    base: TypeSignature::TypedByRef,
                });

                continue;
            }

            // Custom modifiers and the pinned constraint may interleave
            let mut pinned = false;
            while self.parser.has_more_data() {
                match self.parser.peek_byte()? {
                    ELEMENT_TYPE::CMOD_OPT | ELEMENT_TYPE::CMOD_REQD => {
                        self.parser.advance_by(1)?;
                        self.parser.read_compressed_token()?;
                    }
                    ELEMENT_TYPE::PINNED => {
                        self.parser.advance_by(1)?;
                        pinned = true;
                    }
                    _ => break,
                }
            }

            let is_byref = if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
                self.parser.advance_by(1)?;
                true
            } else {
                false
            };

            locals.push(SignatureLocalVariable {
                is_byref,
                is_pinned: pinned,
                base: self.parse_type()?,
            });
        }

        Ok(SignatureLocalVariables { locals })
    }

    /// Parse a type specification signature from the blob (II.23.2.14)
    ///
    /// # Errors
    /// Returns an error if the type specification cannot be parsed.
    pub fn parse_type_spec_signature(&mut self) -> Result<TypeSignature> {
        self.parse_type()
    }

    /// Parse a method specification signature from the blob (II.23.2.15)
    ///
    /// # Errors
    /// Returns an error if the header is invalid or if the type arguments cannot be parsed.
    pub fn parse_method_spec_signature(&mut self) -> Result<SignatureMethodSpec> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x0A {
            return Err(malformed_error!(
                "SignatureMethodSpec - invalid start - {}",
                head_byte
            ));
        }

        let arg_count = self.parser.read_compressed_uint()?;
        let mut generic_args = Vec::with_capacity(arg_count.min(64) as usize);
        for _ in 0..arg_count {
            generic_args.push(self.parse_type()?);
        }

        Ok(SignatureMethodSpec { generic_args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn primitive_types() {
        let test_cases = [
            (vec![0x01], TypeSignature::Void),
            (vec![0x02], TypeSignature::Boolean),
            (vec![0x03], TypeSignature::Char),
            (vec![0x08], TypeSignature::I4),
            (vec![0x0B], TypeSignature::U8),
            (vec![0x0D], TypeSignature::R8),
            (vec![0x0E], TypeSignature::String),
            (vec![0x18], TypeSignature::I),
            (vec![0x1C], TypeSignature::Object),
        ];

        for (input, expected) in test_cases {
            let mut parser = SignatureParser::new(&input);
            assert_eq!(parser.parse_type_spec_signature().unwrap(), expected);
        }
    }

    #[test]
    fn class_and_generic_instance() {
        // List<string> where List`1 is TypeRef row 2
        let mut parser = SignatureParser::new(&[0x15, 0x12, 0x09, 0x01, 0x0E]);
        let result = parser.parse_type_spec_signature().unwrap();
        assert_eq!(
            result,
            TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(Token::new(0x0100_0002))),
                vec![TypeSignature::String]
            )
        );

        let mut parser = SignatureParser::new(&[0x15, 0x0E, 0x01, 0x0E]);
        assert!(parser.parse_type_spec_signature().is_err());
    }

    #[test]
    fn arrays() {
        let mut parser = SignatureParser::new(&[0x1D, 0x08]);
        assert_eq!(
            parser.parse_type_spec_signature().unwrap(),
            TypeSignature::SzArray(Box::new(TypeSignature::I4))
        );

        // int[,] with no sizes and two zero lower bounds
        let mut parser = SignatureParser::new(&[0x14, 0x08, 0x02, 0x00, 0x02, 0x00, 0x00]);
        assert_eq!(
            parser.parse_type_spec_signature().unwrap(),
            TypeSignature::Array(Box::new(TypeSignature::I4), 2)
        );
    }

    #[test]
    fn method_signature() {
        // instance int32 M(string, int32[]&)
        let result = SignatureParser::new(&[0x20, 0x02, 0x08, 0x0E, 0x10, 0x1D, 0x08])
            .parse_method_signature()
            .unwrap();
        assert!(result.has_this);
        assert!(!result.vararg);
        assert_eq!(result.return_type.base, TypeSignature::I4);
        assert_eq!(result.params.len(), 2);
        assert_eq!(result.params[0].base, TypeSignature::String);
        assert!(result.params[1].by_ref);
        assert_eq!(
            result.params[1].base,
            TypeSignature::SzArray(Box::new(TypeSignature::I4))
        );
    }

    #[test]
    fn generic_method_signature() {
        // static !!0 M<T>(!!0)
        let result = SignatureParser::new(&[0x10, 0x01, 0x01, 0x1E, 0x00, 0x1E, 0x00])
            .parse_method_signature()
            .unwrap();
        assert_eq!(result.param_count_generic, 1);
        assert_eq!(result.return_type.base, TypeSignature::GenericParamMethod(0));
        assert_eq!(result.params[0].base, TypeSignature::GenericParamMethod(0));
    }

    #[test]
    fn modifiers_on_parameters() {
        // void M(modreq(InAttribute) int32&)
        let result = SignatureParser::new(&[0x00, 0x01, 0x01, 0x1F, 0x09, 0x10, 0x08])
            .parse_method_signature()
            .unwrap();
        assert_eq!(result.params[0].modifiers, vec![Token::new(0x0100_0002)]);
        assert!(result.params[0].by_ref);
        assert_eq!(result.params[0].base, TypeSignature::I4);
    }

    #[test]
    fn local_variables() {
        #[rustfmt::skip]
        let data = [
            0x07, 0x03,       // LOCAL_SIG, 3 locals
            0x12, 0x08,       // class TypeDef row 2
            0x45, 0x10, 0x08, // pinned int32&
            0x16,             // typedref
        ];
        let result = SignatureParser::new(&data).parse_local_var_signature().unwrap();
        assert_eq!(result.locals.len(), 3);
        assert_eq!(
            result.locals[0].base,
            TypeSignature::Class(Token::new(0x0200_0002))
        );
        assert!(result.locals[1].is_pinned);
        assert!(result.locals[1].is_byref);
        assert_eq!(result.locals[2].base, TypeSignature::TypedByRef);
    }

    #[test]
    fn field_and_method_spec() {
        let result = SignatureParser::new(&[0x06, 0x0E]).parse_field_signature().unwrap();
        assert_eq!(result.base, TypeSignature::String);
        assert!(SignatureParser::new(&[0x07, 0x0E]).parse_field_signature().is_err());

        let result = SignatureParser::new(&[0x0A, 0x02, 0x08, 0x0E])
            .parse_method_spec_signature()
            .unwrap();
        assert_eq!(result.generic_args, vec![TypeSignature::I4, TypeSignature::String]);
    }

    #[test]
    fn recursion_limit() {
        let mut data = vec![0x1D; 100];
        data.push(0x08);
        let result = SignatureParser::new(&data).parse_type_spec_signature();
        assert!(matches!(result, Err(Error::RecursionLimit(_))));
    }

    #[test]
    fn wide_signatures_stay_below_the_limit() {
        // 60 sibling parameters must not accumulate depth
        let mut data = vec![0x00, 60, 0x01];
        data.extend(std::iter::repeat(0x08).take(60));
        let result = SignatureParser::new(&data).parse_method_signature().unwrap();
        assert_eq!(result.params.len(), 60);
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            SignatureParser::new(&[0x20, 0x02, 0x08]).parse_method_signature(),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
