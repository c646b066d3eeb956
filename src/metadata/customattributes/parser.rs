//! Custom attribute blob parser.
//!
//! Blob layout (ECMA-335 II.23.3):
//!
//! ```text
//! Prolog      u16 0x0001
//! FixedArg*   one per constructor parameter, encoded by the parameter's declared type
//! NumNamed    u16
//! NamedArg*   FIELD|PROPERTY, FieldOrPropType, SerString name, value
//! ```
//!
//! Enum-typed named arguments name their enum type but not its underlying type; when one is
//! met the remaining named arguments are left undecoded, the fixed arguments are still returned.

use crate::{
    file::parser::Parser,
    metadata::customattributes::{
        ArgType, CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
        SERIALIZATION_TYPE,
    },
    Error::RecursionLimit,
    Result,
};

const MAX_NESTING_DEPTH: usize = 16;

/// Parses a custom attribute blob given its constructor's parameter types.
///
/// # Errors
///
/// Returns an error if the prolog is wrong or the blob is shorter than the constructor
/// parameters require.
pub fn parse_custom_attribute_data(
    data: &[u8],
    params: &[ArgType],
) -> Result<CustomAttributeValue> {
    CustomAttributeParser::new(data).parse_custom_attribute(params)
}

/// Stateful reader over one custom attribute blob.
pub struct CustomAttributeParser<'a> {
    parser: Parser<'a>,
}

impl<'a> CustomAttributeParser<'a> {
    /// Creates a parser over a custom attribute blob.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        CustomAttributeParser {
            parser: Parser::new(data),
        }
    }

    /// Parses the whole blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the prolog is wrong or a fixed argument cannot be read.
    pub fn parse_custom_attribute(&mut self, params: &[ArgType]) -> Result<CustomAttributeValue> {
        let prolog = self.parser.read_le::<u16>()?;
        if prolog != 0x0001 {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001, got 0x{:04X}",
                prolog
            ));
        }

        let mut fixed_args = Vec::with_capacity(params.len());
        for param in params {
            fixed_args.push(self.parse_fixed_argument(param, 0)?);
        }

        let mut named_args = Vec::new();
        if self.parser.remaining() >= 2 {
            let num_named = self.parser.read_le::<u16>()?;
            for _ in 0..num_named {
                match self.parse_named_argument() {
                    Ok(Some(arg)) => named_args.push(arg),
                    Ok(None) | Err(_) => break,
                }
            }
        }

        Ok(CustomAttributeValue {
            fixed_args,
            named_args,
        })
    }

    fn parse_fixed_argument(
        &mut self,
        arg_type: &ArgType,
        depth: usize,
    ) -> Result<CustomAttributeArgument> {
        if depth > MAX_NESTING_DEPTH {
            return Err(RecursionLimit(MAX_NESTING_DEPTH));
        }

        let value = match arg_type {
            ArgType::Bool => CustomAttributeArgument::Bool(self.parser.read_le::<u8>()? != 0),
            ArgType::Char => {
                let value = self.parser.read_le::<u16>()?;
                CustomAttributeArgument::Char(
                    char::from_u32(u32::from(value)).unwrap_or(char::REPLACEMENT_CHARACTER),
                )
            }
            ArgType::I1 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<i8>()?)),
            ArgType::U1 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<u8>()?)),
            ArgType::I2 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<i16>()?)),
            ArgType::U2 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<u16>()?)),
            ArgType::I4 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<i32>()?)),
            ArgType::U4 => CustomAttributeArgument::Int(i64::from(self.parser.read_le::<u32>()?)),
            ArgType::I8 => CustomAttributeArgument::Int(self.parser.read_le::<i64>()?),
            ArgType::U8 => {
                let value = self.parser.read_le::<u64>()?;
                match i64::try_from(value) {
                    Ok(value) => CustomAttributeArgument::Int(value),
                    Err(_) => CustomAttributeArgument::UInt(value),
                }
            }
            ArgType::R4 => {
                CustomAttributeArgument::Float(f64::from(self.parser.read_le::<f32>()?))
            }
            ArgType::R8 => CustomAttributeArgument::Float(self.parser.read_le::<f64>()?),
            ArgType::String => CustomAttributeArgument::String(self.parser.read_ser_string()?),
            ArgType::Type => CustomAttributeArgument::Type(self.parser.read_ser_string()?),
            ArgType::Enum(underlying) => self.parse_fixed_argument(underlying, depth + 1)?,
            ArgType::Object => {
                let tag = self.parser.read_le::<u8>()?;
                let boxed = self.parse_field_or_prop_type(tag, depth + 1)?;
                self.parse_fixed_argument(&boxed, depth + 1)?
            }
            ArgType::SzArray(element) => {
                let count = self.parser.read_le::<u32>()?;
                if count == u32::MAX {
                    CustomAttributeArgument::Array(None)
                } else {
                    if count as usize > self.parser.remaining() {
                        return Err(malformed_error!(
                            "Custom attribute array of {} elements is truncated",
                            count
                        ));
                    }

                    let mut elements = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        elements.push(self.parse_fixed_argument(element, depth + 1)?);
                    }
                    CustomAttributeArgument::Array(Some(elements))
                }
            }
        };

        Ok(value)
    }

    /// Reads the `FieldOrPropType` following `tag` and maps it to an [`ArgType`].
    fn parse_field_or_prop_type(&mut self, tag: u8, depth: usize) -> Result<ArgType> {
        if depth > MAX_NESTING_DEPTH {
            return Err(RecursionLimit(MAX_NESTING_DEPTH));
        }

        let arg_type = match tag {
            SERIALIZATION_TYPE::BOOLEAN => ArgType::Bool,
            SERIALIZATION_TYPE::CHAR => ArgType::Char,
            SERIALIZATION_TYPE::I1 => ArgType::I1,
            SERIALIZATION_TYPE::U1 => ArgType::U1,
            SERIALIZATION_TYPE::I2 => ArgType::I2,
            SERIALIZATION_TYPE::U2 => ArgType::U2,
            SERIALIZATION_TYPE::I4 => ArgType::I4,
            SERIALIZATION_TYPE::U4 => ArgType::U4,
            SERIALIZATION_TYPE::I8 => ArgType::I8,
            SERIALIZATION_TYPE::U8 => ArgType::U8,
            SERIALIZATION_TYPE::R4 => ArgType::R4,
            SERIALIZATION_TYPE::R8 => ArgType::R8,
            SERIALIZATION_TYPE::STRING => ArgType::String,
            SERIALIZATION_TYPE::TYPE => ArgType::Type,
            SERIALIZATION_TYPE::TAGGED_OBJECT => ArgType::Object,
            SERIALIZATION_TYPE::SZARRAY => {
                let element = self.parser.read_le::<u8>()?;
                ArgType::SzArray(Box::new(self.parse_field_or_prop_type(element, depth + 1)?))
            }
            SERIALIZATION_TYPE::ENUM => {
                let name = self.parser.read_ser_string()?.unwrap_or_default();
                return Err(malformed_error!(
                    "Underlying type of enum '{}' is not encoded in the blob",
                    name
                ));
            }
            _ => {
                return Err(malformed_error!(
                    "Unsupported serialization type: 0x{:02X}",
                    tag
                ))
            }
        };

        Ok(arg_type)
    }

    fn parse_named_argument(&mut self) -> Result<Option<CustomAttributeNamedArgument>> {
        if !self.parser.has_more_data() {
            return Ok(None);
        }

        let is_field = match self.parser.read_le::<u8>()? {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            other => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: 0x{:02X}",
                    other
                ))
            }
        };

        let tag = self.parser.read_le::<u8>()?;
        let arg_type = self.parse_field_or_prop_type(tag, 0)?;
        let name = self.parser.read_ser_string()?.unwrap_or_default();
        let value = self.parse_fixed_argument(&arg_type, 0)?;

        Ok(Some(CustomAttributeNamedArgument {
            is_field,
            name,
            value,
        }))
    }
}
