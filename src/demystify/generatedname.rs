//! The C# compiler's generated-name grammar.
//!
//! Synthesized members carry names of the form `[CS$]<middle>k[__suffix]`, where `middle` is
//! the name of the user-written member the construct came from (possibly itself bracketed) and
//! `k` is a single character in `[1-9a-z]` naming the kind of construct:
//!
//! ```text
//! <Main>b__0_0                lambda #0 of Main, in closure scope 0
//! <Start>g__LocalFunc2|1_0    local function LocalFunc2 inside Start
//! <RunAsync>d__3              state machine type of RunAsync
//! <>c__DisplayClass1_0        closure class
//! ```

use strum::{Display, EnumIter};

/// Kind of a compiler-generated name, from the character after the closing bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum GeneratedNameKind {
    None,
    StateMachineStateField,
    IteratorCurrentBackingField,
    StateMachineParameterProxyField,
    ThisProxyField,
    HoistedLocalField,
    ReusableHoistedLocalField,
    DisplayClassLocalOrField,
    LambdaCacheField,
    LambdaMethod,
    LambdaDisplayClass,
    StateMachineType,
    FixedBufferField,
    AnonymousType,
    LocalFunction,
    TransparentIdentifier,
    AnonymousTypeField,
    AutoPropertyBackingField,
    IteratorCurrentThreadIdField,
    IteratorFinallyMethod,
    BaseMethodWrapper,
    DynamicCallSiteContainerType,
    DynamicCallSiteField,
    HoistedSynthesizedLocalField,
    AsyncBuilderField,
    AwaiterField,
    /// A character of the kind alphabet without a known meaning
    Reserved(char),
}

impl GeneratedNameKind {
    /// Maps a kind character to its kind; `None` when `c` is outside `[1-9a-z]`.
    #[must_use]
    pub fn from_char(c: char) -> Option<GeneratedNameKind> {
        let kind = match c {
            '1' => GeneratedNameKind::StateMachineStateField,
            '2' => GeneratedNameKind::IteratorCurrentBackingField,
            '3' => GeneratedNameKind::StateMachineParameterProxyField,
            '4' => GeneratedNameKind::ThisProxyField,
            '5' => GeneratedNameKind::HoistedLocalField,
            '7' => GeneratedNameKind::ReusableHoistedLocalField,
            '8' => GeneratedNameKind::DisplayClassLocalOrField,
            '9' => GeneratedNameKind::LambdaCacheField,
            'b' => GeneratedNameKind::LambdaMethod,
            'c' => GeneratedNameKind::LambdaDisplayClass,
            'd' => GeneratedNameKind::StateMachineType,
            'e' => GeneratedNameKind::FixedBufferField,
            'f' => GeneratedNameKind::AnonymousType,
            'g' => GeneratedNameKind::LocalFunction,
            'h' => GeneratedNameKind::TransparentIdentifier,
            'i' => GeneratedNameKind::AnonymousTypeField,
            'k' => GeneratedNameKind::AutoPropertyBackingField,
            'l' => GeneratedNameKind::IteratorCurrentThreadIdField,
            'm' => GeneratedNameKind::IteratorFinallyMethod,
            'n' => GeneratedNameKind::BaseMethodWrapper,
            'o' => GeneratedNameKind::DynamicCallSiteContainerType,
            'p' => GeneratedNameKind::DynamicCallSiteField,
            's' => GeneratedNameKind::HoistedSynthesizedLocalField,
            't' => GeneratedNameKind::AsyncBuilderField,
            'u' => GeneratedNameKind::AwaiterField,
            '1'..='9' | 'a'..='z' => GeneratedNameKind::Reserved(c),
            _ => return None,
        };

        Some(kind)
    }

    /// The character that encodes this kind.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        let c = match self {
            GeneratedNameKind::None => return None,
            GeneratedNameKind::StateMachineStateField => '1',
            GeneratedNameKind::IteratorCurrentBackingField => '2',
            GeneratedNameKind::StateMachineParameterProxyField => '3',
            GeneratedNameKind::ThisProxyField => '4',
            GeneratedNameKind::HoistedLocalField => '5',
            GeneratedNameKind::ReusableHoistedLocalField => '7',
            GeneratedNameKind::DisplayClassLocalOrField => '8',
            GeneratedNameKind::LambdaCacheField => '9',
            GeneratedNameKind::LambdaMethod => 'b',
            GeneratedNameKind::LambdaDisplayClass => 'c',
            GeneratedNameKind::StateMachineType => 'd',
            GeneratedNameKind::FixedBufferField => 'e',
            GeneratedNameKind::AnonymousType => 'f',
            GeneratedNameKind::LocalFunction => 'g',
            GeneratedNameKind::TransparentIdentifier => 'h',
            GeneratedNameKind::AnonymousTypeField => 'i',
            GeneratedNameKind::AutoPropertyBackingField => 'k',
            GeneratedNameKind::IteratorCurrentThreadIdField => 'l',
            GeneratedNameKind::IteratorFinallyMethod => 'm',
            GeneratedNameKind::BaseMethodWrapper => 'n',
            GeneratedNameKind::DynamicCallSiteContainerType => 'o',
            GeneratedNameKind::DynamicCallSiteField => 'p',
            GeneratedNameKind::HoistedSynthesizedLocalField => 's',
            GeneratedNameKind::AsyncBuilderField => 't',
            GeneratedNameKind::AwaiterField => 'u',
            GeneratedNameKind::Reserved(c) => c,
        };

        Some(c)
    }
}

/// A parsed generated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedName<'a> {
    /// Kind of the synthesized construct
    pub kind: GeneratedNameKind,
    /// Byte offset of the opening `<`
    pub open_bracket: usize,
    /// Byte offset of the matching `>`
    pub close_bracket: usize,
    /// The full generated name
    pub name: &'a str,
}

impl<'a> GeneratedName<'a> {
    /// Parses `name`, returning `None` for ordinary identifiers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotsym::demystify::{GeneratedName, GeneratedNameKind};
    ///
    /// let parsed = GeneratedName::parse("<Start>g__LocalFunc2|1_0").unwrap();
    /// assert_eq!(parsed.kind, GeneratedNameKind::LocalFunction);
    /// assert_eq!(parsed.original_name(), "Start");
    /// assert_eq!(parsed.local_function_name(), Some("LocalFunc2"));
    ///
    /// assert!(GeneratedName::parse("Main").is_none());
    /// ```
    #[must_use]
    pub fn parse(name: &'a str) -> Option<GeneratedName<'a>> {
        let open_bracket = if name.starts_with("CS$<") {
            3
        } else if name.starts_with('<') {
            0
        } else {
            return None;
        };

        let close_bracket = balanced_close(name, open_bracket)?;
        let kind_char = name[close_bracket + 1..].chars().next()?;
        let kind = GeneratedNameKind::from_char(kind_char)?;

        Some(GeneratedName {
            kind,
            open_bracket,
            close_bracket,
            name,
        })
    }

    /// The text between the brackets: the name of the member the construct was generated from.
    #[must_use]
    pub fn original_name(&self) -> &'a str {
        &self.name[self.open_bracket + 1..self.close_bracket]
    }

    /// Name of a local function: the text after `g__` up to the next `|`.
    #[must_use]
    pub fn local_function_name(&self) -> Option<&'a str> {
        if self.kind != GeneratedNameKind::LocalFunction {
            return None;
        }

        let tail = &self.name[self.close_bracket + 1..];
        let start = self.close_bracket + 1 + tail.find('g')? + 3;
        let rest = self.name.get(start..)?;
        let end = rest.find('|')?;

        Some(&rest[..end])
    }

    /// The `|<n>_` segment of a local function name.
    ///
    /// Local functions declared in the same scope share it, so a call between two of them
    /// identifies the method that hosts them.
    #[must_use]
    pub fn match_hint(&self) -> Option<&'a str> {
        if self.kind != GeneratedNameKind::LocalFunction {
            return None;
        }

        let start = self.name.find('|').filter(|start| *start >= 1)?;
        let end = start + self.name[start..].find('_')? + 1;

        Some(&self.name[start..end])
    }

    /// The ordinal suffix of a lambda method name and the byte length of the prefix before it.
    ///
    /// `<Main>b__0_1` yields `(1, 11)`, with `<Main>b__0_` as the prefix its siblings share.
    #[must_use]
    pub fn lambda_ordinal(&self) -> Option<(i32, usize)> {
        lambda_ordinal(self.name)
    }
}

/// Parses the ordinal from a lambda method name, see [`GeneratedName::lambda_ordinal`].
pub(crate) fn lambda_ordinal(name: &str) -> Option<(i32, usize)> {
    let mut start = name.find("b__")? + 3;
    if start <= 3 {
        return None;
    }

    if let Some(separator) = name[start..].find('_') {
        start += separator + 1;
    }

    let ordinal = name[start..].parse::<i32>().ok()?;
    Some((ordinal, start))
}

fn balanced_close(name: &str, open_bracket: usize) -> Option<usize> {
    let mut depth = 1_usize;
    for (index, c) in name[open_bracket + 1..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_bracket + 1 + index);
                }
            }
            _ => {}
        }
    }

    None
}
