//! Version information resource builder.
//!
//! The resource is a tree of blocks. Every block starts with a [`VersionHeader`], followed by its
//! null-terminated UTF-16 key, an optional value and its children, each aligned to 32 bits.
//! See <https://learn.microsoft.com/en-us/windows/win32/menurc/vs-versioninfo> for more information.

use std::{borrow::Cow, io::Write, mem::size_of};

use ahash::RandomState;
use indexmap::IndexMap;
use log::trace;
use zerocopy::IntoBytes;

use crate::{blob::*, constants::*, errors::*, types::*, util::*};

/// Language and codepage pair.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Translation {
    pub language: u16,
    pub codepage: u16,
}

/// Strings for one language and codepage pair.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StringTable {
    language: u16,
    codepage: u16,
    strings:  IndexMap<String, String, RandomState>,
}
impl StringTable {
    fn new(language: u16, codepage: u16) -> Self {
        Self {
            language,
            codepage,
            strings: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Returns the language of the table.
    pub fn language(&self) -> u16 { self.language }

    /// Returns the codepage of the table.
    pub fn codepage(&self) -> u16 { self.codepage }

    /// Returns the table key, the language and codepage as eight hexadecimal digits.
    pub fn key(&self) -> String { format!("{:04X}{:04X}", self.language, self.codepage) }

    /// Returns the value for the key.
    pub fn get(&self, key: &str) -> Option<&str> { self.strings.get(key).map(String::as_str) }

    /// Returns the key and value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.strings.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of strings in the table.
    pub fn len(&self) -> usize { self.strings.len() }

    /// Returns `true` if the table holds no strings.
    pub fn is_empty(&self) -> bool { self.strings.is_empty() }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
struct StringFileInfo {
    tables: Vec<StringTable>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
struct VarFileInfo {
    translations: Vec<Translation>,
}

/// Version information resource.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct VersionInfo {
    fixed:            FixedFileInfo,
    string_file_info: Option<StringFileInfo>,
    var_file_info:    Option<VarFileInfo>,
}
impl VersionInfo {
    /// Creates version information with default fixed fields and no strings or translations.
    pub fn new() -> Self { Self::default() }

    /// Returns the fixed file information.
    pub fn fixed_file_info(&self) -> &FixedFileInfo { &self.fixed }

    /// Returns the file version, packed as four 16-bit components.
    pub fn file_version(&self) -> u64 {
        (self.fixed.file_version_ms as u64) << 32 | self.fixed.file_version_ls as u64
    }

    pub fn set_file_version(&mut self, version: u64) {
        self.fixed.file_version_ms = (version >> 32) as u32;
        self.fixed.file_version_ls = version as u32;
    }

    /// Returns the file version formatted as `major.minor.patch.build`.
    pub fn file_version_string(&self) -> String { format_version_string(self.file_version()) }

    /// Set the file version from a `major.minor.patch.build` string.
    ///
    /// # Returns
    /// Returns an error and leaves the version unchanged if the string is malformed.
    pub fn set_file_version_string(&mut self, version: &str) -> Result<(), VersionError> {
        self.set_file_version(parse_version_string(version)?);
        Ok(())
    }

    /// Returns the product version, packed as four 16-bit components.
    pub fn product_version(&self) -> u64 {
        (self.fixed.product_version_ms as u64) << 32 | self.fixed.product_version_ls as u64
    }

    pub fn set_product_version(&mut self, version: u64) {
        self.fixed.product_version_ms = (version >> 32) as u32;
        self.fixed.product_version_ls = version as u32;
    }

    /// Returns the product version formatted as `major.minor.patch.build`.
    pub fn product_version_string(&self) -> String {
        format_version_string(self.product_version())
    }

    /// Set the product version from a `major.minor.patch.build` string.
    ///
    /// # Returns
    /// Returns an error and leaves the version unchanged if the string is malformed.
    pub fn set_product_version_string(&mut self, version: &str) -> Result<(), VersionError> {
        self.set_product_version(parse_version_string(version)?);
        Ok(())
    }

    pub fn file_flags_mask(&self) -> u32 { self.fixed.file_flags_mask }

    pub fn set_file_flags_mask(&mut self, mask: u32) { self.fixed.file_flags_mask = mask; }

    pub fn file_flags(&self) -> u32 { self.fixed.file_flags }

    pub fn set_file_flags(&mut self, flags: u32) { self.fixed.file_flags = flags; }

    pub fn file_os(&self) -> u32 { self.fixed.file_os }

    pub fn set_file_os(&mut self, os: u32) { self.fixed.file_os = os; }

    pub fn file_type(&self) -> u32 { self.fixed.file_type }

    pub fn set_file_type(&mut self, type_: u32) { self.fixed.file_type = type_; }

    pub fn file_subtype(&self) -> u32 { self.fixed.file_subtype }

    pub fn set_file_subtype(&mut self, subtype: u32) { self.fixed.file_subtype = subtype; }

    pub fn file_date(&self) -> u64 {
        (self.fixed.file_date_ms as u64) << 32 | self.fixed.file_date_ls as u64
    }

    pub fn set_file_date(&mut self, date: u64) {
        self.fixed.file_date_ms = (date >> 32) as u32;
        self.fixed.file_date_ls = date as u32;
    }

    /// Returns the string for the key in the table of the language and codepage.
    pub fn string(&self, language: u16, codepage: u16, key: &str) -> Option<&str> {
        self.string_file_info
            .as_ref()?
            .tables
            .iter()
            .find(|table| table.language == language && table.codepage == codepage)?
            .get(key)
    }

    /// Set the string for the key in the table of the language and codepage.
    /// The table is created if it does not exist. An existing key is updated in place.
    pub fn set_string<K: Into<String>, V: Into<String>>(
        &mut self, language: u16, codepage: u16, key: K, value: V,
    ) {
        let string_file_info = self.string_file_info.get_or_insert_with(StringFileInfo::default);
        let index = match string_file_info
            .tables
            .iter()
            .position(|table| table.language == language && table.codepage == codepage)
        {
            Some(index) => index,
            None => {
                string_file_info.tables.push(StringTable::new(language, codepage));
                string_file_info.tables.len() - 1
            }
        };
        string_file_info.tables[index].strings.insert(key.into(), value.into());
    }

    /// Returns the string tables in insertion order.
    pub fn string_tables(&self) -> &[StringTable] {
        self.string_file_info.as_ref().map(|info| &info.tables[..]).unwrap_or(&[])
    }

    /// Add a translation. Adding a pair that is already present does nothing.
    pub fn add_translation(&mut self, language: u16, codepage: u16) {
        let var_file_info = self.var_file_info.get_or_insert_with(VarFileInfo::default);
        let translation = Translation { language, codepage };
        if !var_file_info.translations.contains(&translation) {
            var_file_info.translations.push(translation);
        }
    }

    /// Returns the translations in insertion order.
    pub fn translations(&self) -> &[Translation] {
        self.var_file_info.as_ref().map(|info| &info.translations[..]).unwrap_or(&[])
    }

    fn freeze(&self) -> Result<FrozenNode, VersionError> { Node::Root(self).freeze() }

    /// Returns the size of the encoded resource in bytes.
    pub fn size(&self) -> Result<u16, VersionError> { Ok(self.freeze()?.header.length) }

    /// Write the encoded resource to the writer.
    ///
    /// # Returns
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64, VersionError> {
        let root = self.freeze()?;
        Ok(root.write_to(writer)? as u64)
    }

    /// Build the encoded resource into raw bytes.
    pub fn build(&self) -> Result<Vec<u8>, VersionError> {
        let mut data = Vec::new();
        self.write_to(&mut data)?;
        Ok(data)
    }

    /// Build the encoded resource into a blob to embed as resource data.
    pub fn to_blob(&self) -> Result<Blob, VersionError> { Ok(self.build()?.into()) }
}

/// Formats a packed version as four dot-separated decimal components.
pub fn format_version_string(version: u64) -> String {
    format!(
        "{}.{}.{}.{}",
        (version >> 48) & 0xffff,
        (version >> 32) & 0xffff,
        (version >> 16) & 0xffff,
        version & 0xffff
    )
}

/// Parses a `major.minor.patch.build` string into a packed version.
///
/// # Returns
/// Returns an error unless the string has exactly four decimal components in the range 0 to 65535.
pub fn parse_version_string(version: &str) -> Result<u64, VersionError> {
    let components = version.split('.').collect::<Vec<_>>();
    if components.len() != 4 {
        return Err(VersionError::FormatError(format!(
            "expected 4 components in {:?}",
            version
        )));
    }
    components.iter().try_fold(0u64, |packed, component| {
        if component.is_empty() || !component.bytes().all(|c| c.is_ascii_digit()) {
            return Err(VersionError::FormatError(format!(
                "invalid component {:?} in {:?}",
                component, version
            )));
        }
        let component = component.parse::<u16>().map_err(|_| {
            VersionError::FormatError(format!("component {:?} out of range in {:?}", component, version))
        })?;
        Ok(packed << 16 | component as u64)
    })
}

/// Block kinds of the version information tree.
#[derive(Clone, Copy)]
enum Node<'a> {
    Root(&'a VersionInfo),
    StringFileInfo(&'a StringFileInfo),
    StringTable(&'a StringTable),
    String(&'a str, &'a str),
    VarFileInfo(&'a VarFileInfo),
    Var(&'a [Translation]),
}
impl<'a> Node<'a> {
    fn key(&self) -> Cow<'a, str> {
        match *self {
            Node::Root(_) => VS_VERSION_INFO_KEY.into(),
            Node::StringFileInfo(_) => VS_STRING_FILE_INFO_KEY.into(),
            Node::StringTable(table) => table.key().into(),
            Node::String(key, _) => key.into(),
            Node::VarFileInfo(_) => VS_VAR_FILE_INFO_KEY.into(),
            Node::Var(_) => VS_TRANSLATION_KEY.into(),
        }
    }

    fn type_(&self) -> u16 {
        match self {
            Node::Root(_) | Node::Var(_) => VS_VALUE_BINARY,
            _ => VS_VALUE_TEXT,
        }
    }

    /// Returns the value bytes and the value length field.
    /// Text values count 16-bit characters including the terminator, binary values count bytes.
    fn value(&self) -> (Vec<u8>, usize) {
        match *self {
            Node::Root(info) => {
                let value = info.fixed.as_bytes().to_vec();
                let length = value.len();
                (value, length)
            }
            Node::String(_, value) => (string_to_u16(value), utf16_length(value) + 1),
            Node::Var(translations) => {
                let value = translations
                    .iter()
                    .flat_map(|t| [t.language.to_le_bytes(), t.codepage.to_le_bytes()])
                    .flatten()
                    .collect::<Vec<u8>>();
                let length = value.len();
                (value, length)
            }
            _ => (Vec::new(), 0),
        }
    }

    fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Root(info) => {
                let mut children = Vec::new();
                if let Some(string_file_info) = &info.string_file_info {
                    children.push(Node::StringFileInfo(string_file_info));
                }
                if let Some(var_file_info) = &info.var_file_info {
                    children.push(Node::VarFileInfo(var_file_info));
                }
                children
            }
            Node::StringFileInfo(info) => info.tables.iter().map(Node::StringTable).collect(),
            Node::StringTable(table) => table
                .strings
                .iter()
                .map(|(key, value)| Node::String(key.as_str(), value.as_str()))
                .collect(),
            Node::VarFileInfo(info) => vec![Node::Var(&info.translations)],
            Node::String(..) | Node::Var(_) => Vec::new(),
        }
    }

    /// Computes the lengths of the node and its descendants, children first.
    fn freeze(&self) -> Result<FrozenNode, VersionError> {
        let children =
            self.children().iter().map(Node::freeze).collect::<Result<Vec<_>, _>>()?;
        let key = string_to_u16(self.key());
        let (value, value_length) = self.value();

        let mut length = size_of::<VersionHeader>() + key.len();
        length += padding_length(length);
        length += value.len();
        for child in &children {
            length += padding_length(length);
            length += child.header.length as usize;
        }

        let too_large = || VersionError::NodeTooLarge(self.key().into_owned(), length);
        let header = VersionHeader {
            length:       u16::try_from(length).map_err(|_| too_large())?,
            value_length: u16::try_from(value_length).map_err(|_| too_large())?,
            type_:        self.type_(),
        };
        trace!("version block {:?}: {:#x?}", self.key(), header);

        Ok(FrozenNode {
            header,
            key,
            value,
            children,
        })
    }
}

/// Version information block with all lengths computed.
struct FrozenNode {
    header:   VersionHeader,
    key:      Vec<u8>,
    value:    Vec<u8>,
    children: Vec<FrozenNode>,
}
impl FrozenNode {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, VersionError> {
        writer.write_all(self.header.as_bytes())?;
        writer.write_all(&self.key)?;
        let mut written = size_of::<VersionHeader>() + self.key.len();
        written += write_padding(writer, padding_length(written))?;
        writer.write_all(&self.value)?;
        written += self.value.len();
        for child in &self.children {
            written += write_padding(writer, padding_length(written))?;
            written += child.write_to(writer)?;
        }
        Ok(written)
    }
}
