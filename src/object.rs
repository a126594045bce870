//! Object file representation.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#coff-file-header-object-and-image> for more information.

use std::{
    fs,
    io::Write,
    mem::size_of,
    path::{Path, PathBuf},
};

use ahash::RandomState;
use indexmap::IndexMap;
use log::{debug, trace};
use zerocopy::IntoBytes;

use crate::{blob::*, constants::*, errors::*, resource::*, types::*};

const FILE_HEADER_SIZE: u64 = size_of::<CoffHeader>() as u64;
const SECTION_HEADER_SIZE: u64 = size_of::<SectionHeader>() as u64;
const RELOCATION_SIZE: u64 = size_of::<CoffRelocation>() as u64;
const SYMBOL_SIZE: u64 = size_of::<CoffSymbol>() as u64;
const STRING_TABLE_SIZE_FIELD: u64 = 4;

/// Initialized data section with arbitrary contents and no relocations.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DataSection {
    name:            String,
    data:            Blob,
    characteristics: DWORD,
}
impl DataSection {
    /// Creates a readable initialized data section.
    pub fn new<S: Into<String>, B: Into<Blob>>(name: S, data: B) -> Self {
        Self {
            name:            name.into(),
            data:            data.into(),
            characteristics: IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
        }
    }

    /// Replaces the section characteristics.
    pub fn with_characteristics(mut self, characteristics: DWORD) -> Self {
        self.characteristics = characteristics;
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn data(&self) -> &Blob { &self.data }

    pub fn characteristics(&self) -> DWORD { self.characteristics }
}

/// Section of an object file.
#[derive(Debug, Clone)]
pub enum Section {
    Resource(ResourceSection),
    Data(DataSection),
}
impl Section {
    /// Returns the section name.
    pub fn name(&self) -> &str {
        match self {
            Self::Resource(section) => section.name(),
            Self::Data(section) => section.name(),
        }
    }

    /// Returns the section header characteristics.
    pub fn characteristics(&self) -> DWORD {
        match self {
            Self::Resource(_) => RESOURCE_SECTION_CHARACTERISTICS,
            Self::Data(section) => section.characteristics(),
        }
    }

    /// Returns the size of the section body in bytes.
    pub fn size(&self) -> Result<u32, ObjectError> { Ok(self.freeze()?.size()) }

    /// Returns the relocations requested by the section body.
    pub fn relocations(&self) -> Result<Vec<Relocation>, ObjectError> {
        Ok(self.freeze()?.relocations().to_vec())
    }

    fn freeze(&self) -> Result<FrozenSection, ObjectError> {
        match self {
            Self::Resource(section) => Ok(FrozenSection::Resource(section.freeze()?)),
            Self::Data(section) => {
                let size = section.data.size();
                let size = u32::try_from(size).map_err(|_| ObjectError::FileTooLarge(size))?;
                Ok(FrozenSection::Data(size))
            }
        }
    }

    fn write_frozen<W: Write>(
        &self, frozen: &FrozenSection, writer: &mut W,
    ) -> Result<u64, ObjectError> {
        match (self, frozen) {
            (Self::Resource(section), FrozenSection::Resource(layout)) => {
                Ok(section.write_frozen(layout, writer)?)
            }
            (Self::Data(section), FrozenSection::Data(_)) => {
                writer.write_all(section.data.data())?;
                Ok(section.data.size())
            }
            _ => Err(ObjectError::InvariantViolation(format!(
                "section {:?} changed after layout",
                self.name()
            ))),
        }
    }
}
impl From<ResourceSection> for Section {
    fn from(section: ResourceSection) -> Self { Self::Resource(section) }
}
impl From<DataSection> for Section {
    fn from(section: DataSection) -> Self { Self::Data(section) }
}

enum FrozenSection {
    Resource(ResourceLayout),
    Data(u32),
}
impl FrozenSection {
    fn size(&self) -> u32 {
        match self {
            Self::Resource(layout) => layout.size(),
            Self::Data(size) => *size,
        }
    }

    fn relocations(&self) -> &[Relocation] {
        match self {
            Self::Resource(layout) => layout.relocations(),
            Self::Data(_) => &[],
        }
    }
}

struct ObjectLayout {
    sections:            Vec<FrozenSection>,
    data_offsets:        Vec<u32>,
    relocation_offsets:  Vec<u32>,
    symbols_offset:      u32,
    string_table_offset: u32,
    size:                u32,
}

/// Relocatable object file.
///
/// This struct is the main entry point for assembling and writing an object file.
/// Every section gets one static symbol that its relocations refer to.
#[derive(Debug, Clone, Default)]
pub struct ObjectFile {
    sections:     IndexMap<String, Section, RandomState>,
    long_names:   IndexMap<String, u32, RandomState>,
    string_table: Vec<u8>,
}
impl ObjectFile {
    /// Creates an empty object file.
    pub fn new() -> Self { Self::default() }

    /// Add a section to the object file.
    /// Names longer than 8 bytes are stored in the string table.
    ///
    /// # Returns
    /// Returns an error if a section with the same name already exists.
    pub fn add_section<S: Into<Section>>(&mut self, section: S) -> Result<(), ObjectError> {
        let section = section.into();
        let name = section.name().to_string();
        if name.is_empty() || name.contains('\0') {
            return Err(ObjectError::InvalidSectionName(name));
        }
        if self.sections.contains_key(&name) {
            return Err(ObjectError::DuplicateSectionName(name));
        }
        if self.sections.len() >= u16::MAX as usize {
            return Err(ObjectError::TooManySections(self.sections.len() + 1));
        }

        if name.len() > SECTION_NAME_INLINE_LENGTH && !self.long_names.contains_key(&name) {
            let offset = STRING_TABLE_SIZE_FIELD + self.string_table.len() as u64;
            // the reference has to fit the 8-byte name field as `/<offset>`
            if offset > 9_999_999 {
                return Err(ObjectError::InvalidSectionName(name));
            }
            trace!("section name {:?} at string table offset {:#x?}", name, offset);
            self.string_table.extend_from_slice(name.as_bytes());
            self.string_table.push(0);
            self.long_names.insert(name.clone(), offset as u32);
        }

        debug!("adding section {:?}", name);
        self.sections.insert(name, section);
        Ok(())
    }

    /// Returns the section with the given name.
    pub fn section(&self, name: &str) -> Result<&Section, ObjectError> {
        self.sections.get(name).ok_or_else(|| ObjectError::SectionNotFound(name.to_string()))
    }

    /// Returns the sections in file order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> { self.sections.values() }

    /// Returns the resource section, if present.
    pub fn resource_section(&self) -> Option<&ResourceSection> {
        match self.sections.get(RESOURCE_SECTION_NAME) {
            Some(Section::Resource(section)) => Some(section),
            _ => None,
        }
    }

    /// Returns the resource section, adding an empty one if it does not exist yet.
    ///
    /// # Returns
    /// Returns an error if a section with the resource section name exists but holds other data.
    pub fn resource_section_mut(&mut self) -> Result<&mut ResourceSection, ObjectError> {
        if !self.sections.contains_key(RESOURCE_SECTION_NAME) {
            self.add_section(ResourceSection::new())?;
        }
        match self.sections.get_mut(RESOURCE_SECTION_NAME) {
            Some(Section::Resource(section)) => Ok(section),
            _ => Err(ObjectError::DuplicateSectionName(RESOURCE_SECTION_NAME.to_string())),
        }
    }

    /// Returns the offset of a long section name in the string table.
    pub fn string_table_offset(&self, name: &str) -> Option<u32> {
        self.long_names.get(name).copied()
    }

    /// Compute the layout of the whole file.
    ///
    /// The sections are frozen first, then the regions are placed in a fixed order:
    /// file header, section headers, section data, relocations, symbols and the string table.
    fn freeze(&self) -> Result<ObjectLayout, ObjectError> {
        let sections = self.sections.values().map(Section::freeze).collect::<Result<Vec<_>, _>>()?;
        for (name, frozen) in self.sections.keys().zip(&sections) {
            if frozen.relocations().len() > u16::MAX as usize {
                return Err(ObjectError::TooManyRelocations(
                    name.clone(),
                    frozen.relocations().len(),
                ));
            }
        }

        let mut offset = FILE_HEADER_SIZE;
        debug!("section headers offset: {:#x?}", offset);
        offset += SECTION_HEADER_SIZE * sections.len() as u64;

        let mut data_offsets = Vec::with_capacity(sections.len());
        for (name, frozen) in self.sections.keys().zip(&sections) {
            debug!("section {:?} data offset: {:#x?} ({} bytes)", name, offset, frozen.size());
            data_offsets.push(offset as u32);
            offset += frozen.size() as u64;
            if offset > u32::MAX as u64 {
                return Err(ObjectError::FileTooLarge(offset));
            }
        }

        let mut relocation_offsets = Vec::with_capacity(sections.len());
        for (name, frozen) in self.sections.keys().zip(&sections) {
            debug!(
                "section {:?} relocations offset: {:#x?} ({} relocations)",
                name,
                offset,
                frozen.relocations().len()
            );
            relocation_offsets.push(offset as u32);
            offset += RELOCATION_SIZE * frozen.relocations().len() as u64;
        }

        debug!("symbols offset: {:#x?}", offset);
        let symbols_offset = offset;
        offset += SYMBOL_SIZE * sections.len() as u64;

        debug!("string table offset: {:#x?}", offset);
        let string_table_offset = offset;
        offset += STRING_TABLE_SIZE_FIELD + self.string_table.len() as u64;

        if offset > u32::MAX as u64 {
            return Err(ObjectError::FileTooLarge(offset));
        }
        debug!("object file size: {:#x?}", offset);

        Ok(ObjectLayout {
            sections,
            data_offsets,
            relocation_offsets,
            symbols_offset: symbols_offset as u32,
            string_table_offset: string_table_offset as u32,
            size: offset as u32,
        })
    }

    /// Returns the size of the object file in bytes.
    pub fn size(&self) -> Result<u32, ObjectError> { Ok(self.freeze()?.size) }

    fn section_name(&self, name: &str) -> u64 {
        let mut field = [0u8; SECTION_NAME_INLINE_LENGTH];
        match self.long_names.get(name) {
            Some(offset) => {
                let reference = format!("/{}", offset);
                field[..reference.len()].copy_from_slice(reference.as_bytes());
            }
            None => field[..name.len()].copy_from_slice(name.as_bytes()),
        }
        u64::from_le_bytes(field)
    }

    fn symbol_name(&self, name: &str) -> u64 {
        match self.long_names.get(name) {
            Some(&offset) => (offset as u64) << 32,
            None => self.section_name(name),
        }
    }

    /// Write the object file to the writer.
    ///
    /// # Returns
    /// Returns the number of bytes written, or an error if the layout is invalid or the writer fails.
    /// The writer may hold partially written data after an error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64, ObjectError> {
        let layout = self.freeze()?;
        let mut written = 0u64;

        let header = CoffHeader {
            machine:                 IMAGE_FILE_MACHINE_I386,
            number_of_sections:      self.sections.len() as u16,
            time_date_stamp:         0,
            pointer_to_symbol_table: layout.symbols_offset,
            number_of_symbols:       self.sections.len() as u32,
            size_of_optional_header: 0,
            characteristics:         IMAGE_FILE_32BIT_MACHINE,
        };
        trace!("{:#x?}: {:#x?}", written, header);
        writer.write_all(header.as_bytes())?;
        written += FILE_HEADER_SIZE;

        for (index, (name, section)) in self.sections.iter().enumerate() {
            let frozen = &layout.sections[index];
            let relocations = frozen.relocations().len();
            let header = SectionHeader {
                name: self.section_name(name),
                size_of_raw_data: frozen.size(),
                pointer_to_raw_data: layout.data_offsets[index],
                pointer_to_relocations: if relocations > 0 {
                    layout.relocation_offsets[index]
                } else {
                    0
                },
                number_of_relocations: relocations as u16,
                characteristics: section.characteristics(),
                ..SectionHeader::default()
            };
            trace!("{:#x?}: {:#x?}", written, header);
            writer.write_all(header.as_bytes())?;
            written += SECTION_HEADER_SIZE;
        }

        for (index, section) in self.sections.values().enumerate() {
            trace!("{:#x?}: section {:?}", written, section.name());
            written += section.write_frozen(&layout.sections[index], writer)?;
        }

        for (index, frozen) in layout.sections.iter().enumerate() {
            for relocation in frozen.relocations() {
                let relocation = CoffRelocation {
                    virtual_address:    relocation.virtual_address(),
                    symbol_table_index: index as u32,
                    type_:              IMAGE_REL_I386_DIR32NB,
                };
                writer.write_all(relocation.as_bytes())?;
                written += RELOCATION_SIZE;
            }
        }

        for (index, name) in self.sections.keys().enumerate() {
            let symbol = CoffSymbol {
                name:                  self.symbol_name(name),
                value:                 0,
                section_number:        index as u16 + 1,
                type_:                 IMAGE_SYM_TYPE_NULL,
                storage_class:         IMAGE_SYM_CLASS_STATIC,
                number_of_aux_symbols: 0,
            };
            trace!("{:#x?}: {:#x?}", written, symbol);
            writer.write_all(symbol.as_bytes())?;
            written += SYMBOL_SIZE;
        }

        let string_table_size = (STRING_TABLE_SIZE_FIELD + self.string_table.len() as u64) as u32;
        trace!("{:#x?}: string table ({} bytes)", written, string_table_size);
        writer.write_all(&string_table_size.to_le_bytes())?;
        writer.write_all(&self.string_table)?;
        written += string_table_size as u64;

        if written != layout.size as u64
            || written != layout.string_table_offset as u64 + string_table_size as u64
        {
            return Err(ObjectError::InvariantViolation(format!(
                "wrote {} bytes, layout computed {} bytes",
                written, layout.size
            )));
        }
        Ok(written)
    }

    /// Build the object file into raw bytes.
    pub fn build(&self) -> Result<Vec<u8>, ObjectError> {
        let mut data = Vec::new();
        self.write_to(&mut data)?;
        Ok(data)
    }

    /// Write the object file to a file.
    ///
    /// The object file is built in memory and written to a temporary file next to the destination,
    /// which then replaces the destination. An existing file is left untouched on error.
    ///
    /// # Returns
    /// Returns an error if the object file could not be built or the file could not be written.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ObjectError> {
        let path = path.as_ref();
        let data = self.build()?;

        let mut temporary = path.as_os_str().to_owned();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);
        debug!("writing {} bytes to {}", data.len(), temporary.display());
        if let Err(e) = fs::write(&temporary, &data).and_then(|_| fs::rename(&temporary, path)) {
            let _ = fs::remove_file(&temporary);
            return Err(e.into());
        }
        Ok(())
    }
}
