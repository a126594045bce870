//! Data types for building the resource section.
//! The resource section contains the resource directory and the resource data.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for more information.

use std::{fmt, io::Write, mem::size_of};

use ahash::RandomState;
use indexmap::IndexSet;
use log::{debug, trace};
use zerocopy::IntoBytes;

use crate::{blob::*, constants::*, errors::*, icon::*, types::*, util::*, version::*};

const ROOT: usize = 0;

const DIRECTORY_SIZE: u64 = size_of::<ResourceDirectoryTable>() as u64;
const DIRECTORY_ENTRY_SIZE: u64 = size_of::<ResourceDirectoryEntry>() as u64;
const DATA_ENTRY_SIZE: u64 = size_of::<ResourceDataEntry>() as u64;

/// Resource directory entry name.
/// This can either be a numeric id or a name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceEntryName {
    ID(u16),
    Name(String),
}
impl ResourceEntryName {
    pub fn from_string<S: AsRef<str>>(string: S) -> Self { Self::Name(string.as_ref().to_string()) }

    /// Returns the id, or `None` for a named entry.
    pub fn id(&self) -> Option<u16> {
        match self {
            Self::ID(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    /// Returns the name, or `None` for an id entry.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::ID(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// Checks the identifier is usable for a resource.
    /// Ids have to be non-zero and names non-empty.
    pub fn validate(&self) -> Result<(), ResourceError> {
        match self {
            Self::ID(0) => Err(ResourceError::InvalidIdentifier("resource id cannot be 0".into())),
            Self::Name(name) if name.is_empty() => {
                Err(ResourceError::InvalidIdentifier("resource name cannot be empty".into()))
            }
            Self::Name(name) if utf16_length(name) > u16::MAX as usize => {
                Err(ResourceError::InvalidIdentifier(format!("resource name too long: {}", name)))
            }
            _ => Ok(()),
        }
    }
}
impl fmt::Display for ResourceEntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ID(id) => write!(f, "#{}", id),
            Self::Name(name) => write!(f, "{:?}", name),
        }
    }
}
impl From<u16> for ResourceEntryName {
    fn from(id: u16) -> Self { Self::ID(id) }
}
impl From<&str> for ResourceEntryName {
    fn from(name: &str) -> Self { Self::from_string(name) }
}
impl From<String> for ResourceEntryName {
    fn from(name: String) -> Self { Self::Name(name) }
}

/// Relocation requested by a section.
/// The 32-bit field at the virtual address has to be adjusted by the section base address at link time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Relocation {
    virtual_address: u32,
}
impl Relocation {
    pub fn new(virtual_address: u32) -> Self { Self { virtual_address } }

    /// Returns the section-relative offset of the field to relocate.
    pub fn virtual_address(&self) -> u32 { self.virtual_address }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum EntryTarget {
    Table(usize),
    Data(usize),
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    name:   ResourceEntryName,
    target: EntryTarget,
}

/// Resource table node. Children are referenced by index into the section arenas.
#[derive(Debug, Clone, Default)]
struct ResourceTable {
    characteristics: u32,
    name_entries:    Vec<DirectoryEntry>,
    id_entries:      Vec<DirectoryEntry>,
    strings:         IndexSet<String, RandomState>,
}
impl ResourceTable {
    fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.name_entries.iter().chain(self.id_entries.iter())
    }

    fn get(&self, name: &ResourceEntryName) -> Option<&DirectoryEntry> {
        match name {
            ResourceEntryName::ID(_) => self.id_entries.iter().find(|entry| &entry.name == name),
            ResourceEntryName::Name(_) => {
                self.name_entries.iter().find(|entry| &entry.name == name)
            }
        }
    }

    fn check_insert(&self, name: &ResourceEntryName) -> Result<(), ResourceError> {
        if self.get(name).is_some() {
            return Err(ResourceError::DuplicateEntry(format!("directory entry {}", name)));
        }
        if let ResourceEntryName::Name(string) = name {
            if utf16_length(string) > u16::MAX as usize {
                return Err(ResourceError::InvalidIdentifier(format!(
                    "resource name too long: {} characters",
                    utf16_length(string)
                )));
            }
        }
        let count = match name {
            ResourceEntryName::ID(_) => self.id_entries.len(),
            ResourceEntryName::Name(_) => self.name_entries.len(),
        };
        if count >= u16::MAX as usize {
            return Err(ResourceError::TooManyEntries(count + 1));
        }
        Ok(())
    }

    /// Inserts the entry keeping names and ids sorted.
    fn insert(&mut self, entry: DirectoryEntry) -> Result<(), ResourceError> {
        self.check_insert(&entry.name)?;
        match &entry.name {
            ResourceEntryName::ID(id) => {
                let index = self.id_entries.partition_point(|e| e.name.id() < Some(*id));
                self.id_entries.insert(index, entry);
            }
            ResourceEntryName::Name(name) => {
                self.strings.insert(name.clone());
                let index = self.name_entries.partition_point(|e| {
                    e.name.name().map(|n| cmp_utf16(n, name).is_lt()).unwrap_or(false)
                });
                self.name_entries.insert(index, entry);
            }
        }
        Ok(())
    }
}

/// Raw resource data with its codepage.
#[derive(Debug, Clone)]
struct ResourceData {
    blob:     Blob,
    codepage: u32,
}

/// Layout of a resource section computed by [`ResourceSection::freeze`].
///
/// All offsets are relative to the start of the section.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceLayout {
    order:          Vec<usize>,
    table_offsets:  Vec<u32>,
    string_offsets: Vec<Vec<u32>>,
    entry_offsets:  Vec<u32>,
    data_offsets:   Vec<u32>,
    relocations:    Vec<Relocation>,
    size:           u32,
}
impl ResourceLayout {
    /// Returns the total size of the section in bytes.
    pub fn size(&self) -> u32 { self.size }

    /// Returns one relocation per resource data entry, pointing at its data address field.
    pub fn relocations(&self) -> &[Relocation] { &self.relocations }
}

/// Resource section of an object file.
///
/// Resources are organized in three levels: type, identifier and language.
/// Every resource is stored with the fixed default language [`LANGUAGE_ID_EN_US`].
#[derive(Debug, Clone)]
pub struct ResourceSection {
    tables: Vec<ResourceTable>,
    data:   Vec<ResourceData>,
}
impl Default for ResourceSection {
    fn default() -> Self { Self::new() }
}
impl ResourceSection {
    /// Creates an empty resource section.
    pub fn new() -> Self {
        Self {
            tables: vec![ResourceTable::default()],
            data:   Vec::new(),
        }
    }

    /// Returns the section name.
    pub fn name(&self) -> &str { RESOURCE_SECTION_NAME }

    /// Returns the number of resources in the section.
    pub fn len(&self) -> usize { self.data.len() }

    /// Returns `true` if the section holds no resources.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    fn type_table(&self, type_: u16) -> Result<Option<usize>, ResourceError> {
        match self.tables[ROOT].get(&ResourceEntryName::ID(type_)) {
            Some(DirectoryEntry {
                target: EntryTarget::Table(table),
                ..
            }) => Ok(Some(*table)),
            Some(_) => Err(ResourceError::InvariantViolation(format!(
                "resource type {} is not a subdirectory",
                type_
            ))),
            None => Ok(None),
        }
    }

    fn push_table(&mut self) -> usize {
        self.tables.push(ResourceTable::default());
        self.tables.len() - 1
    }

    /// Add a resource of the given type.
    ///
    /// Creates the type and identifier directories if needed and stores the data in a leaf directory
    /// for the default language. The section is left unchanged if an error is returned.
    ///
    /// # Returns
    /// Returns an error if a resource with the same type and identifier already exists.
    pub fn add_resource<N: Into<ResourceEntryName>, B: Into<Blob>>(
        &mut self, type_: u16, name: N, blob: B,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        let blob = blob.into();

        if blob.size() > u32::MAX as u64 {
            return Err(ResourceError::ResourceTooLarge(blob.size()));
        }
        let type_table = self.type_table(type_)?;
        match type_table {
            Some(table) => self.tables[table].check_insert(&name)?,
            None => {
                self.tables[ROOT].check_insert(&ResourceEntryName::ID(type_))?;
                ResourceTable::default().check_insert(&name)?;
            }
        }

        let type_table = match type_table {
            Some(table) => table,
            None => {
                let table = self.push_table();
                self.tables[ROOT].insert(DirectoryEntry {
                    name:   ResourceEntryName::ID(type_),
                    target: EntryTarget::Table(table),
                })?;
                table
            }
        };
        let language_table = self.push_table();
        self.tables[type_table].insert(DirectoryEntry {
            name:   name.clone(),
            target: EntryTarget::Table(language_table),
        })?;

        debug!("adding resource {} of type {} ({} bytes)", name, type_, blob.size());
        self.data.push(ResourceData {
            blob,
            codepage: RESOURCE_DATA_CODEPAGE,
        });
        let data = self.data.len() - 1;
        self.tables[language_table].insert(DirectoryEntry {
            name:   ResourceEntryName::ID(LANGUAGE_ID_EN_US),
            target: EntryTarget::Data(data),
        })
    }

    /// Returns `true` if a resource with the given type and identifier exists.
    pub fn resource_exists<N: Into<ResourceEntryName>>(&self, type_: u16, name: N) -> bool {
        let name = name.into();
        matches!(self.type_table(type_), Ok(Some(table)) if self.tables[table].get(&name).is_some())
    }

    /// Returns the data of the resource with the given type and identifier.
    ///
    /// # Returns
    /// Returns an error if no such resource exists.
    pub fn resource<N: Into<ResourceEntryName>>(
        &self, type_: u16, name: N,
    ) -> Result<&Blob, ResourceError> {
        let name = name.into();
        let not_found = || ResourceError::NotFound(format!("resource {} of type {}", name, type_));
        let table = self.type_table(type_)?.ok_or_else(not_found)?;
        let language_table = match self.tables[table].get(&name).map(|entry| entry.target) {
            Some(EntryTarget::Table(table)) => table,
            _ => return Err(not_found()),
        };
        self.tables[language_table]
            .entries()
            .find_map(|entry| match entry.target {
                EntryTarget::Data(data) => Some(&self.data[data].blob),
                EntryTarget::Table(_) => None,
            })
            .ok_or_else(not_found)
    }

    /// Returns the resource types in the section in serialization order.
    pub fn types(&self) -> Vec<u16> {
        self.tables[ROOT].entries().filter_map(|entry| entry.name.id()).collect()
    }

    /// Returns the identifiers of the resources of the given type in serialization order.
    pub fn names(&self, type_: u16) -> Vec<&ResourceEntryName> {
        match self.type_table(type_) {
            Ok(Some(table)) => self.tables[table].entries().map(|entry| &entry.name).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the first unused id of the given type, starting the search at `from`.
    ///
    /// # Returns
    /// Returns an error if every id from `from` up to 65535 is in use.
    pub fn find_free_id(&self, type_: u16, from: u16) -> Result<u16, ResourceError> {
        (from.max(1)..=u16::MAX)
            .find(|&id| !self.resource_exists(type_, id))
            .ok_or(ResourceError::IDSpaceExhausted(from))
    }

    /// Add a manifest resource.
    pub fn add_manifest<N: Into<ResourceEntryName>, B: Into<Blob>>(
        &mut self, name: N, manifest: B,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        name.validate()?;
        self.add_resource(RT_MANIFEST, name, manifest)
    }

    /// Add a version information resource.
    /// The version information is encoded when it is added.
    pub fn add_version_info<N: Into<ResourceEntryName>>(
        &mut self, name: N, version_info: &VersionInfo,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        name.validate()?;
        let blob = version_info.to_blob()?;
        self.add_resource(RT_VERSION, name, blob)
    }

    /// Add a single icon image resource.
    pub fn add_icon<N: Into<ResourceEntryName>>(
        &mut self, name: N, icon: &IconImage,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        name.validate()?;
        self.add_resource(RT_ICON, name, icon.data().clone())
    }

    /// Add an icon group resource.
    /// Only the group directory is added, the images it references have to be added separately.
    pub fn add_icon_group<N: Into<ResourceEntryName>>(
        &mut self, name: N, icons: &IconGroup,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        name.validate()?;
        self.add_resource(RT_GROUP_ICON, name, icons.group_data()?)
    }

    /// Add an icon group and all of its images.
    /// Each image has to have a non-zero id that is unused by other icon images.
    ///
    /// # Returns
    /// Returns an error without modifying the section if the group or any image cannot be added.
    pub fn add_icons<N: Into<ResourceEntryName>>(
        &mut self, name: N, icons: &IconGroup,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        name.validate()?;
        if self.resource_exists(RT_GROUP_ICON, name.clone()) {
            return Err(ResourceError::DuplicateEntry(format!("icon group {}", name)));
        }
        let group = icons.group_data()?;
        for (index, image) in icons.images().iter().enumerate() {
            if name.id() == Some(image.id()) {
                return Err(ResourceError::InvalidIdentifier(format!(
                    "icon group id cannot be the same as image #{} id ({})",
                    index,
                    image.id()
                )));
            }
            if self.resource_exists(RT_ICON, image.id())
                || icons.images()[..index].iter().any(|other| other.id() == image.id())
            {
                return Err(ResourceError::DuplicateEntry(format!(
                    "icon image #{} id {}",
                    index,
                    image.id()
                )));
            }
        }

        for image in icons.images() {
            self.add_resource(RT_ICON, image.id(), image.data().clone())?;
        }
        self.add_resource(RT_GROUP_ICON, name, group)
    }

    /// Add an icon group and all of its images, assigning unused ids to the images.
    /// Ids are allocated upwards from [`ICON_IMAGE_BASE_ID`] and written back to the images.
    ///
    /// # Returns
    /// Returns the assigned ids, or an error without modifying the section or the icons.
    pub fn embed_icon<N: Into<ResourceEntryName>>(
        &mut self, name: N, icons: &mut IconGroup,
    ) -> Result<Vec<u16>, ResourceError> {
        let name = name.into();
        name.validate()?;
        if self.resource_exists(RT_GROUP_ICON, name.clone()) {
            return Err(ResourceError::DuplicateEntry(format!("icon group {}", name)));
        }

        let mut ids = Vec::<u16>::with_capacity(icons.images().len());
        for _ in icons.images() {
            let from = match ids.last() {
                Some(&last) => last.checked_add(1),
                None => Some(ICON_IMAGE_BASE_ID),
            };
            let id = from
                .and_then(|from| {
                    (from..=u16::MAX)
                        .find(|&id| name.id() != Some(id) && !self.resource_exists(RT_ICON, id))
                })
                .ok_or(ResourceError::IDSpaceExhausted(ICON_IMAGE_BASE_ID))?;
            ids.push(id);
        }

        let previous = icons.images().iter().map(IconImage::id).collect::<Vec<_>>();
        icons.set_ids(&ids);
        if let Err(error) = self.add_icons(name, icons) {
            icons.set_ids(&previous);
            return Err(error);
        }
        Ok(ids)
    }

    /// Pre-order traversal of the tables: each table, then its subtables in entry order.
    fn walk(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.tables.len());
        let mut stack = vec![ROOT];
        while let Some(table) = stack.pop() {
            order.push(table);
            let children = self.tables[table].entries().filter_map(|entry| match entry.target {
                EntryTarget::Table(child) => Some(child),
                EntryTarget::Data(_) => None,
            });
            let start = stack.len();
            stack.extend(children);
            stack[start..].reverse();
        }
        order
    }

    /// Compute the layout of the section.
    ///
    /// Offsets are assigned in four passes over the tables in pre-order:
    /// directory tables with their entries, name strings, data entries and finally the resource data.
    /// Each data entry requests one relocation for its data address field.
    ///
    /// # Returns
    /// Returns an error if the section would exceed the 32-bit offset range.
    pub fn freeze(&self) -> Result<ResourceLayout, ResourceError> {
        let order = self.walk();
        let mut offset = 0u64;

        let mut table_offsets = vec![0u32; self.tables.len()];
        for &table in &order {
            table_offsets[table] = offset as u32;
            let entries = self.tables[table].entries().count() as u64;
            trace!("table {} at {:#x?} ({} entries)", table, offset, entries);
            offset += DIRECTORY_SIZE + entries * DIRECTORY_ENTRY_SIZE;
        }

        let mut string_offsets = vec![Vec::new(); self.tables.len()];
        for &table in &order {
            for string in &self.tables[table].strings {
                trace!("string {:?} at {:#x?}", string, offset);
                string_offsets[table].push(offset as u32);
                offset += 2 + 2 * utf16_length(string) as u64;
            }
        }

        let mut entry_offsets = vec![0u32; self.data.len()];
        let mut relocations = Vec::with_capacity(self.data.len());
        for &table in &order {
            for data in self.data_in(table) {
                trace!("data entry {} at {:#x?}", data, offset);
                entry_offsets[data] = offset as u32;
                relocations.push(Relocation::new(offset as u32));
                offset += DATA_ENTRY_SIZE;
            }
        }

        let mut data_offsets = vec![0u32; self.data.len()];
        for &table in &order {
            for data in self.data_in(table) {
                trace!("data {} at {:#x?} ({} bytes)", data, offset, self.data[data].blob.size());
                data_offsets[data] = offset as u32;
                offset += self.data[data].blob.size();
            }
        }

        if offset > u32::MAX as u64 {
            return Err(ResourceError::ResourceTooLarge(offset));
        }
        debug!(
            "resource section layout: {} tables, {} resources, {} bytes",
            order.len(),
            self.data.len(),
            offset
        );

        Ok(ResourceLayout {
            order,
            table_offsets,
            string_offsets,
            entry_offsets,
            data_offsets,
            relocations,
            size: offset as u32,
        })
    }

    fn data_in(&self, table: usize) -> impl Iterator<Item = usize> + '_ {
        self.tables[table].entries().filter_map(|entry| match entry.target {
            EntryTarget::Data(data) => Some(data),
            EntryTarget::Table(_) => None,
        })
    }

    /// Returns the size of the section in bytes.
    pub fn size(&self) -> Result<u32, ResourceError> { Ok(self.freeze()?.size) }

    /// Returns the relocations requested by the section.
    pub fn relocations(&self) -> Result<Vec<Relocation>, ResourceError> {
        Ok(self.freeze()?.relocations)
    }

    /// Write the section to the writer.
    ///
    /// # Returns
    /// Returns the number of bytes written, or an error if the layout is invalid or the writer fails.
    /// The writer may hold partially written data after an error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<u64, ResourceError> {
        let layout = self.freeze()?;
        self.write_frozen(&layout, writer)
    }

    /// Build the section into raw bytes.
    pub fn build(&self) -> Result<Vec<u8>, ResourceError> {
        let mut data = Vec::new();
        self.write_to(&mut data)?;
        Ok(data)
    }

    /// Write the section using a layout previously computed by [`Self::freeze`] without modification in between.
    pub(crate) fn write_frozen<W: Write>(
        &self, layout: &ResourceLayout, writer: &mut W,
    ) -> Result<u64, ResourceError> {
        let mut written = 0u64;

        for &index in &layout.order {
            let table = &self.tables[index];
            let header = ResourceDirectoryTable {
                characteristics: table.characteristics,
                number_of_name_entries: table.name_entries.len() as u16,
                number_of_id_entries: table.id_entries.len() as u16,
                ..ResourceDirectoryTable::default()
            };
            writer.write_all(header.as_bytes())?;
            written += DIRECTORY_SIZE;

            for entry in table.entries() {
                let name_offset_or_integer_id = match &entry.name {
                    ResourceEntryName::ID(id) => *id as u32,
                    ResourceEntryName::Name(name) => {
                        let string = table.strings.get_index_of(name).ok_or_else(|| {
                            ResourceError::InvariantViolation(format!("string {:?} not interned", name))
                        })?;
                        layout.string_offsets[index][string] | RESOURCE_NAME_FLAG
                    }
                };
                let data_entry_or_subdirectory_offset = match entry.target {
                    EntryTarget::Table(child) => {
                        layout.table_offsets[child] | RESOURCE_SUBDIRECTORY_FLAG
                    }
                    EntryTarget::Data(data) => layout.entry_offsets[data],
                };
                let entry = ResourceDirectoryEntry {
                    name_offset_or_integer_id,
                    data_entry_or_subdirectory_offset,
                };
                writer.write_all(entry.as_bytes())?;
                written += DIRECTORY_ENTRY_SIZE;
            }
        }

        for &index in &layout.order {
            for string in &self.tables[index].strings {
                writer.write_all(&(utf16_length(string) as u16).to_le_bytes())?;
                let data = string_to_u16_raw(string);
                writer.write_all(&data)?;
                written += 2 + data.len() as u64;
            }
        }

        for &index in &layout.order {
            for data in self.data_in(index) {
                let entry = ResourceDataEntry {
                    data_rva: layout.data_offsets[data],
                    size:     self.data[data].blob.size() as u32,
                    codepage: self.data[data].codepage,
                    reserved: 0,
                };
                writer.write_all(entry.as_bytes())?;
                written += DATA_ENTRY_SIZE;
            }
        }

        for &index in &layout.order {
            for data in self.data_in(index) {
                writer.write_all(self.data[data].blob.data())?;
                written += self.data[data].blob.size();
            }
        }

        if written != layout.size as u64 {
            return Err(ResourceError::InvariantViolation(format!(
                "wrote {} bytes, layout computed {} bytes",
                written, layout.size
            )));
        }
        Ok(written)
    }
}
