//! Icon file decoding and icon group resources.
//!
//! An icon file holds several images of one icon. Each image becomes its own icon resource,
//! and an icon group resource references the images by their resource ids.
//! See <https://learn.microsoft.com/en-us/previous-versions/ms997538(v=msdn.10)> for more information.

use std::{io::Read, mem::size_of};

use log::debug;
use zerocopy::IntoBytes;

use crate::{blob::*, errors::*, types::*, util::*};

const ICON_TYPE: u16 = 1;

/// Single icon image.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IconImage {
    id:    u16,
    entry: IconFileEntry,
    data:  Blob,
}
impl IconImage {
    /// Creates an icon image from its directory entry and image bytes.
    /// The size recorded in the entry is taken from the data.
    pub fn new(entry: IconFileEntry, data: Blob) -> Self {
        let entry = IconFileEntry {
            bytes: data.size() as u32,
            ..entry
        };
        Self { id: 0, entry, data }
    }

    /// Returns the resource id of the image, or 0 if none was assigned.
    pub fn id(&self) -> u16 { self.id }

    /// Set the resource id of the image.
    pub fn set_id(&mut self, id: u16) { self.id = id; }

    /// Returns the directory entry of the image in the source icon file.
    pub fn entry(&self) -> &IconFileEntry { &self.entry }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> u64 { self.data.size() }

    /// Returns the image data.
    pub fn data(&self) -> &Blob { &self.data }
}

/// Icon group, the decoded contents of an icon file.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct IconGroup {
    images: Vec<IconImage>,
}
impl IconGroup {
    /// Creates an icon group from images.
    pub fn new(images: Vec<IconImage>) -> Self { Self { images } }

    /// Parse an icon file.
    ///
    /// # Returns
    /// Returns an error if the header is invalid or an image lies outside the data.
    pub fn parse(data: &[u8]) -> Result<Self, IconReadError> {
        let directory = read::<IconDirectory>(data)?;
        if directory.reserved != 0 || directory.type_ != ICON_TYPE {
            return Err(IconReadError::InvalidHeader(format!(
                "not an icon file (reserved {}, type {})",
                { directory.reserved },
                { directory.type_ }
            )));
        }

        let mut images = Vec::with_capacity(directory.count as usize);
        for index in 0..directory.count as usize {
            let offset = size_of::<IconDirectory>() + index * size_of::<IconFileEntry>();
            let entry = read::<IconFileEntry>(data.get(offset..).unwrap_or_default())?;
            let start = entry.image_offset as usize;
            let end = start.checked_add(entry.bytes as usize);
            let image = end.and_then(|end| data.get(start..end)).ok_or_else(|| {
                IconReadError::InvalidHeader(format!(
                    "image #{} at {:#x?} with size {:#x?} outside data ({:#x?})",
                    index,
                    start,
                    { entry.bytes },
                    data.len()
                ))
            })?;
            debug!("icon image #{}: {:#x?}", index, entry);
            images.push(IconImage::new(entry, image.into()));
        }
        Ok(Self { images })
    }

    /// Parse an icon file from a reader.
    pub fn read<R: Read>(reader: R) -> Result<Self, IconReadError> {
        let blob = Blob::from_reader(reader)?;
        Self::parse(blob.data())
    }

    /// Returns the images of the group.
    pub fn images(&self) -> &[IconImage] { &self.images }

    /// Returns the mutable images of the group.
    pub fn images_mut(&mut self) -> &mut [IconImage] { &mut self.images }

    /// Set the resource ids of the images in order.
    pub(crate) fn set_ids(&mut self, ids: &[u16]) {
        for (image, &id) in self.images.iter_mut().zip(ids) {
            image.set_id(id);
        }
    }

    /// Build the icon group resource data referencing the images by their ids.
    ///
    /// # Returns
    /// Returns an error if an image has no id assigned or there are too many images.
    pub fn group_data(&self) -> Result<Vec<u8>, ResourceError> {
        let count = u16::try_from(self.images.len()).map_err(|_| {
            ResourceError::TooManyEntries(self.images.len())
        })?;
        let directory = IconDirectory {
            reserved: 0,
            type_: ICON_TYPE,
            count,
        };
        let mut data = Vec::with_capacity(
            size_of::<IconDirectory>() + self.images.len() * size_of::<IconDirectoryEntry>(),
        );
        data.extend_from_slice(directory.as_bytes());
        for (index, image) in self.images.iter().enumerate() {
            if image.id == 0 {
                return Err(ResourceError::InvalidIdentifier(format!(
                    "icon image #{} has no id",
                    index
                )));
            }
            let entry = IconDirectoryEntry {
                width:       image.entry.width,
                height:      image.entry.height,
                color_count: image.entry.color_count,
                reserved:    image.entry.reserved,
                planes:      image.entry.planes,
                bit_count:   image.entry.bit_count,
                bytes:       image.entry.bytes,
                id:          image.id,
            };
            data.extend_from_slice(entry.as_bytes());
        }
        Ok(data)
    }
}
