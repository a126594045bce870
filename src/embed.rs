//! Embedding of resources loaded from files.

use std::path::PathBuf;

use log::info;

use crate::{blob::*, constants::*, errors::*, icon::*, object::*, resource::*, version::*};

/// Resource backed by a file on disk.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileResource {
    pub name: ResourceEntryName,
    pub path: PathBuf,
}
impl FileResource {
    pub fn new<N: Into<ResourceEntryName>, P: Into<PathBuf>>(name: N, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Checks that the resource has a path and a usable identifier.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.path.as_os_str().is_empty() {
            return Err(ResourceError::InvalidIdentifier(format!(
                "no file path given for resource {}",
                self.name
            )));
        }
        self.name.validate()
    }

    fn load(&self) -> Result<Blob, ObjectError> {
        self.validate()?;
        Ok(Blob::from_file(&self.path)?)
    }
}

/// Embed an icon file as an icon group into the resource section of the object file.
/// The images of the icon are assigned unused ids starting at [`ICON_IMAGE_BASE_ID`].
///
/// # Returns
/// Returns the ids assigned to the images, or an error if the file could not be read or decoded,
/// or the resources could not be added. The object file is left unchanged on error.
pub fn embed_icon_file(
    object: &mut ObjectFile, icon: &FileResource,
) -> Result<Vec<u16>, ObjectError> {
    let data = icon.load()?;
    let mut icons = IconGroup::parse(data.data()).map_err(ResourceError::from)?;
    info!(
        "embedding icon {} from {} ({} images)",
        icon.name,
        icon.path.display(),
        icons.images().len()
    );
    let ids = with_resource_section(object, |resources| {
        resources.embed_icon(icon.name.clone(), &mut icons)
    })?;
    Ok(ids)
}

/// Embed a manifest file into the resource section of the object file.
///
/// # Returns
/// Returns an error if the file could not be read or the resource could not be added.
/// The object file is left unchanged on error.
pub fn embed_manifest_file(
    object: &mut ObjectFile, manifest: &FileResource,
) -> Result<(), ObjectError> {
    let data = manifest.load()?;
    info!("embedding manifest {} from {}", manifest.name, manifest.path.display());
    with_resource_section(object, |resources| resources.add_manifest(manifest.name.clone(), data))
}

/// Embed version information into the resource section of the object file.
///
/// # Returns
/// Returns an error if the version information could not be encoded or the resource could not be added.
/// The object file is left unchanged on error.
pub fn embed_version_info<N: Into<ResourceEntryName>>(
    object: &mut ObjectFile, name: N, version_info: &VersionInfo,
) -> Result<(), ObjectError> {
    let name = name.into();
    name.validate()?;
    let data = version_info.to_blob().map_err(ResourceError::from)?;
    info!("embedding version info {} ({} bytes)", name, data.size());
    with_resource_section(object, |resources| {
        resources.add_resource(RT_VERSION, name, data)
    })
}

/// Runs the operation on the resource section, creating the section only if the operation succeeds.
fn with_resource_section<T, F>(object: &mut ObjectFile, operation: F) -> Result<T, ObjectError>
where
    F: FnOnce(&mut ResourceSection) -> Result<T, ResourceError>,
{
    if object.resource_section().is_some() {
        return Ok(operation(object.resource_section_mut()?)?);
    }
    let mut resources = ResourceSection::new();
    let result = operation(&mut resources)?;
    object.add_section(resources)?;
    Ok(result)
}
