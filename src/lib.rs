//! **R**e**s**ou**rc**e **obj**ect builder for Windows.
//!
//! Supports:
//! * Building resource sections with icons, manifests, version information and arbitrary resources
//! * Decoding icon files into icon group resources
//! * Writing relocatable COFF object files that can be linked into Windows executables
//!
//! See [`ObjectFile`] for the main entry point for assembling and writing an object file,
//! and [`ResourceSection`] for adding resources.
//!
//! # Examples
//!
//! ### Icon and manifest embedding
//! ```
//! use rsrcobj::{IconGroup, ObjectFile};
//!
//! let icon = std::fs::read(ICON_PATH)?;
//! let manifest = std::fs::read(MANIFEST_PATH)?;
//!
//! // decode the icon file
//! let mut icons = IconGroup::parse(&icon)?;
//!
//! // get or create the resource section
//! let mut object = ObjectFile::new();
//! let resources = object.resource_section_mut()?;
//!
//! // add the icon group and its images, and the manifest
//! resources.embed_icon(1u16, &mut icons)?;
//! resources.add_manifest(1u16, manifest)?;
//!
//! // write the object file
//! object.write_file("rsrc.syso")?;
//! ```
//!
//! ### Version information
//! ```
//! use rsrcobj::{constants::*, ObjectFile, VersionInfo};
//!
//! let mut version_info = VersionInfo::new();
//! version_info.set_file_version_string("1.2.3.4")?;
//! version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME, "Example");
//! version_info.add_translation(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US);
//!
//! let mut object = ObjectFile::new();
//! object.resource_section_mut()?.add_version_info(1u16, &version_info)?;
//!
//! // build the object file in memory
//! let data = object.build()?;
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

pub(crate) mod blob;
pub(crate) mod embed;
pub(crate) mod errors;
pub(crate) mod icon;
pub(crate) mod object;
pub(crate) mod resource;
pub(crate) mod util;
pub(crate) mod version;

pub mod constants;
pub mod types;

pub use crate::{blob::*, embed::*, errors::*, icon::*, object::*, resource::*, version::*};
