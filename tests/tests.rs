use rsrcobj::{constants::*, types::*, *};
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Once,
};
use zerocopy::{FromBytes, IntoBytes};

static INIT_LOGGER: Once = Once::new();
fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .format_timestamp(None)
            .format_module_path(false)
            .format_level(true)
            .format_target(false)
            .write_style(env_logger::WriteStyle::Auto)
            .init();
    });
}

fn read_at<T: FromBytes>(data: &[u8], offset: usize) -> T {
    T::read_from_prefix(&data[offset..]).ok().expect("structure fits the data").0
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn utf16_at(data: &[u8], offset: usize, units: usize) -> String {
    let units = (0..units).map(|i| u16_at(data, offset + i * 2)).collect::<Vec<_>>();
    String::from_utf16(&units).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rsrcobj-{}-{}", std::process::id(), name))
}

/// Builds an icon file holding the given images.
fn icon_file(images: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::new();
    let directory = IconDirectory {
        reserved: 0,
        type_:    1,
        count:    images.len() as u16,
    };
    data.extend_from_slice(directory.as_bytes());
    let mut offset = 6 + 16 * images.len();
    for (index, image) in images.iter().enumerate() {
        let entry = IconFileEntry {
            width:        (16 << index) as u8,
            height:       (16 << index) as u8,
            color_count:  0,
            reserved:     0,
            planes:       1,
            bit_count:    32,
            bytes:        image.len() as u32,
            image_offset: offset as u32,
        };
        data.extend_from_slice(entry.as_bytes());
        offset += image.len();
    }
    for image in images {
        data.extend_from_slice(image);
    }
    data
}

/// Writer that fails once `limit` bytes have been written.
struct LimitedWriter {
    limit: usize,
    data:  Vec<u8>,
}
impl Write for LimitedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let available = self.limit - self.data.len();
        if available == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "writer full"));
        }
        let length = buf.len().min(available);
        self.data.extend_from_slice(&buf[..length]);
        Ok(length)
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[test]
fn parse_and_format_version_string() {
    init_logger();

    let mut version_info = VersionInfo::new();
    version_info.set_file_version_string("1.2.3.4").unwrap();
    assert_eq!(version_info.file_version(), 0x0001000200030004);
    assert_eq!(version_info.file_version_string(), "1.2.3.4");

    assert!(matches!(
        version_info.set_file_version_string("1.2.3"),
        Err(VersionError::FormatError(_))
    ));
    assert!(matches!(
        version_info.set_file_version_string("a.b.c.d"),
        Err(VersionError::FormatError(_))
    ));
    assert!(matches!(parse_version_string("1.2.3.65536"), Err(VersionError::FormatError(_))));
    assert!(matches!(parse_version_string("1.2.3.+4"), Err(VersionError::FormatError(_))));
    assert!(matches!(parse_version_string("1..3.4"), Err(VersionError::FormatError(_))));
    assert_eq!(version_info.file_version(), 0x0001000200030004, "failed parse keeps version");

    version_info.set_product_version(0xffff_0000_0001_0002);
    assert_eq!(version_info.product_version_string(), "65535.0.1.2");
    assert_eq!(format_version_string(0), "0.0.0.0");
    assert_eq!(parse_version_string("65535.0.1.2").unwrap(), 0xffff_0000_0001_0002);
}

#[test]
fn set_version_info_fields() {
    init_logger();

    let mut version_info = VersionInfo::new();
    assert_eq!(version_info.file_flags_mask(), VS_FFI_FILEFLAGSMASK);
    assert_eq!(version_info.file_os(), VOS_NT_WINDOWS32);
    assert_eq!(version_info.file_type(), VFT_APP);
    assert_eq!({ version_info.fixed_file_info().signature }, VS_FIXEDFILEINFO_SIGNATURE);

    version_info.set_file_flags(VS_FF_DEBUG | VS_FF_PRERELEASE);
    version_info.set_file_type(VFT_DLL);
    version_info.set_file_subtype(VFT2_UNKNOWN);
    version_info.set_file_date(0x0000_0001_0000_0002);
    assert_eq!(version_info.file_flags(), VS_FF_DEBUG | VS_FF_PRERELEASE);
    assert_eq!(version_info.file_type(), VFT_DLL);
    assert_eq!(version_info.file_date(), 0x0000_0001_0000_0002);

    let data = version_info.build().unwrap();
    // header, key and padding precede the fixed file info
    let fixed = read_at::<FixedFileInfo>(&data, 40);
    assert_eq!({ fixed.file_flags }, VS_FF_DEBUG | VS_FF_PRERELEASE);
    assert_eq!({ fixed.file_type }, VFT_DLL);
    assert_eq!({ fixed.file_date_ms }, 1);
    assert_eq!({ fixed.file_date_ls }, 2);
}

#[test]
fn update_version_strings() {
    init_logger();

    let mut version_info = VersionInfo::new();
    assert_eq!(version_info.string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME), None);

    version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME, "First");
    version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_COMPANY_NAME, "Company");
    assert_eq!(
        version_info.string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME),
        Some("First")
    );

    version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME, "Second");
    assert_eq!(
        version_info.string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME),
        Some("Second")
    );

    let tables = version_info.string_tables();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].key(), "040904B0");
    assert_eq!(tables[0].len(), 2, "existing key is updated in place");
    assert_eq!(
        tables[0].iter().collect::<Vec<_>>(),
        vec![(VS_PRODUCT_NAME, "Second"), (VS_COMPANY_NAME, "Company")]
    );

    version_info.set_string(0x0407, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME, "Zweite");
    assert_eq!(version_info.string_tables().len(), 2);
    assert_eq!(version_info.string(0x0407, CODE_PAGE_ID_EN_US, VS_PRODUCT_NAME), Some("Zweite"));
    assert_eq!(version_info.string(0x0407, 0, VS_PRODUCT_NAME), None);
}

#[test]
fn add_version_translations() {
    init_logger();

    let mut version_info = VersionInfo::new();
    assert!(version_info.translations().is_empty());

    version_info.add_translation(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US);
    version_info.add_translation(0x0407, 1252);
    version_info.add_translation(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US);

    assert_eq!(version_info.translations(), &[
        Translation {
            language: LANGUAGE_ID_EN_US,
            codepage: CODE_PAGE_ID_EN_US,
        },
        Translation {
            language: 0x0407,
            codepage: 1252,
        },
    ]);
}

/// Checks the block at the start of the data and returns its length.
fn check_version_block(data: &[u8]) -> (usize, String) {
    let header = read_at::<VersionHeader>(data, 0);
    let length = header.length as usize;
    assert!(length <= data.len(), "block fits the data");

    let mut position = 6;
    let mut units = 0;
    while u16_at(data, position + units * 2) != 0 {
        units += 1;
    }
    let key = utf16_at(data, position, units);
    position += (units + 1) * 2;
    position += (4 - position % 4) % 4;

    let value_length = header.value_length as usize;
    match { header.type_ } {
        0 => position += value_length,
        1 => {
            position += value_length * 2;
            if value_length > 0 {
                assert_eq!(u16_at(data, position - 2), 0, "text value is null-terminated");
            }
        }
        type_ => panic!("invalid block type {}", type_),
    }

    while position < length {
        position += (4 - position % 4) % 4;
        let (child, _) = check_version_block(&data[position..length]);
        position += child;
    }
    assert_eq!(position, length, "block {:?} length matches its contents", key);
    (length, key)
}

#[test]
fn version_info_lengths_match_written_bytes() {
    init_logger();

    for tables in 0..3u16 {
        for strings in 0..3 {
            for translations in 0..3u16 {
                let mut version_info = VersionInfo::new();
                version_info.set_file_version_string("1.0.0.0").unwrap();
                for table in 0..tables {
                    for string in 0..strings {
                        version_info.set_string(
                            LANGUAGE_ID_EN_US + table,
                            CODE_PAGE_ID_EN_US,
                            format!("Key{}", "k".repeat(string)),
                            "v".repeat(string * 3 + table as usize),
                        );
                    }
                }
                for translation in 0..translations {
                    version_info.add_translation(LANGUAGE_ID_EN_US + translation, CODE_PAGE_ID_EN_US);
                }

                let data = version_info.build().unwrap();
                assert_eq!(data.len(), version_info.size().unwrap() as usize);
                let (length, key) = check_version_block(&data);
                assert_eq!(length, data.len());
                assert_eq!(key, VS_VERSION_INFO_KEY);
            }
        }
    }
}

#[test]
fn version_info_layout() {
    init_logger();

    let mut version_info = VersionInfo::new();
    version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, "A", "x");
    version_info.add_translation(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US);
    let data = version_info.build().unwrap();

    let root = read_at::<VersionHeader>(&data, 0);
    assert_eq!({ root.value_length }, 52);
    assert_eq!({ root.type_ }, 0);

    // root header and key are 38 bytes, padded to 40, then 52 bytes of fixed file info
    let string_file_info = read_at::<VersionHeader>(&data, 92);
    assert_eq!({ string_file_info.value_length }, 0);
    assert_eq!({ string_file_info.type_ }, 1);
    assert_eq!(utf16_at(&data, 98, 14), VS_STRING_FILE_INFO_KEY);

    // string file info header and key are 36 bytes, the table follows without padding
    let table = read_at::<VersionHeader>(&data, 128);
    assert_eq!(utf16_at(&data, 134, 8), "040904B0");

    // table header and key are 24 bytes, the string follows
    let string = read_at::<VersionHeader>(&data, 152);
    assert_eq!({ string.length }, 16);
    assert_eq!({ string.value_length }, 2);
    assert_eq!(utf16_at(&data, 164, 1), "x");
    assert_eq!({ table.length }, 40);
    assert_eq!({ string_file_info.length }, 76);

    let var_file_info = read_at::<VersionHeader>(&data, 168);
    assert_eq!(utf16_at(&data, 174, 11), VS_VAR_FILE_INFO_KEY);
    let var = read_at::<VersionHeader>(&data, 200);
    assert_eq!({ var.value_length }, 4);
    assert_eq!({ var.type_ }, 0);
    assert_eq!(u16_at(&data, 232), LANGUAGE_ID_EN_US);
    assert_eq!(u16_at(&data, 234), CODE_PAGE_ID_EN_US);
    assert_eq!({ var_file_info.length }, 68);
    assert_eq!({ root.length } as usize, data.len());
    assert_eq!(data.len(), 236);
}

#[test]
fn reject_duplicate_resources() {
    init_logger();

    let mut resources = ResourceSection::new();
    resources.add_resource(RT_RCDATA, 1u16, "first").unwrap();
    assert!(matches!(
        resources.add_resource(RT_RCDATA, 1u16, "second"),
        Err(ResourceError::DuplicateEntry(_))
    ));
    assert_eq!(resources.len(), 1);
    assert_eq!(resources.resource(RT_RCDATA, 1u16).unwrap().data(), b"first");

    resources.add_resource(RT_RCDATA, "1", "named").unwrap();
    resources.add_resource(RT_HTML, 1u16, "other type").unwrap();
    assert_eq!(resources.len(), 3);
    assert!(resources.resource_exists(RT_RCDATA, "1"));
    assert!(resources.resource_exists(RT_HTML, 1u16));
    assert!(!resources.resource_exists(RT_HTML, "1"));
    assert!(!resources.resource_exists(RT_MANIFEST, 1u16));
    assert!(matches!(resources.resource(RT_MANIFEST, 1u16), Err(ResourceError::NotFound(_))));
    assert!(matches!(resources.resource(RT_HTML, 2u16), Err(ResourceError::NotFound(_))));

    assert!(matches!(
        resources.add_resource(RT_RCDATA, "1", "again"),
        Err(ResourceError::DuplicateEntry(_))
    ));
    assert_eq!(resources.len(), 3);
}

#[test]
fn reject_long_name_into_new_type() {
    init_logger();

    let mut resources = ResourceSection::new();
    let empty = resources.build().unwrap();
    let name = "x".repeat(70_000);
    match resources.add_resource(RT_RCDATA, name.as_str(), "data") {
        Err(ResourceError::InvalidIdentifier(message)) => assert!(message.contains("70000")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(resources.types().is_empty());
    assert!(resources.is_empty());
    assert_eq!(resources.build().unwrap(), empty);

    resources.add_resource(RT_HTML, 1u16, "html").unwrap();
    let before = resources.build().unwrap();
    let name = "\u{10000}".repeat(40_000);
    match resources.add_resource(RT_RCDATA, name.as_str(), "data") {
        Err(ResourceError::InvalidIdentifier(message)) => {
            assert!(message.contains("80000"), "length counts UTF-16 units")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(resources.types(), vec![RT_HTML]);
    assert_eq!(resources.build().unwrap(), before);
}

#[test]
fn serialize_sorted_entries() {
    init_logger();

    let mut resources = ResourceSection::new();
    resources.add_resource(RT_RCDATA, 5u16, "5").unwrap();
    resources.add_resource(RT_RCDATA, "b", "b").unwrap();
    resources.add_resource(RT_RCDATA, 2u16, "2").unwrap();
    resources.add_resource(RT_RCDATA, "a", "a").unwrap();
    resources.add_resource(RT_RCDATA, "B", "B").unwrap();
    resources.add_resource(RT_ICON, 7u16, "icon").unwrap();

    assert_eq!(resources.types(), vec![RT_ICON, RT_RCDATA]);
    let names = resources.names(RT_RCDATA).into_iter().cloned().collect::<Vec<_>>();
    assert_eq!(names, vec![
        ResourceEntryName::from("B"),
        ResourceEntryName::from("a"),
        ResourceEntryName::from("b"),
        ResourceEntryName::ID(2),
        ResourceEntryName::ID(5),
    ]);

    let data = resources.build().unwrap();
    let root = read_at::<ResourceDirectoryTable>(&data, 0);
    assert_eq!({ root.number_of_name_entries }, 0);
    assert_eq!({ root.number_of_id_entries }, 2);

    let rcdata = read_at::<ResourceDirectoryEntry>(&data, 16 + 8);
    assert_eq!({ rcdata.name_offset_or_integer_id }, RT_RCDATA as u32);
    assert_ne!({ rcdata.data_entry_or_subdirectory_offset } & RESOURCE_SUBDIRECTORY_FLAG, 0);
    let table_offset =
        ({ rcdata.data_entry_or_subdirectory_offset } & !RESOURCE_SUBDIRECTORY_FLAG) as usize;
    let table = read_at::<ResourceDirectoryTable>(&data, table_offset);
    assert_eq!({ table.number_of_name_entries }, 3);
    assert_eq!({ table.number_of_id_entries }, 2);

    let mut serialized = Vec::new();
    for index in 0..5 {
        let entry = read_at::<ResourceDirectoryEntry>(&data, table_offset + 16 + index * 8);
        let name = entry.name_offset_or_integer_id;
        if name & RESOURCE_NAME_FLAG != 0 {
            let offset = (name & !RESOURCE_NAME_FLAG) as usize;
            let length = u16_at(&data, offset) as usize;
            serialized.push(ResourceEntryName::from(utf16_at(&data, offset + 2, length)));
        } else {
            serialized.push(ResourceEntryName::ID(name as u16));
        }
    }
    assert_eq!(serialized, names);
}

#[test]
fn freeze_is_stable() {
    init_logger();

    let mut resources = ResourceSection::new();
    resources.add_resource(RT_RCDATA, "DATA", vec![1u8, 2, 3]).unwrap();
    resources.add_resource(RT_RCDATA, 1u16, vec![4u8; 10]).unwrap();

    let first = resources.freeze().unwrap();
    let second = resources.freeze().unwrap();
    assert_eq!(first, second);
    assert_eq!(resources.build().unwrap(), resources.build().unwrap());
    assert_eq!(resources.build().unwrap().len(), first.size() as usize);

    resources.add_resource(RT_RCDATA, 2u16, vec![5u8; 7]).unwrap();
    let third = resources.freeze().unwrap();
    assert!(third.size() > first.size());
    assert_eq!(third.relocations().len(), 3);
    assert_eq!(resources.build().unwrap().len(), third.size() as usize);
}

#[test]
fn relocations_point_to_data_addresses() {
    init_logger();

    let mut resources = ResourceSection::new();
    resources.add_resource(RT_MANIFEST, 1u16, "<assembly/>").unwrap();
    resources.add_resource(RT_RCDATA, "BLOB", vec![0xAAu8; 5]).unwrap();
    resources.add_resource(RT_RCDATA, 3u16, Vec::<u8>::new()).unwrap();

    let relocations = resources.relocations().unwrap();
    assert_eq!(relocations.len(), 3);
    let data = resources.build().unwrap();

    let mut payloads = Vec::new();
    for relocation in relocations {
        let offset = relocation.virtual_address() as usize;
        let entry = read_at::<ResourceDataEntry>(&data, offset);
        assert_eq!(u32_at(&data, offset), { entry.data_rva });
        assert_eq!({ entry.codepage }, 0);
        let start = entry.data_rva as usize;
        payloads.push(data[start..start + entry.size as usize].to_vec());
    }
    assert_eq!(payloads, vec![vec![0xAAu8; 5], Vec::new(), b"<assembly/>".to_vec()]);
}

#[test]
fn find_free_resource_id() {
    init_logger();

    let mut resources = ResourceSection::new();
    assert_eq!(resources.find_free_id(RT_ICON, 0).unwrap(), 1);
    for id in [1000u16, 1001, 1003] {
        resources.add_resource(RT_ICON, id, "icon").unwrap();
    }
    assert_eq!(resources.find_free_id(RT_ICON, 1000).unwrap(), 1002);
    assert_eq!(resources.find_free_id(RT_ICON, 1003).unwrap(), 1004);
    assert_eq!(resources.find_free_id(RT_RCDATA, 1000).unwrap(), 1000);

    resources.add_resource(RT_ICON, u16::MAX, "icon").unwrap();
    assert!(matches!(
        resources.find_free_id(RT_ICON, u16::MAX),
        Err(ResourceError::IDSpaceExhausted(_))
    ));
}

#[test]
fn validate_identifiers() {
    init_logger();

    let mut resources = ResourceSection::new();
    assert!(matches!(
        resources.add_manifest(0u16, "<assembly/>"),
        Err(ResourceError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        resources.add_manifest("", "<assembly/>"),
        Err(ResourceError::InvalidIdentifier(_))
    ));
    assert!(resources.is_empty());

    assert!(matches!(
        FileResource::new(1u16, "").validate(),
        Err(ResourceError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        FileResource::new("", "app.manifest").validate(),
        Err(ResourceError::InvalidIdentifier(_))
    ));
    assert!(FileResource::new("APP", "app.manifest").validate().is_ok());
}

#[test]
fn parse_icon_file() {
    init_logger();

    let data = icon_file(&[b"first image", b"second"]);
    let icons = IconGroup::parse(&data).unwrap();
    assert_eq!(icons.images().len(), 2);
    assert_eq!(icons.images()[0].data().data(), b"first image");
    assert_eq!(icons.images()[1].data().data(), b"second");
    assert_eq!({ icons.images()[1].entry().width }, 32);
    assert_eq!(icons.images()[1].size(), 6);
    assert_eq!(icons.images()[0].id(), 0);

    let mut invalid = data.clone();
    invalid[2] = 2;
    assert!(matches!(IconGroup::parse(&invalid), Err(IconReadError::InvalidHeader(_))));

    let truncated = &data[..data.len() - 1];
    assert!(matches!(IconGroup::parse(truncated), Err(IconReadError::InvalidHeader(_))));

    assert!(matches!(IconGroup::parse(&data[..4]), Err(IconReadError::InvalidBytes(_))));
    assert!(matches!(IconGroup::parse(&data[..20]), Err(IconReadError::InvalidBytes(_))));

    let read = IconGroup::read(&data[..]).unwrap();
    assert_eq!(read, icons);
}

#[test]
fn add_icons_atomically() {
    init_logger();

    let mut icons = IconGroup::parse(&icon_file(&[b"small", b"large"])).unwrap();
    let mut resources = ResourceSection::new();

    assert!(matches!(
        resources.add_icons(1u16, &icons),
        Err(ResourceError::InvalidIdentifier(_))
    ));
    assert!(resources.is_empty());

    icons.images_mut()[0].set_id(101);
    icons.images_mut()[1].set_id(101);
    assert!(matches!(resources.add_icons(1u16, &icons), Err(ResourceError::DuplicateEntry(_))));
    assert!(resources.is_empty());

    icons.images_mut()[1].set_id(1);
    assert!(matches!(
        resources.add_icons(1u16, &icons),
        Err(ResourceError::InvalidIdentifier(_))
    ));

    resources.add_resource(RT_ICON, 102u16, "existing").unwrap();
    icons.images_mut()[1].set_id(102);
    assert!(matches!(resources.add_icons(1u16, &icons), Err(ResourceError::DuplicateEntry(_))));
    assert_eq!(resources.len(), 1);
    assert!(!resources.resource_exists(RT_ICON, 101u16));
    assert!(!resources.resource_exists(RT_GROUP_ICON, 1u16));
}

#[test]
fn embed_icon_assigns_free_ids() {
    init_logger();

    let mut icons = IconGroup::parse(&icon_file(&[b"small", b"large", b"huge"])).unwrap();
    let mut resources = ResourceSection::new();
    resources.add_resource(RT_ICON, ICON_IMAGE_BASE_ID + 1, "taken").unwrap();

    let ids = resources.embed_icon("APP", &mut icons).unwrap();
    assert_eq!(ids, vec![1000, 1002, 1003]);
    assert_eq!(icons.images().iter().map(IconImage::id).collect::<Vec<_>>(), ids);
    assert_eq!(resources.resource(RT_ICON, 1002u16).unwrap().data(), b"large");

    let group = resources.resource(RT_GROUP_ICON, "APP").unwrap().data().to_vec();
    assert_eq!(group.len(), 6 + 3 * 14);
    let directory = read_at::<IconDirectory>(&group, 0);
    assert_eq!({ directory.type_ }, 1);
    assert_eq!({ directory.count }, 3);
    for (index, id) in ids.iter().enumerate() {
        let entry = read_at::<IconDirectoryEntry>(&group, 6 + index * 14);
        assert_eq!({ entry.id }, *id);
        assert_eq!({ entry.bytes } as u64, icons.images()[index].size());
    }

    let mut other = IconGroup::parse(&icon_file(&[b"other"])).unwrap();
    assert!(matches!(
        resources.embed_icon("APP", &mut other),
        Err(ResourceError::DuplicateEntry(_))
    ));
    assert_eq!(other.images()[0].id(), 0, "ids are not assigned on error");
    assert_eq!(resources.len(), 5);
}

#[test]
fn embed_icon_and_manifest_into_object() {
    init_logger();

    let mut icons = IconGroup::parse(&icon_file(&[b"16x16 image data", b"32x32 image"])).unwrap();
    icons.images_mut()[0].set_id(101);
    icons.images_mut()[1].set_id(102);

    let mut object = ObjectFile::new();
    let resources = object.resource_section_mut().unwrap();
    resources.add_icons(1u16, &icons).unwrap();
    resources.add_manifest("MANIFEST", "<assembly/>").unwrap();

    let body = object.resource_section().unwrap().size().unwrap() as usize;
    let relocations = object.resource_section().unwrap().relocations().unwrap().len();
    assert_eq!(relocations, 4);

    let data = object.build().unwrap();
    assert_eq!(data.len() as u32, object.size().unwrap());
    assert_eq!(data.len(), 20 + 40 + body + 10 * relocations + 18 + 4);

    let header = read_at::<CoffHeader>(&data, 0);
    assert_eq!({ header.number_of_sections }, 1);
    assert_eq!({ header.machine }, IMAGE_FILE_MACHINE_I386);
    assert_eq!({ header.characteristics }, IMAGE_FILE_32BIT_MACHINE);
    assert_eq!({ header.size_of_optional_header }, 0);
    assert_eq!({ header.number_of_symbols }, 1);

    let section = read_at::<SectionHeader>(&data, 20);
    assert_eq!(section.name().as_deref(), Some(".rsrc"));
    assert_eq!({ section.size_of_raw_data } as usize, body);
    assert_eq!({ section.pointer_to_raw_data }, 60);
    assert_eq!({ section.pointer_to_relocations } as usize, 60 + body);
    assert_eq!({ section.number_of_relocations } as usize, relocations);
    assert_eq!({ section.characteristics }, 0x40000040);

    let rsrc = &data[60..60 + body];
    assert_eq!(rsrc, &object.resource_section().unwrap().build().unwrap()[..]);
    for index in 0..relocations {
        let relocation = read_at::<CoffRelocation>(&data, 60 + body + index * 10);
        assert_eq!({ relocation.symbol_table_index }, 0);
        assert_eq!({ relocation.type_ }, IMAGE_REL_I386_DIR32NB);
        let entry = read_at::<ResourceDataEntry>(rsrc, relocation.virtual_address as usize);
        assert!(({ entry.data_rva } + { entry.size }) as usize <= body);
    }

    let symbols = { header.pointer_to_symbol_table } as usize;
    assert_eq!(symbols, 60 + body + 10 * relocations);
    let symbol = read_at::<CoffSymbol>(&data, symbols);
    assert_eq!(&symbol.name.to_le_bytes()[..6], b".rsrc\0");
    assert_eq!({ symbol.section_number }, 1);
    assert_eq!({ symbol.storage_class }, IMAGE_SYM_CLASS_STATIC);
    assert_eq!(u32_at(&data, symbols + 18), 4, "empty string table");

    let group = object.resource_section().unwrap().resource(RT_GROUP_ICON, 1u16).unwrap();
    assert_eq!(u16_at(group.data(), 6 + 12), 101);
    assert_eq!(u16_at(group.data(), 6 + 14 + 12), 102);
}

#[test]
fn store_long_section_names() {
    init_logger();

    let mut object = ObjectFile::new();
    object.resource_section_mut().unwrap().add_manifest(1u16, "<assembly/>").unwrap();
    object.add_section(DataSection::new(".data$long_name", "long")).unwrap();
    object.add_section(DataSection::new(".other$long", "other")).unwrap();
    object.add_section(DataSection::new(".short", "short")).unwrap();

    assert!(matches!(
        object.add_section(DataSection::new(".data$long_name", "again")),
        Err(ObjectError::DuplicateSectionName(_))
    ));
    assert!(matches!(
        object.add_section(ResourceSection::new()),
        Err(ObjectError::DuplicateSectionName(_))
    ));
    assert!(matches!(object.section(".missing"), Err(ObjectError::SectionNotFound(_))));
    assert_eq!(object.string_table_offset(".data$long_name"), Some(4));
    assert_eq!(object.string_table_offset(".other$long"), Some(4 + 16));
    assert_eq!(object.string_table_offset(".short"), None);

    let data = object.build().unwrap();
    let header = read_at::<CoffHeader>(&data, 0);
    assert_eq!({ header.number_of_sections }, 4);

    let names = (0..4)
        .map(|index| read_at::<SectionHeader>(&data, 20 + index * 40).name().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec![".rsrc", "/4", "/20", ".short"]);
    for name in [".rsrc", ".data$long_name", ".other$long", ".short"] {
        assert_eq!(object.section(name).unwrap().name(), name);
    }

    let long = read_at::<SectionHeader>(&data, 60);
    assert_eq!({ long.number_of_relocations }, 0);
    assert_eq!({ long.pointer_to_relocations }, 0);
    let start = long.pointer_to_raw_data as usize;
    assert_eq!(&data[start..start + 4], b"long");

    let symbols = { header.pointer_to_symbol_table } as usize;
    let symbol = read_at::<CoffSymbol>(&data, symbols + 18);
    assert_eq!({ symbol.name } & 0xffff_ffff, 0);
    assert_eq!({ symbol.name } >> 32, 4);
    assert_eq!({ symbol.section_number }, 2);

    let strings = symbols + 4 * 18;
    assert_eq!(u32_at(&data, strings) as usize, data.len() - strings);
    assert_eq!(&data[strings + 4..], b".data$long_name\0.other$long\0");
}

#[test]
fn write_failure_keeps_partial_output() {
    init_logger();

    let mut object = ObjectFile::new();
    object.resource_section_mut().unwrap().add_manifest(1u16, vec![b'x'; 256]).unwrap();

    let mut writer = LimitedWriter {
        limit: 10,
        data:  Vec::new(),
    };
    assert!(matches!(object.write_to(&mut writer), Err(ObjectError::IOError(_))));
    assert_eq!(writer.data.len(), 10);

    let mut writer = LimitedWriter {
        limit: 100,
        data:  Vec::new(),
    };
    assert!(matches!(object.write_to(&mut writer), Err(ObjectError::IOError(_))));
    assert_eq!(writer.data, object.build().unwrap()[..100].to_vec());
}

#[test]
fn write_object_file() {
    init_logger();

    let mut object = ObjectFile::new();
    object.resource_section_mut().unwrap().add_manifest(1u16, "<assembly/>").unwrap();

    let path = temp_path("write.syso");
    object.write_file(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), object.build().unwrap());
    assert!(!temp_path("write.syso.tmp").exists());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn failed_write_leaves_file_untouched() {
    init_logger();

    let mut object = ObjectFile::new();
    let resources = object.resource_section_mut().unwrap();
    for type_ in 1..=256u16 {
        for id in 1..=256u16 {
            resources.add_resource(type_, id, Vec::<u8>::new()).unwrap();
        }
    }

    let path = temp_path("untouched.syso");
    std::fs::write(&path, b"existing").unwrap();
    assert!(matches!(
        object.write_file(&path),
        Err(ObjectError::TooManyRelocations(_, 65536))
    ));
    assert_eq!(std::fs::read(&path).unwrap(), b"existing");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn failed_file_write_leaves_destination_untouched() {
    init_logger();

    let mut object = ObjectFile::new();
    object.resource_section_mut().unwrap().add_manifest(1u16, "<assembly/>").unwrap();

    let path = temp_path("occupied.syso");
    std::fs::create_dir_all(path.join("entry")).unwrap();
    assert!(matches!(object.write_file(&path), Err(ObjectError::IOError(_))));
    assert!(path.join("entry").is_dir());
    assert!(!temp_path("occupied.syso.tmp").exists());
    std::fs::remove_dir_all(&path).unwrap();

    let path = temp_path("missing").join("object.syso");
    assert!(matches!(object.write_file(&path), Err(ObjectError::IOError(_))));
    assert!(!path.exists());
}

#[test]
fn embed_resource_files() {
    init_logger();

    let icon_path = temp_path("embed.ico");
    let manifest_path = temp_path("embed.manifest");
    std::fs::write(&icon_path, icon_file(&[b"small", b"large"])).unwrap();
    std::fs::write(&manifest_path, "<assembly/>").unwrap();

    let mut object = ObjectFile::new();
    let missing = FileResource::new("APP", temp_path("missing.ico"));
    assert!(matches!(embed_icon_file(&mut object, &missing), Err(ObjectError::IOError(_))));
    assert_eq!(object.sections().count(), 0, "no section is created on error");

    let invalid = FileResource::new("APP", &manifest_path);
    assert!(matches!(
        embed_icon_file(&mut object, &invalid),
        Err(ObjectError::Resource(ResourceError::InvalidIcon(_)))
    ));
    assert_eq!(object.sections().count(), 0);

    let ids = embed_icon_file(&mut object, &FileResource::new("APP", &icon_path)).unwrap();
    assert_eq!(ids, vec![1000, 1001]);
    embed_manifest_file(&mut object, &FileResource::new(1u16, &manifest_path)).unwrap();

    let mut version_info = VersionInfo::new();
    version_info.set_file_version_string("1.2.3.4").unwrap();
    version_info.set_string(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US, VS_FILE_VERSION, "1.2.3.4");
    version_info.add_translation(LANGUAGE_ID_EN_US, CODE_PAGE_ID_EN_US);
    embed_version_info(&mut object, 1u16, &version_info).unwrap();
    assert!(matches!(
        embed_version_info(&mut object, 1u16, &version_info),
        Err(ObjectError::Resource(ResourceError::DuplicateEntry(_)))
    ));

    assert_eq!(object.sections().count(), 1);
    let resources = object.resource_section().unwrap();
    assert_eq!(resources.types(), vec![RT_ICON, RT_GROUP_ICON, RT_VERSION, RT_MANIFEST]);
    assert_eq!(resources.resource(RT_MANIFEST, 1u16).unwrap().data(), b"<assembly/>");
    assert_eq!(
        resources.resource(RT_VERSION, 1u16).unwrap().data(),
        &version_info.build().unwrap()[..]
    );
    assert!(object.build().is_ok());

    std::fs::remove_file(&icon_path).unwrap();
    std::fs::remove_file(&manifest_path).unwrap();
}
