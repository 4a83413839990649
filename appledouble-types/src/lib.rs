// SPDX-License-Identifier: MIT

//! Types and constants from [RFC 1740 - MIME Encapsulation of Macintosh files](https://www.rfc-editor.org/rfc/rfc1740)
//! and the extended attribute layout used by macOS in `._` files, as found in
//! xnu's [vfs_xattr.c](https://opensource.apple.com/source/xnu/xnu-792.13.8/bsd/vfs/vfs_xattr.c),
//! adjusted to use Rust-friendly naming.

#![forbid(dead_code, unsafe_code, unused)]

// region AppleDouble header

/// Magic number of a standalone AppleSingle file.
pub const APPLE_SINGLE_MAGIC: u32 = 0x0005_1600;

/// Magic number of an AppleDouble header file.
pub const APPLE_DOUBLE_MAGIC: u32 = 0x0005_1607;

/// Version 2 of the AppleSingle/AppleDouble format. Version 1 files are not
/// written by any supported system.
pub const APPLE_DOUBLE_VERSION: u32 = 0x0002_0000;

/// Filler written by macOS in place of the 16 zero bytes of RFC 1740.
///
/// Version 1 used this field as a home file system name, and macOS keeps
/// writing one.
pub const MAC_OS_X_FILLER: [u8; 16] = *b"Mac OS X        ";

/// Length of the fixed header prefix: magic, version, filler and entry count.
pub const HEADER_PREFIX_LENGTH: usize = 4 + 4 + 16 + 2;

/// Length of one entry descriptor: id, offset and length.
pub const ENTRY_DESCRIPTOR_LENGTH: usize = 4 + 4 + 4;

/// A `._` file written by macOS always has a Finder Info and a Resource Fork entry.
pub const SIDECAR_ENTRY_COUNT: u16 = 2;

/// Length of the header, including the two entry descriptors of a `._` file.
pub const SIDECAR_HEADER_LENGTH: usize =
    HEADER_PREFIX_LENGTH + SIDECAR_ENTRY_COUNT as usize * ENTRY_DESCRIPTOR_LENGTH;

/// Entry types defined by RFC 1740. Ids 0 and 7 are not assigned.
///
/// Described in RFC 1740 [Appendix A](https://www.rfc-editor.org/rfc/rfc1740#appendix-A)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryId {
    /// Data fork. Never present in an AppleDouble header file.
    DataFork = 1,
    /// Resource fork.
    ResourceFork = 2,
    /// File's name as created on the home file system.
    RealName = 3,
    /// Standard Macintosh comment.
    Comment = 4,
    /// Standard Macintosh black and white icon.
    IconBw = 5,
    /// Macintosh color icon.
    IconColor = 6,
    /// File creation, modification, backup and access dates.
    FileDatesInfo = 8,
    /// Standard Macintosh Finder information.
    FinderInfo = 9,
    /// Macintosh file information, attributes and so on.
    MacintoshFileInfo = 10,
    /// ProDOS file information.
    ProDosFileInfo = 11,
    /// MS-DOS file information.
    MsDosFileInfo = 12,
    /// AFP short name.
    ShortName = 13,
    /// AFP file information.
    AfpFileInfo = 14,
    /// AFP directory id.
    DirectoryId = 15,
}

impl TryFrom<u32> for EntryId {
    type Error = u32;

    /// Map a raw entry id, returning the raw value when it is not assigned.
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::DataFork,
            2 => Self::ResourceFork,
            3 => Self::RealName,
            4 => Self::Comment,
            5 => Self::IconBw,
            6 => Self::IconColor,
            8 => Self::FileDatesInfo,
            9 => Self::FinderInfo,
            10 => Self::MacintoshFileInfo,
            11 => Self::ProDosFileInfo,
            12 => Self::MsDosFileInfo,
            13 => Self::ShortName,
            14 => Self::AfpFileInfo,
            15 => Self::DirectoryId,
            other => return Err(other),
        })
    }
}

// region Extended attributes

/// Length of the classic Finder Info block that opens the Finder Info entry.
pub const FINDER_INFO_LENGTH: usize = 32;

/// Magic of the extended attribute header, stored inside the Finder Info entry.
pub const ATTR_HEADER_MAGIC: [u8; 4] = *b"ATTR";

/// Length of the extended attribute header, from the start of the Finder Info
/// entry up to (not including) the attribute count.
///
/// Finder Info, 2 bytes of alignment padding, magic, debug tag, total size,
/// data start, data length, 3 reserved words and flags.
pub const ATTR_HEADER_LENGTH: usize = FINDER_INFO_LENGTH + 2 + 4 + 4 + 4 + 4 + 4 + 3 * 4 + 2;

/// Fixed part of an attribute entry: offset, length, flags and name length.
pub const ATTR_ENTRY_FIXED_LENGTH: usize = 4 + 4 + 2 + 1;

/// Attribute entries are padded to this alignment.
pub const ATTR_ENTRY_ALIGNMENT: usize = 4;

/// Longest attribute name, in bytes, whose length and NUL terminator still fit
/// in the one-byte name length field.
pub const ATTR_NAME_MAX_LENGTH: usize = u8::MAX as usize - 1;

/// Attributes commonly found in `._` files written by macOS.
pub mod well_known {
    /// Classic Finder Info, also stored in the Finder Info entry itself.
    pub const FINDER_INFO: &str = "com.apple.FinderInfo";
    /// Resource fork, normally stored in its own entry.
    pub const RESOURCE_FORK: &str = "com.apple.ResourceFork";
    /// Gatekeeper quarantine flags for downloaded files.
    pub const QUARANTINE: &str = "com.apple.quarantine";
    /// Download sources, as a binary property list.
    pub const WHERE_FROMS: &str = "com.apple.metadata:kMDItemWhereFroms";
    /// Finder tags, as a binary property list.
    pub const USER_TAGS: &str = "com.apple.metadata:_kMDItemUserTags";
}
