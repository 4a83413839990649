//! Fixed-layout structures of a `._` file. Field order and padding follow
//! `apple_double_header_t`, `attr_header_t` and `attr_entry_t` from xnu's
//! vfs_xattr.c. All multi-byte integers are big-endian.

use appledouble_types::{
    APPLE_DOUBLE_MAGIC, APPLE_DOUBLE_VERSION, ATTR_ENTRY_ALIGNMENT, ATTR_ENTRY_FIXED_LENGTH,
    ATTR_HEADER_LENGTH, ATTR_HEADER_MAGIC, EntryId, FINDER_INFO_LENGTH, MAC_OS_X_FILLER,
    SIDECAR_ENTRY_COUNT, SIDECAR_HEADER_LENGTH,
};
use deku::ctx::Endian;
use deku::prelude::*;

/// Location of a single entry within the file. Defined as
/// `apple_double_entry_t` in vfs_xattr.c.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "endian", ctx = "endian: Endian")]
pub struct EntryDescriptor {
    /// Raw [`EntryId`]
    pub entry_id: u32,
    /// Offset from the start of the file
    pub offset: u32,
    pub length: u32,
}

/// AppleDouble file header, including its entry descriptors. Defined as
/// `apple_double_header_t` in vfs_xattr.c.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct AppleDoubleHeader {
    pub magic: u32,
    pub version: u32,
    pub filler: [u8; 16],
    pub entry_count: u16,
    #[deku(count = "entry_count")]
    pub entries: Vec<EntryDescriptor>,
}

impl AppleDoubleHeader {
    pub const SIZE: usize = SIDECAR_HEADER_LENGTH;

    /// Header for a `._` file with a Finder Info entry and an empty resource
    /// fork at `resource_fork_offset`, normally the very end of the file.
    ///
    /// The Finder Info entry must be first and the Resource Fork entry must
    /// be last.
    pub fn sidecar(
        finder_info_offset: u32,
        finder_info_length: u32,
        resource_fork_offset: u32,
    ) -> Self {
        Self {
            magic: APPLE_DOUBLE_MAGIC,
            version: APPLE_DOUBLE_VERSION,
            filler: MAC_OS_X_FILLER,
            entry_count: SIDECAR_ENTRY_COUNT,
            entries: vec![
                EntryDescriptor {
                    entry_id: EntryId::FinderInfo as u32,
                    offset: finder_info_offset,
                    length: finder_info_length,
                },
                EntryDescriptor {
                    entry_id: EntryId::ResourceFork as u32,
                    offset: resource_fork_offset,
                    length: 0,
                },
            ],
        }
    }
}

/// Extended attribute header, stored at the start of the Finder Info entry.
/// Defined as `attr_header_t` in vfs_xattr.c, minus the leading AppleDouble
/// header and the trailing attribute count.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct AttributeHeader {
    /// Classic Finder Info. Always zeroed by this crate.
    pub finder_info: [u8; FINDER_INFO_LENGTH],
    #[deku(pad_bytes_before = "2")]
    pub magic: [u8; 4],
    pub debug_tag: u32,
    /// Length of the whole file, not just the Finder Info entry.
    pub total_size: u32,
    /// Offset of the first attribute value from the start of the file.
    pub data_start: u32,
    pub data_length: u32,
    pub reserved: [u32; 3],
    pub flags: u16,
}

impl AttributeHeader {
    pub const SIZE: usize = ATTR_HEADER_LENGTH;

    pub fn new(total_size: u32, data_start: u32, data_length: u32) -> Self {
        Self {
            finder_info: [0; FINDER_INFO_LENGTH],
            magic: ATTR_HEADER_MAGIC,
            debug_tag: 0,
            total_size,
            data_start,
            data_length,
            reserved: [0; 3],
            flags: 0,
        }
    }
}

/// One record of the attribute key table. Defined as `attr_entry_t` in
/// vfs_xattr.c.
///
/// The name is stored with its NUL terminator, which is counted by
/// `name_length`. Records are followed by zero padding, see
/// [`AttributeEntry::padding`].
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct AttributeEntry {
    /// Offset of the value from the start of the file.
    pub offset: u32,
    pub length: u32,
    pub flags: u16,
    pub name_length: u8,
    #[deku(count = "name_length")]
    pub name: Vec<u8>,
}

impl AttributeEntry {
    /// Record for a name already known to fit the one-byte length field.
    pub(crate) fn new(name: &[u8], name_length: u8, offset: u32, length: u32) -> Self {
        let mut terminated = Vec::with_capacity(usize::from(name_length));
        terminated.extend_from_slice(name);
        terminated.push(0);

        Self {
            offset,
            length,
            flags: 0,
            name_length,
            name: terminated,
        }
    }

    /// Name without its NUL terminator.
    pub fn name(&self) -> &[u8] {
        self.name.strip_suffix(&[0]).unwrap_or(&self.name)
    }

    /// Zero bytes following a record whose name is `name_len` bytes long,
    /// not counting the terminator.
    ///
    /// Always between 1 and 4: a record that already ends on a 4-byte
    /// boundary still gets a full 4 bytes of padding, matching what existing
    /// consumers of these files expect.
    pub fn padding(name_len: usize) -> usize {
        let unpadded = ATTR_ENTRY_FIXED_LENGTH + name_len + 1;
        ATTR_ENTRY_ALIGNMENT - unpadded % ATTR_ENTRY_ALIGNMENT
    }

    /// Total length of a record, including padding.
    pub fn padded_length(name_len: usize) -> usize {
        ATTR_ENTRY_FIXED_LENGTH + name_len + 1 + Self::padding(name_len)
    }
}
