#![forbid(unsafe_code)]

//! Encode extended attributes as an AppleDouble `._` file, the way macOS
//! stores them on file systems without native xattr support.
//!
//! The file holds a Finder Info entry, which carries the extended attribute
//! header, key table and values, followed by an empty resource fork:
//!
//! ```text
//! 0     AppleDouble header, Finder Info and Resource Fork descriptors
//! 50    Finder Info (zeroed), "ATTR" header
//! 118   Attribute count, key records (each 4-byte aligned)
//! ...   Attribute values, packed back-to-back
//! end   Resource fork (empty)
//! ```

pub mod header;

mod attributes;
mod error;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use deku::DekuContainerWrite;
use itertools::Itertools;
use tracing::debug;

pub use appledouble_types as types;
pub use error::{Error, Result};

use attributes::{Layout, data_blob, key_table, validate};
use header::{AppleDoubleHeader, AttributeHeader};

/// Encode `attributes` as the contents of a `._` file.
///
/// Attributes are written sorted by name, as macOS does, so the output only
/// depends on the set of attributes and not on iteration order. An empty
/// input produces a valid file with no attributes.
///
/// Names must be non-empty, free of NUL bytes, at most 254 bytes long and
/// unique; there may be at most 65535 of them. Values are arbitrary bytes.
///
/// ```
/// use std::collections::HashMap;
///
/// let attributes = HashMap::from([("com.apple.test", "hello")]);
/// let file = xattr_file::create(&attributes)?;
///
/// assert!(file.ends_with(b"hello"));
/// # Ok::<(), xattr_file::Error>(())
/// ```
pub fn create<I, K, V>(attributes: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let sorted = attributes
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()))
        .collect::<Vec<_>>();
    let attributes = validate(&sorted)?;

    let layout = Layout::compute(&attributes)?;
    debug!(
        attributes = attributes.len(),
        header_length = layout.header_length,
        attr_header_length = layout.attr_header_length,
        key_table_length = layout.key_table_length,
        data_offset = layout.data_offset,
        data_length = layout.data_length,
        resource_fork_length = layout.resource_fork_length,
        file_length = layout.file_length,
        "AppleDouble layout"
    );

    let header = AppleDoubleHeader::sidecar(
        layout.finder_info_offset,
        layout.finder_info_length,
        layout.resource_fork_offset,
    );
    let attr_header =
        AttributeHeader::new(layout.file_length, layout.data_offset, layout.data_length);

    let mut file = Vec::with_capacity(layout.file_length as usize);
    file.extend_from_slice(&header.to_bytes()?);
    file.extend_from_slice(&attr_header.to_bytes()?);
    file.extend_from_slice(&key_table(&attributes, &layout)?);
    file.extend_from_slice(&data_blob(&attributes, &layout));

    debug_assert_eq!(file.len(), layout.file_length as usize);
    Ok(file)
}

/// Path of the `._` file holding attributes for `path`, next to it.
///
/// Returns `None` if `path` has no file name, such as `/` or `foo/..`.
pub fn sidecar_path(path: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    let file_name = path.file_name()?;

    let mut sidecar_name = OsString::from("._");
    sidecar_name.push(file_name);

    Some(path.with_file_name(sidecar_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn empty_input_is_minimal_file() {
        let file = create(HashMap::<String, Vec<u8>>::new()).unwrap();

        assert_eq!(file.len(), AppleDoubleHeader::SIZE + AttributeHeader::SIZE + 2);
        assert_eq!(&file[118..], &[0, 0]);
    }

    #[test]
    fn accepts_any_pair_iterator() {
        let from_vec = create(vec![("b", b"2".to_vec()), ("a", b"1".to_vec())]).unwrap();
        let from_map = create(BTreeMap::from([("a".to_string(), "1"), ("b".to_string(), "2")]))
            .unwrap();
        let from_iter = create([("a", [b'1']), ("b", [b'2'])]).unwrap();

        assert_eq!(from_vec, from_map);
        assert_eq!(from_vec, from_iter);
        assert!(from_vec.ends_with(b"12"));
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            create([("", "value")]),
            Err(Error::InvalidAttributeName { .. })
        ));
        assert!(matches!(
            create([("a", "1"), ("a", "2")]),
            Err(Error::DuplicateAttributeName(_))
        ));
    }

    #[test]
    fn sidecar_paths() {
        assert_eq!(
            sidecar_path("/Volumes/USB/photo.jpg"),
            Some(PathBuf::from("/Volumes/USB/._photo.jpg"))
        );
        assert_eq!(sidecar_path("notes"), Some(PathBuf::from("._notes")));
        assert_eq!(sidecar_path("/"), None);
    }
}
