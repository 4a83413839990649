//! Attribute key table and data blob.
//!
//! The key table records absolute file offsets of every value, so its own
//! length has to be known before it can be written. Lengths depend only on
//! name and value sizes: [`Layout::compute`] sums them first, and
//! [`key_table`] then emits records with resolved offsets.

use appledouble_types::ATTR_NAME_MAX_LENGTH;
use deku::DekuContainerWrite;
use itertools::Itertools;
use tracing::trace;

use crate::header::{AppleDoubleHeader, AttributeEntry, AttributeHeader};
use crate::{Error, Result};

/// Length of the attribute count preceding the key records.
const COUNT_LENGTH: usize = 2;

/// A validated attribute, borrowed from the caller's input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a [u8],
    /// Name length including the NUL terminator.
    pub name_length: u8,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a str, value: &'a [u8]) -> Result<Self> {
        let invalid = |reason| Error::InvalidAttributeName {
            name: name.to_owned(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.as_bytes().contains(&0) {
            return Err(invalid("name contains a NUL byte"));
        }
        if name.len() > ATTR_NAME_MAX_LENGTH {
            return Err(invalid("name is longer than 254 bytes"));
        }

        Ok(Self {
            name,
            value,
            name_length: (name.len() + 1) as u8,
        })
    }
}

/// Validate `attributes`, which must already be sorted by name.
pub(crate) fn validate<'a, K, V>(attributes: &'a [(K, V)]) -> Result<Vec<Attribute<'a>>>
where
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    if attributes.len() > usize::from(u16::MAX) {
        return Err(Error::AttributeCountOverflow(attributes.len()));
    }

    if let Some(((name, _), _)) = attributes
        .iter()
        .tuple_windows()
        .find(|((a, _), (b, _))| a.as_ref() == b.as_ref())
    {
        return Err(Error::DuplicateAttributeName(name.as_ref().to_owned()));
    }

    attributes
        .iter()
        .map(|(name, value)| Attribute::new(name.as_ref(), value.as_ref()))
        .collect()
}

/// Offsets and lengths of every region of the file, all in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub header_length: u32,
    pub attr_header_length: u32,
    /// Attribute count and all padded key records.
    pub key_table_length: u32,
    /// Offset of the first value from the start of the file.
    pub data_offset: u32,
    pub data_length: u32,
    pub finder_info_offset: u32,
    /// Attribute header, key table and data.
    pub finder_info_length: u32,
    /// The empty resource fork sits at the end of the file.
    pub resource_fork_offset: u32,
    pub resource_fork_length: u32,
    pub file_length: u32,
}

impl Layout {
    /// Compute the layout from name and value lengths alone.
    pub(crate) fn compute(attributes: &[Attribute<'_>]) -> Result<Self> {
        let header_length = AppleDoubleHeader::SIZE as u64;
        let attr_header_length = AttributeHeader::SIZE as u64;

        let key_table_length = COUNT_LENGTH as u64
            + attributes
                .iter()
                .map(|attribute| AttributeEntry::padded_length(attribute.name.len()) as u64)
                .sum::<u64>();
        let data_length = attributes
            .iter()
            .map(|attribute| attribute.value.len() as u64)
            .sum::<u64>();

        let data_offset = header_length + attr_header_length + key_table_length;
        let file_length = data_offset + data_length;

        // Every other field is bounded by the file length.
        let file_length_u32 =
            u32::try_from(file_length).map_err(|_| Error::FileTooLarge(file_length))?;

        Ok(Self {
            header_length: header_length as u32,
            attr_header_length: attr_header_length as u32,
            key_table_length: key_table_length as u32,
            data_offset: data_offset as u32,
            data_length: data_length as u32,
            finder_info_offset: header_length as u32,
            finder_info_length: (attr_header_length + key_table_length + data_length) as u32,
            resource_fork_offset: file_length_u32,
            resource_fork_length: 0,
            file_length: file_length_u32,
        })
    }
}

/// Emit the attribute count followed by one padded record per attribute,
/// pointing at values packed back-to-back from `layout.data_offset`.
pub(crate) fn key_table(attributes: &[Attribute<'_>], layout: &Layout) -> Result<Vec<u8>> {
    let mut table = Vec::with_capacity(layout.key_table_length as usize);
    table.extend_from_slice(&(attributes.len() as u16).to_be_bytes());

    let mut cursor = layout.data_offset;
    for attribute in attributes {
        let length = attribute.value.len() as u32;
        let entry = AttributeEntry::new(
            attribute.name.as_bytes(),
            attribute.name_length,
            cursor,
            length,
        );
        trace!(
            name = attribute.name,
            offset = cursor,
            length,
            "attribute entry"
        );

        table.extend_from_slice(&entry.to_bytes()?);
        let padded_len = table.len() + AttributeEntry::padding(attribute.name.len());
        table.resize(padded_len, 0);

        cursor += length;
    }

    debug_assert_eq!(table.len(), layout.key_table_length as usize);
    Ok(table)
}

/// Concatenate all values, in key table order, without separators.
pub(crate) fn data_blob(attributes: &[Attribute<'_>], layout: &Layout) -> Vec<u8> {
    let mut data = Vec::with_capacity(layout.data_length as usize);
    for attribute in attributes {
        data.extend_from_slice(attribute.value);
    }

    data
}
