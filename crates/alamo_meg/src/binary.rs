//! Building blocks for the fixed-layout elements an archive's metadata is made of.

use std::io::{self, Write};
use std::slice;

use crate::error::{Error, Result};

/// An element with a byte-exact encoding
pub trait BinaryElement {
    /// Number of bytes [`BinaryElement::write_bytes`] produces
    fn size(&self) -> usize;

    /// Writes the encoded element
    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Returns a freshly allocated copy of the encoded element
    ///
    /// # Panics
    ///
    /// Only if [`BinaryElement::write_bytes`] fails on its own, since writing into a `Vec` cannot.
    /// Use [`BinaryElement::write_bytes`] directly to get the error instead.
    fn bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size());
        self.write_bytes(&mut buffer)
            .expect("writing to a Vec should never fail");
        buffer
    }
}

/// An ordered table of [`BinaryElement`]s, encoded as the concatenation of its members
///
/// The encoded size is summed once when the table is created.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryTable<T> {
    items: Vec<T>,
    size: usize,
}

impl<T: BinaryElement> BinaryTable<T> {
    /// Creates a table from `items`, keeping their order
    pub fn new(items: Vec<T>) -> Self {
        let size = items.iter().map(|item| item.size()).sum();
        BinaryTable { items, size }
    }

    /// Number of elements in the table
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table contains no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an element by its position
    pub fn get(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Iterates the elements from the first one
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: BinaryElement> BinaryElement for BinaryTable<T> {
    fn size(&self) -> usize {
        self.size
    }

    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.items.iter().try_for_each(|item| item.write_bytes(writer))
    }
}

impl<'a, T: BinaryElement> IntoIterator for &'a BinaryTable<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: BinaryElement> Default for BinaryTable<T> {
    fn default() -> Self {
        BinaryTable::new(Vec::new())
    }
}
