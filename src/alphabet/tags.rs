use std::io::Cursor;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};

/// Fixed key space of all tags of one size over an alphabet.
///
/// Ordinals are base-|alphabet| numbers with the first residue most
/// significant, so ordinal order is lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpace {
    alphabet: Vec<char>,
    tag_size: usize,
}

impl TagSpace {
    pub fn new(alphabet: &[char], tag_size: usize) -> Result<Self> {
        let mut alphabet = alphabet.to_vec();
        alphabet.sort_unstable();
        alphabet.dedup();

        if alphabet.is_empty() || tag_size == 0 {
            return Err(Error::invalid_argument("Tag space needs an alphabet and a positive tag size"));
        }
        let len = (alphabet.len() as u64).checked_pow(tag_size as u32);
        if len.map_or(true, |len| len > u32::MAX as u64 + 1) {
            return Err(Error::invalid_argument(format!(
                "Tags of size {} over {} residues do not fit a 32-bit key space",
                tag_size, alphabet.len()
            )));
        }

        Ok(TagSpace { alphabet, tag_size })
    }

    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Number of tags in the key space
    pub fn len(&self) -> u64 {
        (self.alphabet.len() as u64).pow(self.tag_size as u32)
    }

    pub fn ordinal(&self, tag: &str) -> Option<u32> {
        let mut ordinal: u64 = 0;
        let mut count = 0;
        for residue in tag.chars() {
            count += 1;
            if count > self.tag_size {
                return None;
            }
            let index = self.alphabet.binary_search(&residue).ok()?;
            ordinal = ordinal * self.alphabet.len() as u64 + index as u64;
        }
        if count != self.tag_size {
            return None;
        }
        u32::try_from(ordinal).ok()
    }

    pub fn tag(&self, ordinal: u32) -> String {
        let base = self.alphabet.len() as u64;
        let mut remainder = ordinal as u64;
        let mut residues = vec![self.alphabet[0]; self.tag_size];
        for slot in residues.iter_mut().rev() {
            *slot = self.alphabet[(remainder % base) as usize];
            remainder /= base;
        }
        residues.into_iter().collect()
    }

    /// Every tag in ascending order
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.len()).map(move |ordinal| self.tag(ordinal as u32))
    }
}

/// Set of tags observed in a database, stored as a bitmap of ordinals
#[derive(Debug, Clone, PartialEq)]
pub struct TagSet {
    space: TagSpace,
    ordinals: RoaringBitmap,
}

impl TagSet {
    pub fn new(space: TagSpace) -> Self {
        TagSet {
            space,
            ordinals: RoaringBitmap::new(),
        }
    }

    pub fn space(&self) -> &TagSpace {
        &self.space
    }

    /// Returns false if the tag was already present or is outside the key space
    pub fn insert(&mut self, tag: &str) -> bool {
        match self.space.ordinal(tag) {
            Some(ordinal) => self.ordinals.insert(ordinal),
            None => false,
        }
    }

    pub fn insert_ordinal(&mut self, ordinal: u32) -> bool {
        if (ordinal as u64) < self.space.len() {
            self.ordinals.insert(ordinal)
        } else {
            false
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.space
            .ordinal(tag)
            .is_some_and(|ordinal| self.ordinals.contains(ordinal))
    }

    pub fn len(&self) -> u64 {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// Tags in ascending lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.ordinals.iter().map(|ordinal| self.space.tag(ordinal))
    }

    /// Owning variant of `iter`
    pub fn into_tags(self) -> impl Iterator<Item = String> + Send {
        let space = self.space;
        self.ordinals.into_iter().map(move |ordinal| space.tag(ordinal))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = bincode::serialize(&self.space)?;
        self.ordinals.serialize_into(&mut buffer)?;
        Ok(buffer)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let space: TagSpace = bincode::deserialize_from(&mut cursor)?;
        let ordinals = RoaringBitmap::deserialize_from(&mut cursor)?;
        Ok(TagSet { space, ordinals })
    }
}
