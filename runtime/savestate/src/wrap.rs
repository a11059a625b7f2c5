//! StateWrap - the bidirectional snapshot cursor
//!
//! One wrap is created per save, restore or measure pass. Callers describe
//! their state once, as a sequence of [`StateWrap::value`] and
//! [`StateWrap::section`] calls, and the wrap's [`Mode`] decides whether
//! that sequence is written, read back, or only sized.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, StateError};

/// Bincode configuration shared by every value in a snapshot
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Direction of a snapshot pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Restore values from an existing snapshot
    Read,
    /// Append values to a new snapshot
    Write,
    /// Count the bytes a write pass would produce
    Measure,
}

/// Header of a top-level section, as found by [`scan_sections`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Section title
    pub title: String,
    /// Version the section was written with
    pub version: u32,
    /// Body length in bytes
    pub length: u32,
}

/// Snapshot cursor
pub struct StateWrap<'a> {
    mode: Mode,
    input: &'a [u8],
    output: Vec<u8>,
    offset: usize,
}

impl<'a> StateWrap<'a> {
    /// Create a wrap that restores from `input`
    pub fn reader(input: &'a [u8]) -> Self {
        Self {
            mode: Mode::Read,
            input,
            output: Vec::new(),
            offset: 0,
        }
    }

    /// Current mode
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether this pass restores state
    #[inline]
    pub fn is_reading(&self) -> bool {
        self.mode == Mode::Read
    }

    /// Byte position of the cursor
    ///
    /// For a measure pass this is the number of bytes counted so far.
    pub fn position(&self) -> usize {
        match self.mode {
            Mode::Write => self.output.len(),
            Mode::Read | Mode::Measure => self.offset,
        }
    }

    /// Unread bytes left in a read pass (zero for other modes)
    pub fn remaining(&self) -> usize {
        self.input.len().saturating_sub(self.offset)
    }

    /// Finish a write pass and take the snapshot bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    /// Save or restore a single value
    pub fn value<T>(&mut self, value: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        if self.is_reading() {
            *value = self.take()?;
            Ok(())
        } else {
            self.put(&*value)
        }
    }

    /// Save or restore a fixed-size array element by element
    ///
    /// No length is written; both sides must agree on `items.len()`.
    pub fn do_array<T>(&mut self, items: &mut [T]) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        for item in items.iter_mut() {
            self.value(item)?;
        }
        Ok(())
    }

    /// Save or restore a named, versioned section
    ///
    /// `body` receives the version to interpret: `version` when writing, the
    /// stored version when reading. A read fails if the stored version is
    /// outside `min_version..=version`.
    ///
    /// # Returns
    /// The section version that was written or found
    pub fn section<F>(&mut self, title: &str, min_version: u32, version: u32, body: F) -> Result<u32>
    where
        F: FnOnce(&mut Self, u32) -> Result<()>,
    {
        if self.is_reading() {
            self.read_section(title, min_version, version, body)
        } else {
            self.write_section(title, version, body)
        }
    }

    fn write_section<F>(&mut self, title: &str, version: u32, body: F) -> Result<u32>
    where
        F: FnOnce(&mut Self, u32) -> Result<()>,
    {
        self.put(title)?;
        self.put(&version)?;

        // Length is back-patched once the body size is known
        let length_at = self.position();
        self.put(&0u32)?;
        let body_start = self.position();

        body(self, version)?;

        let length = u32::try_from(self.position() - body_start).map_err(|_| {
            StateError::SectionTooLarge {
                title: title.to_owned(),
            }
        })?;
        if self.mode == Mode::Write {
            self.output[length_at..length_at + 4].copy_from_slice(&length.to_le_bytes());
        }

        Ok(version)
    }

    fn read_section<F>(&mut self, title: &str, min_version: u32, version: u32, body: F) -> Result<u32>
    where
        F: FnOnce(&mut Self, u32) -> Result<()>,
    {
        let found: String = self.take()?;
        if found != title {
            log::error!("Savestate failure: wrong section \"{}\", expected \"{}\"", found, title);
            return Err(StateError::SectionMismatch {
                expected: title.to_owned(),
                found,
            });
        }

        let stored: u32 = self.take()?;
        if stored < min_version || stored > version {
            log::error!(
                "Savestate failure: section \"{}\" has version {}, this build reads {}..={}",
                title,
                stored,
                min_version,
                version
            );
            return Err(StateError::UnsupportedVersion {
                title: title.to_owned(),
                found: stored,
                min: min_version,
                max: version,
            });
        }

        let declared: u32 = self.take()?;
        let body_start = self.offset;
        if body_start + declared as usize > self.input.len() {
            return Err(StateError::Truncated {
                offset: self.input.len(),
            });
        }

        // The body only sees its own bytes; reading past them is an overrun
        let outer = self.input;
        self.input = &outer[..body_start + declared as usize];
        let result = body(self, stored);
        self.input = outer;
        if let Err(StateError::Truncated { .. }) = result {
            return Err(StateError::SectionOverrun {
                title: title.to_owned(),
                declared,
            });
        }
        result?;

        let consumed = self.offset - body_start;
        if consumed != declared as usize {
            log::error!(
                "Savestate failure: section \"{}\" left {} of {} bytes unread",
                title,
                (declared as usize).saturating_sub(consumed),
                declared
            );
            return Err(StateError::SectionLength {
                title: title.to_owned(),
                declared,
                consumed,
            });
        }

        Ok(stored)
    }

    /// Encode a value (write and measure passes only)
    fn put<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if self.mode == Mode::Write {
            codec().serialize_into(&mut self.output, value)?;
        } else {
            self.offset += codec().serialized_size(value)? as usize;
        }
        Ok(())
    }

    /// Decode a value (read pass only)
    fn take<T>(&mut self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let input = self.input;
        let mut rest = input.get(self.offset..).unwrap_or_default();
        let before = rest.len();

        // A length prefix larger than the remaining input must not allocate
        let value = codec()
            .with_limit(before as u64)
            .deserialize_from(&mut rest)
            .map_err(|err| {
                let eof = match *err {
                    bincode::ErrorKind::SizeLimit => true,
                    bincode::ErrorKind::Io(ref io) => io.kind() == std::io::ErrorKind::UnexpectedEof,
                    _ => false,
                };
                if eof {
                    StateError::Truncated {
                        offset: self.offset,
                    }
                } else {
                    StateError::Codec(err)
                }
            })?;

        self.offset += before - rest.len();
        Ok(value)
    }
}

impl StateWrap<'static> {
    /// Create a wrap that produces a new snapshot
    pub fn writer() -> Self {
        Self {
            mode: Mode::Write,
            input: &[],
            output: Vec::new(),
            offset: 0,
        }
    }

    /// Create a wrap that only counts bytes
    pub fn measurer() -> Self {
        Self {
            mode: Mode::Measure,
            input: &[],
            output: Vec::new(),
            offset: 0,
        }
    }
}

/// List the top-level sections of a snapshot without interpreting bodies
pub fn scan_sections(bytes: &[u8]) -> Result<Vec<SectionHeader>> {
    let mut p = StateWrap::reader(bytes);
    let mut headers = Vec::new();

    while p.remaining() > 0 {
        let title: String = p.take()?;
        let version: u32 = p.take()?;
        let length: u32 = p.take()?;

        let end = p.offset + length as usize;
        if end > bytes.len() {
            return Err(StateError::Truncated {
                offset: bytes.len(),
            });
        }
        p.offset = end;

        headers.push(SectionHeader {
            title,
            version,
            length,
        });
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_counter(p: &mut StateWrap<'_>, counter: &mut u32, version: u32) -> Result<u32> {
        p.section("Counter", 1, version, |p, _| p.value(counter))
    }

    #[test]
    fn test_fixed_width_encoding() {
        let mut p = StateWrap::writer();
        p.value(&mut 0x1234_5678u32).unwrap();
        p.value(&mut true).unwrap();
        assert_eq!(p.into_bytes(), vec![0x78, 0x56, 0x34, 0x12, 0x01]);
    }

    #[test]
    fn test_section_round_trip() {
        let mut p = StateWrap::writer();
        let mut value = 42u32;
        let mut name = String::from("idle");
        p.section("Outer", 1, 3, |p, version| {
            assert_eq!(version, 3);
            p.value(&mut value)?;
            p.section("Inner", 1, 1, |p, _| p.value(&mut name))?;
            Ok(())
        })
        .unwrap();
        let bytes = p.into_bytes();

        let mut value_back = 0u32;
        let mut name_back = String::new();
        let mut r = StateWrap::reader(&bytes);
        let version = r
            .section("Outer", 1, 3, |p, _| {
                p.value(&mut value_back)?;
                p.section("Inner", 1, 1, |p, _| p.value(&mut name_back))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(version, 3);
        assert_eq!(value_back, 42);
        assert_eq!(name_back, "idle");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_measure_matches_write() {
        let mut counter = 7u32;
        let mut w = StateWrap::writer();
        write_counter(&mut w, &mut counter, 1).unwrap();

        let mut m = StateWrap::measurer();
        write_counter(&mut m, &mut counter, 1).unwrap();

        assert_eq!(m.position(), w.into_bytes().len());
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut counter = 1u32;
        let mut w = StateWrap::writer();
        write_counter(&mut w, &mut counter, 2).unwrap();
        let bytes = w.into_bytes();

        let mut r = StateWrap::reader(&bytes);
        let err = write_counter(&mut r, &mut counter, 1).unwrap_err();
        assert!(matches!(
            err,
            StateError::UnsupportedVersion { found: 2, min: 1, max: 1, .. }
        ));
        assert!(err.is_structural());
    }

    #[test]
    fn test_older_version_below_minimum_rejected() {
        let mut w = StateWrap::writer();
        w.section("Counter", 1, 1, |_, _| Ok(())).unwrap();
        let bytes = w.into_bytes();

        let mut r = StateWrap::reader(&bytes);
        let result = r.section("Counter", 2, 3, |_, _| Ok(()));
        assert!(matches!(result, Err(StateError::UnsupportedVersion { found: 1, .. })));
    }

    #[test]
    fn test_title_mismatch() {
        let mut w = StateWrap::writer();
        w.section("Threads", 1, 1, |_, _| Ok(())).unwrap();
        let bytes = w.into_bytes();

        let mut r = StateWrap::reader(&bytes);
        let err = r.section("Mutexes", 1, 1, |_, _| Ok(())).unwrap_err();
        match err {
            StateError::SectionMismatch { expected, found } => {
                assert_eq!(expected, "Mutexes");
                assert_eq!(found, "Threads");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_body_length_mismatch() {
        let mut w = StateWrap::writer();
        w.section("Pair", 1, 1, |p, _| {
            p.value(&mut 1u32)?;
            p.value(&mut 2u32)
        })
        .unwrap();
        let bytes = w.into_bytes();

        // Reader only understands the first field
        let mut r = StateWrap::reader(&bytes);
        let err = r
            .section("Pair", 1, 1, |p, _| p.value(&mut 0u32))
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::SectionLength { declared: 8, consumed: 4, .. }
        ));
    }

    #[test]
    fn test_body_overrun() {
        let mut w = StateWrap::writer();
        w.section("One", 1, 1, |p, _| p.value(&mut 1u32)).unwrap();
        w.section("Next", 1, 1, |p, _| p.value(&mut 2u32)).unwrap();
        let bytes = w.into_bytes();

        // Reader expects two fields; the second must not come from "Next"
        let mut r = StateWrap::reader(&bytes);
        let err = r
            .section("One", 1, 1, |p, _| {
                p.value(&mut 0u32)?;
                p.value(&mut 0u32)
            })
            .unwrap_err();
        assert!(matches!(err, StateError::SectionOverrun { declared: 4, .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_truncated_input() {
        let mut counter = 9u32;
        let mut w = StateWrap::writer();
        write_counter(&mut w, &mut counter, 1).unwrap();
        let bytes = w.into_bytes();

        let mut r = StateWrap::reader(&bytes[..bytes.len() - 2]);
        let err = write_counter(&mut r, &mut counter, 1).unwrap_err();
        assert!(matches!(err, StateError::Truncated { .. }));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_do_array_has_no_length_prefix() {
        let mut flags = [true, false, true, true];
        let mut w = StateWrap::writer();
        w.do_array(&mut flags).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![1, 0, 1, 1]);

        let mut back = [false; 4];
        StateWrap::reader(&bytes).do_array(&mut back).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn test_scan_sections() {
        let mut w = StateWrap::writer();
        w.section("Kernel", 1, 2, |p, _| p.value(&mut 5u32)).unwrap();
        w.section("HLE Modules", 1, 1, |_, _| Ok(())).unwrap();
        let bytes = w.into_bytes();

        let headers = scan_sections(&bytes).unwrap();
        assert_eq!(
            headers,
            vec![
                SectionHeader {
                    title: "Kernel".into(),
                    version: 2,
                    length: 4
                },
                SectionHeader {
                    title: "HLE Modules".into(),
                    version: 1,
                    length: 0
                },
            ]
        );
    }
}
